/// Decoding of every supported encoding and rejection of reserved ones.
pub mod decode;

//! Cache Replacement Policies.
//!
//! The caches are fully associative, so a policy only has to name a victim slot
//! among all slots once the cache is full. `RandomPolicy` is the production policy;
//! other implementations are handy for deterministic tests.

/// Random replacement policy.
pub mod random;

pub use random::RandomPolicy;

/// Trait for cache replacement policies.
pub trait ReplacementPolicy: Send {
    /// Records that `slot` was just filled.
    fn update(&mut self, slot: usize);

    /// Selects the slot to evict from a full cache of `slots` lines.
    ///
    /// # Returns
    ///
    /// A slot index in `0..slots`.
    fn get_victim(&mut self, slots: usize) -> usize;
}

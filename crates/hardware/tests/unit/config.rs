//! Configuration loading and validation.

use std::io::Write;

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvsmp_core::config::{Config, ConfigError};

#[test]
fn empty_object_is_the_default() {
    assert_eq!(Config::from_json("{}").unwrap(), Config::default());
}

#[test]
fn defaults() {
    let c = Config::default();
    assert_eq!(c.system.harts, 1);
    assert!(c.system.ipi_enabled);
    assert_eq!(c.system.interrupt_poll_interval, 100);
    assert_eq!(c.system.nop_loop_sleep_us, 100);
    assert_eq!(c.system.start_pc, 0);
    assert_eq!(c.memory.size_mib, 16);
    assert_eq!(c.memory.size_bytes(), 16 << 20);
    assert_eq!(c.memory.tlb_size, 64);
    assert!(c.cache.icache_enabled && c.cache.dcache_enabled);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let c = Config::from_json(
        r#"{ "system": { "harts": 4, "ipi_enabled": false }, "cache": { "dcache_enabled": false } }"#,
    )
    .unwrap();
    assert_eq!(c.system.harts, 4);
    assert!(!c.system.ipi_enabled);
    assert_eq!(c.system.interrupt_poll_interval, 100);
    assert!(c.cache.icache_enabled);
    assert!(!c.cache.dcache_enabled);
}

#[rstest]
#[case(r#"{ "system": { "harts": 0 } }"#, "system.harts")]
#[case(r#"{ "system": { "harts": 33 } }"#, "system.harts")]
#[case(r#"{ "system": { "interrupt_poll_interval": 0 } }"#, "system.interrupt_poll_interval")]
#[case(r#"{ "system": { "start_pc": 2 } }"#, "system.start_pc")]
#[case(r#"{ "memory": { "size_mib": 12 } }"#, "memory.size_mib")]
#[case(r#"{ "memory": { "tlb_size": 48 } }"#, "memory.tlb_size")]
fn invalid_values_name_the_field(#[case] json: &str, #[case] expected: &str) {
    match Config::from_json(json) {
        Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
        other => panic!("expected Invalid for {expected}, got {other:?}"),
    }
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(
        Config::from_json(r#"{ "system": { "harts": "two" } }"#),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn from_file_reads_and_validates() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ "system": {{ "harts": 2, "start_pc": 4096 }} }}"#).unwrap();
    let c = Config::from_file(file.path()).unwrap();
    assert_eq!(c.system.harts, 2);
    assert_eq!(c.system.start_pc, 0x1000);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Config::from_file(dir.path().join("absent.json")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn serialises_back_to_the_same_config() {
    let c = Config::from_json(r#"{ "memory": { "size_mib": 4 } }"#).unwrap();
    let text = serde_json::to_string(&c).unwrap();
    assert_eq!(Config::from_json(&text).unwrap(), c);
}

//! Resolution from explicitly supplied file content.

mod common;

use anyhow::Result;
use serial_test::serial;
use strata_config::{Loader, StrataConfig, StrataError, decode_json};

use common::EnvGuard;

#[derive(Debug, Default, PartialEq, StrataConfig)]
struct CacheConfig {
    #[strata(default = "mem", desc = "cache backend")]
    backend: String,
    #[strata(default = "1024", desc = "entry limit")]
    capacity: u64,
}

#[test]
fn file_content_bypasses_discovery() -> Result<()> {
    let mut config = CacheConfig::default();
    Loader::new()
        .env_prefix("RAW_")
        .args(["app"])
        .load_with_file_content(&mut config, b"backend: disk\n")?;

    assert_eq!(config.backend, "disk");
    assert_eq!(config.capacity, 1024);
    Ok(())
}

#[test]
#[serial]
fn environment_still_layers_over_file_content() -> Result<()> {
    let _env = EnvGuard::set("LAYER_CAPACITY", "4096");

    let mut config = CacheConfig::default();
    Loader::new()
        .env_prefix("LAYER_")
        .args(["app"])
        .load_with_file_content(&mut config, b"capacity: 2048\n")?;

    assert_eq!(config.capacity, 4096);
    Ok(())
}

#[test]
fn flags_still_layer_over_file_content() -> Result<()> {
    let mut config = CacheConfig::default();
    Loader::new()
        .env_prefix("FLAGC_")
        .args(["app", "--backend=redis"])
        .load_with_file_content(&mut config, b"backend: disk\n")?;

    assert_eq!(config.backend, "redis");
    Ok(())
}

#[test]
#[serial]
fn load_file_content_skips_environment_and_flags() -> Result<()> {
    let _env = EnvGuard::set("ONLY_CAPACITY", "4096");

    let mut config = CacheConfig::default();
    Loader::new()
        .env_prefix("ONLY_")
        // Deliberately hostile argv: it must never be parsed.
        .args(["app", "--no-such-flag"])
        .load_file_content(&mut config, b"capacity: 2048\n")?;

    assert_eq!(config.capacity, 2048);
    assert_eq!(config.backend, "mem");
    Ok(())
}

#[test]
fn content_honours_the_configured_decoder() -> Result<()> {
    let mut config = CacheConfig::default();
    Loader::new()
        .env_prefix("DEC_")
        .args(["app"])
        .decoder(decode_json)
        .load_with_file_content(&mut config, b"{\"backend\": \"disk\"}")?;

    assert_eq!(config.backend, "disk");
    Ok(())
}

#[test]
fn undecodable_content_is_a_decode_error() {
    let mut config = CacheConfig::default();
    let err = Loader::new()
        .env_prefix("BADC_")
        .args(["app"])
        .decoder(decode_json)
        .load_with_file_content(&mut config, b"backend: disk\n")
        .unwrap_err();
    assert!(matches!(err, StrataError::Decode { path: None, .. }), "got {err:?}");
}

#[test]
#[should_panic(expected = "requires the file source")]
fn file_content_with_the_file_source_disabled_panics() {
    let mut config = CacheConfig::default();
    let _ = Loader::new()
        .disable_file()
        .args(["app"])
        .load_with_file_content(&mut config, b"backend: disk\n");
}

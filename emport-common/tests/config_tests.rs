//! Integration tests for configuration loading and graceful degradation
//!
//! Covers:
//! - Missing TOML file falls back to compiled defaults
//! - Malformed TOML file is reported as a configuration error
//! - Config path resolution priority (explicit → ENV → per-user default)
//!
//! Tests that manipulate EMPORT_CONFIG are marked with #[serial] so they do
//! not race each other.

use emport_common::config::{resolve_config_path, LoggingConfig, TomlConfig, CONFIG_ENV_VAR};
use emport_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_full_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("emport-svc.toml");

    std::fs::write(
        &path,
        r#"
bind_address = "0.0.0.0"
port = 6001
seed_file = "/var/lib/emport/seed.json"
export_indent = 0
max_import_bytes = 1048576

[logging]
level = "emport_svc=trace"
file = "/var/log/emport.log"
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.listen_address(), "0.0.0.0:6001");
    assert_eq!(config.seed_file, Some(PathBuf::from("/var/lib/emport/seed.json")));
    assert_eq!(config.export_indent, 0);
    assert_eq!(config.max_import_bytes, 1_048_576);
    assert_eq!(
        config.logging,
        LoggingConfig {
            level: "emport_svc=trace".to_string(),
            file: Some(PathBuf::from("/var/log/emport.log")),
        }
    );
}

#[test]
fn test_malformed_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "port = [1, 2").unwrap();

    match TomlConfig::load(&path) {
        Err(Error::Config(msg)) => assert!(msg.contains("Parse TOML failed")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_env_var_overrides_default_path() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/emport-env.toml");
    let path = resolve_config_path(None, "emport-svc");
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(path, PathBuf::from("/tmp/emport-env.toml"));
}

#[test]
#[serial]
fn test_explicit_path_beats_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/emport-env.toml");
    let path = resolve_config_path(Some(std::path::Path::new("/tmp/cli.toml")), "emport-svc");
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(path, PathBuf::from("/tmp/cli.toml"));
}

#[test]
#[serial]
fn test_default_path_uses_module_name() {
    env::remove_var(CONFIG_ENV_VAR);
    let path = resolve_config_path(None, "emport-svc");

    assert!(path.ends_with("emport-svc.toml"));
}

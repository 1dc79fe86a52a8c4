//! Configuration loading and graceful degradation
//!
//! Tests that touch CLENS_CONFIG are marked #[serial] so they do not race on
//! the process environment.

use clens_common::config::{load_config, load_toml_config, resolve_config_path, CONFIG_ENV_VAR};
use clens_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_full_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        [logging]
        level = "debug"

        [perception]
        baseline_threshold = 0.3
        fallback_threshold = 0.15
        min_detections = 4
        deadline_ms = 1500

        [reasoning]
        endpoint = "http://localhost:9000/protocol"
        timeout_ms = 5000
        "#,
    );

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.perception.baseline_threshold, 0.3);
    assert_eq!(config.perception.min_detections, 4);
    assert_eq!(config.perception.sweep_limit, 3, "unset fields keep defaults");
    assert_eq!(
        config.reasoning.endpoint.as_deref(),
        Some("http://localhost:9000/protocol")
    );
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let config = load_config(Some(&missing)).unwrap();
    assert_eq!(config, Default::default());
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[perception\ndeadline_ms = ");

    assert!(matches!(load_config(Some(&path)), Err(Error::Toml(_))));
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        [perception]
        baseline_threshold = 1.5
        "#,
    );

    assert!(matches!(load_config(Some(&path)), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_env_var_used_without_cli_arg() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[perception]\ndeadline_ms = 900\n");
    env::set_var(CONFIG_ENV_VAR, &path);

    assert_eq!(resolve_config_path(None), Some(path.clone()));
    let config = load_config(None).unwrap();
    assert_eq!(config.perception.deadline_ms, 900);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    let dir = TempDir::new().unwrap();
    let env_path = write_config(&dir, "[perception]\ndeadline_ms = 900\n");
    let cli_path = dir.path().join("cli.toml");
    fs::write(&cli_path, "[perception]\ndeadline_ms = 1200\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &env_path);

    let config = load_config(Some(&cli_path)).unwrap();
    assert_eq!(config.perception.deadline_ms, 1200);

    env::remove_var(CONFIG_ENV_VAR);
}

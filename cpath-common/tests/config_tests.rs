//! Tests for configuration loading and root folder resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate CPATH_ROOT_FOLDER are marked with #[serial].

use cpath_common::config::{
    load_toml_config, resolve_root_folder, RootFolderInitializer, TomlConfig,
    DEFAULT_BIND_ADDR, DEFAULT_BUCKET_WIDTH_YEARS, ROOT_FOLDER_ENV,
};
use cpath_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = TomlConfig::default();

    assert_eq!(config.root_folder, None);
    assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    assert_eq!(config.bucket_width_years, DEFAULT_BUCKET_WIDTH_YEARS);
    assert!(!config.allow_delete);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let config = load_toml_config(&path).expect("Missing file should not be an error");
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_partial_config_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "allow_delete = true\nbucket_width_years = 10\n").unwrap();

    let config = load_toml_config(&path).unwrap();

    assert!(config.allow_delete);
    assert_eq!(config.bucket_width_years, 10);
    assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_full_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/srv/cpath"
bind_addr = "0.0.0.0:8080"
bucket_width_years = 2
allow_delete = false

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/cpath")));
    assert_eq!(config.bind_addr, "0.0.0.0:8080");
    assert_eq!(config.bucket_width_years, 2);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_malformed_config_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "bucket_width_years = \"five\"").unwrap();

    let result = load_toml_config(&path);
    assert!(matches!(result, Err(Error::ConfigParse { .. })));
}

#[test]
fn test_zero_bucket_width_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "bucket_width_years = 0").unwrap();

    let result = load_toml_config(&path);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_cli_arg_has_highest_priority() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/cpath-from-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/cpath-from-toml")),
        ..TomlConfig::default()
    };

    let root = resolve_root_folder(Some(Path::new("/tmp/cpath-from-cli")), ROOT_FOLDER_ENV, &config);
    assert_eq!(root, PathBuf::from("/tmp/cpath-from-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_var_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/cpath-from-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/cpath-from-toml")),
        ..TomlConfig::default()
    };

    let root = resolve_root_folder(None, ROOT_FOLDER_ENV, &config);
    assert_eq!(root, PathBuf::from("/tmp/cpath-from-env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_used_without_cli_or_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/cpath-from-toml")),
        ..TomlConfig::default()
    };

    let root = resolve_root_folder(None, ROOT_FOLDER_ENV, &config);
    assert_eq!(root, PathBuf::from("/tmp/cpath-from-toml"));
}

#[test]
#[serial]
fn test_falls_back_to_platform_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root = resolve_root_folder(None, ROOT_FOLDER_ENV, &TomlConfig::default());
    assert_eq!(root, cpath_common::config::default_root_folder());
    assert!(!root.as_os_str().is_empty());
}

#[test]
fn test_initializer_creates_directory_and_paths() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("nested").join("root");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("cpath.db"));
    assert_eq!(initializer.submissions_log_path(), root.join("submissions.log"));

    // Second call is a no-op
    initializer.ensure_directory_exists().unwrap();
}

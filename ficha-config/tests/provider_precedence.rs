//! Precedence tests for the figment-backed provider

use ficha_config::{ConfigError, ConfigProvider, FileDiscovery};
use serial_test::serial;
use tempfile::TempDir;

fn provider_for(project: &TempDir, global: &TempDir) -> ConfigProvider {
    ConfigProvider::with_discovery(FileDiscovery::with_dirs(
        Some(project.path().to_path_buf()),
        Some(global.path().to_path_buf()),
    ))
}

#[test]
#[serial]
fn test_defaults_without_files() {
    let project = TempDir::new().unwrap();
    let global = TempDir::new().unwrap();

    let config = provider_for(&project, &global).load().unwrap();

    assert_eq!(config.comments.max_level, 7);
    assert_eq!(config.storage.bucket, "card-attachments");
    assert_eq!(config.tasks.fallback_name, "Usuário");
}

#[test]
#[serial]
fn test_project_overrides_global() {
    let project = TempDir::new().unwrap();
    let global = TempDir::new().unwrap();
    std::fs::write(
        global.path().join("ficha.toml"),
        "[comments]\nmax_level = 4\n\n[identity]\ncache_ttl_secs = 90\n",
    )
    .unwrap();
    std::fs::write(
        project.path().join("ficha.yaml"),
        "comments:\n  max_level: 5\n",
    )
    .unwrap();

    let config = provider_for(&project, &global).load().unwrap();

    assert_eq!(config.comments.max_level, 5);
    assert_eq!(config.identity.cache_ttl_secs, 90);
    // Untouched sections keep their defaults
    assert_eq!(config.comments.thread_message_limit, 7);
}

#[test]
#[serial]
fn test_env_overrides_files() {
    let project = TempDir::new().unwrap();
    let global = TempDir::new().unwrap();
    std::fs::write(
        project.path().join("ficha.json"),
        r#"{"storage": {"bucket": "from-file"}}"#,
    )
    .unwrap();

    std::env::set_var("FICHA_STORAGE__BUCKET", "from-env");
    let result = provider_for(&project, &global).load();
    std::env::remove_var("FICHA_STORAGE__BUCKET");

    assert_eq!(result.unwrap().storage.bucket, "from-env");
}

#[test]
#[serial]
fn test_invalid_values_rejected() {
    let project = TempDir::new().unwrap();
    let global = TempDir::new().unwrap();
    std::fs::write(
        project.path().join("ficha.toml"),
        "[comments]\nthread_message_limit = 3\nthread_warning_threshold = 3\n",
    )
    .unwrap();

    let result = provider_for(&project, &global).load();

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

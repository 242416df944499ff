use gridwatch_api::{AppError, Config};
use serial_test::serial;
use std::path::PathBuf;

const OVERRIDES: &[&str] = &[
    "GRIDWATCH_PROM_URL",
    "GRIDWATCH_USERNAME",
    "GRIDWATCH_PASSWORD",
    "GRIDWATCH_HOST",
    "GRIDWATCH_PORT",
    "GRIDWATCH_ESTIMATED_DNC",
    "GRIDWATCH_DNC",
];

fn clear_overrides() {
    for name in OVERRIDES {
        std::env::remove_var(name);
    }
}

fn write_config(name: &str, yaml: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "gridwatch-{}-{}.yaml",
        name,
        std::process::id()
    ));
    std::fs::write(&path, yaml).unwrap();
    path
}

#[test]
#[serial]
fn test_load_shipped_config() {
    clear_overrides();

    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/config.yaml");
    let config = Config::load(path).unwrap();

    assert_eq!(config.prometheus.url, "http://localhost:9090");
    assert_eq!(config.api.port, 1323);
    assert_eq!(config.capacity.scale_factor(), 25.0);
    assert_eq!(config.stream.interval_secs, 60);
    assert_eq!(config.metrics.purpose, "solar");
}

#[test]
#[serial]
fn test_load_expands_placeholders() {
    clear_overrides();
    std::env::set_var("GRIDWATCH_IT_PROM_PASSWORD", "s3cret");

    let path = write_config(
        "placeholders",
        "prometheus:\n  url: \"http://prom:9090\"\n  username: reader\n  password: \"${GRIDWATCH_IT_PROM_PASSWORD}\"\n",
    );
    let config = Config::load(&path).unwrap();

    assert_eq!(config.prometheus.username.as_deref(), Some("reader"));
    assert_eq!(config.prometheus.password.as_deref(), Some("s3cret"));

    std::env::remove_var("GRIDWATCH_IT_PROM_PASSWORD");
    std::fs::remove_file(path).ok();
}

#[test]
#[serial]
fn test_env_overrides_win_over_file() {
    clear_overrides();
    std::env::set_var("GRIDWATCH_PROM_URL", "http://override:9090");
    std::env::set_var("GRIDWATCH_PORT", "8080");
    std::env::set_var("GRIDWATCH_ESTIMATED_DNC", "1000");
    std::env::set_var("GRIDWATCH_DNC", "50");

    let path = write_config(
        "overrides",
        "prometheus:\n  url: \"http://file:9090\"\napi:\n  port: 1323\n",
    );
    let config = Config::load(&path);
    clear_overrides();
    std::fs::remove_file(path).ok();

    let config = config.unwrap();
    assert_eq!(config.prometheus.url, "http://override:9090");
    assert_eq!(config.api.port, 8080);
    assert_eq!(config.capacity.estimated_kw, 1000.0);
    assert_eq!(config.capacity.scale_factor(), 20.0);
}

#[test]
#[serial]
fn test_rejects_zero_monitored_capacity() {
    clear_overrides();

    let path = write_config(
        "zero-capacity",
        "prometheus: {}\ncapacity:\n  monitored_kw: 0\n",
    );
    let result = Config::load(&path);
    std::fs::remove_file(path).ok();

    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
#[serial]
fn test_rejects_unparseable_override() {
    clear_overrides();
    std::env::set_var("GRIDWATCH_DNC", "lots");

    let path = write_config("bad-override", "prometheus: {}\n");
    let result = Config::load(&path);
    clear_overrides();
    std::fs::remove_file(path).ok();

    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
#[serial]
fn test_missing_file_is_io_error() {
    clear_overrides();

    let result = Config::load("/nonexistent/gridwatch.yaml");
    assert!(matches!(result, Err(AppError::Io(_))));
}

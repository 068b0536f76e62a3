// Integration tests for loading supervisor configuration files

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use vigil::config::SupervisorConfig;
use vigil::error::VigilError;

fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn load_full_toml_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "api.toml",
        r#"
name = "dashboard-api"
command = "/bin/sh"
args = ["-c", "exec python app.py"]
backoff_secs = 5
max_restarts = 999
log_path = "/tmp/vigil/dashboard-api.log"
stop_signal = "SIGINT"
stop_timeout_secs = 15

[env]
FLASK_APP = "app.py"
PORT = "5000"

[probe]
url = "http://localhost:5000/api/health"
timeout_secs = 3
"#,
    );

    let config = SupervisorConfig::from_file(&path).unwrap();
    assert_eq!(config.name, "dashboard-api");
    assert_eq!(config.command, PathBuf::from("/bin/sh"));
    assert_eq!(config.backoff_secs, 5);
    assert_eq!(config.max_restarts, Some(999));
    assert_eq!(
        config.log_path,
        Some(PathBuf::from("/tmp/vigil/dashboard-api.log"))
    );
    assert_eq!(config.stop_signal, "SIGINT");
    assert_eq!(config.stop_timeout_secs, 15);
    assert_eq!(config.env.get("PORT"), Some(&"5000".to_string()));

    let probe = config.probe.unwrap();
    assert_eq!(probe.url, "http://localhost:5000/api/health");
    assert_eq!(probe.timeout_secs, 3);
}

#[test]
fn load_minimal_json_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "api.json",
        r#"{"name": "api", "command": "/bin/true"}"#,
    );

    let config = SupervisorConfig::from_file(&path).unwrap();
    assert_eq!(config.name, "api");
    // Defaults: 5s backoff, unbounded retries, no probe
    assert_eq!(config.backoff_secs, 5);
    assert_eq!(config.max_restarts, None);
    assert!(config.probe.is_none());
    assert!(config.log_path.is_none());
}

#[test]
fn reject_missing_required_fields() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "bad.toml", r#"name = "api""#);

    assert!(matches!(
        SupervisorConfig::from_file(&path),
        Err(VigilError::InvalidConfig(_))
    ));
}

#[test]
fn reject_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "bad.toml", "name = [unterminated");

    assert!(matches!(
        SupervisorConfig::from_file(&path),
        Err(VigilError::InvalidConfig(_))
    ));
}

#[test]
fn reject_invalid_probe_section() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "api.toml",
        r#"
name = "api"
command = "/bin/true"

[probe]
url = "not-a-url"
"#,
    );

    assert!(matches!(
        SupervisorConfig::from_file(&path),
        Err(VigilError::ConfigValidationError(_))
    ));
}

#[test]
fn missing_file_is_a_config_error() {
    assert!(matches!(
        SupervisorConfig::from_file(&PathBuf::from("/nonexistent/vigil.toml")),
        Err(VigilError::ConfigError(_))
    ));
}

use crate::error::{Result, VigilError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Health endpoint settings used by the probe and wait commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Health endpoint URL (e.g. http://localhost:5000/api/health)
    pub url: String,

    /// Request timeout (in seconds)
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

impl ProbeConfig {
    /// Get probe timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Supervisor configuration with all settings for running a process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Service name (used in logs and error messages)
    pub name: String,

    /// Path to the executable to run
    pub command: PathBuf,

    /// Command-line arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the process
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Delay between an observed exit and the next spawn (in seconds)
    #[serde(default = "default_backoff")]
    pub backoff_secs: u64,

    /// Maximum number of restarts; None means retry forever
    #[serde(default)]
    pub max_restarts: Option<u64>,

    /// Append-only lifecycle event log path
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Signal to send on stop (default: SIGTERM)
    #[serde(default = "default_stop_signal")]
    pub stop_signal: String,

    /// Timeout before force kill (in seconds)
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,

    /// Health endpoint settings (optional)
    #[serde(default)]
    pub probe: Option<ProbeConfig>,
}

// Default value functions for serde
fn default_backoff() -> u64 {
    5
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_stop_signal() -> String {
    "SIGTERM".to_string()
}

fn default_stop_timeout() -> u64 {
    10
}

impl SupervisorConfig {
    /// Create a configuration with defaults for everything but the command
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            backoff_secs: default_backoff(),
            max_restarts: None,
            log_path: None,
            stop_signal: default_stop_signal(),
            stop_timeout_secs: default_stop_timeout(),
            probe: None,
        }
    }

    /// Load a supervisor configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<SupervisorConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| VigilError::ConfigError(format!("Failed to read config file: {}", e)))?;

        // Determine format based on file extension
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut config: SupervisorConfig = match extension {
            "toml" => toml::from_str(&contents)
                .map_err(|e| VigilError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| VigilError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(VigilError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.expand_env_vars();
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(VigilError::MissingConfigField("name".to_string()));
        }

        if self.command.as_os_str().is_empty() {
            return Err(VigilError::MissingConfigField("command".to_string()));
        }

        if let Some(0) = self.max_restarts {
            return Err(VigilError::ConfigValidationError(
                "max_restarts must be at least 1 when set".to_string(),
            ));
        }

        // Validate stop_signal
        let valid_signals = [
            "SIGTERM", "SIGINT", "SIGQUIT", "SIGKILL", "SIGHUP", "SIGUSR1", "SIGUSR2",
        ];
        if !valid_signals.contains(&self.stop_signal.as_str()) {
            return Err(VigilError::ConfigValidationError(format!(
                "Invalid stop_signal: {}. Must be one of: {}",
                self.stop_signal,
                valid_signals.join(", ")
            )));
        }

        // Validate working directory exists if specified
        if let Some(ref cwd) = self.cwd {
            if !cwd.exists() {
                return Err(VigilError::ConfigValidationError(format!(
                    "Working directory does not exist: {}",
                    cwd.display()
                )));
            }
            if !cwd.is_dir() {
                return Err(VigilError::ConfigValidationError(format!(
                    "Working directory is not a directory: {}",
                    cwd.display()
                )));
            }
        }

        if let Some(ref probe) = self.probe {
            if probe.url.is_empty() {
                return Err(VigilError::MissingConfigField("probe.url".to_string()));
            }
            if !probe.url.starts_with("http://") && !probe.url.starts_with("https://") {
                return Err(VigilError::ConfigValidationError(format!(
                    "Probe URL must be http(s): {}",
                    probe.url
                )));
            }
            if probe.timeout_secs == 0 {
                return Err(VigilError::ConfigValidationError(
                    "probe.timeout_secs must be at least 1".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Expand environment variables in configuration fields
    fn expand_env_vars(&mut self) {
        self.command = Self::expand_env_in_path(&self.command);

        if let Some(ref cwd) = self.cwd {
            self.cwd = Some(Self::expand_env_in_path(cwd));
        }

        if let Some(ref log_path) = self.log_path {
            self.log_path = Some(Self::expand_env_in_path(log_path));
        }

        self.args = self
            .args
            .iter()
            .map(|arg| Self::expand_env_in_string(arg))
            .collect();

        // Expand in environment variables (values only)
        self.env = self
            .env
            .iter()
            .map(|(k, v)| (k.clone(), Self::expand_env_in_string(v)))
            .collect();
    }

    /// Expand environment variables in a string
    ///
    /// Handles $VAR and ${VAR} syntax
    fn expand_env_in_string(s: &str) -> String {
        let mut result = s.to_string();

        for (key, value) in std::env::vars() {
            result = result.replace(&format!("${{{}}}", key), &value);
            result = result.replace(&format!("${}", key), &value);
        }

        result
    }

    /// Expand environment variables in a path
    fn expand_env_in_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = Self::expand_env_in_string(&path_str);
        PathBuf::from(expanded)
    }

    /// Get restart backoff as Duration
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    /// Get stop timeout as Duration
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_supervisor_config_defaults() {
        let config = SupervisorConfig::new("api", "/bin/echo");

        assert_eq!(config.backoff_secs, 5);
        assert_eq!(config.max_restarts, None);
        assert_eq!(config.stop_signal, "SIGTERM");
        assert_eq!(config.stop_timeout_secs, 10);
        assert!(config.probe.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = SupervisorConfig::new("api", "/bin/echo");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_name() {
        let config = SupervisorConfig::new("", "/bin/echo");
        assert!(matches!(
            config.validate(),
            Err(VigilError::MissingConfigField(_))
        ));
    }

    #[test]
    fn test_validate_empty_command() {
        let config = SupervisorConfig::new("api", "");
        assert!(matches!(
            config.validate(),
            Err(VigilError::MissingConfigField(_))
        ));
    }

    #[test]
    fn test_validate_zero_max_restarts() {
        let mut config = SupervisorConfig::new("api", "/bin/echo");
        config.max_restarts = Some(0);
        assert!(matches!(
            config.validate(),
            Err(VigilError::ConfigValidationError(_))
        ));
    }

    #[test]
    fn test_validate_invalid_stop_signal() {
        let mut config = SupervisorConfig::new("api", "/bin/echo");
        config.stop_signal = "SIGFOO".to_string();
        assert!(matches!(
            config.validate(),
            Err(VigilError::ConfigValidationError(_))
        ));
    }

    #[test]
    fn test_validate_nonexistent_cwd() {
        let mut config = SupervisorConfig::new("api", "/bin/echo");
        config.cwd = Some(PathBuf::from("/nonexistent/directory"));
        assert!(matches!(
            config.validate(),
            Err(VigilError::ConfigValidationError(_))
        ));
    }

    #[test]
    fn test_validate_probe_url() {
        let mut config = SupervisorConfig::new("api", "/bin/echo");
        config.probe = Some(ProbeConfig {
            url: "localhost:5000/health".to_string(),
            timeout_secs: 5,
        });
        assert!(matches!(
            config.validate(),
            Err(VigilError::ConfigValidationError(_))
        ));

        config.probe = Some(ProbeConfig {
            url: "http://localhost:5000/health".to_string(),
            timeout_secs: 5,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("service.toml");
        fs::write(
            &config_path,
            r#"
name = "api"
command = "/bin/echo"
args = ["hello"]
backoff_secs = 3
max_restarts = 10

[probe]
url = "http://localhost:5000/api/health"
"#,
        )
        .unwrap();

        let config = SupervisorConfig::from_file(&config_path).unwrap();
        assert_eq!(config.name, "api");
        assert_eq!(config.command, PathBuf::from("/bin/echo"));
        assert_eq!(config.args, vec!["hello".to_string()]);
        assert_eq!(config.backoff_secs, 3);
        assert_eq!(config.max_restarts, Some(10));

        let probe = config.probe.unwrap();
        assert_eq!(probe.url, "http://localhost:5000/api/health");
        assert_eq!(probe.timeout_secs, 5);
    }

    #[test]
    fn test_from_file_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("service.json");
        fs::write(
            &config_path,
            r#"{"name": "api", "command": "/bin/echo"}"#,
        )
        .unwrap();

        let config = SupervisorConfig::from_file(&config_path).unwrap();
        assert_eq!(config.name, "api");
        assert_eq!(config.backoff_secs, 5);
        assert_eq!(config.max_restarts, None);
    }

    #[test]
    fn test_from_file_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("service.yaml");
        fs::write(&config_path, "name: api").unwrap();

        assert!(matches!(
            SupervisorConfig::from_file(&config_path),
            Err(VigilError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("VIGIL_TEST_DIR", "/tmp");

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("service.toml");
        fs::write(
            &config_path,
            r#"
name = "api"
command = "/bin/echo"
args = ["${VIGIL_TEST_DIR}/data"]
"#,
        )
        .unwrap();

        let config = SupervisorConfig::from_file(&config_path).unwrap();
        assert_eq!(config.args, vec!["/tmp/data".to_string()]);
    }

    #[test]
    fn test_backoff_duration() {
        let mut config = SupervisorConfig::new("api", "/bin/echo");
        config.backoff_secs = 7;
        assert_eq!(config.backoff(), Duration::from_secs(7));
    }
}

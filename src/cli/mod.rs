// CLI module - User-facing command-line interface

mod output;

use crate::config::{ProbeConfig, SupervisorConfig};
use crate::error::{Result, VigilError};
use crate::probe::LivenessProbe;
use crate::supervisor::Supervisor;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

/// Vigil - keep a single local service running
#[derive(Parser)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the supervisor in the foreground (Ctrl-C to stop)
    Run {
        /// Path to a TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Executable to supervise (when no config file is given)
        command: Option<PathBuf>,

        /// Name for the service (defaults to the executable name)
        #[arg(short, long)]
        name: Option<String>,

        /// Working directory for the process
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Environment variables (KEY=VALUE format)
        #[arg(short, long)]
        env: Vec<String>,

        /// Seconds to wait between an exit and the next start
        #[arg(short, long)]
        backoff: Option<u64>,

        /// Maximum number of restarts (default: unbounded)
        #[arg(long)]
        max_restarts: Option<u64>,

        /// Append-only lifecycle event log path
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Arguments to pass to the executable
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Check a health endpoint once
    Probe {
        /// Health endpoint URL (defaults to the config file's probe.url)
        url: Option<String>,

        /// Path to a configuration file carrying a [probe] section
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Request timeout in seconds
        #[arg(short, long, default_value_t = 5)]
        timeout: u64,
    },

    /// Poll a health endpoint until it responds or attempts run out
    Wait {
        /// Health endpoint URL (defaults to the config file's probe.url)
        url: Option<String>,

        /// Path to a configuration file carrying a [probe] section
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Request timeout in seconds
        #[arg(short, long, default_value_t = 5)]
        timeout: u64,

        /// Maximum number of probe attempts
        #[arg(short, long, default_value_t = 10)]
        attempts: u32,

        /// Seconds between attempts
        #[arg(short, long, default_value_t = 1)]
        interval: u64,
    },
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute().await
    }

    async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                config,
                command,
                name,
                cwd,
                env,
                backoff,
                max_restarts,
                log,
                args,
            } => {
                let config = build_run_config(
                    config,
                    command,
                    name,
                    cwd,
                    env,
                    backoff,
                    max_restarts,
                    log,
                    args,
                )?;
                run_supervisor(config).await
            }

            Commands::Probe {
                url,
                config,
                timeout,
            } => {
                let (url, timeout) = resolve_probe_target(url, config, timeout)?;
                let probe = LivenessProbe::new()?;
                let result = probe.check(&url, timeout).await;
                output::print_probe_result(&result);
                if !result.is_reachable() {
                    std::process::exit(1);
                }
                Ok(())
            }

            Commands::Wait {
                url,
                config,
                timeout,
                attempts,
                interval,
            } => {
                let (url, timeout) = resolve_probe_target(url, config, timeout)?;
                let probe = LivenessProbe::new()?;
                let result = probe
                    .wait_ready(&url, timeout, attempts, Duration::from_secs(interval))
                    .await;
                output::print_wait_result(&result, attempts);
                if !result.is_reachable() {
                    std::process::exit(1);
                }
                Ok(())
            }
        }
    }
}

/// Build the supervisor configuration from a file and/or command-line flags
///
/// Flags override file values so a config file can be tried with a shorter
/// backoff or a capped restart count without editing it.
#[allow(clippy::too_many_arguments)]
fn build_run_config(
    config_path: Option<PathBuf>,
    command: Option<PathBuf>,
    name: Option<String>,
    cwd: Option<PathBuf>,
    env: Vec<String>,
    backoff: Option<u64>,
    max_restarts: Option<u64>,
    log: Option<PathBuf>,
    args: Vec<String>,
) -> Result<SupervisorConfig> {
    let mut config = match (config_path, command) {
        (Some(path), _) => SupervisorConfig::from_file(&path)?,
        (None, Some(command)) => {
            let name = name.clone().unwrap_or_else(|| {
                command
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| "service".to_string())
            });
            SupervisorConfig::new(name, command)
        }
        (None, None) => {
            return Err(VigilError::ConfigError(
                "Either a config file (--config) or a command is required".to_string(),
            ))
        }
    };

    if let Some(name) = name {
        config.name = name;
    }
    if !args.is_empty() {
        config.args = args;
    }
    if cwd.is_some() {
        config.cwd = cwd;
    }
    for entry in env {
        let (key, value) = parse_env_var(&entry)?;
        config.env.insert(key, value);
    }
    if let Some(backoff) = backoff {
        config.backoff_secs = backoff;
    }
    if max_restarts.is_some() {
        config.max_restarts = max_restarts;
    }
    if log.is_some() {
        config.log_path = log;
    }

    config.validate()?;
    Ok(config)
}

/// Start the supervisor and wire Ctrl-C into its shutdown channel
async fn run_supervisor(config: SupervisorConfig) -> Result<()> {
    let name = config.name.clone();
    let mut supervisor = Supervisor::new(config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let report = supervisor.run(shutdown_rx).await?;
    output::print_run_summary(&name, &report);
    Ok(())
}

/// Resolve the probe URL and timeout from a flag or a config file
fn resolve_probe_target(
    url: Option<String>,
    config_path: Option<PathBuf>,
    timeout_secs: u64,
) -> Result<(String, Duration)> {
    match (url, config_path) {
        (Some(url), _) => Ok((url, Duration::from_secs(timeout_secs))),
        (None, Some(path)) => {
            let config = SupervisorConfig::from_file(&path)?;
            let ProbeConfig { url, timeout_secs } = config.probe.ok_or_else(|| {
                VigilError::ConfigError(format!(
                    "Config file {} has no [probe] section",
                    path.display()
                ))
            })?;
            Ok((url, Duration::from_secs(timeout_secs)))
        }
        (None, None) => Err(VigilError::ConfigError(
            "Either a URL or a config file (--config) is required".to_string(),
        )),
    }
}

/// Parse a KEY=VALUE environment variable argument
fn parse_env_var(entry: &str) -> Result<(String, String)> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(VigilError::ConfigError(format!(
            "Invalid environment variable (expected KEY=VALUE): {}",
            entry
        ))),
    }
}

pub use output::print_error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_var() {
        assert_eq!(
            parse_env_var("PORT=5000").unwrap(),
            ("PORT".to_string(), "5000".to_string())
        );
        assert_eq!(
            parse_env_var("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
        assert!(parse_env_var("NOEQUALS").is_err());
        assert!(parse_env_var("=value").is_err());
    }

    #[test]
    fn test_build_run_config_from_command() {
        let config = build_run_config(
            None,
            Some(PathBuf::from("/bin/echo")),
            None,
            None,
            vec!["PORT=5000".to_string()],
            Some(2),
            Some(3),
            None,
            vec!["hello".to_string()],
        )
        .unwrap();

        assert_eq!(config.name, "echo");
        assert_eq!(config.args, vec!["hello".to_string()]);
        assert_eq!(config.env.get("PORT"), Some(&"5000".to_string()));
        assert_eq!(config.backoff_secs, 2);
        assert_eq!(config.max_restarts, Some(3));
    }

    #[test]
    fn test_build_run_config_requires_source() {
        let result = build_run_config(
            None, None, None, None, vec![], None, None, None, vec![],
        );
        assert!(matches!(result, Err(VigilError::ConfigError(_))));
    }

    #[test]
    fn test_resolve_probe_target_requires_source() {
        assert!(resolve_probe_target(None, None, 5).is_err());

        let (url, timeout) =
            resolve_probe_target(Some("http://localhost:5000/health".to_string()), None, 3)
                .unwrap();
        assert_eq!(url, "http://localhost:5000/health");
        assert_eq!(timeout, Duration::from_secs(3));
    }
}

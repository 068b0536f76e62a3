use crate::config::SupervisorConfig;
use crate::error::{Result, VigilError};
use std::fs::OpenOptions;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Metadata returned when spawning a process
#[derive(Debug)]
pub struct SpawnedProcess {
    /// The child process handle
    pub child: Child,

    /// Process ID assigned by the OS
    pub pid: u32,

    /// Process name from configuration
    pub name: String,
}

/// Spawn the supervised process based on the provided configuration
///
/// This builds a tokio::process::Command from the configuration, applying
/// the working directory, environment variables, and arguments. When a log
/// path is configured, the child's stdout and stderr are redirected to
/// sibling `<name>-out.log` / `<name>-err.log` files opened in append mode;
/// otherwise the child inherits the supervisor's stdio.
pub async fn spawn_process(config: &SupervisorConfig) -> Result<SpawnedProcess> {
    if !config.command.exists() {
        return Err(VigilError::SpawnError(format!(
            "Command does not exist: {}",
            config.command.display()
        )));
    }

    let mut command = Command::new(&config.command);

    if !config.args.is_empty() {
        command.args(&config.args);
    }

    if let Some(ref cwd) = config.cwd {
        command.current_dir(cwd);
    }

    if !config.env.is_empty() {
        for (key, value) in &config.env {
            command.env(key, value);
        }
    }

    match config.log_path {
        Some(ref log_path) => {
            let (stdout, stderr) = open_output_logs(log_path, &config.name)?;
            command.stdout(stdout);
            command.stderr(stderr);
        }
        None => {
            command.stdout(Stdio::inherit());
            command.stderr(Stdio::inherit());
        }
    }

    let child = command.spawn().map_err(|e| {
        VigilError::SpawnError(format!("Failed to spawn process '{}': {}", config.name, e))
    })?;

    let pid = child.id().ok_or_else(|| {
        VigilError::SpawnError(format!("Failed to get PID for process '{}'", config.name))
    })?;

    Ok(SpawnedProcess {
        child,
        pid,
        name: config.name.clone(),
    })
}

/// Open append-mode output files for the child next to the event log
fn open_output_logs(log_path: &Path, name: &str) -> Result<(Stdio, Stdio)> {
    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .map_err(|e| VigilError::LogError(format!("Failed to create log directory: {}", e)))?;

    let open = |path: &Path| -> Result<Stdio> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| VigilError::LogFileError(format!("Failed to open output log: {}", e)))?;
        Ok(Stdio::from(file))
    };

    let stdout = open(&dir.join(format!("{}-out.log", name)))?;
    let stderr = open(&dir.join(format!("{}-err.log", name)))?;
    Ok((stdout, stderr))
}

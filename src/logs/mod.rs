use crate::error::{Result, VigilError};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tokio::fs::File as TokioFile;
use tokio::io::AsyncWriteExt;

/// A lifecycle event recorded by the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Supervisor started for the named service
    SupervisorStarted { name: String },
    /// Child process spawned successfully
    Spawned { name: String, pid: u32 },
    /// Child process could not be started
    SpawnFailed { name: String, reason: String },
    /// Child process exited (any reason)
    Exited { name: String, status: String },
    /// A restart is pending after the backoff delay
    RestartPending { name: String, backoff_secs: u64 },
    /// Supervisor stopped cooperatively
    SupervisorStopped { name: String, restarts: u64 },
}

impl LifecycleEvent {
    pub fn exited(name: &str, status: ExitStatus) -> Self {
        LifecycleEvent::Exited {
            name: name.to_string(),
            status: format!("{}", status),
        }
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::SupervisorStarted { name } => {
                write!(f, "supervisor started for '{}'", name)
            }
            LifecycleEvent::Spawned { name, pid } => {
                write!(f, "spawned '{}' (pid {})", name, pid)
            }
            LifecycleEvent::SpawnFailed { name, reason } => {
                write!(f, "failed to spawn '{}': {}", name, reason)
            }
            LifecycleEvent::Exited { name, status } => {
                write!(f, "'{}' exited: {}", name, status)
            }
            LifecycleEvent::RestartPending { name, backoff_secs } => {
                write!(f, "restart of '{}' pending in {}s", name, backoff_secs)
            }
            LifecycleEvent::SupervisorStopped { name, restarts } => {
                write!(
                    f,
                    "supervisor stopped for '{}' ({} restarts)",
                    name, restarts
                )
            }
        }
    }
}

/// EventLog writes timestamped lifecycle events for a supervised process
/// to an append-only log file
pub struct EventLog {
    /// Path to the event log file
    path: PathBuf,
    /// Async file handle, opened in append mode
    file: TokioFile,
}

impl EventLog {
    /// Open (or create) the event log at the given path
    ///
    /// Parent directories are created if missing; the file is always
    /// opened in append mode so prior runs are preserved.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    VigilError::LogError(format!("Failed to create log directory: {}", e))
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| VigilError::LogFileError(format!("Failed to open event log: {}", e)))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: TokioFile::from_std(file),
        })
    }

    /// Append a single lifecycle event with a timestamp
    pub async fn record(&mut self, event: &LifecycleEvent) -> Result<()> {
        let timestamp = Local::now();
        let entry = Self::format_entry(&timestamp, event);

        self.file
            .write_all(entry.as_bytes())
            .await
            .map_err(|e| VigilError::LogError(format!("Failed to write event log: {}", e)))?;

        // Flush so the line is visible to external tailers immediately
        self.file
            .flush()
            .await
            .map_err(|e| VigilError::LogError(format!("Failed to flush event log: {}", e)))?;

        Ok(())
    }

    /// Format a log entry: [YYYY-MM-DD HH:MM:SS.mmm] <event>
    fn format_entry(timestamp: &DateTime<Local>, event: &LifecycleEvent) -> String {
        format!(
            "[{}] {}\n",
            timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            event
        )
    }

    /// Get the path to the event log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

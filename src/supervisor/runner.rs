use crate::config::SupervisorConfig;
use crate::error::{Result, VigilError};
use crate::logs::{EventLog, LifecycleEvent};
use crate::supervisor::restart::{RestartPolicy, RestartTracker};
use crate::supervisor::spawner::spawn_process;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::Child;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Lifecycle state of the supervised process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Starting,
    Running,
    PendingRestart,
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorState::Starting => write!(f, "starting"),
            SupervisorState::Running => write!(f, "running"),
            SupervisorState::PendingRestart => write!(f, "pending-restart"),
        }
    }
}

/// Summary returned when the supervisor loop ends cooperatively
#[derive(Debug, Clone)]
pub struct SupervisorReport {
    /// Total restarts observed over the supervisor's lifetime
    pub restarts: u64,
    /// Last observed child exit status, if any
    pub last_exit: Option<String>,
}

/// Supervisor that keeps a single child process alive
///
/// The loop spawns the configured command, blocks until it exits, records
/// the exit, sleeps the fixed backoff, and spawns again. A crash is not an
/// error of the supervisor; it is the trigger for the next iteration. The
/// loop only ends through the shutdown channel or the optional restart cap.
pub struct Supervisor {
    config: SupervisorConfig,
    policy: RestartPolicy,
    tracker: RestartTracker,
    state: SupervisorState,
    event_log: Option<EventLog>,
}

impl Supervisor {
    /// Create a new supervisor for the given configuration
    pub fn new(config: SupervisorConfig) -> Self {
        let policy = RestartPolicy::from_config(config.max_restarts, config.backoff_secs);
        Self {
            config,
            policy,
            tracker: RestartTracker::new(),
            state: SupervisorState::Starting,
            event_log: None,
        }
    }

    /// Current lifecycle state of the supervised process
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Total restarts recorded so far
    pub fn restart_count(&self) -> u64 {
        self.tracker.restart_count()
    }

    /// Run the supervise loop
    ///
    /// At most one child is alive at a time: a new spawn only happens after
    /// the previous child's exit has been observed. The shutdown channel is
    /// honored at every iteration boundary (before spawn, while waiting on
    /// the child, and during backoff).
    ///
    /// # Returns
    /// * `Ok(SupervisorReport)` - Loop ended through the shutdown channel
    /// * `Err(VigilError::RestartLimitExceeded)` - Configured cap reached
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<SupervisorReport> {
        if let Some(path) = self.config.log_path.clone() {
            self.event_log = Some(EventLog::open(&path).await?);
        }

        info!(
            "Starting supervisor for '{}' (backoff: {}s, max restarts: {})",
            self.config.name,
            self.config.backoff_secs,
            self.config
                .max_restarts
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        );
        self.record(LifecycleEvent::SupervisorStarted {
            name: self.config.name.clone(),
        })
        .await;

        let mut last_exit: Option<String> = None;
        let mut first_spawn = true;

        loop {
            if *shutdown.borrow() {
                break;
            }

            // The initial start is not a restart; every later spawn is
            if !first_spawn {
                if !self.policy.should_restart(&self.tracker) {
                    let count = self.tracker.restart_count();
                    warn!(
                        "Restart limit reached for '{}' after {} restarts, giving up",
                        self.config.name, count
                    );
                    self.record(LifecycleEvent::SupervisorStopped {
                        name: self.config.name.clone(),
                        restarts: count,
                    })
                    .await;
                    return Err(VigilError::RestartLimitExceeded(
                        self.config.name.clone(),
                        count,
                    ));
                }
                self.tracker.record_restart();
            }
            first_spawn = false;

            self.state = SupervisorState::Starting;
            match spawn_process(&self.config).await {
                Ok(mut spawned) => {
                    self.state = SupervisorState::Running;
                    info!(
                        "Process '{}' started (pid: {}, restarts so far: {})",
                        spawned.name,
                        spawned.pid,
                        self.tracker.restart_count()
                    );
                    self.record(LifecycleEvent::Spawned {
                        name: spawned.name.clone(),
                        pid: spawned.pid,
                    })
                    .await;

                    tokio::select! {
                        status = spawned.child.wait() => match status {
                            Ok(status) => {
                                info!(
                                    "Process '{}' exited with status: {}, restart pending",
                                    spawned.name, status
                                );
                                self.record(LifecycleEvent::exited(&spawned.name, status)).await;
                                last_exit = Some(format!("{}", status));
                            }
                            Err(e) => {
                                error!("Failed to wait on process '{}': {}", spawned.name, e);
                                self.record(LifecycleEvent::Exited {
                                    name: spawned.name.clone(),
                                    status: format!("wait failed: {}", e),
                                })
                                .await;
                            }
                        },
                        _ = wait_for_shutdown(&mut shutdown) => {
                            info!("Shutdown requested, stopping '{}'", spawned.name);
                            if let Err(e) = self.stop_child(&mut spawned.child, spawned.pid).await {
                                error!("Failed to stop '{}': {}", spawned.name, e);
                            }
                            break;
                        }
                    }
                }
                Err(e) => {
                    // Spawn failures are treated as transient and retried
                    warn!(
                        "Failed to spawn '{}': {}, retrying after backoff",
                        self.config.name, e
                    );
                    self.record(LifecycleEvent::SpawnFailed {
                        name: self.config.name.clone(),
                        reason: e.to_string(),
                    })
                    .await;
                }
            }

            self.state = SupervisorState::PendingRestart;
            self.record(LifecycleEvent::RestartPending {
                name: self.config.name.clone(),
                backoff_secs: self.config.backoff_secs,
            })
            .await;

            tokio::select! {
                _ = sleep(self.policy.backoff()) => {}
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        let restarts = self.tracker.restart_count();
        info!(
            "Supervisor for '{}' stopped ({} restarts)",
            self.config.name, restarts
        );
        self.record(LifecycleEvent::SupervisorStopped {
            name: self.config.name.clone(),
            restarts,
        })
        .await;

        Ok(SupervisorReport {
            restarts,
            last_exit,
        })
    }

    /// Stop the child gracefully: stop signal, bounded wait, then SIGKILL
    async fn stop_child(&self, child: &mut Child, pid: u32) -> Result<()> {
        let nix_pid = Pid::from_raw(pid as i32);
        let stop_signal = parse_signal(&self.config.stop_signal)?;
        let name = &self.config.name;

        info!(
            "Gracefully stopping process '{}' (pid: {}) with {}",
            name, pid, self.config.stop_signal
        );
        signal::kill(nix_pid, stop_signal).map_err(|e| {
            VigilError::StopError(
                name.clone(),
                format!("Failed to send {}: {}", self.config.stop_signal, e),
            )
        })?;

        let timeout = self.config.stop_timeout();
        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                info!("Process '{}' exited gracefully with status: {}", name, status);
            }
            Ok(Err(e)) => {
                return Err(VigilError::StopError(
                    name.clone(),
                    format!("Wait failed: {}", e),
                ));
            }
            Err(_) => {
                warn!(
                    "Process '{}' did not exit within {:?}, sending SIGKILL",
                    name, timeout
                );
                signal::kill(nix_pid, Signal::SIGKILL).map_err(|e| {
                    VigilError::StopError(
                        name.clone(),
                        format!("Failed to send SIGKILL after timeout: {}", e),
                    )
                })?;
                let _ = child.wait().await;
            }
        }

        Ok(())
    }

    /// Record a lifecycle event, downgrading log failures to warnings
    async fn record(&mut self, event: LifecycleEvent) {
        if let Some(ref mut log) = self.event_log {
            if let Err(e) = log.record(&event).await {
                warn!("Failed to record lifecycle event: {}", e);
            }
        }
    }
}

/// Resolve once the shutdown channel carries `true`
///
/// A dropped sender means no shutdown can ever arrive, so the future stays
/// pending and the loop runs until externally terminated.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn parse_signal(signal_name: &str) -> Result<Signal> {
    match signal_name {
        "SIGTERM" => Ok(Signal::SIGTERM),
        "SIGINT" => Ok(Signal::SIGINT),
        "SIGQUIT" => Ok(Signal::SIGQUIT),
        "SIGKILL" => Ok(Signal::SIGKILL),
        "SIGHUP" => Ok(Signal::SIGHUP),
        "SIGUSR1" => Ok(Signal::SIGUSR1),
        "SIGUSR2" => Ok(Signal::SIGUSR2),
        _ => Err(VigilError::SignalError(format!(
            "Invalid signal name: {}",
            signal_name
        ))),
    }
}

mod restart;
mod runner;
mod spawner;

pub use restart::{RestartPolicy, RestartTracker};
pub use runner::{Supervisor, SupervisorReport, SupervisorState};
pub use spawner::{spawn_process, SpawnedProcess};

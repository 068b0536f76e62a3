use std::time::{Duration, SystemTime};

/// Restart policy for a supervised process
///
/// The backoff is fixed (no exponential growth): the supervised workload is
/// a single always-on local service and the policy favors availability.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    /// Maximum number of restarts; None means retry forever
    pub max_restarts: Option<u64>,
    /// Fixed delay between an observed exit and the next spawn (in seconds)
    pub backoff_secs: u64,
}

impl RestartPolicy {
    /// Create a restart policy from configuration values
    pub fn from_config(max_restarts: Option<u64>, backoff_secs: u64) -> Self {
        Self {
            max_restarts,
            backoff_secs,
        }
    }

    /// Check if another restart may be attempted
    pub fn should_restart(&self, tracker: &RestartTracker) -> bool {
        match self.max_restarts {
            Some(max) => tracker.restart_count() < max,
            None => true,
        }
    }

    /// The delay before the next restart attempt
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: None,
            backoff_secs: 5,
        }
    }
}

/// Tracks restart history for a supervised process
///
/// The counter is monotonic: it is never reset while the supervisor lives.
#[derive(Debug, Clone, Default)]
pub struct RestartTracker {
    count: u64,
    last_restart: Option<SystemTime>,
}

impl RestartTracker {
    /// Create a new restart tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a restart attempt
    pub fn record_restart(&mut self) {
        self.count += 1;
        self.last_restart = Some(SystemTime::now());
    }

    /// Get the total number of restarts
    pub fn restart_count(&self) -> u64 {
        self.count
    }

    /// Get the time of the last restart, if any
    pub fn last_restart_time(&self) -> Option<SystemTime> {
        self.last_restart
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_default_is_unbounded() {
        let policy = RestartPolicy::default();
        let mut tracker = RestartTracker::new();

        for _ in 0..1000 {
            assert!(policy.should_restart(&tracker));
            tracker.record_restart();
        }
        assert_eq!(tracker.restart_count(), 1000);
    }

    #[test]
    fn test_policy_respects_cap() {
        let policy = RestartPolicy::from_config(Some(3), 5);
        let mut tracker = RestartTracker::new();

        assert!(policy.should_restart(&tracker));
        tracker.record_restart();
        assert!(policy.should_restart(&tracker));
        tracker.record_restart();
        assert!(policy.should_restart(&tracker));
        tracker.record_restart();
        // Cap reached
        assert!(!policy.should_restart(&tracker));
    }

    #[test]
    fn test_backoff_is_fixed() {
        let policy = RestartPolicy::from_config(None, 5);
        let mut tracker = RestartTracker::new();

        assert_eq!(policy.backoff(), Duration::from_secs(5));
        tracker.record_restart();
        tracker.record_restart();
        // No growth with restart count
        assert_eq!(policy.backoff(), Duration::from_secs(5));
    }

    #[test]
    fn test_tracker_counts_monotonically() {
        let mut tracker = RestartTracker::new();
        assert_eq!(tracker.restart_count(), 0);
        assert!(tracker.last_restart_time().is_none());

        tracker.record_restart();
        assert_eq!(tracker.restart_count(), 1);
        assert!(tracker.last_restart_time().is_some());

        tracker.record_restart();
        assert_eq!(tracker.restart_count(), 2);
    }
}

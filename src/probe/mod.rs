use crate::error::{Result, VigilError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of a single liveness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The endpoint answered with a success status within the timeout
    Reachable,
    /// No timely success response (connection refused, timeout, or error status)
    Unreachable(String),
}

/// Result of one probe call
///
/// Created fresh per call and immutable; callers that want to poll simply
/// probe again.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Target URL that was probed
    pub url: String,
    /// Timeout the request was bounded by
    pub timeout: Duration,
    /// Observed status
    pub status: ProbeStatus,
    /// Time the probe took to resolve
    pub latency: Duration,
}

impl ProbeResult {
    /// Whether the endpoint was reachable
    pub fn is_reachable(&self) -> bool {
        self.status == ProbeStatus::Reachable
    }
}

/// Liveness probe for a health endpoint
///
/// Issues a single bounded-timeout GET and reports reachable only on a
/// success (2xx) response. The probe carries no retry logic of its own;
/// [`LivenessProbe::wait_ready`] is the polling convenience for callers
/// that want one.
pub struct LivenessProbe {
    client: reqwest::Client,
}

impl LivenessProbe {
    /// Create a probe with a default HTTP client
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| VigilError::ProbeError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Issue one bounded-timeout GET against the health endpoint
    ///
    /// Never hangs: the request is bounded by `timeout`, and every failure
    /// mode (refused, timed out, non-success status) is reported as
    /// unreachable rather than an error.
    pub async fn check(&self, url: &str, timeout: Duration) -> ProbeResult {
        let started = Instant::now();

        let status = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) if response.status().is_success() => ProbeStatus::Reachable,
            Ok(response) => {
                ProbeStatus::Unreachable(format!("status {}", response.status().as_u16()))
            }
            Err(e) if e.is_timeout() => {
                ProbeStatus::Unreachable(format!("timed out after {:?}", timeout))
            }
            Err(e) => ProbeStatus::Unreachable(format!("request failed: {}", e)),
        };

        let latency = started.elapsed();
        debug!("Probe of {} took {:?}: {:?}", url, latency, status);

        ProbeResult {
            url: url.to_string(),
            timeout,
            status,
            latency,
        }
    }

    /// Poll the endpoint until it is reachable or attempts run out
    ///
    /// Returns the last probe result either way; callers inspect
    /// `is_reachable()` to decide. `interval` is slept between attempts,
    /// not after the final one.
    pub async fn wait_ready(
        &self,
        url: &str,
        timeout: Duration,
        attempts: u32,
        interval: Duration,
    ) -> ProbeResult {
        let mut last = self.check(url, timeout).await;

        for attempt in 1..attempts {
            if last.is_reachable() {
                return last;
            }
            debug!(
                "Endpoint {} not ready (attempt {}/{}), retrying in {:?}",
                url, attempt, attempts, interval
            );
            tokio::time::sleep(interval).await;
            last = self.check(url, timeout).await;
        }

        last
    }
}

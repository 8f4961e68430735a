//! Bounded capability polling.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use mine_analyzer_core::BridgeSettings;

/// Terminal outcome of a readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Every capability became available
    Ready(BTreeMap<String, bool>),
    /// Attempts ran out
    Unavailable(String),
}

/// Polls a capability check a bounded number of times.
///
/// Waits `grace` first, checks once, then retries up to `attempts` times at
/// `interval` spacing. Never loops forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessProbe {
    /// Delay before the first check
    pub grace: Duration,
    /// Retries after the first check
    pub attempts: u32,
    /// Delay between retries
    pub interval: Duration,
}

impl ReadinessProbe {
    /// Create a probe.
    pub fn new(grace: Duration, attempts: u32, interval: Duration) -> Self {
        Self {
            grace,
            attempts,
            interval,
        }
    }

    /// Probe configured from bridge settings.
    pub fn from_settings(settings: &BridgeSettings) -> Self {
        Self::new(
            Duration::from_millis(settings.readiness_grace_ms),
            settings.readiness_attempts,
            Duration::from_millis(settings.readiness_interval_ms),
        )
    }

    /// Run the probe against a status check.
    pub async fn run<F>(&self, check: F) -> ProbeOutcome
    where
        F: Fn() -> BTreeMap<String, bool>,
    {
        tokio::time::sleep(self.grace).await;

        let all_present = |status: &BTreeMap<String, bool>| status.values().all(|ready| *ready);

        let status = check();
        if all_present(&status) {
            return ProbeOutcome::Ready(status);
        }

        for attempt in 1..=self.attempts {
            tokio::time::sleep(self.interval).await;
            let status = check();
            debug!(attempt, attempts = self.attempts, ?status, "readiness check");
            if all_present(&status) {
                return ProbeOutcome::Ready(status);
            }
        }

        ProbeOutcome::Unavailable("Timeout waiting for solver components".to_string())
    }
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self::from_settings(&BridgeSettings::default())
    }
}

//! Shared solver readiness.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use mine_analyzer_core::{Error, Result};

/// Where the solver realm stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReadinessState {
    /// Nothing heard yet
    Pending,
    /// Every capability is present
    Ready {
        /// Capability status by name
        components: BTreeMap<String, bool>,
    },
    /// The solver realm gave up, or the caller stopped waiting
    Unavailable {
        /// Why
        reason: String,
    },
}

impl ReadinessState {
    /// Whether a terminal outcome has been reached.
    pub fn is_settled(&self) -> bool {
        !matches!(self, ReadinessState::Pending)
    }
}

/// Readiness flag owned jointly by the controller and the bridge.
///
/// The first terminal outcome sticks: once ready or unavailable, later
/// signals are ignored.
#[derive(Debug, Clone)]
pub struct Readiness {
    state: Arc<watch::Sender<ReadinessState>>,
}

impl Readiness {
    /// Create a pending readiness object.
    pub fn new() -> Self {
        let (state, _) = watch::channel(ReadinessState::Pending);
        Self {
            state: Arc::new(state),
        }
    }

    /// Current state.
    pub fn state(&self) -> ReadinessState {
        self.state.borrow().clone()
    }

    /// Whether calls may be made.
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), ReadinessState::Ready { .. })
    }

    /// Record the ready event. Returns false if already settled.
    pub fn mark_ready(&self, components: BTreeMap<String, bool>) -> bool {
        let changed = self.settle(ReadinessState::Ready { components });
        if changed {
            info!("solver ready");
        }
        changed
    }

    /// Record a readiness failure. Returns false if already settled.
    pub fn mark_unavailable(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let changed = self.settle(ReadinessState::Unavailable {
            reason: reason.clone(),
        });
        if changed {
            warn!(%reason, "solver unavailable");
        }
        changed
    }

    fn settle(&self, next: ReadinessState) -> bool {
        self.state.send_if_modified(|current| {
            if current.is_settled() {
                return false;
            }
            *current = next;
            true
        })
    }

    /// Wait until the state settles.
    ///
    /// # Errors
    ///
    /// [`Error::SolverUnavailable`] if the realm reported failure or nothing
    /// arrived within `timeout`; in the latter case the state is also
    /// settled as unavailable.
    pub async fn wait(&self, timeout: Duration) -> Result<()> {
        let mut receiver = self.state.subscribe();
        let settled = tokio::time::timeout(timeout, async {
            receiver
                .wait_for(ReadinessState::is_settled)
                .await
                .map(|state| state.clone())
        })
        .await;

        match settled {
            Ok(Ok(ReadinessState::Ready { .. })) => Ok(()),
            Ok(Ok(ReadinessState::Unavailable { reason })) => Err(Error::SolverUnavailable(reason)),
            Ok(Ok(ReadinessState::Pending)) | Ok(Err(_)) => {
                Err(Error::SolverUnavailable("readiness channel closed".to_string()))
            }
            Err(_) => {
                let reason = format!("no ready signal within {}ms", timeout.as_millis());
                self.mark_unavailable(reason.clone());
                match self.state() {
                    ReadinessState::Ready { .. } => Ok(()),
                    _ => Err(Error::SolverUnavailable(reason)),
                }
            }
        }
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components() -> BTreeMap<String, bool> {
        BTreeMap::from([("engine".to_string(), true)])
    }

    #[test]
    fn test_first_outcome_sticks() {
        let readiness = Readiness::new();
        assert_eq!(readiness.state(), ReadinessState::Pending);

        assert!(readiness.mark_ready(components()));
        assert!(!readiness.mark_unavailable("late failure"));
        assert!(readiness.is_ready());
    }

    #[tokio::test]
    async fn test_wait_resolves_on_ready() {
        let readiness = Readiness::new();
        let shared = readiness.clone();
        tokio::spawn(async move {
            shared.mark_ready(components());
        });
        readiness.wait(Duration::from_secs(5)).await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_reports_failure() {
        let readiness = Readiness::new();
        readiness.mark_unavailable("Timeout waiting for solver components");
        let err = readiness.wait(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, Error::SolverUnavailable(reason) if reason.contains("Timeout")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let readiness = Readiness::new();
        let err = readiness.wait(Duration::from_secs(30)).await.unwrap_err();
        assert!(matches!(err, Error::SolverUnavailable(_)));
        assert!(matches!(
            readiness.state(),
            ReadinessState::Unavailable { .. }
        ));
    }
}

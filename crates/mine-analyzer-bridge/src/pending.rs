//! Pending-calls table keyed by correlation id.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::trace;

use mine_analyzer_core::AnalysisResult;

use crate::correlation::CorrelationId;

/// Outstanding solve calls awaiting a response.
///
/// Resolution is first-wins: the entry is removed when the first response
/// arrives, so any later response for the same id is a no-op.
#[derive(Debug, Default)]
pub struct PendingCalls {
    calls: Mutex<HashMap<CorrelationId, oneshot::Sender<AnalysisResult>>>,
}

impl PendingCalls {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CorrelationId, oneshot::Sender<AnalysisResult>>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a call and get the receiver its response will arrive on.
    pub fn register(&self, id: CorrelationId) -> oneshot::Receiver<AnalysisResult> {
        let (sender, receiver) = oneshot::channel();
        self.lock().insert(id, sender);
        receiver
    }

    /// Deliver a response. Returns false if the id is unknown or already
    /// resolved (or timed out).
    pub fn resolve(&self, id: &CorrelationId, result: AnalysisResult) -> bool {
        let Some(sender) = self.lock().remove(id) else {
            trace!(correlation_id = %id, "response for unknown or settled call");
            return false;
        };
        sender.send(result).is_ok()
    }

    /// Forget a call without resolving it.
    pub fn cancel(&self, id: &CorrelationId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Number of unresolved calls.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no call is outstanding.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

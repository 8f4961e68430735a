//! Caller side of the solver bridge.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use mine_analyzer_core::{
    AnalysisResult, BoardSnapshot, BridgeSettings, Error, Result, SolveOptions,
};

use crate::channel::MessageChannel;
use crate::correlation::CorrelationId;
use crate::message::BridgeMessage;
use crate::pending::PendingCalls;
use crate::readiness::Readiness;
use crate::sanitize::SanitizedSnapshot;

/// Sends solve requests across the realm boundary.
///
/// A dispatcher task reads the shared channel, validates every message,
/// routes `SOLVE_RESULT`s to the pending-calls table and turns
/// `SOLVER_READY`/`SOLVER_ERROR` into [`Readiness`] updates. Everything else
/// is ignored.
///
/// [`SolverBridge::solve`] never returns an error: failures of any kind
/// become an [`AnalysisResult`] with `success = false`.
#[derive(Debug)]
pub struct SolverBridge {
    channel: MessageChannel,
    pending: Arc<PendingCalls>,
    readiness: Readiness,
    settings: BridgeSettings,
    dispatcher: JoinHandle<()>,
}

impl SolverBridge {
    /// Create a bridge and start listening on the channel.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(channel: MessageChannel, readiness: Readiness, settings: BridgeSettings) -> Self {
        let pending = Arc::new(PendingCalls::new());
        let dispatcher = tokio::spawn(dispatch(
            channel.subscribe(),
            pending.clone(),
            readiness.clone(),
        ));

        Self {
            channel,
            pending,
            readiness,
            settings,
            dispatcher,
        }
    }

    /// Shared readiness object.
    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// Configured solve timeout.
    pub fn solve_timeout(&self) -> Duration {
        self.settings.solve_timeout()
    }

    /// Wait for the solver realm to signal readiness.
    pub async fn wait_ready(&self) -> Result<()> {
        self.readiness.wait(self.settings.readiness_wait()).await
    }

    /// Number of calls still waiting for a response.
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    /// Solve a snapshot, waiting at most `timeout` for the response.
    pub async fn solve(
        &self,
        snapshot: &BoardSnapshot,
        options: &SolveOptions,
        timeout: Duration,
    ) -> AnalysisResult {
        if !self.readiness.is_ready() {
            let error = Error::SolverUnavailable("solver has not signalled readiness".to_string());
            return AnalysisResult::failure(error.to_string());
        }

        let correlation_id = CorrelationId::generate();
        let request = encode_request(&correlation_id, snapshot, options);
        let receiver = self.pending.register(correlation_id.clone());

        if let Err(e) = self.channel.post(request) {
            self.pending.cancel(&correlation_id);
            return AnalysisResult::failure(e.to_string());
        }
        debug!(correlation_id = %correlation_id, "solve call posted");

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(result)) => {
                debug!(correlation_id = %correlation_id, success = result.success, "solve result received");
                result.normalized()
            }
            Ok(Err(_)) => AnalysisResult::failure(Error::ChannelClosed.to_string()),
            Err(_) => {
                self.pending.cancel(&correlation_id);
                warn!(
                    correlation_id = %correlation_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "solve call timed out"
                );
                AnalysisResult::timeout()
            }
        }
    }
}

impl Drop for SolverBridge {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

/// Serialize a request, degrading to a dimensions-only payload if the full
/// snapshot cannot be encoded.
fn encode_request(
    correlation_id: &CorrelationId,
    snapshot: &BoardSnapshot,
    options: &SolveOptions,
) -> Value {
    let message = |snapshot| BridgeMessage::SolveCall {
        correlation_id: correlation_id.clone(),
        snapshot,
        options: options.clone(),
    };

    message(SanitizedSnapshot::from_snapshot(snapshot))
        .to_value()
        .or_else(|e| {
            warn!(correlation_id = %correlation_id, error = %e, "sanitization failed, sending dimensions only");
            message(SanitizedSnapshot::dimensions_only(snapshot)).to_value()
        })
        .unwrap_or_else(|_| {
            serde_json::json!({
                "type": "SOLVE_CALL",
                "correlationId": correlation_id,
                "snapshot": {
                    "width": snapshot.width(),
                    "height": snapshot.height(),
                    "cells": [],
                },
            })
        })
}

async fn dispatch(
    mut receiver: tokio::sync::broadcast::Receiver<Value>,
    pending: Arc<PendingCalls>,
    readiness: Readiness,
) {
    loop {
        let value = match receiver.recv().await {
            Ok(value) => value,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "bridge lagged behind the channel");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match BridgeMessage::parse(&value) {
            Ok(BridgeMessage::SolveResult {
                correlation_id,
                result,
            }) => {
                if !pending.resolve(&correlation_id, result) {
                    trace!(correlation_id = %correlation_id, "late or foreign response dropped");
                }
            }
            Ok(BridgeMessage::SolverReady { components }) => {
                readiness.mark_ready(components);
            }
            Ok(BridgeMessage::SolverError { error }) => {
                readiness.mark_unavailable(error);
            }
            Ok(BridgeMessage::SolveCall { .. }) => {}
            Err(e) => trace!(error = %e, "ignoring channel message"),
        }
    }
}

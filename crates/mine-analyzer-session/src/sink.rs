//! Result sink contract.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use mine_analyzer_core::AnalysisResult;

/// Fire-and-forget notification sent to the rest of the extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SinkMessage {
    /// A successful analysis was rendered
    AnalysisComplete {
        /// The rendered result
        result: AnalysisResult,
    },
}

/// Receives notifications; no response is expected.
pub trait ResultSink: Send + Sync {
    /// Deliver a notification. Must not block.
    fn notify(&self, message: SinkMessage);
}

/// Sink forwarding notifications into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<SinkMessage>,
}

impl ChannelSink {
    /// Create a sink and the receiver its notifications arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SinkMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ResultSink for ChannelSink {
    fn notify(&self, message: SinkMessage) {
        if self.sender.send(message).is_err() {
            debug!("result sink receiver dropped");
        }
    }
}

/// Sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ResultSink for LogSink {
    fn notify(&self, message: SinkMessage) {
        match message {
            SinkMessage::AnalysisComplete { result } => info!(
                safe_moves = result.safe_moves.len(),
                win_probability = ?result.win_probability,
                "analysis complete"
            ),
        }
    }
}

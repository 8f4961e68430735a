//! Broadcast message channel shared by both realms.

use serde_json::Value;
use tokio::sync::broadcast;

use mine_analyzer_core::{Error, Result};

const DEFAULT_CAPACITY: usize = 256;

/// A broadcast port carrying untyped JSON messages.
///
/// Every subscriber sees every message, including ones it posted itself and
/// ones from unrelated senders; receivers must validate what they read.
#[derive(Debug, Clone)]
pub struct MessageChannel {
    sender: broadcast::Sender<Value>,
}

impl MessageChannel {
    /// Create a channel with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a channel buffering up to `capacity` messages per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Post a message to every current subscriber.
    ///
    /// Fails with [`Error::ChannelClosed`] if nobody is listening.
    pub fn post(&self, message: Value) -> Result<usize> {
        self.sender.send(message).map_err(|_| Error::ChannelClosed)
    }

    /// Start receiving messages posted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Value> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MessageChannel {
    fn default() -> Self {
        Self::new()
    }
}

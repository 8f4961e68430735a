//! Quiet-window debouncing.

use std::time::Duration;

use tokio::time::Instant;

/// Coalesces bursts of events into one firing after a quiet window.
///
/// Every [`Debouncer::record`] pushes the deadline out by the window;
/// [`Debouncer::settled`] completes once the deadline passes with no new
/// events. `settled` is cancel safe, so it can sit in a `select!` loop next
/// to the event source.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
    pending: usize,
    bursts: u64,
}

impl Debouncer {
    /// Create a debouncer with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            pending: 0,
            bursts: 0,
        }
    }

    /// Quiet window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Note an event, restarting the quiet window.
    pub fn record(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
        self.pending += 1;
    }

    /// Whether a firing is scheduled.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Drop the scheduled firing, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending = 0;
    }

    /// Number of times the debouncer has fired.
    pub fn bursts(&self) -> u64 {
        self.bursts
    }

    /// Wait for the current burst to settle, returning how many events it
    /// coalesced. Never completes while nothing is scheduled.
    pub async fn settled(&mut self) -> usize {
        let Some(deadline) = self.deadline else {
            return std::future::pending().await;
        };
        tokio::time::sleep_until(deadline).await;

        self.deadline = None;
        self.bursts += 1;
        std::mem::take(&mut self.pending)
    }
}

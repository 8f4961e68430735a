//! Mutation observation over the host document.
//!
//! A [`Subscription`] delivers [`MutationRecord`]s for a watched subtree.
//! Its [`ObserverHandle`] can be cloned and handed to any component that
//! writes into the same tree; [`ObserverHandle::pause`] returns a guard that
//! suppresses delivery until it is dropped, so a writer never observes its
//! own changes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use mine_analyzer_core::NodeId;

/// Kind of change reported by a mutation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were added or removed
    ChildList,
    /// An attribute (including `class` and `style`) changed
    Attribute {
        /// Attribute name
        name: String,
    },
    /// Text content changed
    Text,
}

/// A single change in the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Node the change applies to
    pub target: NodeId,
    /// What changed
    pub kind: MutationKind,
}

/// Which mutations a subscription is interested in.
#[derive(Debug, Clone)]
pub struct ObserveOptions {
    /// Watch descendants as well as the root itself
    pub subtree: bool,
    /// Report child additions and removals
    pub child_list: bool,
    /// Report attribute changes
    pub attributes: bool,
    /// Restrict attribute reports to these names (`None` = all)
    pub attribute_filter: Option<Vec<String>>,
    /// Report text changes
    pub character_data: bool,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            subtree: true,
            child_list: true,
            attributes: true,
            attribute_filter: Some(vec!["class".to_string(), "style".to_string()]),
            character_data: false,
        }
    }
}

impl ObserveOptions {
    /// Whether a mutation kind passes these options.
    pub fn accepts(&self, kind: &MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::Text => self.character_data,
            MutationKind::Attribute { name } => {
                self.attributes
                    && self
                        .attribute_filter
                        .as_ref()
                        .map_or(true, |filter| filter.iter().any(|f| f == name))
            }
        }
    }
}

#[derive(Debug, Default)]
struct ObserverState {
    pause_depth: AtomicUsize,
    disconnected: AtomicBool,
}

/// Shared control handle for one subscription.
#[derive(Debug, Clone)]
pub struct ObserverHandle {
    state: Arc<ObserverState>,
}

impl ObserverHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(ObserverState::default()),
        }
    }

    /// Suspend delivery until the returned scope is dropped.
    ///
    /// Scopes nest; delivery resumes when the last one is dropped.
    pub fn pause(&self) -> PauseScope {
        self.state.pause_depth.fetch_add(1, Ordering::SeqCst);
        PauseScope {
            handle: self.clone(),
        }
    }

    /// Whether at least one pause scope is alive.
    pub fn is_paused(&self) -> bool {
        self.state.pause_depth.load(Ordering::SeqCst) > 0
    }

    /// Stop delivery permanently.
    pub fn disconnect(&self) {
        self.state.disconnected.store(true, Ordering::SeqCst);
    }

    /// Whether the subscription still receives records.
    pub fn is_connected(&self) -> bool {
        !self.state.disconnected.load(Ordering::SeqCst)
    }

    /// Whether a record produced now would be delivered.
    pub(crate) fn is_delivering(&self) -> bool {
        self.is_connected() && !self.is_paused()
    }
}

/// Guard returned by [`ObserverHandle::pause`].
#[derive(Debug)]
#[must_use = "observation resumes as soon as the scope is dropped"]
pub struct PauseScope {
    handle: ObserverHandle,
}

impl Drop for PauseScope {
    fn drop(&mut self) {
        self.handle.state.pause_depth.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Receiving end of a mutation subscription.
///
/// Dropping the subscription disconnects it.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<MutationRecord>,
    handle: ObserverHandle,
}

impl Subscription {
    pub(crate) fn new(
        receiver: mpsc::UnboundedReceiver<MutationRecord>,
        handle: ObserverHandle,
    ) -> Self {
        Self { receiver, handle }
    }

    /// Wait for the next record. Returns `None` once the document is gone.
    pub async fn recv(&mut self) -> Option<MutationRecord> {
        self.receiver.recv().await
    }

    /// Take a record if one is already queued.
    pub fn try_recv(&mut self) -> Option<MutationRecord> {
        self.receiver.try_recv().ok()
    }

    /// Discard every queued record, returning how many there were.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while self.receiver.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    /// Control handle for this subscription.
    pub fn handle(&self) -> ObserverHandle {
        self.handle.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.disconnect();
    }
}

/// Registration kept by the document for each live subscription.
#[derive(Debug)]
pub(crate) struct ObserverEntry {
    pub(crate) root: NodeId,
    pub(crate) options: ObserveOptions,
    pub(crate) sender: mpsc::UnboundedSender<MutationRecord>,
    pub(crate) handle: ObserverHandle,
}

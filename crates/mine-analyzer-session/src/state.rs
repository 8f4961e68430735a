//! Controller lifecycle states.

use std::fmt;

use serde::Serialize;

/// Where the analyzer controller is in its lifecycle.
///
/// `Idle → WaitingForBoard → WaitingForSolverReady → Ready ⇄ Analyzing`,
/// with `Disabled` reachable from anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum AnalyzerState {
    /// Not started
    #[default]
    Idle,
    /// Polling for a visible board
    WaitingForBoard,
    /// Board found; waiting for the solver realm
    WaitingForSolverReady,
    /// Ready to analyze
    Ready,
    /// A solve is in flight
    Analyzing,
    /// Permanently inactive
    Disabled {
        /// Why
        reason: String,
    },
}

impl AnalyzerState {
    /// Short camelCase name.
    pub fn name(&self) -> &'static str {
        match self {
            AnalyzerState::Idle => "idle",
            AnalyzerState::WaitingForBoard => "waitingForBoard",
            AnalyzerState::WaitingForSolverReady => "waitingForSolverReady",
            AnalyzerState::Ready => "ready",
            AnalyzerState::Analyzing => "analyzing",
            AnalyzerState::Disabled { .. } => "disabled",
        }
    }

    /// Whether analysis triggers are accepted (run now or coalesced).
    pub fn accepts_analysis(&self) -> bool {
        matches!(self, AnalyzerState::Ready | AnalyzerState::Analyzing)
    }

    /// Whether the controller is disabled.
    pub fn is_disabled(&self) -> bool {
        matches!(self, AnalyzerState::Disabled { .. })
    }
}

impl fmt::Display for AnalyzerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerState::Disabled { reason } => write!(f, "disabled: {reason}"),
            other => f.write_str(other.name()),
        }
    }
}

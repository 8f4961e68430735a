//! # mine-analyzer-bridge
//!
//! Cross-realm solver bridge for the minesweeper analyzer.
//!
//! The caller and the solving engine share nothing but a broadcast message
//! channel. This crate provides both ends of that conversation:
//!
//! - The message schema (`SOLVE_CALL`, `SOLVE_RESULT`, `SOLVER_READY`,
//!   `SOLVER_ERROR`) and snapshot sanitization
//! - Correlation ids and the pending-calls table
//! - A shared `Readiness` object and a bounded `ReadinessProbe`
//! - `SolverBridge`, the caller side with timeout semantics
//! - `SolverRealm`, the far side hosting a `SolvingEngine`
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends only on
//! mine-analyzer-core and knows nothing about the host document.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod bridge;
pub mod channel;
pub mod correlation;
pub mod message;
pub mod pending;
pub mod probe;
pub mod readiness;
pub mod realm;
pub mod sanitize;

// Re-export commonly used types
pub use adapter::{ActionKind, EngineAction, EngineBoard, EngineOutcome, EngineTile};
pub use bridge::SolverBridge;
pub use channel::MessageChannel;
pub use correlation::CorrelationId;
pub use message::BridgeMessage;
pub use pending::PendingCalls;
pub use probe::{ProbeOutcome, ReadinessProbe};
pub use readiness::{Readiness, ReadinessState};
pub use realm::{CapabilityRegistry, SolverRealm, SolvingEngine};
pub use sanitize::{SanitizedCell, SanitizedSnapshot};

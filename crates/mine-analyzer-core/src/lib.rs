//! # mine-analyzer-core
//!
//! Core types for the minesweeper board analyzer.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other mine-analyzer crates. It provides:
//!
//! - Cell and board snapshot types (`Cell`, `CellState`, `BoardSnapshot`)
//! - Solver request options and normalized analysis results
//! - User-facing settings with their defaults
//! - Host node identifiers
//! - Configuration and error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other mine-analyzer crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod board;
pub mod cell;
pub mod config;
pub mod error;
pub mod node;
pub mod options;
pub mod settings;

// Re-export commonly used types
pub use analysis::{cell_key, parse_cell_key, AnalysisResult, CellProbability};
pub use board::{BoardSnapshot, CaptureMode, Difficulty, MAX_BOARD_SIDE};
pub use cell::{Cell, CellState};
pub use config::{
    AnalyzerConfig, BridgeSettings, ChangeSettings, ExtractionSettings, OverlaySettings,
    ServerSettings,
};
pub use error::{Error, Result};
pub use node::NodeId;
pub use options::{PlayStyle, SolveOptions};
pub use settings::Settings;

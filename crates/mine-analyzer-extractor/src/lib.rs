//! # mine-analyzer-extractor
//!
//! Board snapshot extraction for the minesweeper analyzer.
//!
//! This crate provides:
//! - The `CellClassifier` contract and a class-name based default
//! - Cell location by element id pattern
//! - Difficulty, dimension and mine counter resolution
//! - Replay/live capture mode detection
//! - `BoardSnapshotExtractor`, which assembles a validated `BoardSnapshot`
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on mine-analyzer-core
//! and mine-analyzer-dom and only ever reads from the host document.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classifier;
pub mod counter;
pub mod difficulty;
pub mod extractor;
pub mod locator;
pub mod mode;

// Re-export commonly used types
pub use classifier::{CellClassifier, CellReading, ClassNameClassifier};
pub use counter::MineCounterReader;
pub use difficulty::DifficultyResolver;
pub use extractor::BoardSnapshotExtractor;
pub use locator::{CellLocator, IdPatternLocator};
pub use mode::detect_capture_mode;

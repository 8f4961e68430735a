//! # mine-analyzer-session
//!
//! Analyzer lifecycle for the minesweeper board analyzer.
//!
//! This crate provides:
//! - Change detection over snapshots and debouncing of mutation bursts
//! - The overlay renderer and its click-transparent annotation layer
//! - Settings provider and result sink contracts with in-memory versions
//! - `AnalyzerController`, the state machine that ties extraction, the
//!   solver bridge and rendering together, and its `AnalyzerHandle`
//!
//! ## Architecture
//!
//! This is Layer 3 in the architecture - it depends on mine-analyzer-core,
//! mine-analyzer-dom, mine-analyzer-extractor and mine-analyzer-bridge.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod change;
pub mod controller;
pub mod debounce;
pub mod overlay;
pub mod settings;
pub mod sink;
pub mod state;

// Re-export commonly used types
pub use change::ChangeDetector;
pub use controller::{AnalyzerController, AnalyzerHandle, StatusReport};
pub use debounce::Debouncer;
pub use overlay::{Highlight, HighlightKind, LabelKind, OverlayLabel, OverlayRenderer, OverlayView};
pub use settings::{load_settings, MemorySettings, SettingsProvider};
pub use sink::{ChannelSink, LogSink, ResultSink, SinkMessage};
pub use state::AnalyzerState;

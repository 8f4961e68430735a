//! # mine-analyzer-dom
//!
//! Host document abstraction for the minesweeper analyzer.
//!
//! This crate provides:
//! - The `HostDocument` contract the analyzer reads from and writes to
//! - A small selector language for locating elements
//! - `HostTree`, an in-memory element tree implementing the contract
//! - Mutation observation with scoped pausing
//! - A minesweeper page fixture for tests and simulation
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on mine-analyzer-core
//! and stands in for the live, externally controlled page.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod fixture;
pub mod observer;
pub mod selector;
pub mod tree;

// Re-export commonly used types
pub use document::{HostDocument, Rect};
pub use fixture::{MinesweeperPage, PageFixture};
pub use observer::{
    MutationKind, MutationRecord, ObserveOptions, ObserverHandle, PauseScope, Subscription,
};
pub use selector::Selector;
pub use tree::HostTree;

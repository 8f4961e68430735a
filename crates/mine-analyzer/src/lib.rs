//! Mine Analyzer MCP Server Library
//!
//! This library contains the MCP protocol layer, the reference solving
//! engine and the runtime wiring them to a simulated page.
//! The actual server binary is in main.rs.

pub mod engine;
pub mod protocol;
pub mod runtime;
pub mod tools;

// Re-export commonly used types
pub use engine::LocalEngine;
pub use protocol::MineAnalyzerServer;
pub use runtime::AnalyzerRuntime;
pub use tools::*;

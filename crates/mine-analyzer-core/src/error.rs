//! Error types for the minesweeper analyzer.

use thiserror::Error;

use crate::NodeId;

/// Main error type for analyzer operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No recognizable board container exists in the host document
    #[error("No board region found")]
    NoBoardRegion,

    /// Extraction located fewer cells than the board dimensions require
    #[error("Incomplete snapshot: {missing} of {expected} cells missing")]
    IncompleteSnapshot {
        /// Number of coordinates with no cell
        missing: usize,
        /// Number of cells the dimensions require
        expected: usize,
    },

    /// Board dimensions are zero or otherwise unusable
    #[error("Invalid board dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Board width in cells
        width: u16,
        /// Board height in cells
        height: u16,
    },

    /// A cell violates the snapshot invariants
    #[error("Invalid cell at ({x},{y}): {reason}")]
    InvalidCell {
        /// Column
        x: u16,
        /// Row
        y: u16,
        /// What is wrong with it
        reason: String,
    },

    /// The solver realm never signalled readiness
    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),

    /// No correlated response arrived in time
    #[error("Solve timed out after {0}ms")]
    SolveTimeout(u64),

    /// The solver realm reported a failure
    #[error("Solve failed: {0}")]
    SolveFailed(String),

    /// A message on the shared channel did not match the schema
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// The message channel has no remaining peers
    #[error("Message channel closed")]
    ChannelClosed,

    /// The controller task is no longer running
    #[error("Analyzer controller stopped")]
    ControllerStopped,

    /// Selector string could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Node does not exist (or was removed) in the host document
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The analyzer is disabled on this page
    #[error("Analyzer disabled: {0}")]
    Disabled(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input or parameters (generic)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the failure is transient and should simply be retried on the
    /// next trigger.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::IncompleteSnapshot { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_board_region_error() {
        assert_eq!(Error::NoBoardRegion.to_string(), "No board region found");
    }

    #[test]
    fn test_incomplete_snapshot_error() {
        let err = Error::IncompleteSnapshot {
            missing: 3,
            expected: 81,
        };
        assert_eq!(err.to_string(), "Incomplete snapshot: 3 of 81 cells missing");
        assert!(err.is_transient());
    }

    #[test]
    fn test_invalid_dimensions_error() {
        let err = Error::InvalidDimensions {
            width: 0,
            height: 9,
        };
        assert_eq!(err.to_string(), "Invalid board dimensions: 0x9");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_invalid_cell_error() {
        let err = Error::InvalidCell {
            x: 2,
            y: 5,
            reason: "value 9 out of range".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid cell at (2,5): value 9 out of range");
    }

    #[test]
    fn test_solver_errors() {
        assert_eq!(
            Error::SolverUnavailable("timeout".to_string()).to_string(),
            "Solver unavailable: timeout"
        );
        assert_eq!(
            Error::SolveTimeout(30000).to_string(),
            "Solve timed out after 30000ms"
        );
        assert_eq!(
            Error::SolveFailed("boom".to_string()).to_string(),
            "Solve failed: boom"
        );
    }

    #[test]
    fn test_node_not_found_error() {
        let err = Error::NodeNotFound(NodeId(7));
        assert_eq!(err.to_string(), "Node not found: node#7");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_error_debug() {
        let err = Error::InvalidInput("test".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("InvalidInput"));
    }
}

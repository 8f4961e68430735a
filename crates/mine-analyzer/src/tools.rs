//! MCP tool parameter and response types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Analyzer Tools
// =============================================================================

/// Parameters for tools that take no arguments
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoParams {}

/// Response for analyzer_toggle_probabilities
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleProbabilitiesResponse {
    /// New value of the showProbabilities setting
    pub show_probabilities: bool,
}

// =============================================================================
// Page Tools
// =============================================================================

/// Parameters for page_reveal
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RevealParams {
    /// Column, zero-based
    pub x: u16,

    /// Row, zero-based
    pub y: u16,

    /// Number of adjacent mines the opened cell shows (0-8)
    pub value: u8,
}

/// Parameters for page_flag
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FlagParams {
    /// Column, zero-based
    pub x: u16,

    /// Row, zero-based
    pub y: u16,

    /// Remove the flag instead of placing it
    #[serde(default)]
    pub remove: bool,
}

/// Response for page mutations
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PageChangeResponse {
    /// What was changed
    pub message: String,
}

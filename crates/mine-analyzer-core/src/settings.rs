//! User-facing display settings.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed view of the recognized settings keys.
///
/// Every key defaults to `true` when absent or not a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Run analysis automatically when the board changes
    pub auto_analyze: bool,
    /// Draw per-cell probability labels
    pub show_probabilities: bool,
    /// Highlight safe moves and the best guess
    pub highlight_moves: bool,
}

impl Settings {
    /// Key for [`Settings::auto_analyze`].
    pub const AUTO_ANALYZE: &'static str = "autoAnalyze";
    /// Key for [`Settings::show_probabilities`].
    pub const SHOW_PROBABILITIES: &'static str = "showProbabilities";
    /// Key for [`Settings::highlight_moves`].
    pub const HIGHLIGHT_MOVES: &'static str = "highlightMoves";

    /// All recognized keys.
    pub const KEYS: [&'static str; 3] = [
        Self::AUTO_ANALYZE,
        Self::SHOW_PROBABILITIES,
        Self::HIGHLIGHT_MOVES,
    ];

    /// Build from a provider's key/value mapping.
    pub fn from_values(values: &HashMap<String, Value>) -> Self {
        let flag = |key: &str| values.get(key).and_then(Value::as_bool).unwrap_or(true);
        Self {
            auto_analyze: flag(Self::AUTO_ANALYZE),
            show_probabilities: flag(Self::SHOW_PROBABILITIES),
            highlight_moves: flag(Self::HIGHLIGHT_MOVES),
        }
    }

    /// Convert into a key/value mapping for a provider.
    pub fn to_values(&self) -> HashMap<String, Value> {
        HashMap::from([
            (Self::AUTO_ANALYZE.to_string(), Value::Bool(self.auto_analyze)),
            (
                Self::SHOW_PROBABILITIES.to_string(),
                Value::Bool(self.show_probabilities),
            ),
            (
                Self::HIGHLIGHT_MOVES.to_string(),
                Value::Bool(self.highlight_moves),
            ),
        ])
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_analyze: true,
            show_probabilities: true,
            highlight_moves: true,
        }
    }
}

//! Normalized solver output.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Format the `"x,y"` key used by [`AnalysisResult::mine_probabilities`].
pub fn cell_key(x: u16, y: u16) -> String {
    format!("{x},{y}")
}

/// Parse an `"x,y"` key back into coordinates.
pub fn parse_cell_key(key: &str) -> Option<(u16, u16)> {
    let (x, y) = key.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// A coordinate together with a probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CellProbability {
    /// Column
    pub x: u16,
    /// Row
    pub y: u16,
    /// Probability in `[0, 1]`
    pub probability: f64,
}

impl CellProbability {
    /// Create a new entry.
    pub fn new(x: u16, y: u16, probability: f64) -> Self {
        Self { x, y, probability }
    }
}

/// Result of one analysis cycle.
///
/// When `success` is false every collection is empty and `error` is set;
/// use [`AnalysisResult::failure`] to build one and
/// [`AnalysisResult::normalized`] to enforce the rule on untrusted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Whether the solver produced an analysis
    pub success: bool,
    /// Cells that are certainly (or nearly) safe to open
    #[serde(default)]
    pub safe_moves: Vec<CellProbability>,
    /// Mine probability per hidden, unflagged cell, keyed `"x,y"`
    #[serde(default)]
    pub mine_probabilities: BTreeMap<String, f64>,
    /// Suggested guess when no safe move exists
    #[serde(default)]
    pub best_guess: Option<CellProbability>,
    /// Estimated probability of winning from this position
    #[serde(default)]
    pub win_probability: Option<f64>,
    /// Failure description
    #[serde(default)]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Successful result with the given contents.
    pub fn success(
        safe_moves: Vec<CellProbability>,
        mine_probabilities: BTreeMap<String, f64>,
        best_guess: Option<CellProbability>,
        win_probability: Option<f64>,
    ) -> Self {
        Self {
            success: true,
            safe_moves,
            mine_probabilities,
            best_guess,
            win_probability,
            error: None,
        }
    }

    /// Failed result carrying only an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            safe_moves: Vec::new(),
            mine_probabilities: BTreeMap::new(),
            best_guess: None,
            win_probability: None,
            error: Some(error.into()),
        }
    }

    /// The failure returned when no correlated response arrives in time.
    pub fn timeout() -> Self {
        Self::failure("timeout")
    }

    /// Whether this is the bridge timeout failure.
    pub fn is_timeout(&self) -> bool {
        !self.success && self.error.as_deref() == Some("timeout")
    }

    /// Mine probability for a coordinate, if reported.
    pub fn probability_at(&self, x: u16, y: u16) -> Option<f64> {
        self.mine_probabilities.get(&cell_key(x, y)).copied()
    }

    /// Enforce the result invariants on data received from another realm.
    ///
    /// Failed results lose any collections they carried; probabilities are
    /// clamped into `[0, 1]` and non-finite or badly keyed entries dropped.
    pub fn normalized(self) -> Self {
        if !self.success {
            return Self::failure(
                self.error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "unknown solver error".to_string()),
            );
        }

        let clamp = |p: f64| p.is_finite().then(|| p.clamp(0.0, 1.0));
        let fix = |entry: CellProbability| {
            clamp(entry.probability).map(|p| CellProbability::new(entry.x, entry.y, p))
        };

        Self {
            success: true,
            safe_moves: self.safe_moves.into_iter().filter_map(fix).collect(),
            mine_probabilities: self
                .mine_probabilities
                .into_iter()
                .filter(|(key, _)| parse_cell_key(key).is_some())
                .filter_map(|(key, p)| clamp(p).map(|p| (key, p)))
                .collect(),
            best_guess: self.best_guess.and_then(fix),
            win_probability: self.win_probability.and_then(clamp),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_key_round_trip() {
        assert_eq!(cell_key(3, 4), "3,4");
        assert_eq!(parse_cell_key("3,4"), Some((3, 4)));
        assert_eq!(parse_cell_key("3;4"), None);
        assert_eq!(parse_cell_key("a,4"), None);
    }

    #[test]
    fn test_failure_has_empty_collections() {
        let result = AnalysisResult::failure("engine crashed");
        assert!(!result.success);
        assert!(result.safe_moves.is_empty());
        assert!(result.mine_probabilities.is_empty());
        assert!(result.best_guess.is_none());
        assert!(result.win_probability.is_none());
        assert_eq!(result.error.as_deref(), Some("engine crashed"));
    }

    #[test]
    fn test_timeout() {
        let result = AnalysisResult::timeout();
        assert!(result.is_timeout());
        assert_eq!(result.error.as_deref(), Some("timeout"));
        assert!(!AnalysisResult::failure("other").is_timeout());
    }

    #[test]
    fn test_normalize_failure_strips_collections() {
        let mut result = AnalysisResult::failure("x");
        result.safe_moves.push(CellProbability::new(0, 0, 1.0));
        result.mine_probabilities.insert("0,0".to_string(), 0.5);
        result.error = None;

        let normalized = result.normalized();
        assert!(normalized.safe_moves.is_empty());
        assert!(normalized.mine_probabilities.is_empty());
        assert_eq!(normalized.error.as_deref(), Some("unknown solver error"));
    }

    #[test]
    fn test_normalize_clamps_probabilities() {
        let mut probabilities = BTreeMap::new();
        probabilities.insert("0,0".to_string(), 1.5);
        probabilities.insert("1,0".to_string(), f64::NAN);
        probabilities.insert("bogus".to_string(), 0.5);
        probabilities.insert("2,0".to_string(), 0.25);

        let result = AnalysisResult::success(
            vec![CellProbability::new(1, 1, -0.2)],
            probabilities,
            Some(CellProbability::new(2, 2, f64::INFINITY)),
            Some(2.0),
        )
        .normalized();

        assert_eq!(result.probability_at(0, 0), Some(1.0));
        assert_eq!(result.probability_at(1, 0), None);
        assert_eq!(result.probability_at(2, 0), Some(0.25));
        assert_eq!(result.mine_probabilities.len(), 2);
        assert_eq!(result.safe_moves[0].probability, 0.0);
        assert!(result.best_guess.is_none());
        assert_eq!(result.win_probability, Some(1.0));
    }

    #[test]
    fn test_result_json_shape() {
        let mut probabilities = BTreeMap::new();
        probabilities.insert("3,4".to_string(), 0.5);
        let result = AnalysisResult::success(
            vec![CellProbability::new(1, 2, 1.0)],
            probabilities,
            None,
            None,
        );
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["safeMoves"][0]["x"], 1);
        assert_eq!(json["mineProbabilities"]["3,4"], 0.5);
        assert!(json["bestGuess"].is_null());
    }

    #[test]
    fn test_result_deserializes_sparse_failure() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"success": false, "error": "boom"}"#).unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert!(result.safe_moves.is_empty());
    }
}

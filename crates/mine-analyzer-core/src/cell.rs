//! Cell types for a captured minesweeper board.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Semantic state of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    /// Covered, no flag
    Hidden,
    /// Uncovered; `value` holds the adjacent mine count
    Revealed,
    /// Covered with a flag
    Flagged,
    /// The classifier could not decide
    Unknown,
}

impl CellState {
    /// Whether the cell is still covered (hidden or flagged).
    pub fn is_covered(&self) -> bool {
        matches!(self, CellState::Hidden | CellState::Flagged)
    }
}

/// One cell of a board snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// Column (0-based)
    pub x: u16,
    /// Row (0-based)
    pub y: u16,
    /// Semantic state
    pub state: CellState,
    /// Adjacent mine count (0-8), meaningful only when revealed
    pub value: u8,
    /// Whether a flag is shown on the cell
    pub is_flagged: bool,
    /// `Some` only when the page tells us definitively (revealed cells,
    /// end-of-game mine reveal); `None` means unknown
    pub is_mine: Option<bool>,
    /// Live back-reference into the host document; never serialized
    #[serde(skip)]
    #[schemars(skip)]
    pub node: Option<NodeId>,
}

impl Cell {
    /// Create a hidden cell with no knowledge about a mine.
    pub fn hidden(x: u16, y: u16) -> Self {
        Self {
            x,
            y,
            state: CellState::Hidden,
            value: 0,
            is_flagged: false,
            is_mine: None,
            node: None,
        }
    }

    /// Create a revealed number cell.
    pub fn revealed(x: u16, y: u16, value: u8) -> Self {
        Self {
            x,
            y,
            state: CellState::Revealed,
            value,
            is_flagged: false,
            is_mine: Some(false),
            node: None,
        }
    }

    /// Create a flagged cell.
    pub fn flagged(x: u16, y: u16) -> Self {
        Self {
            x,
            y,
            state: CellState::Flagged,
            value: 0,
            is_flagged: true,
            is_mine: None,
            node: None,
        }
    }

    /// Attach the host node this cell was read from.
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    /// Whether the cell is covered and carries no flag.
    pub fn is_hidden_unflagged(&self) -> bool {
        self.state == CellState::Hidden && !self.is_flagged
    }

    /// The fields that matter for analysis: `(state, value, isFlagged)`.
    pub fn semantic_key(&self) -> (CellState, u8, bool) {
        (self.state, self.value, self.is_flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_constructors() {
        let hidden = Cell::hidden(1, 2);
        assert_eq!(hidden.state, CellState::Hidden);
        assert_eq!(hidden.is_mine, None);
        assert!(hidden.is_hidden_unflagged());

        let revealed = Cell::revealed(0, 0, 3);
        assert_eq!(revealed.value, 3);
        assert_eq!(revealed.is_mine, Some(false));
        assert!(!revealed.is_hidden_unflagged());

        let flagged = Cell::flagged(4, 4);
        assert!(flagged.is_flagged);
        assert!(flagged.state.is_covered());
        assert!(!flagged.is_hidden_unflagged());
    }

    #[test]
    fn test_cell_serialization_skips_node() {
        let cell = Cell::revealed(3, 4, 2).with_node(NodeId(99));
        let json = serde_json::to_value(&cell).unwrap();

        assert_eq!(json["x"], 3);
        assert_eq!(json["state"], "revealed");
        assert_eq!(json["isFlagged"], false);
        assert_eq!(json["isMine"], false);
        assert!(json.get("node").is_none());
    }

    #[test]
    fn test_unknown_mine_serializes_as_null() {
        let json = serde_json::to_value(Cell::hidden(0, 0)).unwrap();
        assert!(json["isMine"].is_null());

        let back: Cell = serde_json::from_value(json).unwrap();
        assert_eq!(back.is_mine, None);
        assert_eq!(back.node, None);
    }

    #[test]
    fn test_semantic_key_ignores_node() {
        let a = Cell::hidden(0, 0).with_node(NodeId(1));
        let b = Cell::hidden(0, 0).with_node(NodeId(2));
        assert_eq!(a.semantic_key(), b.semantic_key());
    }
}

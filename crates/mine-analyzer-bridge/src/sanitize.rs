//! Transport-safe snapshot representation.
//!
//! Only `x, y, state, value, isFlagged, isMine` survive per cell. Live node
//! references never cross the realm boundary.

use serde::{Deserialize, Serialize};

use mine_analyzer_core::{BoardSnapshot, CaptureMode, Cell, CellState, Difficulty, Result};

/// A cell as sent to the solver realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedCell {
    /// Column
    pub x: u16,
    /// Row
    pub y: u16,
    /// Semantic state
    pub state: CellState,
    /// Adjacent mine count
    pub value: u8,
    /// Flag shown
    pub is_flagged: bool,
    /// Definitive mine knowledge
    pub is_mine: Option<bool>,
}

impl From<&Cell> for SanitizedCell {
    fn from(cell: &Cell) -> Self {
        Self {
            x: cell.x,
            y: cell.y,
            state: cell.state,
            value: cell.value,
            is_flagged: cell.is_flagged,
            is_mine: cell.is_mine,
        }
    }
}

impl From<SanitizedCell> for Cell {
    fn from(cell: SanitizedCell) -> Self {
        Cell {
            x: cell.x,
            y: cell.y,
            state: cell.state,
            value: cell.value,
            is_flagged: cell.is_flagged,
            is_mine: cell.is_mine,
            node: None,
        }
    }
}

/// A snapshot as sent to the solver realm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedSnapshot {
    /// Board width
    pub width: u16,
    /// Board height
    pub height: u16,
    /// Total mines
    pub mine_count: u32,
    /// Detected difficulty
    pub difficulty: Difficulty,
    /// Capture mode
    pub captured_mode: CaptureMode,
    /// Cells, row-major; empty in a dimensions-only payload
    #[serde(default)]
    pub cells: Vec<SanitizedCell>,
}

impl SanitizedSnapshot {
    /// Strip a snapshot down to its semantic fields.
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Self {
        Self {
            cells: snapshot.cells().iter().map(SanitizedCell::from).collect(),
            ..Self::dimensions_only(snapshot)
        }
    }

    /// Fallback payload carrying only the board shape.
    pub fn dimensions_only(snapshot: &BoardSnapshot) -> Self {
        Self {
            width: snapshot.width(),
            height: snapshot.height(),
            mine_count: snapshot.mine_count(),
            difficulty: snapshot.difficulty(),
            captured_mode: snapshot.captured_mode(),
            cells: Vec::new(),
        }
    }

    /// Rebuild a validated snapshot on the receiving side.
    ///
    /// A dimensions-only payload fails with `IncompleteSnapshot`.
    pub fn into_board(self) -> Result<BoardSnapshot> {
        BoardSnapshot::new(
            self.width,
            self.height,
            self.mine_count,
            self.difficulty,
            self.cells.into_iter().map(Cell::from).collect(),
            self.captured_mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mine_analyzer_core::{Error, NodeId};

    fn sample() -> BoardSnapshot {
        let cells = vec![
            Cell::hidden(0, 0).with_node(NodeId(1)),
            Cell::revealed(1, 0, 2).with_node(NodeId(2)),
            Cell::flagged(0, 1).with_node(NodeId(3)),
            Cell {
                is_mine: Some(true),
                ..Cell::revealed(1, 1, 0)
            },
        ];
        BoardSnapshot::new(2, 2, 1, Difficulty::Custom, cells, CaptureMode::Replay).unwrap()
    }

    #[test]
    fn test_sanitized_json_has_no_node() {
        let json = serde_json::to_value(SanitizedSnapshot::from_snapshot(&sample())).unwrap();
        assert_eq!(json["mineCount"], 1);
        assert_eq!(json["capturedMode"], "replay");
        let cell = &json["cells"][1];
        assert_eq!(cell["state"], "revealed");
        assert_eq!(cell["value"], 2);
        assert_eq!(
            cell.as_object().unwrap().len(),
            6,
            "only the six semantic fields cross the boundary"
        );
    }

    #[test]
    fn test_round_trip_preserves_semantics() {
        let original = sample();
        let json = serde_json::to_string(&SanitizedSnapshot::from_snapshot(&original)).unwrap();
        let board = serde_json::from_str::<SanitizedSnapshot>(&json)
            .unwrap()
            .into_board()
            .unwrap();

        for (a, b) in original.cells().iter().zip(board.cells()) {
            assert_eq!((a.x, a.y, a.state, a.value), (b.x, b.y, b.state, b.value));
            assert_eq!((a.is_flagged, a.is_mine), (b.is_flagged, b.is_mine));
            assert_eq!(b.node, None);
        }
    }

    #[test]
    fn test_dimensions_only_payload() {
        let payload = SanitizedSnapshot::dimensions_only(&sample());
        assert!(payload.cells.is_empty());
        assert_eq!((payload.width, payload.height), (2, 2));
        assert!(matches!(
            payload.into_board(),
            Err(Error::IncompleteSnapshot { missing: 4, .. })
        ));
    }

    #[test]
    fn test_oversized_dimensions_are_rejected() {
        let payload: SanitizedSnapshot = serde_json::from_value(serde_json::json!({
            "width": 65535,
            "height": 65535,
            "mineCount": 10,
            "difficulty": "custom",
            "capturedMode": "live",
            "cells": []
        }))
        .unwrap();
        assert!(matches!(
            payload.into_board(),
            Err(Error::IncompleteSnapshot { .. })
        ));
    }
}

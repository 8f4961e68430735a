//! Conversion between snapshots and the engine's native representation.

use std::collections::BTreeMap;

use mine_analyzer_core::{cell_key, AnalysisResult, BoardSnapshot, CellProbability, CellState};

/// One tile as the engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTile {
    /// Column
    pub x: u16,
    /// Row
    pub y: u16,
    /// Still covered
    pub covered: bool,
    /// Carries a flag
    pub flagged: bool,
    /// Number shown, for uncovered tiles
    pub value: u8,
    /// Known to be a mine
    pub mine: bool,
}

/// The engine's board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineBoard {
    /// Width in tiles
    pub width: u16,
    /// Height in tiles
    pub height: u16,
    /// Total mines
    pub mines: u32,
    /// Tiles, row-major
    pub tiles: Vec<EngineTile>,
}

impl EngineBoard {
    /// Build the engine board from a snapshot.
    ///
    /// Revealed cells become uncovered tiles with their number; flagged cells
    /// stay covered with a flag; known mines are marked as such.
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Self {
        let tiles = snapshot
            .cells()
            .iter()
            .map(|cell| EngineTile {
                x: cell.x,
                y: cell.y,
                covered: cell.state != CellState::Revealed,
                flagged: cell.state == CellState::Flagged || cell.is_flagged,
                value: if cell.state == CellState::Revealed {
                    cell.value
                } else {
                    0
                },
                mine: cell.is_mine == Some(true),
            })
            .collect();

        Self {
            width: snapshot.width(),
            height: snapshot.height(),
            mines: snapshot.mine_count(),
            tiles,
        }
    }

    /// Tile at `(x, y)`.
    pub fn tile(&self, x: u16, y: u16) -> Option<&EngineTile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get(y as usize * self.width as usize + x as usize)
    }

    /// The up to eight tiles around `(x, y)`.
    pub fn neighbours(&self, x: u16, y: u16) -> impl Iterator<Item = &EngineTile> + '_ {
        let (x, y) = (x as i32, y as i32);
        (-1..=1)
            .flat_map(move |dy| (-1..=1).map(move |dx| (x + dx, y + dy)))
            .filter(move |&(nx, ny)| (nx, ny) != (x, y) && nx >= 0 && ny >= 0)
            .filter_map(|(nx, ny)| self.tile(nx as u16, ny as u16))
    }
}

/// What the engine suggests doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Open the tile
    Clear,
    /// Flag the tile
    Flag,
}

/// A suggested action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineAction {
    /// Column
    pub x: u16,
    /// Row
    pub y: u16,
    /// Action
    pub kind: ActionKind,
    /// Probability the action is safe, when known
    pub prob: Option<f64>,
}

impl EngineAction {
    /// A clear action.
    pub fn clear(x: u16, y: u16, prob: Option<f64>) -> Self {
        Self {
            x,
            y,
            kind: ActionKind::Clear,
            prob,
        }
    }

    /// A flag action.
    pub fn flag(x: u16, y: u16) -> Self {
        Self {
            x,
            y,
            kind: ActionKind::Flag,
            prob: Some(1.0),
        }
    }
}

/// Native engine output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutcome {
    /// Suggested actions, best first
    pub actions: Vec<EngineAction>,
    /// Probability each tile is safe, keyed by coordinate
    pub safety: BTreeMap<(u16, u16), f64>,
    /// Explicit best guess
    pub best_guess: Option<EngineAction>,
    /// Estimated chance of winning
    pub win_probability: Option<f64>,
}

impl EngineOutcome {
    /// Convert into an [`AnalysisResult`] for the given board.
    ///
    /// - safe moves are the clear actions (probability 1.0 when unknown)
    /// - every covered, unflagged tile gets `1 - safety` (0.5 when unknown)
    /// - the best guess is the explicit one, else the first action
    ///   (probability 0.5 when unknown)
    pub fn into_result(self, board: &EngineBoard) -> AnalysisResult {
        let safe_moves = self
            .actions
            .iter()
            .filter(|action| action.kind == ActionKind::Clear)
            .map(|action| CellProbability::new(action.x, action.y, action.prob.unwrap_or(1.0)))
            .collect();

        let mine_probabilities = board
            .tiles
            .iter()
            .filter(|tile| tile.covered && !tile.flagged)
            .map(|tile| {
                let mine = self
                    .safety
                    .get(&(tile.x, tile.y))
                    .map_or(0.5, |safe| 1.0 - safe);
                (cell_key(tile.x, tile.y), mine)
            })
            .collect();

        let best_guess = self
            .best_guess
            .or_else(|| self.actions.first().copied())
            .map(|action| CellProbability::new(action.x, action.y, action.prob.unwrap_or(0.5)));

        AnalysisResult::success(safe_moves, mine_probabilities, best_guess, self.win_probability)
            .normalized()
    }
}

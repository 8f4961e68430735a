//! Reference solving engine.
//!
//! Deduces what single constraints allow: a number whose flags are all
//! accounted for clears its other neighbours, and a number with exactly as
//! many covered neighbours as missing mines flags them. Deductions feed each
//! other until nothing changes. Every unresolved tile then gets the uniform
//! density of the mines still unaccounted for.

use std::collections::BTreeSet;

use tracing::debug;

use mine_analyzer_bridge::{EngineAction, EngineBoard, EngineOutcome, SolvingEngine};
use mine_analyzer_core::{PlayStyle, Result, SolveOptions};

/// Capability name the realm waits for.
pub const LOCAL_ENGINE: &str = "local-engine";

/// Single-constraint deductions plus uniform density.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalEngine;

impl LocalEngine {
    /// Create the engine.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Default)]
struct Deductions {
    safe: BTreeSet<(u16, u16)>,
    mines: BTreeSet<(u16, u16)>,
}

impl Deductions {
    fn is_mine(&self, board: &EngineBoard, x: u16, y: u16) -> bool {
        board
            .tile(x, y)
            .is_some_and(|tile| tile.flagged || tile.mine)
            || self.mines.contains(&(x, y))
    }

    fn is_unresolved(&self, board: &EngineBoard, x: u16, y: u16) -> bool {
        board.tile(x, y).is_some_and(|tile| tile.covered)
            && !self.is_mine(board, x, y)
            && !self.safe.contains(&(x, y))
    }

    /// One pass over every number. Returns whether anything new was learned.
    fn sweep(&mut self, board: &EngineBoard) -> bool {
        let mut learned = false;
        for tile in board.tiles.iter().filter(|tile| !tile.covered && !tile.mine) {
            let neighbours: Vec<(u16, u16)> = board
                .neighbours(tile.x, tile.y)
                .map(|n| (n.x, n.y))
                .collect();
            let known_mines = neighbours
                .iter()
                .filter(|&&(x, y)| self.is_mine(board, x, y))
                .count();
            let unresolved: Vec<(u16, u16)> = neighbours
                .into_iter()
                .filter(|&(x, y)| self.is_unresolved(board, x, y))
                .collect();
            if unresolved.is_empty() {
                continue;
            }

            let missing = (tile.value as usize).saturating_sub(known_mines);
            if missing == 0 {
                learned = true;
                self.safe.extend(unresolved);
            } else if missing == unresolved.len() {
                learned = true;
                self.mines.extend(unresolved);
            }
        }
        learned
    }
}

impl SolvingEngine for LocalEngine {
    fn name(&self) -> &str {
        LOCAL_ENGINE
    }

    fn solve(&self, board: &EngineBoard, options: &SolveOptions) -> Result<EngineOutcome> {
        let mut deductions = Deductions::default();
        while deductions.sweep(board) {}

        let unresolved: Vec<(u16, u16)> = board
            .tiles
            .iter()
            .filter(|tile| deductions.is_unresolved(board, tile.x, tile.y))
            .map(|tile| (tile.x, tile.y))
            .collect();
        let placed = board
            .tiles
            .iter()
            .filter(|tile| deductions.is_mine(board, tile.x, tile.y))
            .count();
        let remaining = (board.mines as usize).saturating_sub(placed);
        let density = if unresolved.is_empty() {
            0.0
        } else {
            (remaining as f64 / unresolved.len() as f64).min(1.0)
        };

        let mut outcome = EngineOutcome::default();
        for &(x, y) in &deductions.safe {
            outcome.safety.insert((x, y), 1.0);
            outcome.actions.push(EngineAction::clear(x, y, Some(1.0)));
        }
        let flags = matches!(options.play_style, PlayStyle::Flags | PlayStyle::Efficiency);
        for &(x, y) in &deductions.mines {
            outcome.safety.insert((x, y), 0.0);
            if flags {
                outcome.actions.push(EngineAction::flag(x, y));
            }
        }
        for &(x, y) in &unresolved {
            outcome.safety.insert((x, y), 1.0 - density);
        }

        if deductions.safe.is_empty() {
            outcome.best_guess = unresolved
                .first()
                .map(|&(x, y)| EngineAction::clear(x, y, Some(1.0 - density)));
        }
        if unresolved.is_empty() {
            outcome.win_probability = Some(1.0);
        }

        debug!(
            safe = deductions.safe.len(),
            mines = deductions.mines.len(),
            unresolved = unresolved.len(),
            density,
            "local engine pass complete"
        );
        Ok(outcome)
    }
}

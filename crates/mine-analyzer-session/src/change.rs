//! Semantic change detection between snapshots.

use mine_analyzer_core::BoardSnapshot;

/// Decides whether a new snapshot is worth analyzing.
///
/// Only `(state, value, isFlagged)` per cell and the board dimensions are
/// compared, so cosmetic churn (hover styling, overlay marker classes,
/// counter animation) never counts as a change.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    /// True when there is no previous snapshot, the dimensions differ, or any
    /// cell's semantic fields differ.
    pub fn should_reanalyze(previous: Option<&BoardSnapshot>, current: &BoardSnapshot) -> bool {
        let Some(previous) = previous else {
            return true;
        };
        if (previous.width(), previous.height()) != (current.width(), current.height()) {
            return true;
        }
        previous
            .cells()
            .iter()
            .zip(current.cells())
            .any(|(before, after)| before.semantic_key() != after.semantic_key())
    }

    /// Coordinates whose semantic fields differ between two same-sized
    /// snapshots. Empty when the dimensions differ.
    pub fn changed_cells(previous: &BoardSnapshot, current: &BoardSnapshot) -> Vec<(u16, u16)> {
        if (previous.width(), previous.height()) != (current.width(), current.height()) {
            return Vec::new();
        }
        previous
            .cells()
            .iter()
            .zip(current.cells())
            .filter(|(before, after)| before.semantic_key() != after.semantic_key())
            .map(|(_, after)| (after.x, after.y))
            .collect()
    }
}

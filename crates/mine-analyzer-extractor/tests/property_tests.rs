//! Property-based tests for board extraction.
//!
//! Uses proptest to generate random boards and verify snapshot invariants.

use proptest::prelude::*;

use mine_analyzer_core::{CellState, Error};
use mine_analyzer_dom::MinesweeperPage;
use mine_analyzer_extractor::BoardSnapshotExtractor;

/// Generate a random row symbol.
fn cell_symbol() -> impl Strategy<Value = char> {
    prop_oneof![
        4 => Just('#'),
        1 => Just('F'),
        1 => Just('*'),
        3 => (0u8..=8).prop_map(|d| (b'0' + d) as char),
    ]
}

/// Generate a rectangular board of symbols.
fn board_rows() -> impl Strategy<Value = Vec<String>> {
    (2usize..12, 2usize..12).prop_flat_map(|(width, height)| {
        prop::collection::vec(
            prop::collection::vec(cell_symbol(), width).prop_map(|row| row.into_iter().collect()),
            height,
        )
    })
}

fn build_page(rows: &[String], mines: u32) -> MinesweeperPage {
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    MinesweeperPage::from_rows(&rows, mines).unwrap()
}

proptest! {
    /// Every coordinate appears exactly once, row-major.
    #[test]
    fn snapshot_covers_every_coordinate(rows in board_rows(), mines in 0u32..100) {
        let page = build_page(&rows, mines);
        let snapshot = BoardSnapshotExtractor::default().extract(page.tree(), None).unwrap();

        let width = rows[0].chars().count();
        prop_assert_eq!(snapshot.width() as usize, width);
        prop_assert_eq!(snapshot.height() as usize, rows.len());
        prop_assert_eq!(snapshot.cells().len(), width * rows.len());
        prop_assert_eq!(snapshot.mine_count(), mines);

        for (index, cell) in snapshot.cells().iter().enumerate() {
            prop_assert_eq!(cell.x as usize, index % width);
            prop_assert_eq!(cell.y as usize, index / width);
        }
    }

    /// The classified state matches the symbol the page was built from.
    #[test]
    fn snapshot_matches_page_symbols(rows in board_rows()) {
        let page = build_page(&rows, 0);
        let snapshot = BoardSnapshotExtractor::default().extract(page.tree(), None).unwrap();

        for (y, row) in rows.iter().enumerate() {
            for (x, symbol) in row.chars().enumerate() {
                let cell = snapshot.cell(x as u16, y as u16).unwrap();
                match symbol {
                    '#' => prop_assert_eq!(cell.state, CellState::Hidden),
                    'F' => prop_assert!(cell.state == CellState::Flagged && cell.is_flagged),
                    '*' => prop_assert_eq!(cell.is_mine, Some(true)),
                    d => {
                        prop_assert_eq!(cell.state, CellState::Revealed);
                        prop_assert_eq!(cell.value as u32, d.to_digit(10).unwrap());
                    }
                }
            }
        }
    }

    /// Extracting an unchanged page twice yields identical snapshots.
    #[test]
    fn extraction_is_deterministic(rows in board_rows()) {
        let page = build_page(&rows, 5);
        let extractor = BoardSnapshotExtractor::default();
        let first = extractor.extract(page.tree(), None).unwrap();
        let second = extractor.extract(page.tree(), None).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Removing any interior cell makes the snapshot incomplete.
    #[test]
    fn missing_cell_is_never_passed_on(
        rows in board_rows(),
        pick in any::<prop::sample::Index>(),
    ) {
        let page = build_page(&rows, 0);
        let width = rows[0].chars().count();
        // Keep the far corner so the grid size stays derivable
        let candidates = width * rows.len() - 1;
        let index = pick.index(candidates);
        page.remove_cell((index % width) as u16, (index / width) as u16).unwrap();

        let result = BoardSnapshotExtractor::default().extract(page.tree(), None);
        let is_incomplete = matches!(result, Err(Error::IncompleteSnapshot { missing: 1, .. }));
        prop_assert!(is_incomplete);
    }
}

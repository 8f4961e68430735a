//! Board snapshot types.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Cell, CellState, Error, Result};

/// Largest board side the analyzer accepts from a page.
pub const MAX_BOARD_SIDE: u16 = 256;

/// Game difficulty as presented by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// 9x9, 10 mines
    Beginner,
    /// 16x16, 40 mines
    Intermediate,
    /// 30x16, 99 mines
    Expert,
    /// User-defined board
    Custom,
    /// Could not be determined
    Unknown,
}

impl Difficulty {
    /// Standard `(width, height)` for the fixed difficulties.
    pub fn standard_dimensions(&self) -> Option<(u16, u16)> {
        match self {
            Difficulty::Beginner => Some((9, 9)),
            Difficulty::Intermediate => Some((16, 16)),
            Difficulty::Expert => Some((30, 16)),
            Difficulty::Custom | Difficulty::Unknown => None,
        }
    }

    /// Standard mine count for the fixed difficulties.
    pub fn standard_mines(&self) -> Option<u32> {
        match self {
            Difficulty::Beginner => Some(10),
            Difficulty::Intermediate => Some(40),
            Difficulty::Expert => Some(99),
            Difficulty::Custom | Difficulty::Unknown => None,
        }
    }

    /// Match a standard board by its total number of cells.
    pub fn from_cell_count(count: usize) -> Option<Self> {
        match count {
            81 => Some(Difficulty::Beginner),
            256 => Some(Difficulty::Intermediate),
            480 => Some(Difficulty::Expert),
            _ => None,
        }
    }

    /// Match a difficulty from free text such as a level selector label.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        [
            ("beginner", Difficulty::Beginner),
            ("intermediate", Difficulty::Intermediate),
            ("expert", Difficulty::Expert),
            ("custom", Difficulty::Custom),
        ]
        .into_iter()
        .find(|(name, _)| label.contains(name))
        .map(|(_, difficulty)| difficulty)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Expert => "expert",
            Difficulty::Custom => "custom",
            Difficulty::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Whether the board was captured from a replay or a live game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Replay viewer
    Replay,
    /// Game in progress
    Live,
}

/// Immutable point-in-time capture of the board.
///
/// A snapshot always holds exactly one cell per coordinate in
/// `[0,width) x [0,height)`, stored row-major. Construction through
/// [`BoardSnapshot::new`] is the only way to obtain one, so an incomplete
/// board can never be handed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    width: u16,
    height: u16,
    mine_count: u32,
    difficulty: Difficulty,
    cells: Vec<Cell>,
    captured_mode: CaptureMode,
}

impl BoardSnapshot {
    /// Build a snapshot, validating dimensions and cell coverage.
    ///
    /// Cells may be given in any order; they are stored row-major.
    pub fn new(
        width: u16,
        height: u16,
        mine_count: u32,
        difficulty: Difficulty,
        cells: Vec<Cell>,
        captured_mode: CaptureMode,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }

        let expected = width as usize * height as usize;
        // Coverage is checked before slots are sized from the claimed dimensions
        if cells.len() < expected {
            return Err(Error::IncompleteSnapshot {
                missing: expected - cells.len(),
                expected,
            });
        }
        let mut slots: Vec<Option<Cell>> = vec![None; expected];

        for cell in cells {
            if cell.x >= width || cell.y >= height {
                return Err(Error::InvalidCell {
                    x: cell.x,
                    y: cell.y,
                    reason: format!("outside {width}x{height} board"),
                });
            }
            if cell.value > 8 {
                return Err(Error::InvalidCell {
                    x: cell.x,
                    y: cell.y,
                    reason: format!("value {} out of range", cell.value),
                });
            }
            let index = cell.y as usize * width as usize + cell.x as usize;
            if slots[index].is_some() {
                return Err(Error::InvalidCell {
                    x: cell.x,
                    y: cell.y,
                    reason: "duplicate coordinate".to_string(),
                });
            }
            slots[index] = Some(cell);
        }

        let missing = slots.iter().filter(|slot| slot.is_none()).count();
        if missing > 0 {
            return Err(Error::IncompleteSnapshot { missing, expected });
        }

        Ok(Self {
            width,
            height,
            mine_count,
            difficulty,
            cells: slots.into_iter().flatten().collect(),
            captured_mode,
        })
    }

    /// Board width in cells.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Board height in cells.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Total mines on the board.
    pub fn mine_count(&self) -> u32 {
        self.mine_count
    }

    /// Detected difficulty.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mode the page was in at capture time.
    pub fn captured_mode(&self) -> CaptureMode {
        self.captured_mode
    }

    /// Whether the snapshot was captured from a replay.
    pub fn is_replay(&self) -> bool {
        self.captured_mode == CaptureMode::Replay
    }

    /// Look up a cell by coordinate.
    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells
            .get(y as usize * self.width as usize + x as usize)
    }

    /// Whether at least one cell has been revealed.
    pub fn has_revealed_cells(&self) -> bool {
        self.cells
            .iter()
            .any(|cell| cell.state == CellState::Revealed)
    }

    /// Whether the cell at `(x, y)` is covered and unflagged.
    pub fn is_hidden_unflagged(&self, x: u16, y: u16) -> bool {
        self.cell(x, y).is_some_and(Cell::is_hidden_unflagged)
    }

    /// Number of flagged cells.
    pub fn flagged_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_flagged).count()
    }

    /// Short human description, e.g. `9×9, 10 mines (beginner)`.
    pub fn describe(&self) -> String {
        format!(
            "{}×{}, {} mines ({})",
            self.width, self.height, self.mine_count, self.difficulty
        )
    }
}

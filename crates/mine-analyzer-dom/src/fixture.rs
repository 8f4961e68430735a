//! Simulated minesweeper host page.
//!
//! Builds the markup the default extractor understands:
//!
//! ```text
//! body
//! ├── div#top_area_mines_100 / _10 / _1   (hd_top-area-num<d>)
//! ├── div.level-select-link[.active] ×4
//! ├── div#replay_timeline                 (replay pages only)
//! └── div#AreaBlock
//!     └── div#cell_<x>_<y>.cell.hd_closed[data-x][data-y]
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use mine_analyzer_core::{Difficulty, Error, NodeId, Result};

use crate::document::{HostDocument, Rect};
use crate::selector::Selector;
use crate::tree::HostTree;

const CELL_SIZE: f64 = 24.0;
const BOARD_TOP: f64 = 60.0;
const LEVELS: [&str; 4] = ["Beginner", "Intermediate", "Expert", "Custom"];

/// Serializable description of a page, loaded from YAML.
///
/// Rows use `#` hidden, `F` flagged, `0`-`8` revealed and `*` a revealed mine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageFixture {
    /// Page URL
    pub url: String,
    /// Active level selector label (derived from the size when absent)
    pub level_label: Option<String>,
    /// Mine counter value (standard count for the size when absent)
    pub mines: Option<u32>,
    /// Board rows, top to bottom
    pub rows: Vec<String>,
    /// Add the replay timeline element
    pub replay: bool,
}

impl Default for PageFixture {
    fn default() -> Self {
        Self {
            url: "https://minesweeper.online/start/1".to_string(),
            level_label: None,
            mines: None,
            rows: vec!["#########".to_string(); 9],
            replay: false,
        }
    }
}

impl PageFixture {
    /// Parse a fixture from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a fixture from a YAML file.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// A minesweeper page living in a [`HostTree`].
#[derive(Debug, Clone)]
pub struct MinesweeperPage {
    tree: HostTree,
    board: NodeId,
    width: u16,
    height: u16,
}

impl MinesweeperPage {
    /// Build an all-hidden page.
    pub fn new(url: &str, width: u16, height: u16, mines: u32) -> Result<Self> {
        let rows = vec!["#".repeat(width as usize); height as usize];
        Self::from_fixture(&PageFixture {
            url: url.to_string(),
            mines: Some(mines),
            rows,
            ..PageFixture::default()
        })
    }

    /// Standard 9×9 beginner page with 10 mines.
    pub fn beginner() -> Result<Self> {
        Self::from_fixture(&PageFixture::default())
    }

    /// Build a page from row strings.
    pub fn from_rows(rows: &[&str], mines: u32) -> Result<Self> {
        Self::from_fixture(&PageFixture {
            rows: rows.iter().map(|r| r.to_string()).collect(),
            mines: Some(mines),
            ..PageFixture::default()
        })
    }

    /// Build a page from a fixture description.
    pub fn from_fixture(fixture: &PageFixture) -> Result<Self> {
        let height = fixture.rows.len();
        let width = fixture.rows.first().map_or(0, |row| row.chars().count());
        if width == 0 || height == 0 || width > u16::MAX as usize || height > u16::MAX as usize {
            return Err(Error::InvalidInput(format!(
                "page fixture needs a non-empty rectangular board, got {height} rows"
            )));
        }
        if let Some(bad) = fixture.rows.iter().position(|r| r.chars().count() != width) {
            return Err(Error::InvalidInput(format!(
                "page fixture row {bad} has a different length than row 0"
            )));
        }
        let (width, height) = (width as u16, height as u16);

        let difficulty = Difficulty::from_cell_count(width as usize * height as usize)
            .filter(|d| d.standard_dimensions() == Some((width, height)))
            .unwrap_or(Difficulty::Custom);
        let label = fixture
            .level_label
            .clone()
            .unwrap_or_else(|| capitalize(&difficulty.to_string()));
        let mines = fixture
            .mines
            .or_else(|| difficulty.standard_mines())
            .unwrap_or(0);

        let tree = HostTree::new(fixture.url.as_str());
        let body = tree.body();

        for (suffix, digit) in ["100", "10", "1"].into_iter().zip(digits(mines)) {
            tree.append_element(
                body,
                "div",
                Some(&format!("top_area_mines_{suffix}")),
                &format!("top-area-num hd_top-area-num{digit}"),
            )?;
        }

        for level in LEVELS {
            let class = if level.eq_ignore_ascii_case(&label) {
                "level-select-link active"
            } else {
                "level-select-link"
            };
            let link = tree.append_element(body, "a", None, class)?;
            tree.set_text(link, level)?;
        }

        if fixture.replay {
            tree.append_element(body, "div", Some("replay_timeline"), "")?;
        }

        let board = tree.append_element(body, "div", Some("AreaBlock"), "pull-left")?;
        tree.set_rect(
            board,
            Rect::new(
                0.0,
                BOARD_TOP,
                width as f64 * CELL_SIZE,
                height as f64 * CELL_SIZE,
            ),
        )?;

        let page = Self {
            tree,
            board,
            width,
            height,
        };

        for (y, row) in fixture.rows.iter().enumerate() {
            for (x, symbol) in row.chars().enumerate() {
                let (x, y) = (x as u16, y as u16);
                let node = page.tree.append_element(
                    board,
                    "div",
                    Some(&format!("cell_{x}_{y}")),
                    &cell_class(symbol).ok_or_else(|| {
                        Error::InvalidInput(format!("unknown cell symbol '{symbol}' at ({x},{y})"))
                    })?,
                )?;
                page.tree.set_attribute(node, "data-x", &x.to_string())?;
                page.tree.set_attribute(node, "data-y", &y.to_string())?;
                page.tree.set_rect(
                    node,
                    Rect::new(
                        x as f64 * CELL_SIZE,
                        BOARD_TOP + y as f64 * CELL_SIZE,
                        CELL_SIZE,
                        CELL_SIZE,
                    ),
                )?;
            }
        }

        debug!(width, height, mines, label = %label, "minesweeper page built");
        Ok(page)
    }

    /// The underlying tree.
    pub fn tree(&self) -> &HostTree {
        &self.tree
    }

    /// The tree as a shareable host document.
    pub fn document(&self) -> Arc<dyn HostDocument> {
        Arc::new(self.tree.clone())
    }

    /// Board container node.
    pub fn board(&self) -> NodeId {
        self.board
    }

    /// Board width in cells.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Board height in cells.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Node of the cell at `(x, y)`.
    pub fn cell_node(&self, x: u16, y: u16) -> Option<NodeId> {
        self.tree.query(&Selector::id(format!("cell_{x}_{y}")))
    }

    fn set_cell(&self, x: u16, y: u16, class_name: &str) -> Result<()> {
        let node = self.cell_node(x, y).ok_or_else(|| Error::InvalidCell {
            x,
            y,
            reason: "no such cell on the page".to_string(),
        })?;
        self.tree.set_class_name(node, class_name)
    }

    /// Open a cell showing `value` adjacent mines.
    pub fn reveal(&self, x: u16, y: u16, value: u8) -> Result<()> {
        if value > 8 {
            return Err(Error::InvalidCell {
                x,
                y,
                reason: format!("value {value} out of range"),
            });
        }
        self.set_cell(x, y, &format!("cell hd_opened hd_type{value}"))
    }

    /// Place a flag.
    pub fn flag(&self, x: u16, y: u16) -> Result<()> {
        self.set_cell(x, y, "cell hd_closed hd_flag")
    }

    /// Remove a flag.
    pub fn unflag(&self, x: u16, y: u16) -> Result<()> {
        self.set_cell(x, y, "cell hd_closed")
    }

    /// Show the exploded mine.
    pub fn explode(&self, x: u16, y: u16) -> Result<()> {
        self.set_cell(x, y, "cell hd_opened hd_type11")
    }

    /// Show a mine revealed at game end.
    pub fn show_mine(&self, x: u16, y: u16) -> Result<()> {
        self.set_cell(x, y, "cell hd_opened hd_type10")
    }

    /// Rewrite the three-digit mine counter.
    pub fn set_mine_counter(&self, mines: u32) -> Result<()> {
        for (suffix, digit) in ["100", "10", "1"].into_iter().zip(digits(mines)) {
            let node = self
                .tree
                .query(&Selector::id(format!("top_area_mines_{suffix}")))
                .ok_or_else(|| Error::InvalidInput("mine counter missing".to_string()))?;
            self.tree
                .set_class_name(node, &format!("top-area-num hd_top-area-num{digit}"))?;
        }
        Ok(())
    }

    /// Delete a cell element, leaving a gap in the board.
    pub fn remove_cell(&self, x: u16, y: u16) -> Result<()> {
        let node = self.cell_node(x, y).ok_or_else(|| Error::InvalidCell {
            x,
            y,
            reason: "no such cell on the page".to_string(),
        })?;
        self.tree.remove(node)
    }

    /// Hide or show the board container.
    pub fn set_board_displayed(&self, displayed: bool) -> Result<()> {
        self.tree.set_displayed(self.board, displayed)
    }
}

fn cell_class(symbol: char) -> Option<String> {
    match symbol {
        '#' => Some("cell hd_closed".to_string()),
        'F' | 'f' => Some("cell hd_closed hd_flag".to_string()),
        '*' => Some("cell hd_opened hd_type10".to_string()),
        d @ '0'..='8' => Some(format!("cell hd_opened hd_type{d}")),
        _ => None,
    }
}

fn digits(value: u32) -> [u32; 3] {
    let value = value.min(999);
    [value / 100, value / 10 % 10, value % 10]
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

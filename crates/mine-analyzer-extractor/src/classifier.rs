//! Cell classification.
//!
//! Mapping a visual cell element to a [`CellState`] depends entirely on the
//! host page's markup, so it sits behind the [`CellClassifier`] trait. The
//! extractor only relies on the contract: exactly one state per element,
//! `value` in `0..=8`, and `is_mine` set only when the page says so.

use lazy_static::lazy_static;
use regex::Regex;

use mine_analyzer_core::{Cell, CellState, NodeId};
use mine_analyzer_dom::HostDocument;

/// What a classifier read from one cell element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellReading {
    /// Semantic state
    pub state: CellState,
    /// Adjacent mine count (0 unless revealed)
    pub value: u8,
    /// Flag shown on the cell
    pub is_flagged: bool,
    /// Definitive mine knowledge, if any
    pub is_mine: Option<bool>,
}

impl CellReading {
    /// A reading for an element the classifier does not recognize.
    pub fn unknown() -> Self {
        Self {
            state: CellState::Unknown,
            value: 0,
            is_flagged: false,
            is_mine: None,
        }
    }

    /// Attach coordinates and the source node.
    pub fn into_cell(self, x: u16, y: u16, node: NodeId) -> Cell {
        Cell {
            x,
            y,
            state: self.state,
            value: self.value.min(8),
            is_flagged: self.is_flagged,
            is_mine: self.is_mine,
            node: Some(node),
        }
    }
}

/// Maps one host cell element to a semantic reading.
pub trait CellClassifier: Send + Sync {
    /// Classifier name for logging.
    fn name(&self) -> &'static str;

    /// Classify the element. Must not fail; unrecognized markup yields
    /// [`CellState::Unknown`].
    fn classify(&self, document: &dyn HostDocument, node: NodeId) -> CellReading;
}

lazy_static! {
    static ref TYPE_CLASS: Regex = Regex::new(r"^hd_type(\d+)$").unwrap();
}

const CLOSED: &str = "hd_closed";
const OPENED: &str = "hd_opened";
const FLAG_CLASSES: [&str; 3] = ["hd_flag", "hd_flagged", "flagged"];
const MINE_CLASSES: [&str; 2] = ["hd_mine", "mine"];
const MINE_SHOWN: u32 = 10;
const MINE_EXPLODED: u32 = 11;

/// Default classifier for the `hd_*` class-name markup.
///
/// - `hd_closed` is hidden, `hd_opened` revealed
/// - `hd_typeN` gives the number for N ≤ 8; types 10 and 11 are a shown or
///   exploded mine (revealed, value 0, mine)
/// - a flag class overrides the state to flagged
/// - a mine class marks the cell as a known mine
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassNameClassifier;

impl ClassNameClassifier {
    /// Create the classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify a raw class list.
    pub fn classify_class_name(&self, class_name: &str) -> CellReading {
        let tokens: Vec<&str> = class_name.split_whitespace().collect();
        let has = |class: &str| tokens.contains(&class);

        let mut reading = CellReading::unknown();

        if has(CLOSED) {
            reading.state = CellState::Hidden;
        } else if has(OPENED) {
            reading.state = CellState::Revealed;
            reading.is_mine = Some(false);

            let cell_type = tokens.iter().find_map(|token| {
                TYPE_CLASS
                    .captures(token)
                    .and_then(|caps| caps[1].parse::<u32>().ok())
            });
            match cell_type {
                Some(n) if n <= 8 => reading.value = n as u8,
                Some(MINE_SHOWN | MINE_EXPLODED) => reading.is_mine = Some(true),
                _ => {}
            }
        }

        if FLAG_CLASSES.iter().any(|class| has(class)) {
            reading.state = CellState::Flagged;
            reading.is_flagged = true;
        }

        if MINE_CLASSES.iter().any(|class| has(class)) {
            reading.is_mine = Some(true);
        }

        reading
    }
}

impl CellClassifier for ClassNameClassifier {
    fn name(&self) -> &'static str {
        "class-name"
    }

    fn classify(&self, document: &dyn HostDocument, node: NodeId) -> CellReading {
        document
            .class_name(node)
            .map(|class_name| self.classify_class_name(&class_name))
            .unwrap_or_else(CellReading::unknown)
    }
}

//! Board snapshot assembly.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use mine_analyzer_core::{
    BoardSnapshot, CaptureMode, Cell, Error, ExtractionSettings, NodeId, Result,
};
use mine_analyzer_dom::{HostDocument, Selector};

use crate::classifier::{CellClassifier, ClassNameClassifier};
use crate::counter::MineCounterReader;
use crate::difficulty::DifficultyResolver;
use crate::locator::{CellLocator, IdPatternLocator};
use crate::mode::detect_capture_mode;

/// Reads the host document into a validated [`BoardSnapshot`].
///
/// Extraction is a pure read: nothing is written to the document and the
/// snapshot holds no state shared with it beyond node ids.
pub struct BoardSnapshotExtractor {
    board_selectors: Vec<Selector>,
    locator: Arc<dyn CellLocator>,
    classifier: Arc<dyn CellClassifier>,
    counter: MineCounterReader,
    difficulty: DifficultyResolver,
}

impl std::fmt::Debug for BoardSnapshotExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardSnapshotExtractor")
            .field("board_selectors", &self.board_selectors)
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

impl BoardSnapshotExtractor {
    /// Create an extractor from settings, with the default classifier.
    pub fn new(settings: &ExtractionSettings) -> Result<Self> {
        let board_selectors = settings
            .board_selectors
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<Selector>>>()?;

        Ok(Self {
            board_selectors,
            locator: Arc::new(IdPatternLocator::new(settings.cell_id_prefix.as_str())),
            classifier: Arc::new(ClassNameClassifier::new()),
            counter: MineCounterReader::default(),
            difficulty: DifficultyResolver::default(),
        })
    }

    /// Replace the cell classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn CellClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the cell locator.
    pub fn with_locator(mut self, locator: Arc<dyn CellLocator>) -> Self {
        self.locator = locator;
        self
    }

    /// The cell locator, shared with anything that needs to find cells.
    pub fn locator(&self) -> Arc<dyn CellLocator> {
        self.locator.clone()
    }

    /// First visible board container, trying selectors in order.
    pub fn locate_board(&self, document: &dyn HostDocument) -> Option<NodeId> {
        self.board_selectors
            .iter()
            .filter_map(|selector| document.query(selector))
            .find(|node| document.is_visible(*node))
    }

    /// Whether a board is present and at least one cell element exists.
    pub fn is_board_ready(&self, document: &dyn HostDocument) -> bool {
        self.locate_board(document).is_some() && !self.locator.all_cells(document).is_empty()
    }

    /// Poll until the board is ready, up to `attempts` times.
    pub async fn wait_for_board(
        &self,
        document: &dyn HostDocument,
        attempts: u32,
        interval: Duration,
    ) -> Result<NodeId> {
        for attempt in 1..=attempts {
            if self.is_board_ready(document) {
                if let Some(board) = self.locate_board(document) {
                    debug!(attempt, board = %board, "board ready");
                    return Ok(board);
                }
            }
            debug!(attempt, attempts, "board not ready yet");
            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }
        Err(Error::NoBoardRegion)
    }

    /// Capture the board.
    ///
    /// `mode_hint` overrides capture mode detection when given.
    ///
    /// # Errors
    ///
    /// - [`Error::NoBoardRegion`] when no visible board container exists
    ///   or the grid size cannot be determined
    /// - [`Error::IncompleteSnapshot`] when any coordinate has no element
    pub fn extract(
        &self,
        document: &dyn HostDocument,
        mode_hint: Option<CaptureMode>,
    ) -> Result<BoardSnapshot> {
        self.locate_board(document).ok_or(Error::NoBoardRegion)?;

        let cell_nodes = self.locator.all_cells(document);
        let difficulty = self.difficulty.resolve(document, cell_nodes.len());
        let observed = cell_nodes
            .iter()
            .filter_map(|node| self.locator.coordinates(document, *node));
        let (width, height) =
            DifficultyResolver::dimensions(difficulty, observed).ok_or(Error::NoBoardRegion)?;

        let mine_count = self
            .counter
            .read(document)
            .or_else(|| difficulty.standard_mines())
            .unwrap_or(0);

        let mut cells: Vec<Cell> = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                match self.locator.locate(document, x, y) {
                    Some(node) => cells.push(
                        self.classifier
                            .classify(document, node)
                            .into_cell(x, y, node),
                    ),
                    None => warn!(x, y, "cell element not found"),
                }
            }
        }

        let mode = mode_hint.unwrap_or_else(|| detect_capture_mode(document));
        let snapshot = BoardSnapshot::new(width, height, mine_count, difficulty, cells, mode)?;
        debug!(
            width,
            height,
            mine_count,
            %difficulty,
            classifier = self.classifier.name(),
            "board extracted"
        );
        Ok(snapshot)
    }
}

impl Default for BoardSnapshotExtractor {
    fn default() -> Self {
        let settings = ExtractionSettings::default();
        Self {
            board_selectors: vec![
                Selector::id("AreaBlock"),
                Selector::id("game"),
                Selector::class("game-board"),
            ],
            locator: Arc::new(IdPatternLocator::new(settings.cell_id_prefix)),
            classifier: Arc::new(ClassNameClassifier::new()),
            counter: MineCounterReader::default(),
            difficulty: DifficultyResolver::default(),
        }
    }
}

//! Annotation layer over the board.
//!
//! Everything the renderer writes is either a child of its own layer element
//! (labels, status line) tagged with [`OVERLAY_MARKER`], or one of the
//! highlight marker classes added next to the host's own classes. Clearing
//! removes exactly those and nothing else.
//!
//! All writes happen inside an observer pause scope so the mutation
//! subscription never sees the renderer's own output.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use mine_analyzer_core::{
    parse_cell_key, AnalysisResult, BoardSnapshot, NodeId, OverlaySettings, Result, Settings,
};
use mine_analyzer_dom::{HostDocument, ObserverHandle, PauseScope, Selector};
use mine_analyzer_extractor::CellLocator;

/// Attribute carried by every element the renderer creates.
pub const OVERLAY_MARKER: &str = "data-mra-overlay";

const LABEL_CLASS: &str = "probability-overlay";
const STATUS_CLASS: &str = "analysis-info";

/// Classification of a mine probability label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelKind {
    /// At or below the safe threshold
    Safe,
    /// At or above the mine threshold
    Mine,
    /// Anything in between
    Uncertain,
}

impl LabelKind {
    /// Classify a mine probability.
    pub fn classify(probability: f64, settings: &OverlaySettings) -> Self {
        if probability <= settings.safe_threshold {
            LabelKind::Safe
        } else if probability >= settings.mine_threshold {
            LabelKind::Mine
        } else {
            LabelKind::Uncertain
        }
    }

    /// Marker class for the label element.
    pub fn class(&self) -> &'static str {
        match self {
            LabelKind::Safe => "probability-safe",
            LabelKind::Mine => "probability-mine",
            LabelKind::Uncertain => "probability-uncertain",
        }
    }

    /// Label text: `SAFE`, `MINE` or a whole percentage.
    pub fn text(&self, probability: f64) -> String {
        match self {
            LabelKind::Safe => "SAFE".to_string(),
            LabelKind::Mine => "MINE".to_string(),
            LabelKind::Uncertain => format!("{}%", (probability * 100.0).round() as u32),
        }
    }
}

/// A drawn probability label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayLabel {
    /// Column
    pub x: u16,
    /// Row
    pub y: u16,
    /// Displayed text
    pub text: String,
    /// Classification
    pub kind: LabelKind,
}

/// Kind of cell highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HighlightKind {
    /// A safe move
    SafeMove,
    /// The suggested guess
    BestGuess,
}

impl HighlightKind {
    /// Marker class added to the cell element.
    pub fn class(&self) -> &'static str {
        match self {
            HighlightKind::SafeMove => "cell-highlight-safe",
            HighlightKind::BestGuess => "cell-highlight-best-guess",
        }
    }
}

/// A highlighted cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Highlight {
    /// Column
    pub x: u16,
    /// Row
    pub y: u16,
    /// What the highlight means
    pub kind: HighlightKind,
}

/// What the overlay currently shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayView {
    /// Probability labels
    pub labels: Vec<OverlayLabel>,
    /// Highlighted cells
    pub highlights: Vec<Highlight>,
    /// Status line
    pub status: Option<String>,
}

/// Status line shown in the annotation layer.
///
/// `Safe moves: N · Best guess: (x,y) · Win probability: p%`, with `None`
/// and `Unknown` for missing parts, or `Analysis failed: <error>`.
pub fn status_line(result: &AnalysisResult) -> String {
    if !result.success {
        return format!(
            "Analysis failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    let best_guess = result
        .best_guess
        .map_or_else(|| "None".to_string(), |guess| format!("({},{})", guess.x, guess.y));
    let win = result.win_probability.map_or_else(
        || "Unknown".to_string(),
        |p| format!("{:.1}%", (p * 1000.0).round() / 10.0),
    );
    format!(
        "Safe moves: {} · Best guess: {} · Win probability: {}",
        result.safe_moves.len(),
        best_guess,
        win
    )
}

/// Draws and clears analysis annotations.
pub struct OverlayRenderer {
    document: Arc<dyn HostDocument>,
    locator: Arc<dyn CellLocator>,
    settings: OverlaySettings,
    observer: Option<ObserverHandle>,
    layer: Option<NodeId>,
    labels: Vec<(NodeId, OverlayLabel)>,
    highlights: Vec<(NodeId, Highlight)>,
    status: Option<(NodeId, String)>,
}

impl std::fmt::Debug for OverlayRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayRenderer")
            .field("layer", &self.layer)
            .field("labels", &self.labels.len())
            .field("highlights", &self.highlights.len())
            .finish()
    }
}

impl OverlayRenderer {
    /// Create a renderer. Nothing is written until the first render.
    pub fn new(
        document: Arc<dyn HostDocument>,
        locator: Arc<dyn CellLocator>,
        settings: OverlaySettings,
    ) -> Self {
        Self {
            document,
            locator,
            settings,
            observer: None,
            layer: None,
            labels: Vec::new(),
            highlights: Vec::new(),
            status: None,
        }
    }

    /// Pause this observer around every write.
    pub fn watch(&mut self, observer: ObserverHandle) {
        self.observer = Some(observer);
    }

    fn pause(&self) -> Option<PauseScope> {
        self.observer.as_ref().map(ObserverHandle::pause)
    }

    /// The annotation layer element, once created.
    pub fn layer(&self) -> Option<NodeId> {
        self.layer
    }

    /// Current contents.
    pub fn view(&self) -> OverlayView {
        OverlayView {
            labels: self.labels.iter().map(|(_, label)| label.clone()).collect(),
            highlights: self.highlights.iter().map(|(_, h)| *h).collect(),
            status: self.status.as_ref().map(|(_, text)| text.clone()),
        }
    }

    /// Replace whatever is drawn with `result`.
    ///
    /// Labels are drawn only for cells `snapshot` reports as hidden and
    /// unflagged, and only when `showProbabilities` is on; highlights only
    /// when `highlightMoves` is on. Failed results draw just the status line.
    pub fn render(
        &mut self,
        result: &AnalysisResult,
        snapshot: &BoardSnapshot,
        settings: &Settings,
    ) -> Result<()> {
        let _pause = self.pause();
        self.remove_all()?;
        let layer = self.ensure_layer()?;

        if result.success {
            if settings.show_probabilities {
                self.draw_labels(layer, result, snapshot)?;
            }
            if settings.highlight_moves {
                self.draw_highlights(result)?;
            }
        }
        self.draw_status(layer, status_line(result))?;

        debug!(
            labels = self.labels.len(),
            highlights = self.highlights.len(),
            success = result.success,
            "overlay rendered"
        );
        Ok(())
    }

    /// Remove everything this renderer drew. Idempotent.
    pub fn clear(&mut self) -> Result<()> {
        let _pause = self.pause();
        self.remove_all()
    }

    /// Remove only the probability labels.
    pub fn hide_probabilities(&mut self) -> Result<()> {
        let _pause = self.pause();
        self.remove_labels()
    }

    fn ensure_layer(&mut self) -> Result<NodeId> {
        if let Some(layer) = self.layer.filter(|layer| self.document.contains(*layer)) {
            return Ok(layer);
        }
        if let Some(existing) = self.document.query(&Selector::id(self.settings.layer_id.as_str()))
        {
            self.layer = Some(existing);
            return Ok(existing);
        }

        let doc = &self.document;
        let layer = doc.create_element(doc.body(), "div")?;
        doc.set_attribute(layer, "id", &self.settings.layer_id)?;
        doc.set_attribute(layer, OVERLAY_MARKER, "layer")?;
        for (property, value) in [
            ("position", "absolute"),
            ("top", "0"),
            ("left", "0"),
            ("width", "100%"),
            ("height", "100%"),
            ("pointer-events", "none"),
            ("z-index", "9999"),
        ] {
            doc.set_style(layer, property, value)?;
        }
        debug!(layer = %layer, "annotation layer created");
        self.layer = Some(layer);
        Ok(layer)
    }

    fn draw_labels(
        &mut self,
        layer: NodeId,
        result: &AnalysisResult,
        snapshot: &BoardSnapshot,
    ) -> Result<()> {
        let doc = self.document.clone();
        for (key, probability) in &result.mine_probabilities {
            let Some((x, y)) = parse_cell_key(key) else {
                continue;
            };
            if !snapshot.is_hidden_unflagged(x, y) {
                continue;
            }
            let Some(cell) = self.locator.locate(doc.as_ref(), x, y) else {
                trace!(x, y, "no element for label");
                continue;
            };

            let kind = LabelKind::classify(*probability, &self.settings);
            let text = kind.text(*probability);

            let label = doc.create_element(layer, "div")?;
            doc.set_attribute(label, OVERLAY_MARKER, "label")?;
            doc.add_class(label, LABEL_CLASS)?;
            doc.add_class(label, kind.class())?;
            doc.set_style(label, "position", "absolute")?;
            doc.set_style(label, "pointer-events", "none")?;
            if let Some(rect) = doc.bounding_rect(cell) {
                doc.set_style(label, "left", &format!("{}px", rect.x))?;
                doc.set_style(label, "top", &format!("{}px", rect.y))?;
                doc.set_style(label, "width", &format!("{}px", rect.width))?;
                doc.set_style(label, "height", &format!("{}px", rect.height))?;
            }
            doc.set_text(label, &text)?;

            self.labels.push((label, OverlayLabel { x, y, text, kind }));
        }
        Ok(())
    }

    fn draw_highlights(&mut self, result: &AnalysisResult) -> Result<()> {
        let targets = result
            .safe_moves
            .iter()
            .map(|m| (m.x, m.y, HighlightKind::SafeMove))
            .chain(
                result
                    .best_guess
                    .map(|guess| (guess.x, guess.y, HighlightKind::BestGuess)),
            );

        for (x, y, kind) in targets {
            let Some(cell) = self.locator.locate(self.document.as_ref(), x, y) else {
                continue;
            };
            self.document.add_class(cell, kind.class())?;
            self.highlights.push((cell, Highlight { x, y, kind }));
        }
        Ok(())
    }

    fn draw_status(&mut self, layer: NodeId, text: String) -> Result<()> {
        let doc = &self.document;
        let status = doc.create_element(layer, "div")?;
        doc.set_attribute(status, OVERLAY_MARKER, "status")?;
        doc.add_class(status, STATUS_CLASS)?;
        doc.set_text(status, &text)?;
        self.status = Some((status, text));
        Ok(())
    }

    fn remove_labels(&mut self) -> Result<()> {
        for (node, _) in self.labels.drain(..) {
            if self.document.contains(node) {
                self.document.remove(node)?;
            }
        }
        self.sweep("label")
    }

    fn remove_all(&mut self) -> Result<()> {
        self.remove_labels()?;

        for (node, highlight) in self.highlights.drain(..) {
            if self.document.contains(node) {
                self.document.remove_class(node, highlight.kind.class())?;
            }
        }
        for kind in [HighlightKind::SafeMove, HighlightKind::BestGuess] {
            for node in self.document.query_all(&Selector::class(kind.class())) {
                self.document.remove_class(node, kind.class())?;
            }
        }

        if let Some((node, _)) = self.status.take() {
            if self.document.contains(node) {
                self.document.remove(node)?;
            }
        }
        self.sweep("status")
    }

    /// Remove marked elements left behind by an earlier renderer.
    fn sweep(&self, role: &str) -> Result<()> {
        let selector = Selector::AttrEquals {
            name: OVERLAY_MARKER.to_string(),
            value: role.to_string(),
        };
        for node in self.document.query_all(&selector) {
            if self.document.contains(node) {
                self.document.remove(node)?;
            }
        }
        Ok(())
    }
}

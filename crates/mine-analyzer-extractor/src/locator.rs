//! Locating cell elements in the host document.

use mine_analyzer_core::NodeId;
use mine_analyzer_dom::{HostDocument, Selector};

/// Finds the element for a board coordinate.
pub trait CellLocator: Send + Sync {
    /// Element for `(x, y)`, if present.
    fn locate(&self, document: &dyn HostDocument, x: u16, y: u16) -> Option<NodeId>;

    /// Every cell element currently in the document.
    fn all_cells(&self, document: &dyn HostDocument) -> Vec<NodeId>;

    /// Coordinates carried by a cell element.
    fn coordinates(&self, document: &dyn HostDocument, node: NodeId) -> Option<(u16, u16)>;
}

/// Cells addressed as `#<prefix><x>_<y>` carrying `data-x`/`data-y`.
#[derive(Debug, Clone)]
pub struct IdPatternLocator {
    prefix: String,
}

impl IdPatternLocator {
    /// Create a locator for the given id prefix (e.g. `cell_`).
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The id of the cell at `(x, y)`.
    pub fn cell_id(&self, x: u16, y: u16) -> String {
        format!("{}{x}_{y}", self.prefix)
    }

    fn parse_id(&self, id: &str) -> Option<(u16, u16)> {
        let (x, y) = id.strip_prefix(self.prefix.as_str())?.split_once('_')?;
        Some((x.parse().ok()?, y.parse().ok()?))
    }
}

impl Default for IdPatternLocator {
    fn default() -> Self {
        Self::new("cell_")
    }
}

impl CellLocator for IdPatternLocator {
    fn locate(&self, document: &dyn HostDocument, x: u16, y: u16) -> Option<NodeId> {
        document.query(&Selector::id(self.cell_id(x, y)))
    }

    fn all_cells(&self, document: &dyn HostDocument) -> Vec<NodeId> {
        document.query_all(&Selector::AttrPrefix {
            name: "id".to_string(),
            prefix: self.prefix.clone(),
        })
    }

    fn coordinates(&self, document: &dyn HostDocument, node: NodeId) -> Option<(u16, u16)> {
        let data = |name: &str| {
            document
                .attribute(node, name)
                .and_then(|v| v.trim().parse::<u16>().ok())
        };
        match (data("data-x"), data("data-y")) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => document
                .attribute(node, "id")
                .and_then(|id| self.parse_id(&id)),
        }
    }
}

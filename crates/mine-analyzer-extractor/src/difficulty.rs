//! Difficulty and board dimension resolution.

use tracing::{debug, warn};

use mine_analyzer_core::{Difficulty, MAX_BOARD_SIDE};
use mine_analyzer_dom::{HostDocument, Selector};

const URL_MARKERS: [(&str, Difficulty); 4] = [
    ("/start/1", Difficulty::Beginner),
    ("/start/2", Difficulty::Intermediate),
    ("/start/3", Difficulty::Expert),
    ("/start/4", Difficulty::Custom),
];

/// Resolves the game difficulty and the grid size it implies.
///
/// Sources, in order of preference:
/// 1. the active level selector
/// 2. `/start/<n>` markers in the URL
/// 3. the number of cell elements against the standard sizes
#[derive(Debug, Clone)]
pub struct DifficultyResolver {
    indicator: Selector,
}

impl DifficultyResolver {
    /// Resolver using the given active-level indicator selector.
    pub fn new(indicator: Selector) -> Self {
        Self { indicator }
    }

    /// Difficulty named by the active level selector.
    pub fn from_indicator(&self, document: &dyn HostDocument) -> Option<Difficulty> {
        let node = document.query(&self.indicator)?;
        Difficulty::from_label(&document.text_content(node)?)
    }

    /// Difficulty encoded in the URL.
    pub fn from_url(url: &str) -> Option<Difficulty> {
        URL_MARKERS
            .iter()
            .find(|(marker, _)| url.contains(marker))
            .map(|(_, difficulty)| *difficulty)
    }

    /// Resolve the difficulty given how many cell elements exist.
    pub fn resolve(&self, document: &dyn HostDocument, cell_count: usize) -> Difficulty {
        let difficulty = self
            .from_indicator(document)
            .or_else(|| Self::from_url(&document.url()))
            .or_else(|| Difficulty::from_cell_count(cell_count))
            .unwrap_or(Difficulty::Unknown);
        debug!(%difficulty, cell_count, "difficulty resolved");
        difficulty
    }

    /// Grid size: the standard size for fixed difficulties, otherwise the
    /// largest observed coordinates plus one.
    ///
    /// Derived sizes above [`MAX_BOARD_SIDE`] on either axis yield `None`.
    pub fn dimensions(
        difficulty: Difficulty,
        observed: impl IntoIterator<Item = (u16, u16)>,
    ) -> Option<(u16, u16)> {
        if let Some(dimensions) = difficulty.standard_dimensions() {
            return Some(dimensions);
        }
        let (width, height) = observed
            .into_iter()
            .fold(None, |acc: Option<(u16, u16)>, (x, y)| {
                let (w, h) = acc.unwrap_or((0, 0));
                Some((w.max(x), h.max(y)))
            })
            .map(|(x, y)| (x.saturating_add(1), y.saturating_add(1)))?;
        if width > MAX_BOARD_SIDE || height > MAX_BOARD_SIDE {
            warn!(width, height, "derived board size out of range");
            return None;
        }
        Some((width, height))
    }
}

impl Default for DifficultyResolver {
    fn default() -> Self {
        Self::new(Selector::Classes(vec![
            "level-select-link".to_string(),
            "active".to_string(),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mine_analyzer_dom::{HostTree, MinesweeperPage, PageFixture};

    #[test]
    fn test_indicator_wins() {
        let page = MinesweeperPage::from_fixture(&PageFixture {
            url: "https://minesweeper.online/start/3".to_string(),
            level_label: Some("Intermediate".to_string()),
            ..PageFixture::default()
        })
        .unwrap();
        let resolver = DifficultyResolver::default();
        assert_eq!(resolver.resolve(page.tree(), 81), Difficulty::Intermediate);
    }

    #[test]
    fn test_url_fallback() {
        let tree = HostTree::new("https://minesweeper.online/start/3");
        let resolver = DifficultyResolver::default();
        assert_eq!(resolver.resolve(&tree, 81), Difficulty::Expert);
        assert_eq!(
            DifficultyResolver::from_url("https://x/start/4"),
            Some(Difficulty::Custom)
        );
        assert_eq!(DifficultyResolver::from_url("https://x/"), None);
    }

    #[test]
    fn test_cell_count_fallback() {
        let tree = HostTree::new("https://minesweeper.online/");
        let resolver = DifficultyResolver::default();
        assert_eq!(resolver.resolve(&tree, 256), Difficulty::Intermediate);
        assert_eq!(resolver.resolve(&tree, 480), Difficulty::Expert);
        assert_eq!(resolver.resolve(&tree, 12), Difficulty::Unknown);
    }

    #[test]
    fn test_unrecognized_label_falls_through() {
        let page = MinesweeperPage::from_fixture(&PageFixture {
            url: "https://minesweeper.online/start/2".to_string(),
            level_label: Some("Daily".to_string()),
            ..PageFixture::default()
        })
        .unwrap();
        let resolver = DifficultyResolver::default();
        assert_eq!(resolver.from_indicator(page.tree()), None);
        assert_eq!(resolver.resolve(page.tree(), 81), Difficulty::Intermediate);
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(
            DifficultyResolver::dimensions(Difficulty::Expert, []),
            Some((30, 16))
        );
        assert_eq!(
            DifficultyResolver::dimensions(Difficulty::Custom, [(0, 0), (4, 1), (2, 6)]),
            Some((5, 7))
        );
        assert_eq!(DifficultyResolver::dimensions(Difficulty::Unknown, []), None);
    }

    #[test]
    fn test_dimensions_are_bounded() {
        assert_eq!(
            DifficultyResolver::dimensions(
                Difficulty::Custom,
                [(0, 0), (MAX_BOARD_SIDE - 1, MAX_BOARD_SIDE - 1)]
            ),
            Some((MAX_BOARD_SIDE, MAX_BOARD_SIDE))
        );
        assert_eq!(
            DifficultyResolver::dimensions(Difficulty::Custom, [(0, 0), (MAX_BOARD_SIDE, 3)]),
            None
        );
        assert_eq!(
            DifficultyResolver::dimensions(Difficulty::Unknown, [(2, u16::MAX)]),
            None
        );
    }
}

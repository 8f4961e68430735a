//! Replay versus live game detection.

use mine_analyzer_core::CaptureMode;
use mine_analyzer_dom::{HostDocument, Selector};

const REPLAY_MARKERS: [&str; 2] = ["replay_timeline", "replay_play_btn"];
const REPLAY_URL_PARTS: [&str; 2] = ["replay", "/game/"];

/// Decide whether the page shows a replay or a game in progress.
pub fn detect_capture_mode(document: &dyn HostDocument) -> CaptureMode {
    let has_controls = REPLAY_MARKERS
        .iter()
        .any(|id| document.query(&Selector::id(*id)).is_some());
    let url = document.url();
    if has_controls || REPLAY_URL_PARTS.iter().any(|part| url.contains(part)) {
        CaptureMode::Replay
    } else {
        CaptureMode::Live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mine_analyzer_dom::{HostTree, MinesweeperPage, PageFixture};

    #[test]
    fn test_live_page() {
        let page = MinesweeperPage::beginner().unwrap();
        assert_eq!(detect_capture_mode(page.tree()), CaptureMode::Live);
    }

    #[test]
    fn test_replay_controls() {
        let page = MinesweeperPage::from_fixture(&PageFixture {
            replay: true,
            ..PageFixture::default()
        })
        .unwrap();
        assert_eq!(detect_capture_mode(page.tree()), CaptureMode::Replay);

        let tree = HostTree::new("https://minesweeper.online/");
        tree.append_element(tree.body(), "button", Some("replay_play_btn"), "")
            .unwrap();
        assert_eq!(detect_capture_mode(&tree), CaptureMode::Replay);
    }

    #[test]
    fn test_replay_urls() {
        let tree = HostTree::new("https://minesweeper.online/game/1234");
        assert_eq!(detect_capture_mode(&tree), CaptureMode::Replay);

        tree.set_url("https://minesweeper.online/replay?id=9");
        assert_eq!(detect_capture_mode(&tree), CaptureMode::Replay);

        tree.set_url("https://minesweeper.online/start/3");
        assert_eq!(detect_capture_mode(&tree), CaptureMode::Live);
    }
}

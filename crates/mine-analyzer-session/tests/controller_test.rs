//! Controller lifecycle tests against a fixture page and a scripted solver
//! realm on the shared message channel.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

use mine_analyzer_bridge::{
    BridgeMessage, MessageChannel, Readiness, SanitizedSnapshot, SolverBridge,
};
use mine_analyzer_core::{
    cell_key, AnalysisResult, AnalyzerConfig, CellProbability, CellState, Error, Settings,
};
use mine_analyzer_dom::MinesweeperPage;
use mine_analyzer_session::{
    AnalyzerController, AnalyzerHandle, ChannelSink, MemorySettings, SinkMessage,
};

/// How the scripted solver behaves.
#[derive(Clone, Copy)]
struct Script {
    signal_ready: bool,
    answer: bool,
    delay: Duration,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            signal_ready: true,
            answer: true,
            delay: Duration::from_millis(50),
        }
    }
}

/// Every hidden cell at 0.5 except the bottom-right corner, which is safe.
/// The win probability encodes how many cells were revealed.
fn scripted_result(snapshot: &SanitizedSnapshot) -> AnalysisResult {
    let corner = (snapshot.width - 1, snapshot.height - 1);
    let mut probabilities = BTreeMap::new();
    let mut revealed = 0;
    for cell in &snapshot.cells {
        if cell.state == CellState::Revealed {
            revealed += 1;
        } else if !cell.is_flagged {
            let p = if (cell.x, cell.y) == corner { 0.0 } else { 0.5 };
            probabilities.insert(cell_key(cell.x, cell.y), p);
        }
    }
    AnalysisResult::success(
        vec![CellProbability::new(corner.0, corner.1, 0.0)],
        probabilities,
        Some(CellProbability::new(4, 4, 0.5)),
        Some(revealed as f64 / 100.0),
    )
}

fn spawn_solver(channel: MessageChannel, script: Script, calls: Arc<AtomicUsize>) {
    let mut receiver = channel.subscribe();
    tokio::spawn(async move {
        if script.signal_ready {
            let _ = channel.post(json!({"type": "SOLVER_READY", "components": {"engine": true}}));
        }
        while let Ok(value) = receiver.recv().await {
            let Ok(BridgeMessage::SolveCall {
                correlation_id,
                snapshot,
                ..
            }) = BridgeMessage::parse(&value)
            else {
                continue;
            };
            calls.fetch_add(1, Ordering::SeqCst);
            if !script.answer {
                continue;
            }
            let channel = channel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(script.delay).await;
                let response = BridgeMessage::SolveResult {
                    correlation_id,
                    result: scripted_result(&snapshot),
                };
                if let Ok(value) = response.to_value() {
                    let _ = channel.post(value);
                }
            });
        }
    });
}

struct Harness {
    page: MinesweeperPage,
    handle: AnalyzerHandle,
    sink: UnboundedReceiver<SinkMessage>,
    settings: Arc<MemorySettings>,
    calls: Arc<AtomicUsize>,
}

fn start(page: MinesweeperPage, config: AnalyzerConfig, script: Script) -> Harness {
    start_with_settings(page, config, script, Settings::default())
}

fn start_with_settings(
    page: MinesweeperPage,
    config: AnalyzerConfig,
    script: Script,
    settings: Settings,
) -> Harness {
    let channel = MessageChannel::new();
    let bridge = SolverBridge::new(channel.clone(), Readiness::new(), config.bridge.clone());
    let calls = Arc::new(AtomicUsize::new(0));
    spawn_solver(channel, script, calls.clone());

    let settings = Arc::new(MemorySettings::with_settings(settings));
    let (sink, receiver) = ChannelSink::channel();
    let handle = AnalyzerController::new(
        page.document(),
        bridge,
        settings.clone(),
        Arc::new(sink),
        config,
    )
    .unwrap()
    .spawn();

    Harness {
        page,
        handle,
        sink: receiver,
        settings,
        calls,
    }
}

async fn wait_for_state(handle: &AnalyzerHandle, name: &str) {
    for _ in 0..1000 {
        if handle.get_status().await.unwrap().state.name() == name {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("controller never reached {name}");
}

fn drain(receiver: &mut UnboundedReceiver<SinkMessage>) -> Vec<AnalysisResult> {
    let mut results = Vec::new();
    while let Ok(SinkMessage::AnalysisComplete { result }) = receiver.try_recv() {
        results.push(result);
    }
    results
}

#[tokio::test(start_paused = true)]
async fn test_reaches_ready_and_reports_status() {
    let harness = start(
        MinesweeperPage::beginner().unwrap(),
        AnalyzerConfig::default(),
        Script::default(),
    );
    wait_for_state(&harness.handle, "ready").await;

    let status = harness.handle.get_status().await.unwrap();
    assert!(status.has_board_data);
    assert!(!status.is_replay_mode);
    assert_eq!(status.board_info.as_deref(), Some("9×9, 10 mines (beginner)"));
    assert_eq!(status.board_data.unwrap().cells().len(), 81);
    assert!(status.last_result.is_none());
    assert!(status.message.is_none());

    let json = serde_json::to_value(harness.handle.get_status().await.unwrap()).unwrap();
    assert_eq!(json["hasBoardData"], true);
    assert_eq!(json["state"]["name"], "ready");
}

#[tokio::test(start_paused = true)]
async fn test_foreign_page_is_disabled() {
    let page = MinesweeperPage::new("https://example.com/game", 9, 9, 10).unwrap();
    let harness = start(page, AnalyzerConfig::default(), Script::default());
    wait_for_state(&harness.handle, "disabled").await;

    let result = harness.handle.analyze_current().await.unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("Analyzer disabled"));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(harness.calls.load(Ordering::SeqCst), 0);
    assert!(harness.handle.overlay().await.unwrap().labels.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_solver_disables() {
    let mut config = AnalyzerConfig::default();
    config.bridge.readiness_wait_ms = 2000;
    let script = Script {
        signal_ready: false,
        ..Script::default()
    };
    let harness = start(MinesweeperPage::beginner().unwrap(), config, script);

    tokio::time::sleep(Duration::from_millis(10)).await;
    let early = harness.handle.analyze_current().await.unwrap();
    assert!(early
        .error
        .unwrap()
        .contains("waiting for solver readiness"));

    wait_for_state(&harness.handle, "disabled").await;
    let status = harness.handle.get_status().await.unwrap();
    assert!(status.message.unwrap().starts_with("Analyzer disabled"));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_controller_ignores_page_changes() {
    let mut config = AnalyzerConfig::default();
    config.bridge.readiness_wait_ms = 2000;
    let script = Script {
        signal_ready: false,
        ..Script::default()
    };
    let harness = start(MinesweeperPage::beginner().unwrap(), config, script);
    wait_for_state(&harness.handle, "disabled").await;
    let before = harness.handle.get_status().await.unwrap();

    harness.page.reveal(0, 0, 1).unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let after = harness.handle.get_status().await.unwrap();
    assert_eq!(after.cycle, before.cycle);
    let board = after.board_data.unwrap();
    assert_eq!(board.cell(0, 0).unwrap().state, CellState::Hidden);
    assert_eq!(harness.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_analysis_renders_and_notifies() {
    let mut harness = start(
        MinesweeperPage::beginner().unwrap(),
        AnalyzerConfig::default(),
        Script::default(),
    );
    wait_for_state(&harness.handle, "ready").await;

    let result = harness.handle.analyze_current().await.unwrap();
    assert!(result.success);
    assert_eq!(result.safe_moves.len(), 1);

    let view = harness.handle.overlay().await.unwrap();
    assert_eq!(view.labels.len(), 81);
    assert_eq!(view.highlights.len(), 2);
    assert_eq!(
        view.status.as_deref(),
        Some("Safe moves: 1 · Best guess: (4,4) · Win probability: 0.0%")
    );

    let notified = drain(&mut harness.sink);
    assert_eq!(notified, vec![result.clone()]);

    let status = harness.handle.get_status().await.unwrap();
    assert_eq!(status.last_result, Some(result));
    assert_eq!(status.state.name(), "ready");
}

#[tokio::test(start_paused = true)]
async fn test_overlay_writes_do_not_retrigger() {
    let mut harness = start(
        MinesweeperPage::beginner().unwrap(),
        AnalyzerConfig::default(),
        Script::default(),
    );
    wait_for_state(&harness.handle, "ready").await;
    let cycle = harness.handle.get_status().await.unwrap().cycle;

    harness.handle.analyze_current().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(harness.calls.load(Ordering::SeqCst), 1);
    assert_eq!(drain(&mut harness.sink).len(), 1);
    assert_eq!(harness.handle.get_status().await.unwrap().cycle, cycle);
}

#[tokio::test(start_paused = true)]
async fn test_reveal_triggers_auto_analysis() {
    let mut harness = start(
        MinesweeperPage::beginner().unwrap(),
        AnalyzerConfig::default(),
        Script::default(),
    );
    wait_for_state(&harness.handle, "ready").await;

    // Nothing revealed yet: no automatic run
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(harness.calls.load(Ordering::SeqCst), 0);

    harness.page.reveal(0, 0, 1).unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let notified = drain(&mut harness.sink);
    assert_eq!(notified.len(), 1);
    assert_eq!(notified[0].win_probability, Some(0.01));

    let view = harness.handle.overlay().await.unwrap();
    assert_eq!(view.labels.len(), 80);
    assert!(view.labels.iter().all(|label| (label.x, label.y) != (0, 0)));
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_reveals_runs_once() {
    let mut harness = start(
        MinesweeperPage::beginner().unwrap(),
        AnalyzerConfig::default(),
        Script::default(),
    );
    wait_for_state(&harness.handle, "ready").await;

    for x in 0..5 {
        harness.page.reveal(x, 0, 1).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(harness.calls.load(Ordering::SeqCst), 1);
    let notified = drain(&mut harness.sink);
    assert_eq!(notified.len(), 1);
    assert_eq!(notified[0].win_probability, Some(0.05));
}

#[tokio::test(start_paused = true)]
async fn test_auto_analyze_off() {
    let settings = Settings {
        auto_analyze: false,
        ..Settings::default()
    };
    let mut harness = start_with_settings(
        MinesweeperPage::beginner().unwrap(),
        AnalyzerConfig::default(),
        Script::default(),
        settings,
    );
    wait_for_state(&harness.handle, "ready").await;

    harness.page.reveal(0, 0, 1).unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(harness.calls.load(Ordering::SeqCst), 0);
    assert!(drain(&mut harness.sink).is_empty());

    // The board change was still picked up
    let status = harness.handle.get_status().await.unwrap();
    let board = status.board_data.unwrap();
    assert_eq!(board.cell(0, 0).unwrap().state, CellState::Revealed);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_are_coalesced() {
    let script = Script {
        delay: Duration::from_secs(2),
        ..Script::default()
    };
    let harness = start(
        MinesweeperPage::beginner().unwrap(),
        AnalyzerConfig::default(),
        script,
    );
    wait_for_state(&harness.handle, "ready").await;

    let (a, b, c) = tokio::join!(
        harness.handle.analyze_current(),
        harness.handle.analyze_current(),
        harness.handle.analyze_current(),
    );
    assert!(a.unwrap().success);
    assert!(b.unwrap().success);
    assert!(c.unwrap().success);

    // One run plus one coalesced follow-up
    assert_eq!(harness.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_result_is_discarded() {
    let script = Script {
        delay: Duration::from_secs(5),
        ..Script::default()
    };
    let mut harness = start(
        MinesweeperPage::beginner().unwrap(),
        AnalyzerConfig::default(),
        script,
    );
    wait_for_state(&harness.handle, "ready").await;

    harness.page.reveal(0, 0, 1).unwrap();
    wait_for_state(&harness.handle, "analyzing").await;

    // Board moves on while the first solve is in flight
    harness.page.reveal(1, 0, 1).unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;

    assert_eq!(harness.calls.load(Ordering::SeqCst), 2);
    let notified = drain(&mut harness.sink);
    assert_eq!(notified.len(), 1);
    assert_eq!(notified[0].win_probability, Some(0.02));

    let status = harness.handle.get_status().await.unwrap();
    assert_eq!(status.last_result.unwrap().win_probability, Some(0.02));
}

#[tokio::test(start_paused = true)]
async fn test_solve_timeout_is_reported() {
    let mut config = AnalyzerConfig::default();
    config.bridge.solve_timeout_ms = 1000;
    let script = Script {
        answer: false,
        ..Script::default()
    };
    let mut harness = start(MinesweeperPage::beginner().unwrap(), config, script);
    wait_for_state(&harness.handle, "ready").await;

    let result = harness.handle.analyze_current().await.unwrap();
    assert!(result.is_timeout());

    let view = harness.handle.overlay().await.unwrap();
    assert!(view.labels.is_empty());
    assert_eq!(view.status.as_deref(), Some("Analysis failed: timeout"));

    let status = harness.handle.get_status().await.unwrap();
    assert_eq!(status.message.as_deref(), Some("Analysis failed: timeout"));
    assert_eq!(status.state.name(), "ready");
    assert!(drain(&mut harness.sink).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_toggle_probabilities() {
    let harness = start(
        MinesweeperPage::beginner().unwrap(),
        AnalyzerConfig::default(),
        Script::default(),
    );
    wait_for_state(&harness.handle, "ready").await;
    harness.handle.analyze_current().await.unwrap();

    assert!(!harness.handle.toggle_probabilities().await.unwrap());
    assert!(!harness.settings.current().show_probabilities);
    let view = harness.handle.overlay().await.unwrap();
    assert!(view.labels.is_empty());
    assert_eq!(view.highlights.len(), 2);

    assert!(harness.handle.toggle_probabilities().await.unwrap());
    assert!(harness.settings.current().show_probabilities);
    assert_eq!(harness.handle.overlay().await.unwrap().labels.len(), 81);
}

#[tokio::test(start_paused = true)]
async fn test_vanished_board_clears_overlay() {
    let harness = start(
        MinesweeperPage::beginner().unwrap(),
        AnalyzerConfig::default(),
        Script::default(),
    );
    wait_for_state(&harness.handle, "ready").await;
    harness.handle.analyze_current().await.unwrap();
    let cycle = harness.handle.get_status().await.unwrap().cycle;

    harness.page.set_board_displayed(false).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let status = harness.handle.get_status().await.unwrap();
    assert!(!status.has_board_data);
    assert!(status.board_info.is_none());
    assert_eq!(status.message.as_deref(), Some("No board region found"));
    assert!(status.cycle > cycle);

    let view = harness.handle.overlay().await.unwrap();
    assert!(view.labels.is_empty());
    assert!(view.highlights.is_empty());
    assert!(view.status.is_none());

    let result = harness.handle.analyze_current().await.unwrap();
    assert_eq!(result.error.as_deref(), Some("No board region found"));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_board() {
    let harness = start(
        MinesweeperPage::beginner().unwrap(),
        AnalyzerConfig::default(),
        Script::default(),
    );
    wait_for_state(&harness.handle, "ready").await;

    harness.page.flag(2, 2).unwrap();
    let snapshot = harness.handle.refresh_board().await.unwrap();
    assert_eq!(snapshot.width(), 9);
    assert!(snapshot.cell(2, 2).unwrap().is_flagged);

    harness.page.remove_cell(3, 3).unwrap();
    assert!(matches!(
        harness.handle.refresh_board().await,
        Err(Error::IncompleteSnapshot { missing: 1, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_replay_page_status() {
    let page = MinesweeperPage::from_fixture(&mine_analyzer_dom::PageFixture {
        replay: true,
        ..Default::default()
    })
    .unwrap();
    let harness = start(page, AnalyzerConfig::default(), Script::default());
    wait_for_state(&harness.handle, "ready").await;

    assert!(harness.handle.get_status().await.unwrap().is_replay_mode);
}

#[tokio::test(start_paused = true)]
async fn test_handle_after_stop() {
    let page = MinesweeperPage::beginner().unwrap();
    let harness = start(page, AnalyzerConfig::default(), Script::default());
    wait_for_state(&harness.handle, "ready").await;

    let handle = harness.handle.clone();
    drop(harness);
    // A surviving clone keeps the controller alive
    assert!(handle.get_status().await.is_ok());
}

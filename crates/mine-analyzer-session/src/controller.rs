//! The analyzer controller.
//!
//! One tokio task owns all analyzer state and runs the lifecycle:
//! wait for a board, wait for the solver realm, then loop on mutation bursts
//! and commands, running extract → detect → solve → render. Callers talk to
//! it through a cloneable [`AnalyzerHandle`].
//!
//! Solves run in their own task so commands and mutations keep being served
//! while one is in flight. Triggers arriving during a solve are coalesced
//! into a single follow-up run. A result whose cycle number is older than
//! the controller's current cycle is discarded unrendered.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use mine_analyzer_bridge::SolverBridge;
use mine_analyzer_core::{
    AnalysisResult, AnalyzerConfig, BoardSnapshot, CaptureMode, Error, NodeId, Result, Settings,
};
use mine_analyzer_dom::{HostDocument, MutationRecord, ObserveOptions, Subscription};
use mine_analyzer_extractor::{detect_capture_mode, BoardSnapshotExtractor};

use crate::change::ChangeDetector;
use crate::debounce::Debouncer;
use crate::overlay::{OverlayRenderer, OverlayView};
use crate::settings::{load_settings, SettingsProvider};
use crate::sink::{ResultSink, SinkMessage};
use crate::state::AnalyzerState;

const COMMAND_BUFFER: usize = 32;

/// Snapshot of controller status for host integrations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Whether the page is showing a replay
    pub is_replay_mode: bool,
    /// Whether a valid snapshot is held
    pub has_board_data: bool,
    /// The held snapshot
    pub board_data: Option<BoardSnapshot>,
    /// Lifecycle state
    pub state: AnalyzerState,
    /// Last transient status message
    pub message: Option<String>,
    /// Human description of the board
    pub board_info: Option<String>,
    /// Current analysis cycle
    pub cycle: u64,
    /// Last applied analysis result
    pub last_result: Option<AnalysisResult>,
}

type Waiter = oneshot::Sender<AnalysisResult>;

#[derive(Debug)]
enum Command {
    GetStatus(oneshot::Sender<StatusReport>),
    AnalyzeCurrent(Waiter),
    RefreshBoard(oneshot::Sender<Result<BoardSnapshot>>),
    ToggleProbabilities(oneshot::Sender<Result<bool>>),
    Overlay(oneshot::Sender<OverlayView>),
}

/// Command surface of a running controller.
#[derive(Debug, Clone)]
pub struct AnalyzerHandle {
    commands: mpsc::Sender<Command>,
}

impl AnalyzerHandle {
    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| Error::ControllerStopped)?;
        response.await.map_err(|_| Error::ControllerStopped)
    }

    /// Current status.
    pub async fn get_status(&self) -> Result<StatusReport> {
        self.request(Command::GetStatus).await
    }

    /// Analyze the current board and wait for the outcome.
    ///
    /// Failures (not ready, no board, solver timeout) come back as a failed
    /// [`AnalysisResult`], not as `Err`.
    pub async fn analyze_current(&self) -> Result<AnalysisResult> {
        self.request(Command::AnalyzeCurrent).await
    }

    /// Force a re-extraction and return the fresh snapshot.
    pub async fn refresh_board(&self) -> Result<BoardSnapshot> {
        self.request(Command::RefreshBoard).await?
    }

    /// Flip `showProbabilities`, returning the new value.
    pub async fn toggle_probabilities(&self) -> Result<bool> {
        self.request(Command::ToggleProbabilities).await?
    }

    /// What the overlay currently shows.
    pub async fn overlay(&self) -> Result<OverlayView> {
        self.request(Command::Overlay).await
    }
}

struct InFlight {
    cycle: u64,
    task: JoinHandle<AnalysisResult>,
    waiters: Vec<Waiter>,
}

/// Owns the analyzer lifecycle. Start it with [`AnalyzerController::spawn`].
pub struct AnalyzerController {
    document: Arc<dyn HostDocument>,
    extractor: Arc<BoardSnapshotExtractor>,
    bridge: Arc<SolverBridge>,
    renderer: OverlayRenderer,
    settings: Arc<dyn SettingsProvider>,
    sink: Arc<dyn ResultSink>,
    config: AnalyzerConfig,

    state: AnalyzerState,
    snapshot: Option<BoardSnapshot>,
    result: Option<AnalysisResult>,
    message: Option<String>,
    cycle: u64,

    subscription: Option<Subscription>,
    mutations: Debouncer,
    auto_analyze: Debouncer,
    in_flight: Option<InFlight>,
    queued: Option<Vec<Waiter>>,
}

impl std::fmt::Debug for AnalyzerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerController")
            .field("state", &self.state)
            .field("cycle", &self.cycle)
            .field("has_board_data", &self.snapshot.is_some())
            .finish()
    }
}

impl AnalyzerController {
    /// Build a controller for `document`.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate.
    pub fn new(
        document: Arc<dyn HostDocument>,
        bridge: SolverBridge,
        settings: Arc<dyn SettingsProvider>,
        sink: Arc<dyn ResultSink>,
        config: AnalyzerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let extractor = BoardSnapshotExtractor::new(&config.extraction)?;
        Ok(Self::with_extractor(
            document, extractor, bridge, settings, sink, config,
        ))
    }

    /// Build a controller with a custom extractor (classifier or locator).
    pub fn with_extractor(
        document: Arc<dyn HostDocument>,
        extractor: BoardSnapshotExtractor,
        bridge: SolverBridge,
        settings: Arc<dyn SettingsProvider>,
        sink: Arc<dyn ResultSink>,
        config: AnalyzerConfig,
    ) -> Self {
        let renderer = OverlayRenderer::new(
            document.clone(),
            extractor.locator(),
            config.overlay.clone(),
        );
        Self {
            document,
            extractor: Arc::new(extractor),
            bridge: Arc::new(bridge),
            renderer,
            settings,
            sink,
            mutations: Debouncer::new(config.change.debounce()),
            auto_analyze: Debouncer::new(config.change.auto_analyze_delay()),
            config,
            state: AnalyzerState::Idle,
            snapshot: None,
            result: None,
            message: None,
            cycle: 0,
            subscription: None,
            in_flight: None,
            queued: None,
        }
    }

    /// Start the controller task. It stops when every handle is dropped.
    pub fn spawn(self) -> AnalyzerHandle {
        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(self.run(receiver));
        AnalyzerHandle { commands }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let url = self.document.url();
        if self.config.server.is_target_url(&url) {
            self.observe();
            if !self.start(&mut commands).await {
                return;
            }
        } else {
            self.disable(format!("{url} is not a recognized minesweeper page"));
        }

        self.serve(&mut commands).await;
        debug!("analyzer controller stopped");
    }

    fn observe(&mut self) {
        match self
            .document
            .observe(self.document.body(), ObserveOptions::default())
        {
            Ok(subscription) => {
                self.renderer.watch(subscription.handle());
                self.subscription = Some(subscription);
            }
            Err(e) => warn!(error = %e, "could not observe the page"),
        }
    }

    /// Board and solver readiness. Returns false if every handle is gone.
    async fn start(&mut self, commands: &mut mpsc::Receiver<Command>) -> bool {
        self.state = AnalyzerState::WaitingForBoard;

        let extractor = self.extractor.clone();
        let document = self.document.clone();
        let attempts = self.config.extraction.board_retry_attempts;
        let interval = self.config.extraction.board_retry_interval();
        let found = self
            .serve_until(commands, async move {
                extractor
                    .wait_for_board(document.as_ref(), attempts, interval)
                    .await
            })
            .await;

        match found {
            None => false,
            Some(Ok(board)) => self.on_board_found(board, commands).await,
            Some(Err(e)) => {
                warn!(attempts, "board did not appear, waiting for page changes");
                self.message = Some(e.to_string());
                true
            }
        }
    }

    async fn on_board_found(
        &mut self,
        board: NodeId,
        commands: &mut mpsc::Receiver<Command>,
    ) -> bool {
        info!(board = %board, "board detected");
        if let Err(e) = self.extract() {
            debug!(error = %e, "no initial snapshot, retrying on the next change");
        }
        if let Some(subscription) = self.subscription.as_mut() {
            subscription.drain();
        }

        self.state = AnalyzerState::WaitingForSolverReady;
        let bridge = self.bridge.clone();
        let ready = self
            .serve_until(commands, async move { bridge.wait_ready().await })
            .await;

        match ready {
            None => false,
            Some(Ok(())) => {
                info!("analyzer ready");
                self.state = AnalyzerState::Ready;
                self.message = None;
                self.schedule_auto_analysis().await;
                true
            }
            Some(Err(e)) => {
                self.disable(e.to_string());
                true
            }
        }
    }

    /// Serve commands until `future` completes.
    async fn serve_until<F>(
        &mut self,
        commands: &mut mpsc::Receiver<Command>,
        future: F,
    ) -> Option<F::Output>
    where
        F: Future,
    {
        tokio::pin!(future);
        loop {
            tokio::select! {
                output = &mut future => return Some(output),
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => return None,
                },
            }
        }
    }

    async fn serve(&mut self, commands: &mut mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                record = next_mutation(&mut self.subscription) => match record {
                    Some(_) => self.mutations.record(),
                    None => {
                        warn!("mutation subscription closed");
                        self.subscription = None;
                    }
                },
                records = self.mutations.settled() => {
                    self.on_mutations_settled(records, commands).await;
                }
                _ = self.auto_analyze.settled() => self.begin_analysis(Vec::new()).await,
                (cycle, waiters, result) = join_in_flight(&mut self.in_flight) => {
                    self.on_solved(cycle, waiters, result).await;
                }
            }
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::GetStatus(reply) => {
                let _ = reply.send(self.status());
            }
            Command::AnalyzeCurrent(reply) => {
                if self.state == AnalyzerState::Ready {
                    if let Err(e) = self.extract() {
                        if self.snapshot.is_none() {
                            let _ = reply.send(AnalysisResult::failure(e.to_string()));
                            return;
                        }
                    }
                }
                self.begin_analysis(vec![reply]).await;
            }
            Command::RefreshBoard(reply) => {
                let outcome = self.extract();
                if matches!(outcome, Ok(true)) {
                    self.schedule_auto_analysis().await;
                }
                let snapshot =
                    outcome.and_then(|_| self.snapshot.clone().ok_or(Error::NoBoardRegion));
                let _ = reply.send(snapshot);
            }
            Command::ToggleProbabilities(reply) => {
                let _ = reply.send(self.toggle_probabilities().await);
            }
            Command::Overlay(reply) => {
                let _ = reply.send(self.renderer.view());
            }
        }
    }

    fn status(&self) -> StatusReport {
        let is_replay_mode = self.snapshot.as_ref().map_or_else(
            || detect_capture_mode(self.document.as_ref()) == CaptureMode::Replay,
            BoardSnapshot::is_replay,
        );
        StatusReport {
            is_replay_mode,
            has_board_data: self.snapshot.is_some(),
            board_data: self.snapshot.clone(),
            state: self.state.clone(),
            message: self.message.clone(),
            board_info: self.snapshot.as_ref().map(BoardSnapshot::describe),
            cycle: self.cycle,
            last_result: self.result.clone(),
        }
    }

    /// Re-read the board. Returns whether it changed semantically.
    fn extract(&mut self) -> Result<bool> {
        match self.extractor.extract(self.document.as_ref(), None) {
            Ok(snapshot) => {
                let changed = ChangeDetector::should_reanalyze(self.snapshot.as_ref(), &snapshot);
                if changed {
                    self.cycle += 1;
                    debug!(cycle = self.cycle, "board changed");
                }
                self.snapshot = Some(snapshot);
                Ok(changed)
            }
            Err(Error::NoBoardRegion) => {
                warn!("board region vanished");
                if let Err(e) = self.renderer.clear() {
                    warn!(error = %e, "could not clear overlay");
                }
                if self.snapshot.take().is_some() {
                    self.cycle += 1;
                }
                self.message = Some(Error::NoBoardRegion.to_string());
                Err(Error::NoBoardRegion)
            }
            Err(e @ Error::IncompleteSnapshot { .. }) => {
                debug!(error = %e, "incomplete snapshot, waiting for the next change");
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "extraction failed");
                Err(e)
            }
        }
    }

    async fn on_mutations_settled(
        &mut self,
        records: usize,
        commands: &mut mpsc::Receiver<Command>,
    ) {
        debug!(records, "mutation burst settled");

        if self.state.is_disabled() {
            return;
        }
        if self.state == AnalyzerState::WaitingForBoard {
            if self.extractor.is_board_ready(self.document.as_ref()) {
                if let Some(board) = self.extractor.locate_board(self.document.as_ref()) {
                    self.on_board_found(board, commands).await;
                }
            }
            return;
        }

        if matches!(self.extract(), Ok(true)) {
            self.schedule_auto_analysis().await;
        }
    }

    /// Arm the auto-analysis timer if the settings and board allow it.
    async fn schedule_auto_analysis(&mut self) {
        if !self.state.accepts_analysis() {
            return;
        }
        let has_revealed = self
            .snapshot
            .as_ref()
            .is_some_and(BoardSnapshot::has_revealed_cells);
        if !has_revealed {
            return;
        }
        if load_settings(self.settings.as_ref()).await.auto_analyze {
            self.auto_analyze.record();
        }
    }

    async fn begin_analysis(&mut self, mut waiters: Vec<Waiter>) {
        match &self.state {
            AnalyzerState::Ready => {}
            AnalyzerState::Analyzing => {
                debug!("analysis already running, coalescing trigger");
                self.queued.get_or_insert_with(Vec::new).append(&mut waiters);
                return;
            }
            other => {
                let error = match other {
                    AnalyzerState::Disabled { reason } => Error::Disabled(reason.clone()),
                    AnalyzerState::WaitingForSolverReady => {
                        Error::SolverUnavailable("waiting for solver readiness".to_string())
                    }
                    _ => Error::NoBoardRegion,
                };
                reply_all(waiters, &AnalysisResult::failure(error.to_string()));
                return;
            }
        }

        self.auto_analyze.cancel();
        let Some(snapshot) = self.snapshot.clone() else {
            reply_all(waiters, &AnalysisResult::failure(Error::NoBoardRegion.to_string()));
            return;
        };

        let bridge = self.bridge.clone();
        let options = self.config.solve.clone();
        let timeout = self.config.bridge.solve_timeout();
        let cycle = self.cycle;
        info!(cycle, board = %snapshot.describe(), "analysis started");

        let task = tokio::spawn(async move { bridge.solve(&snapshot, &options, timeout).await });
        self.in_flight = Some(InFlight {
            cycle,
            task,
            waiters,
        });
        self.state = AnalyzerState::Analyzing;
    }

    async fn on_solved(&mut self, cycle: u64, mut waiters: Vec<Waiter>, result: AnalysisResult) {
        if self.state == AnalyzerState::Analyzing {
            self.state = AnalyzerState::Ready;
        }

        if cycle == self.cycle {
            self.apply_result(&result).await;
            reply_all(waiters, &result);
            self.result = Some(result);
        } else {
            debug!(cycle, current = self.cycle, "discarding superseded result");
            if !waiters.is_empty() {
                self.queued.get_or_insert_with(Vec::new).append(&mut waiters);
            }
        }

        if let Some(queued) = self.queued.take() {
            self.begin_analysis(queued).await;
        }
    }

    async fn apply_result(&mut self, result: &AnalysisResult) {
        let settings = load_settings(self.settings.as_ref()).await;
        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = self.renderer.render(result, snapshot, &settings) {
                warn!(error = %e, "overlay render failed");
            }
        }

        if result.success {
            info!(
                cycle = self.cycle,
                safe_moves = result.safe_moves.len(),
                win_probability = ?result.win_probability,
                "analysis complete"
            );
            self.message = None;
            self.sink.notify(SinkMessage::AnalysisComplete {
                result: result.clone(),
            });
        } else {
            let error = result.error.as_deref().unwrap_or("unknown error");
            warn!(cycle = self.cycle, %error, "analysis failed");
            self.message = Some(format!("Analysis failed: {error}"));
        }
    }

    async fn toggle_probabilities(&mut self) -> Result<bool> {
        let mut settings = load_settings(self.settings.as_ref()).await;
        settings.show_probabilities = !settings.show_probabilities;
        self.settings
            .set(HashMap::from([(
                Settings::SHOW_PROBABILITIES.to_string(),
                Value::Bool(settings.show_probabilities),
            )]))
            .await?;

        if settings.show_probabilities {
            if let (Some(result), Some(snapshot)) = (&self.result, &self.snapshot) {
                self.renderer.render(result, snapshot, &settings)?;
            }
        } else {
            self.renderer.hide_probabilities()?;
        }
        info!(show = settings.show_probabilities, "probabilities toggled");
        Ok(settings.show_probabilities)
    }

    fn disable(&mut self, reason: String) {
        warn!(%reason, "analyzer disabled");
        if let Err(e) = self.renderer.clear() {
            warn!(error = %e, "could not clear overlay");
        }
        self.auto_analyze.cancel();
        self.message = Some(Error::Disabled(reason.clone()).to_string());
        self.state = AnalyzerState::Disabled { reason };
    }
}

fn reply_all(waiters: Vec<Waiter>, result: &AnalysisResult) {
    for waiter in waiters {
        let _ = waiter.send(result.clone());
    }
}

async fn next_mutation(subscription: &mut Option<Subscription>) -> Option<MutationRecord> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

async fn join_in_flight(slot: &mut Option<InFlight>) -> (u64, Vec<Waiter>, AnalysisResult) {
    let Some(in_flight) = slot.as_mut() else {
        return std::future::pending().await;
    };
    let result = (&mut in_flight.task)
        .await
        .unwrap_or_else(|e| AnalysisResult::failure(format!("analysis task failed: {e}")));
    let cycle = in_flight.cycle;
    let waiters = std::mem::take(&mut in_flight.waiters);
    *slot = None;
    (cycle, waiters, result)
}

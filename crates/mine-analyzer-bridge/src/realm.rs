//! The solver realm: the far side of the bridge.
//!
//! Hosts a [`SolvingEngine`], announces readiness once every required
//! capability is registered, and answers `SOLVE_CALL` messages with
//! `SOLVE_RESULT` messages tagged with the same correlation id. A response
//! is posted for every well-formed call, even when conversion or solving
//! fails.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use mine_analyzer_core::{AnalysisResult, Result, SolveOptions};

use crate::adapter::{EngineBoard, EngineOutcome};
use crate::channel::MessageChannel;
use crate::correlation::CorrelationId;
use crate::message::BridgeMessage;
use crate::probe::{ProbeOutcome, ReadinessProbe};
use crate::sanitize::SanitizedSnapshot;

/// An opaque solving capability.
pub trait SolvingEngine: Send + Sync {
    /// Engine name for logging.
    fn name(&self) -> &str;

    /// Capabilities this engine provides once installed.
    fn capabilities(&self) -> Vec<String> {
        vec![self.name().to_string()]
    }

    /// Analyze a board. May be slow; runs on a blocking thread.
    fn solve(&self, board: &EngineBoard, options: &SolveOptions) -> Result<EngineOutcome>;
}

/// Tracks which required capabilities have appeared in the realm.
#[derive(Debug)]
pub struct CapabilityRegistry {
    required: BTreeSet<String>,
    present: RwLock<BTreeSet<String>>,
}

impl CapabilityRegistry {
    /// Registry waiting for the given capability names.
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            present: RwLock::new(BTreeSet::new()),
        }
    }

    /// Mark a capability as present.
    pub fn register(&self, name: impl Into<String>) {
        self.present
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into());
    }

    /// Presence of every required capability.
    pub fn status(&self) -> BTreeMap<String, bool> {
        let present = self.present.read().unwrap_or_else(PoisonError::into_inner);
        self.required
            .iter()
            .map(|name| (name.clone(), present.contains(name)))
            .collect()
    }

    /// Whether every required capability is present.
    pub fn all_present(&self) -> bool {
        self.status().values().all(|ready| *ready)
    }
}

type EngineSlot = Arc<RwLock<Option<Arc<dyn SolvingEngine>>>>;

/// Far-side endpoint of the bridge.
pub struct SolverRealm {
    channel: MessageChannel,
    registry: Arc<CapabilityRegistry>,
    engine: EngineSlot,
    probe: ReadinessProbe,
}

impl std::fmt::Debug for SolverRealm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverRealm")
            .field("registry", &self.registry)
            .field("probe", &self.probe)
            .finish()
    }
}

impl SolverRealm {
    /// Create a realm on the channel, requiring the given capabilities.
    pub fn new(
        channel: MessageChannel,
        registry: CapabilityRegistry,
        probe: ReadinessProbe,
    ) -> Self {
        Self {
            channel,
            registry: Arc::new(registry),
            engine: Arc::new(RwLock::new(None)),
            probe,
        }
    }

    /// Install the engine and register its capabilities.
    ///
    /// May be called before or after [`SolverRealm::spawn`].
    pub fn install(&self, engine: Arc<dyn SolvingEngine>) {
        for capability in engine.capabilities() {
            self.registry.register(capability);
        }
        info!(engine = engine.name(), "solving engine installed");
        *self.engine.write().unwrap_or_else(PoisonError::into_inner) = Some(engine);
    }

    /// Capability registry.
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Start the readiness probe and the request listener.
    pub fn spawn(&self) -> JoinHandle<()> {
        let mut receiver = self.channel.subscribe();
        let channel = self.channel.clone();
        let registry = self.registry.clone();
        let engine = self.engine.clone();
        let probe = self.probe;

        let announcer = {
            let channel = channel.clone();
            tokio::spawn(async move {
                let message = match probe.run(|| registry.status()).await {
                    ProbeOutcome::Ready(components) => {
                        info!(?components, "solver components ready");
                        BridgeMessage::SolverReady { components }
                    }
                    ProbeOutcome::Unavailable(error) => {
                        error!(%error, "solver components failed to load");
                        BridgeMessage::SolverError { error }
                    }
                };
                post(&channel, &message);
            })
        };

        tokio::spawn(async move {
            loop {
                let value = match receiver.recv().await {
                    Ok(value) => value,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "solver realm lagged behind the channel");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let Ok(BridgeMessage::SolveCall {
                    correlation_id,
                    snapshot,
                    options,
                }) = BridgeMessage::parse(&value)
                else {
                    continue;
                };

                let current = engine
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                let channel = channel.clone();
                tokio::spawn(async move {
                    let result = answer(current, &correlation_id, snapshot, options).await;
                    post(
                        &channel,
                        &BridgeMessage::SolveResult {
                            correlation_id,
                            result,
                        },
                    );
                });
            }
            announcer.abort();
        })
    }
}

async fn answer(
    engine: Option<Arc<dyn SolvingEngine>>,
    correlation_id: &CorrelationId,
    snapshot: SanitizedSnapshot,
    options: SolveOptions,
) -> AnalysisResult {
    let Some(engine) = engine else {
        error!(correlation_id = %correlation_id, "solve call before an engine was installed");
        return AnalysisResult::failure("solving engine not available");
    };

    let board = match snapshot.into_board() {
        Ok(board) => EngineBoard::from_snapshot(&board),
        Err(e) => {
            error!(correlation_id = %correlation_id, error = %e, "could not rebuild board");
            return AnalysisResult::failure(format!("Failed to create board: {e}"));
        }
    };

    debug!(correlation_id = %correlation_id, engine = engine.name(), "solving");
    let solved = tokio::task::spawn_blocking(move || {
        engine
            .solve(&board, &options)
            .map(|outcome| outcome.into_result(&board))
    })
    .await;

    match solved {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            error!(correlation_id = %correlation_id, error = %e, "solver call failed");
            AnalysisResult::failure(e.to_string())
        }
        Err(e) => {
            error!(correlation_id = %correlation_id, error = %e, "solver task aborted");
            AnalysisResult::failure(format!("solver crashed: {e}"))
        }
    }
}

fn post(channel: &MessageChannel, message: &BridgeMessage) {
    match message.to_value() {
        Ok(value) => {
            if channel.post(value).is_err() {
                debug!(kind = message.kind(), "no listener for message");
            }
        }
        Err(e) => error!(kind = message.kind(), error = %e, "could not encode message"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::EngineAction;
    use mine_analyzer_core::{BoardSnapshot, CaptureMode, Cell, Difficulty, Error};
    use serde_json::json;
    use std::time::Duration;

    struct FixedEngine;

    impl SolvingEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        fn solve(&self, _board: &EngineBoard, _options: &SolveOptions) -> Result<EngineOutcome> {
            Ok(EngineOutcome {
                actions: vec![EngineAction::clear(1, 0, None)],
                ..EngineOutcome::default()
            })
        }
    }

    struct FailingEngine;

    impl SolvingEngine for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        fn solve(&self, _board: &EngineBoard, _options: &SolveOptions) -> Result<EngineOutcome> {
            Err(Error::SolveFailed("no solution".to_string()))
        }
    }

    fn snapshot() -> SanitizedSnapshot {
        let cells = vec![Cell::revealed(0, 0, 1), Cell::hidden(1, 0)];
        let board =
            BoardSnapshot::new(2, 1, 1, Difficulty::Custom, cells, CaptureMode::Live).unwrap();
        SanitizedSnapshot::from_snapshot(&board)
    }

    fn call(id: &str, snapshot: SanitizedSnapshot) -> serde_json::Value {
        BridgeMessage::SolveCall {
            correlation_id: CorrelationId::from(id),
            snapshot,
            options: SolveOptions::default(),
        }
        .to_value()
        .unwrap()
    }

    async fn next_result(
        receiver: &mut tokio::sync::broadcast::Receiver<serde_json::Value>,
    ) -> (CorrelationId, AnalysisResult) {
        loop {
            let value = receiver.recv().await.unwrap();
            if let Ok(BridgeMessage::SolveResult {
                correlation_id,
                result,
            }) = BridgeMessage::parse(&value)
            {
                return (correlation_id, result);
            }
        }
    }

    fn realm(channel: &MessageChannel) -> SolverRealm {
        SolverRealm::new(
            channel.clone(),
            CapabilityRegistry::new(["fixed"]),
            ReadinessProbe::new(Duration::from_millis(10), 3, Duration::from_millis(10)),
        )
    }

    #[test]
    fn test_capability_registry() {
        let registry = CapabilityRegistry::new(["a", "b"]);
        assert!(!registry.all_present());
        registry.register("a");
        assert_eq!(
            registry.status(),
            BTreeMap::from([("a".to_string(), true), ("b".to_string(), false)])
        );
        registry.register("b");
        assert!(registry.all_present());
    }

    #[tokio::test]
    async fn test_answers_with_same_correlation_id() {
        let channel = MessageChannel::new();
        let realm = realm(&channel);
        realm.install(Arc::new(FixedEngine));
        let _task = realm.spawn();
        let mut receiver = channel.subscribe();

        channel.post(call("req-1", snapshot())).unwrap();
        let (id, result) = next_result(&mut receiver).await;

        assert_eq!(id.as_str(), "req-1");
        assert!(result.success);
        assert_eq!(result.safe_moves.len(), 1);
        assert_eq!(result.probability_at(1, 0), Some(0.5));
    }

    #[tokio::test]
    async fn test_failures_still_answer() {
        let channel = MessageChannel::new();
        let realm = realm(&channel);
        realm.install(Arc::new(FailingEngine));
        let _task = realm.spawn();
        let mut receiver = channel.subscribe();

        channel.post(call("req-2", snapshot())).unwrap();
        let (id, result) = next_result(&mut receiver).await;
        assert_eq!(id.as_str(), "req-2");
        assert!(!result.success);
        assert!(result.error.unwrap().contains("no solution"));

        let mut empty = snapshot();
        empty.cells.clear();
        channel.post(call("req-3", empty)).unwrap();
        let (id, result) = next_result(&mut receiver).await;
        assert_eq!(id.as_str(), "req-3");
        assert!(result.error.unwrap().starts_with("Failed to create board"));
    }

    #[tokio::test]
    async fn test_oversized_call_still_answers() {
        let channel = MessageChannel::new();
        let realm = realm(&channel);
        realm.install(Arc::new(FixedEngine));
        let _task = realm.spawn();
        let mut receiver = channel.subscribe();

        let mut huge = snapshot();
        huge.width = u16::MAX;
        huge.height = u16::MAX;
        huge.cells.clear();
        channel.post(call("req-5", huge)).unwrap();

        let (id, result) = next_result(&mut receiver).await;
        assert_eq!(id.as_str(), "req-5");
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Failed to create board"));
    }

    #[tokio::test]
    async fn test_no_engine_installed() {
        let channel = MessageChannel::new();
        let realm = realm(&channel);
        let _task = realm.spawn();
        let mut receiver = channel.subscribe();

        channel.post(call("req-4", snapshot())).unwrap();
        let (_, result) = next_result(&mut receiver).await;
        assert_eq!(result.error.as_deref(), Some("solving engine not available"));
    }

    #[tokio::test]
    async fn test_ignores_foreign_messages() {
        let channel = MessageChannel::new();
        let realm = realm(&channel);
        realm.install(Arc::new(FixedEngine));
        let _task = realm.spawn();
        let mut receiver = channel.subscribe();

        channel.post(json!({"type": "MRA_SOMETHING"})).unwrap();
        channel.post(json!("noise")).unwrap();
        channel.post(call("req-5", snapshot())).unwrap();

        let (id, _) = next_result(&mut receiver).await;
        assert_eq!(id.as_str(), "req-5");
    }

    #[tokio::test(start_paused = true)]
    async fn test_announces_ready() {
        let channel = MessageChannel::new();
        let realm = realm(&channel);
        let mut receiver = channel.subscribe();
        let _task = realm.spawn();
        realm.install(Arc::new(FixedEngine));

        let value = receiver.recv().await.unwrap();
        assert_eq!(value["type"], "SOLVER_READY");
        assert_eq!(value["components"]["fixed"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn test_announces_error_when_capabilities_never_appear() {
        let channel = MessageChannel::new();
        let realm = realm(&channel);
        let mut receiver = channel.subscribe();
        let _task = realm.spawn();

        let value = receiver.recv().await.unwrap();
        assert_eq!(value["type"], "SOLVER_ERROR");
        assert_eq!(value["error"], "Timeout waiting for solver components");
    }
}

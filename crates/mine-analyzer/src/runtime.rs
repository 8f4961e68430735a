//! Wiring of the simulated page, the solver realm and the controller.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use mine_analyzer_bridge::{
    CapabilityRegistry, MessageChannel, Readiness, ReadinessProbe, SolverBridge, SolverRealm,
};
use mine_analyzer_core::{AnalyzerConfig, Result, Settings};
use mine_analyzer_dom::{HostDocument, MinesweeperPage};
use mine_analyzer_session::{AnalyzerController, AnalyzerHandle, LogSink, MemorySettings};

use crate::engine::{LocalEngine, LOCAL_ENGINE};

/// A running analyzer attached to a simulated page.
///
/// The page and the solver realm share nothing with the controller except
/// the host document and the message channel.
#[derive(Debug)]
pub struct AnalyzerRuntime {
    page: MinesweeperPage,
    handle: AnalyzerHandle,
    settings: Arc<MemorySettings>,
    realm: JoinHandle<()>,
}

impl AnalyzerRuntime {
    /// Start the realm and the controller. Must be called inside a tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate.
    pub fn start(page: MinesweeperPage, config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;

        let channel = MessageChannel::new();
        // Subscribe the caller side before the realm can announce readiness
        let bridge = SolverBridge::new(channel.clone(), Readiness::new(), config.bridge.clone());

        let realm = SolverRealm::new(
            channel,
            CapabilityRegistry::new([LOCAL_ENGINE]),
            ReadinessProbe::from_settings(&config.bridge),
        );
        realm.install(Arc::new(LocalEngine::new()));
        let realm = realm.spawn();

        let settings = Arc::new(MemorySettings::new());
        let handle = AnalyzerController::new(
            page.document(),
            bridge,
            settings.clone(),
            Arc::new(LogSink),
            config,
        )?
        .spawn();

        info!(url = %page.document().url(), "analyzer runtime started");
        Ok(Self {
            page,
            handle,
            settings,
            realm,
        })
    }

    /// The simulated page.
    pub fn page(&self) -> &MinesweeperPage {
        &self.page
    }

    /// Controller command surface.
    pub fn handle(&self) -> &AnalyzerHandle {
        &self.handle
    }

    /// Current user settings.
    pub fn settings(&self) -> Settings {
        self.settings.current()
    }
}

impl Drop for AnalyzerRuntime {
    fn drop(&mut self) {
        self.realm.abort();
    }
}

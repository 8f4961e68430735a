//! Settings provider contract.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use mine_analyzer_core::{Result, Settings};

/// External store of user preferences.
///
/// Asynchronous and eventually consistent; keys it does not know are simply
/// absent from the returned mapping.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    /// Read the given keys.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    /// Write a set of values.
    async fn set(&self, values: HashMap<String, Value>) -> Result<()>;
}

/// Read the recognized settings, falling back to defaults if the provider
/// fails.
pub async fn load_settings(provider: &dyn SettingsProvider) -> Settings {
    match provider.get(&Settings::KEYS).await {
        Ok(values) => Settings::from_values(&values),
        Err(e) => {
            warn!(error = %e, "settings unavailable, using defaults");
            Settings::default()
        }
    }
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySettings {
    /// Empty store; every setting reads as its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given settings.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            values: RwLock::new(settings.to_values()),
        }
    }

    /// Typed view of the current contents.
    pub fn current(&self) -> Settings {
        Settings::from_values(&self.values.read().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl SettingsProvider for MemorySettings {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(keys
            .iter()
            .filter_map(|key| values.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn set(&self, values: HashMap<String, Value>) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(values);
        Ok(())
    }
}

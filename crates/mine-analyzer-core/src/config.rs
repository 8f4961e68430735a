//! Configuration types for the analyzer.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Error, SolveOptions};

/// Analyzer configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Server settings
    pub server: ServerSettings,
    /// Board extraction settings
    pub extraction: ExtractionSettings,
    /// Change detection settings
    pub change: ChangeSettings,
    /// Solver bridge settings
    pub bridge: BridgeSettings,
    /// Overlay rendering settings
    pub overlay: OverlaySettings,
    /// Options forwarded to the solver
    pub solve: SolveOptions,
}

impl AnalyzerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: AnalyzerConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        self.extraction.validate()?;

        if self.change.debounce_ms == 0 {
            return Err(Error::Config("change.debounce_ms must be > 0".to_string()));
        }

        self.bridge.validate()?;
        self.overlay.validate()?;

        Ok(())
    }
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Hosts the analyzer activates on (empty = any page)
    pub target_hosts: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            target_hosts: vec!["minesweeper.online".to_string()],
        }
    }
}

impl ServerSettings {
    /// Check if a page URL belongs to the target application.
    ///
    /// Returns true if target_hosts is empty (any page) or if the URL
    /// contains one of the configured hosts.
    pub fn is_target_url(&self, url: &str) -> bool {
        if self.target_hosts.is_empty() {
            return true;
        }
        self.target_hosts.iter().any(|host| url.contains(host.as_str()))
    }
}

/// Board extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Board container selectors, in order of preference
    pub board_selectors: Vec<String>,
    /// Id prefix of cell elements (`cell_` gives `cell_<x>_<y>`)
    pub cell_id_prefix: String,
    /// Attempts while waiting for the board to appear
    pub board_retry_attempts: u32,
    /// Delay between board attempts in milliseconds
    pub board_retry_interval_ms: u64,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            board_selectors: vec![
                "#AreaBlock".to_string(),
                "#game".to_string(),
                ".game-board".to_string(),
            ],
            cell_id_prefix: "cell_".to_string(),
            board_retry_attempts: 20,
            board_retry_interval_ms: 500,
        }
    }
}

impl ExtractionSettings {
    /// Delay between board attempts.
    pub fn board_retry_interval(&self) -> Duration {
        Duration::from_millis(self.board_retry_interval_ms)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.board_selectors.is_empty() {
            return Err(Error::Config(
                "extraction.board_selectors cannot be empty".to_string(),
            ));
        }

        for selector in &self.board_selectors {
            let first = selector.trim().chars().next();
            if !matches!(first, Some('#' | '.' | '[')) && !first.is_some_and(char::is_alphabetic) {
                return Err(Error::Config(format!(
                    "extraction.board_selectors: invalid selector '{selector}'"
                )));
            }
        }

        if self.cell_id_prefix.trim().is_empty() {
            return Err(Error::Config(
                "extraction.cell_id_prefix cannot be empty".to_string(),
            ));
        }

        if self.board_retry_attempts == 0 || self.board_retry_interval_ms == 0 {
            return Err(Error::Config(
                "extraction board retry attempts and interval must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Change detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeSettings {
    /// Quiet window that closes a burst of mutations, in milliseconds
    pub debounce_ms: u64,
    /// Settle delay before an automatic analysis, in milliseconds
    pub auto_analyze_delay_ms: u64,
}

impl Default for ChangeSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            auto_analyze_delay_ms: 500,
        }
    }
}

impl ChangeSettings {
    /// Quiet window as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Settle delay as a duration.
    pub fn auto_analyze_delay(&self) -> Duration {
        Duration::from_millis(self.auto_analyze_delay_ms)
    }
}

/// Solver bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Time allowed for a correlated response, in milliseconds
    pub solve_timeout_ms: u64,
    /// Delay before the solver realm starts polling its capabilities
    pub readiness_grace_ms: u64,
    /// Maximum capability polls before giving up
    pub readiness_attempts: u32,
    /// Delay between capability polls in milliseconds
    pub readiness_interval_ms: u64,
    /// How long the caller waits for the ready event, in milliseconds
    pub readiness_wait_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            solve_timeout_ms: 30_000,
            readiness_grace_ms: 1_000,
            readiness_attempts: 100,
            readiness_interval_ms: 200,
            readiness_wait_ms: 30_000,
        }
    }
}

impl BridgeSettings {
    /// Solve timeout as a duration.
    pub fn solve_timeout(&self) -> Duration {
        Duration::from_millis(self.solve_timeout_ms)
    }

    /// Caller-side readiness wait as a duration.
    pub fn readiness_wait(&self) -> Duration {
        Duration::from_millis(self.readiness_wait_ms)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.solve_timeout_ms == 0 || self.readiness_wait_ms == 0 {
            return Err(Error::Config(
                "bridge timeouts must be > 0".to_string(),
            ));
        }
        if self.readiness_attempts == 0 || self.readiness_interval_ms == 0 {
            return Err(Error::Config(
                "bridge readiness attempts and interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Overlay rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    /// Mine probability at or below which a cell is labelled SAFE
    pub safe_threshold: f64,
    /// Mine probability at or above which a cell is labelled MINE
    pub mine_threshold: f64,
    /// Id of the annotation layer element
    pub layer_id: String,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            safe_threshold: 0.01,
            mine_threshold: 0.99,
            layer_id: "mra-cell-overlay-container".to_string(),
        }
    }
}

impl OverlaySettings {
    fn validate(&self) -> crate::Result<()> {
        let in_range = |p: f64| (0.0..=1.0).contains(&p);
        if !in_range(self.safe_threshold) || !in_range(self.mine_threshold) {
            return Err(Error::Config(
                "overlay thresholds must be within [0, 1]".to_string(),
            ));
        }
        if self.safe_threshold >= self.mine_threshold {
            return Err(Error::Config(
                "overlay.safe_threshold must be below overlay.mine_threshold".to_string(),
            ));
        }
        if self.layer_id.trim().is_empty() {
            return Err(Error::Config("overlay.layer_id cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.extraction.board_retry_attempts, 20);
        assert_eq!(config.extraction.board_retry_interval_ms, 500);
        assert_eq!(config.change.debounce_ms, 100);
        assert_eq!(config.bridge.solve_timeout_ms, 30_000);
        assert_eq!(config.bridge.readiness_attempts, 100);
        assert_eq!(config.bridge.readiness_interval_ms, 200);
        assert_eq!(config.overlay.safe_threshold, 0.01);
        assert_eq!(config.overlay.mine_threshold, 0.99);
    }

    #[test]
    fn test_config_validation() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_debounce() {
        let mut config = AnalyzerConfig::default();
        config.change.debounce_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_thresholds() {
        let mut config = AnalyzerConfig::default();
        config.overlay.safe_threshold = 0.995;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.overlay.mine_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_selectors() {
        let mut config = AnalyzerConfig::default();
        config.extraction.board_selectors.clear();
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.extraction.board_selectors = vec!["%board".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r##"
server:
  log_level: debug
  target_hosts:
    - localhost

extraction:
  board_selectors:
    - "#board"
  cell_id_prefix: "tile_"
  board_retry_attempts: 5
  board_retry_interval_ms: 50

change:
  debounce_ms: 250

bridge:
  solve_timeout_ms: 5000
  readiness_attempts: 10

overlay:
  safe_threshold: 0.05

solve:
  playStyle: 2
  fullBFDA: true
"##;

        let config = AnalyzerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.extraction.board_selectors, vec!["#board"]);
        assert_eq!(config.extraction.cell_id_prefix, "tile_");
        assert_eq!(config.change.debounce_ms, 250);
        assert_eq!(config.change.auto_analyze_delay_ms, 500);
        assert_eq!(config.bridge.solve_timeout(), Duration::from_secs(5));
        assert_eq!(config.bridge.readiness_interval_ms, 200);
        assert_eq!(config.overlay.safe_threshold, 0.05);
        assert_eq!(config.solve.play_style, crate::PlayStyle::NoFlags);
        assert!(config.solve.full_bfda);
    }

    #[test]
    fn test_invalid_yaml() {
        let result = AnalyzerConfig::from_yaml("change: [1, 2");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_target_url() {
        let mut settings = ServerSettings::default();
        assert!(settings.is_target_url("https://minesweeper.online/game/123"));
        assert!(!settings.is_target_url("https://example.com/"));

        settings.target_hosts.clear();
        assert!(settings.is_target_url("https://example.com/"));
    }
}

//! Configuration loading and typed config structures for the console.
//!
//! The canonical configuration lives in `lifescope.yaml` next to the
//! binary. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the
//! file. Every field is optional in the file; a missing file means a
//! fully-defaulted configuration.

use std::path::Path;
use std::time::Duration;

use lifescope_sync::{PollIntervals, SyncConfig};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level console configuration.
///
/// Mirrors the structure of `lifescope.yaml`. All fields have defaults
/// matching a local backend on port 8000.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConsoleConfig {
    /// Backend endpoints.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Poll cadences and fetch limits.
    #[serde(default)]
    pub sync: SyncTuningConfig,

    /// Scene generation settings.
    #[serde(default)]
    pub scene: SceneConfig,

    /// Render loop settings.
    #[serde(default)]
    pub render: RenderConfig,
}

impl ConsoleConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the endpoints:
    /// - `LIFESCOPE_REST_URL` overrides `connection.rest_url`
    /// - `LIFESCOPE_WS_URL` overrides `connection.ws_url`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.connection.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.connection.apply_env_overrides();
        Ok(config)
    }

    /// Assemble the sync session configuration from the loaded settings.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            rest_url: self.connection.rest_url.clone(),
            ws_url: self.connection.ws_url.clone(),
            poll: PollIntervals {
                snapshot: Duration::from_millis(self.sync.snapshot_poll_ms),
                agents: Duration::from_millis(self.sync.agents_poll_ms),
                events: Duration::from_millis(self.sync.events_poll_ms),
                stats: Duration::from_millis(self.sync.stats_poll_ms),
            },
            events_limit: self.sync.events_limit,
        }
    }
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the backend REST API.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,

    /// URL of the backend push channel.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
}

impl ConnectionConfig {
    /// Override endpoint URLs with environment variables when set.
    ///
    /// This allows a deployment to point the console at a remote
    /// backend without modifying the YAML config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LIFESCOPE_REST_URL") {
            self.rest_url = val;
        }
        if let Ok(val) = std::env::var("LIFESCOPE_WS_URL") {
            self.ws_url = val;
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            ws_url: default_ws_url(),
        }
    }
}

/// Poll cadences and fetch limits for the sync session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncTuningConfig {
    /// Milliseconds between simulation snapshot polls.
    #[serde(default = "default_snapshot_poll_ms")]
    pub snapshot_poll_ms: u64,

    /// Milliseconds between agent roster polls.
    #[serde(default = "default_agents_poll_ms")]
    pub agents_poll_ms: u64,

    /// Milliseconds between event feed polls.
    #[serde(default = "default_events_poll_ms")]
    pub events_poll_ms: u64,

    /// Milliseconds between deep-statistics polls.
    #[serde(default = "default_stats_poll_ms")]
    pub stats_poll_ms: u64,

    /// Maximum events requested per poll.
    #[serde(default = "default_events_limit")]
    pub events_limit: u32,
}

impl Default for SyncTuningConfig {
    fn default() -> Self {
        Self {
            snapshot_poll_ms: default_snapshot_poll_ms(),
            agents_poll_ms: default_agents_poll_ms(),
            events_poll_ms: default_events_poll_ms(),
            stats_poll_ms: default_stats_poll_ms(),
            events_limit: default_events_limit(),
        }
    }
}

/// Scene generation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SceneConfig {
    /// Session seed for terrain and territory placement.
    ///
    /// When unset, a random seed is drawn at startup and logged so a
    /// session can be reproduced afterwards.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Render loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderConfig {
    /// Milliseconds between render frames.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Seconds between scene summary log lines.
    #[serde(default = "default_summary_interval_secs")]
    pub summary_interval_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            summary_interval_secs: default_summary_interval_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_rest_url() -> String {
    lifescope_sync::DEFAULT_REST_URL.to_owned()
}

fn default_ws_url() -> String {
    lifescope_sync::DEFAULT_WS_URL.to_owned()
}

const fn default_snapshot_poll_ms() -> u64 {
    3_000
}

const fn default_agents_poll_ms() -> u64 {
    2_000
}

const fn default_events_poll_ms() -> u64 {
    5_000
}

const fn default_stats_poll_ms() -> u64 {
    15_000
}

const fn default_events_limit() -> u32 {
    50
}

const fn default_frame_interval_ms() -> u64 {
    33
}

const fn default_summary_interval_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ConsoleConfig::default();
        assert_eq!(config.connection.rest_url, "http://127.0.0.1:8000/api");
        assert_eq!(config.connection.ws_url, "ws://127.0.0.1:8000/ws");
        assert_eq!(config.sync.snapshot_poll_ms, 3_000);
        assert_eq!(config.sync.events_limit, 50);
        assert_eq!(config.scene.seed, None);
        assert_eq!(config.render.frame_interval_ms, 33);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
connection:
  rest_url: "http://observatory.test:9000/api"
  ws_url: "ws://observatory.test:9000/ws"

sync:
  snapshot_poll_ms: 1000
  agents_poll_ms: 750
  events_poll_ms: 2000
  stats_poll_ms: 30000
  events_limit: 25

scene:
  seed: 1337

render:
  frame_interval_ms: 16
  summary_interval_secs: 10
"#;

        let config = ConsoleConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        // Endpoint fields are skipped here: env vars may override them.
        assert_eq!(config.sync.snapshot_poll_ms, 1000);
        assert_eq!(config.sync.agents_poll_ms, 750);
        assert_eq!(config.sync.stats_poll_ms, 30_000);
        assert_eq!(config.sync.events_limit, 25);
        assert_eq!(config.scene.seed, Some(1337));
        assert_eq!(config.render.frame_interval_ms, 16);
        assert_eq!(config.render.summary_interval_secs, 10);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "scene:\n  seed: 7\n";
        let config = ConsoleConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        // Seed is overridden
        assert_eq!(config.scene.seed, Some(7));
        // Everything else uses defaults
        assert_eq!(config.sync.snapshot_poll_ms, 3_000);
        assert_eq!(config.render.frame_interval_ms, 33);
    }

    #[test]
    fn parse_empty_yaml() {
        let yaml = "";
        let config = ConsoleConfig::parse(yaml);
        assert!(config.is_ok());
    }

    #[test]
    fn sync_config_carries_the_tuning_through() {
        let config = ConsoleConfig {
            sync: SyncTuningConfig {
                snapshot_poll_ms: 1_200,
                events_limit: 10,
                ..SyncTuningConfig::default()
            },
            ..ConsoleConfig::default()
        };

        let sync = config.sync_config();
        assert_eq!(sync.rest_url, config.connection.rest_url);
        assert_eq!(sync.poll.snapshot, Duration::from_millis(1_200));
        assert_eq!(sync.poll.agents, Duration::from_millis(2_000));
        assert_eq!(sync.events_limit, 10);
    }
}

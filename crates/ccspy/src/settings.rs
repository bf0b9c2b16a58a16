//! User settings stored at ~/.claude/ccspy/config.json

use ccspy_analysis::{
    ClientConfig, DEFAULT_API_KEY_VAR, DEFAULT_ENDPOINT, DEFAULT_MODEL, NANO_MODEL,
};
use ccspy_transcript::atomic_write;
use ccspy_watch::{WatchConfig, WatchStart};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: String,
    pub nano_model: String,
    pub endpoint: String,
    /// Environment variable the API key is read from
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub idle_threshold_secs: u64,
    pub token_threshold: usize,
    pub interaction_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            nano_model: NANO_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: DEFAULT_API_KEY_VAR.to_string(),
            timeout_secs: 30,
            poll_interval_ms: 500,
            idle_threshold_secs: 15,
            token_threshold: 1000,
            interaction_limit: 10,
        }
    }
}

impl Settings {
    /// Load settings; a missing file means defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid settings file {}: {}", path.display(), e))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, format!("{}\n", json).as_bytes())?;
        Ok(())
    }

    pub fn client_config(&self, nano: bool) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            model: if nano {
                self.nano_model.clone()
            } else {
                self.model.clone()
            },
            api_key_var: self.api_key_env.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            ..ClientConfig::new()
        }
    }

    /// Interactions per analysis; a CLI value overrides the file, and zero
    /// counts as one
    pub fn interaction_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.interaction_limit).max(1)
    }

    pub fn watch_config(&self, start: WatchStart, interaction_limit: Option<usize>) -> WatchConfig {
        WatchConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            idle_threshold: Duration::from_secs(self.idle_threshold_secs),
            token_threshold: self.token_threshold,
            interaction_limit: self.interaction_limit(interaction_limit),
            start,
            ..WatchConfig::new()
        }
    }
}

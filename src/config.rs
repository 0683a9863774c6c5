//! Configuration Management
//!
//! Handles persistent configuration storage for gce-actions.

use crate::action::DispatchOptions;
use crate::gcp::client::DEFAULT_COMPUTE_ENDPOINT;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

fn default_poll_interval_ms() -> u64 {
    1000
}

/// User configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Default project ID
    #[serde(default)]
    pub project_id: Option<String>,
    /// Default zone
    #[serde(default)]
    pub zone: Option<String>,
    /// Compute Engine API root, for private endpoints or emulators
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Interval between long-running operation polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: None,
            zone: None,
            endpoint: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gce-actions").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`, falling back to defaults
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get effective project (config > gcloud default)
    pub fn effective_project(&self) -> Option<String> {
        self.project_id
            .clone()
            .or_else(crate::gcp::auth::get_default_project)
    }

    /// Get effective zone (config > gcloud default)
    pub fn effective_zone(&self) -> Option<String> {
        self.zone.clone().or_else(crate::gcp::auth::get_default_zone)
    }

    /// Validated API endpoint
    pub fn effective_endpoint(&self) -> Result<String> {
        let endpoint = self.endpoint.as_deref().unwrap_or(DEFAULT_COMPUTE_ENDPOINT);
        let parsed = url::Url::parse(endpoint)
            .with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Endpoint must be http or https: {}", endpoint);
        }

        Ok(endpoint.trim_end_matches('/').to_string())
    }

    /// Options handed to the dispatcher
    pub fn dispatch_options(&self) -> Result<DispatchOptions> {
        Ok(DispatchOptions {
            endpoint: self.effective_endpoint()?,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            default_project: self.effective_project(),
            default_zone: self.effective_zone(),
        })
    }
}

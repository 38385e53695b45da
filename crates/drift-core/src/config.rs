//! driftboard.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::registry::{EnvironmentDescriptor, Registry, ServiceDescriptor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(rename = "environment")]
    pub environments: Vec<EnvironmentDescriptor>,
    #[serde(rename = "service")]
    pub services: Vec<ServiceDescriptor>,
    /// Default baseline environment title. Defaults to the first
    /// configured environment.
    pub baseline: Option<String>,
    pub fetch: Option<FetchSection>,
    pub refresh: Option<RefreshSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSection {
    /// Hard deadline for a full-matrix refresh in milliseconds.
    pub deadline_ms: Option<u64>,
    /// Background poll interval in seconds. 0 disables polling.
    pub poll_interval_secs: Option<u64>,
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DashboardConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Build the validated registry from this config.
    pub fn registry(&self) -> CoreResult<Registry> {
        Registry::new(
            self.environments.clone(),
            self.services.clone(),
            self.baseline.clone(),
        )
    }

    pub fn fetch_timeout(&self) -> Duration {
        let ms = self
            .fetch
            .as_ref()
            .and_then(|f| f.timeout_ms)
            .unwrap_or(5_000);
        Duration::from_millis(ms)
    }

    pub fn refresh_deadline(&self) -> Duration {
        let ms = self
            .refresh
            .as_ref()
            .and_then(|r| r.deadline_ms)
            .unwrap_or(10_000);
        Duration::from_millis(ms)
    }

    /// Background poll interval, `None` when polling is disabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        let secs = self
            .refresh
            .as_ref()
            .and_then(|r| r.poll_interval_secs)
            .unwrap_or(300);
        (secs > 0).then(|| Duration::from_secs(secs))
    }
}

//! Normalized commit model.
//!
//! Every health-check payload, whatever its raw shape, is reduced to a
//! [`ServiceCommitData`] record: a health state plus zero or more named
//! commit entries. The table snapshot is a pure derived view over one
//! such record per (environment, service) pair.

use serde::{Deserialize, Serialize};

/// Health state of one service in one environment.
///
/// `Loading` means the cell's fetch has not settled yet; `Unknown` means
/// the payload arrived but carried no recognizable status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
    Loading,
}

impl HealthState {
    /// Parse the raw `status` string a health-check payload reports.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "HEALTHY" => HealthState::Healthy,
            "DEGRADED" => HealthState::Degraded,
            "UNHEALTHY" => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "HEALTHY",
            HealthState::Degraded => "DEGRADED",
            HealthState::Unhealthy => "UNHEALTHY",
            HealthState::Unknown => "UNKNOWN",
            HealthState::Loading => "LOADING",
        }
    }
}

/// A named (sub-component, commit hash) pair extracted from a version
/// payload. Equality is pair equality on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitEntry {
    /// Sub-component identifier (`"main"` for single-version services,
    /// the mapping key for multi-component services).
    pub name: String,
    /// Commit hash exactly as mapped from the payload. Display
    /// truncation to 7 characters happens in the presentation layer,
    /// never here.
    pub commit: String,
}

impl CommitEntry {
    pub fn new(name: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit: commit.into(),
        }
    }
}

/// Normalized record for one (environment, service) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCommitData {
    /// Service name (registry key).
    pub service: String,
    pub status: HealthState,
    /// Valid commit entries, in payload mapping order. Empty while
    /// loading, after an error, or when the payload carried no
    /// recognizable version field.
    pub commits: Vec<CommitEntry>,
    /// Normalized user-facing error string, if the fetch failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceCommitData {
    /// Record for a cell whose fetch has not settled yet.
    pub fn loading(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            status: HealthState::Loading,
            commits: Vec::new(),
            error: None,
        }
    }

    /// Record for a cell whose fetch failed.
    pub fn errored(service: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            status: HealthState::Unhealthy,
            commits: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// One table row: every configured service for one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentCommits {
    pub environment: String,
    pub services: Vec<ServiceCommitData>,
}

/// Derived, read-only view over all cells.
///
/// Contains a row for every configured environment and an entry for
/// every configured service, in registry order, in every lifecycle
/// state of the system. Recomputed from current cell states on read;
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitTableSnapshot {
    pub environments: Vec<EnvironmentCommits>,
    /// Unix timestamp (seconds) of the last cell write.
    pub last_updated: u64,
}

impl CommitTableSnapshot {
    /// Look up one cell's normalized record.
    pub fn cell(&self, environment: &str, service: &str) -> Option<&ServiceCommitData> {
        self.environments
            .iter()
            .find(|e| e.environment == environment)?
            .services
            .iter()
            .find(|s| s.service == service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_state_parses_known_statuses() {
        assert_eq!(HealthState::parse("HEALTHY"), HealthState::Healthy);
        assert_eq!(HealthState::parse("healthy"), HealthState::Healthy);
        assert_eq!(HealthState::parse("DEGRADED"), HealthState::Degraded);
        assert_eq!(HealthState::parse("UNHEALTHY"), HealthState::Unhealthy);
    }

    #[test]
    fn health_state_defaults_to_unknown() {
        assert_eq!(HealthState::parse("ok"), HealthState::Unknown);
        assert_eq!(HealthState::parse(""), HealthState::Unknown);
    }

    #[test]
    fn commit_entry_equality_is_pair_equality() {
        let a = CommitEntry::new("main", "abc1234");
        let b = CommitEntry::new("main", "abc1234");
        let c = CommitEntry::new("main", "def5678");
        let d = CommitEntry::new("base", "abc1234");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn errored_record_has_no_commits() {
        let data = ServiceCommitData::errored("admin", "Server Down");
        assert_eq!(data.status, HealthState::Unhealthy);
        assert!(data.commits.is_empty());
        assert_eq!(data.error.as_deref(), Some("Server Down"));
    }

    #[test]
    fn snapshot_cell_lookup() {
        let snapshot = CommitTableSnapshot {
            environments: vec![EnvironmentCommits {
                environment: "Staging".to_string(),
                services: vec![ServiceCommitData::loading("admin")],
            }],
            last_updated: 0,
        };
        assert!(snapshot.cell("Staging", "admin").is_some());
        assert!(snapshot.cell("Staging", "alerts").is_none());
        assert!(snapshot.cell("Production", "admin").is_none());
    }
}

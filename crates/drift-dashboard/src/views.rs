//! View types for the dashboard API.
//!
//! These types carry pre-formatted strings and computed fields so the
//! presentation layer stays simple: status color classes, 7-character
//! commit displays, per-cell match status against the baseline, and
//! mismatch detail rows.

use serde::{Deserialize, Serialize};

use drift_agg::{compare, mismatched_entries, MatchStatus, MismatchDetail};
use drift_core::{CommitTableSnapshot, HealthState, Registry, ServiceDescriptor};

/// Server-held UI filter state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub search: String,
    pub mismatches_only: bool,
}

// ── Table View ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub baseline: String,
    /// Visible columns after filtering, in registry order.
    pub columns: Vec<ServiceColumn>,
    pub environments: Vec<EnvironmentRowView>,
    /// Visible vs configured service counts, for the filter badge.
    pub shown_services: usize,
    pub total_services: usize,
    pub last_updated: u64,
    pub last_updated_display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceColumn {
    pub name: String,
    pub display_name: String,
    /// Baseline reference commit for display. Falls back to the first
    /// environment that has data when the baseline itself has none;
    /// the fallback never feeds the match computation.
    pub baseline_commit: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentRowView {
    pub environment: String,
    pub is_baseline: bool,
    pub services: Vec<ServiceCellView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceCellView {
    pub service: String,
    pub status: HealthState,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub status_dot_class: &'static str,
    /// 7-character commit displays, one per sub-component.
    pub commits: Vec<CommitView>,
    /// Headline commit (first entry), `"N/A"` when there is none.
    pub commit_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub match_status: MatchStatus,
    pub match_class: &'static str,
    pub match_icon: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<MismatchDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitView {
    pub name: String,
    pub commit: String,
}

// ── Summary View ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub healthy: usize,
    pub degraded: usize,
    /// Unhealthy plus unknown cells.
    pub unhealthy: usize,
    pub loading: usize,
    pub refreshing: bool,
    pub baseline: String,
    pub filters: Filters,
    pub last_updated: u64,
    pub last_updated_display: String,
}

// ── Builders ────────────────────────────────────────────────────

pub fn build_table_view(
    snapshot: &CommitTableSnapshot,
    registry: &Registry,
    baseline: &str,
    filters: &Filters,
) -> TableView {
    let visible = filtered_services(snapshot, registry, baseline, filters);

    let columns = visible
        .iter()
        .map(|svc| ServiceColumn {
            name: svc.name.clone(),
            display_name: svc.display_name.clone(),
            baseline_commit: baseline_commit_display(snapshot, registry, baseline, &svc.name),
        })
        .collect();

    let environments = snapshot
        .environments
        .iter()
        .map(|row| EnvironmentRowView {
            environment: row.environment.clone(),
            is_baseline: row.environment == baseline,
            services: visible
                .iter()
                .map(|svc| build_cell(snapshot, baseline, &row.environment, &svc.name))
                .collect(),
        })
        .collect();

    TableView {
        baseline: baseline.to_string(),
        columns,
        environments,
        shown_services: visible.len(),
        total_services: registry.services().len(),
        last_updated: snapshot.last_updated,
        last_updated_display: format_timestamp(snapshot.last_updated),
    }
}

fn build_cell(
    snapshot: &CommitTableSnapshot,
    baseline: &str,
    environment: &str,
    service: &str,
) -> ServiceCellView {
    let empty: &[drift_core::CommitEntry] = &[];
    let data = snapshot.cell(environment, service);
    let (status, commits, error) = match data {
        Some(d) => (d.status, d.commits.as_slice(), d.error.clone()),
        None => (HealthState::Unknown, empty, None),
    };

    let baseline_commits = snapshot
        .cell(baseline, service)
        .map(|d| d.commits.as_slice())
        .unwrap_or(empty);

    let match_status = compare(commits, baseline_commits);
    let mismatches = if match_status == MatchStatus::Mismatch {
        mismatched_entries(baseline_commits, commits)
    } else {
        Vec::new()
    };

    ServiceCellView {
        service: service.to_string(),
        status,
        status_label: status.as_str(),
        status_class: status_class(status),
        status_dot_class: status_dot_class(status),
        commits: commits
            .iter()
            .map(|c| CommitView {
                name: c.name.clone(),
                commit: truncate7(&c.commit).to_string(),
            })
            .collect(),
        commit_display: commits
            .first()
            .map(|c| truncate7(&c.commit).to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        error,
        match_status,
        match_class: match_class(match_status),
        match_icon: match_icon(match_status),
        mismatches,
    }
}

pub fn build_summary(
    snapshot: &CommitTableSnapshot,
    refreshing: bool,
    baseline: &str,
    filters: &Filters,
) -> SummaryView {
    let mut healthy = 0;
    let mut degraded = 0;
    let mut unhealthy = 0;
    let mut loading = 0;
    for row in &snapshot.environments {
        for cell in &row.services {
            match cell.status {
                HealthState::Healthy => healthy += 1,
                HealthState::Degraded => degraded += 1,
                HealthState::Unhealthy | HealthState::Unknown => unhealthy += 1,
                HealthState::Loading => loading += 1,
            }
        }
    }
    SummaryView {
        healthy,
        degraded,
        unhealthy,
        loading,
        refreshing,
        baseline: baseline.to_string(),
        filters: filters.clone(),
        last_updated: snapshot.last_updated,
        last_updated_display: format_timestamp(snapshot.last_updated),
    }
}

/// Services that survive the search and mismatches-only filters, in
/// registry order.
pub fn filtered_services<'a>(
    snapshot: &CommitTableSnapshot,
    registry: &'a Registry,
    baseline: &str,
    filters: &Filters,
) -> Vec<&'a ServiceDescriptor> {
    let term = filters.search.trim().to_lowercase();
    registry
        .services()
        .iter()
        .filter(|svc| term.is_empty() || search_matches(snapshot, svc, &term))
        .filter(|svc| !filters.mismatches_only || has_any_drift(snapshot, baseline, &svc.name))
        .collect()
}

/// Search covers the service name and display name plus commit hashes
/// and sub-component names in every environment.
fn search_matches(snapshot: &CommitTableSnapshot, svc: &ServiceDescriptor, term: &str) -> bool {
    if svc.name.to_lowercase().contains(term) || svc.display_name.to_lowercase().contains(term) {
        return true;
    }
    snapshot.environments.iter().any(|row| {
        snapshot
            .cell(&row.environment, &svc.name)
            .map(|d| {
                d.commits.iter().any(|c| {
                    c.commit.to_lowercase().contains(term) || c.name.to_lowercase().contains(term)
                })
            })
            .unwrap_or(false)
    })
}

/// True when any environment is not a clean match against the
/// baseline, including environments with no usable data.
fn has_any_drift(snapshot: &CommitTableSnapshot, baseline: &str, service: &str) -> bool {
    let empty: &[drift_core::CommitEntry] = &[];
    let baseline_commits = snapshot
        .cell(baseline, service)
        .map(|d| d.commits.as_slice())
        .unwrap_or(empty);
    snapshot.environments.iter().any(|row| {
        let commits = snapshot
            .cell(&row.environment, service)
            .map(|d| d.commits.as_slice())
            .unwrap_or(empty);
        compare(commits, baseline_commits) != MatchStatus::Match
    })
}

/// Baseline reference commit for display only. When the nominated
/// baseline environment has no data for the service, probe the other
/// environments in registry order for a usable commit.
pub fn baseline_commit_display(
    snapshot: &CommitTableSnapshot,
    registry: &Registry,
    baseline: &str,
    service: &str,
) -> String {
    let first_commit = |env: &str| {
        snapshot
            .cell(env, service)
            .and_then(|d| d.commits.first())
            .map(|c| truncate7(&c.commit).to_string())
    };
    if let Some(commit) = first_commit(baseline) {
        return commit;
    }
    for env in registry.environments() {
        if let Some(commit) = first_commit(&env.title) {
            return commit;
        }
    }
    "N/A".to_string()
}

// ── Format Helpers ──────────────────────────────────────────────

pub fn truncate7(s: &str) -> &str {
    s.get(..7).unwrap_or(s)
}

pub fn format_timestamp(timestamp_secs: u64) -> String {
    chrono::DateTime::from_timestamp(timestamp_secs as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn status_class(status: HealthState) -> &'static str {
    match status {
        HealthState::Healthy => "text-green-600",
        HealthState::Degraded => "text-yellow-600",
        HealthState::Unhealthy => "text-red-600",
        HealthState::Unknown | HealthState::Loading => "text-gray-600",
    }
}

pub fn status_dot_class(status: HealthState) -> &'static str {
    match status {
        HealthState::Healthy => "bg-green-500",
        HealthState::Degraded => "bg-yellow-500",
        HealthState::Unhealthy => "bg-red-500",
        HealthState::Loading => "bg-blue-500 animate-pulse",
        HealthState::Unknown => "bg-gray-400",
    }
}

pub fn match_class(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Match => "text-green-600",
        MatchStatus::Mismatch => "text-red-600",
        MatchStatus::Indeterminate => "text-gray-500",
    }
}

pub fn match_icon(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Match => "✅",
        MatchStatus::Mismatch => "❌",
        MatchStatus::Indeterminate => "",
    }
}

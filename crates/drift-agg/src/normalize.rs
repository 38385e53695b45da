//! Response normalizer.
//!
//! Reduces the three raw payload shapes to [`ServiceCommitData`]:
//!
//! - single-version: `{status, version: {commit, branch, tag}}`
//! - multi-version: `{status, version: {<name>: {commit, ...}, ...}}`
//! - frontend: `{buildTime, git: {commit, shortCommit, ...}}` with no
//!   top-level status
//!
//! Commit values of `"Error"` or `"N/A"` (or missing ones) are not
//! valid commits: they are excluded entirely and never participate in
//! baseline comparison.

use serde_json::Value;

use drift_core::{
    CommitEntry, HealthState, ServiceCommitData, ServiceDescriptor, FRONTEND_SERVICE,
};

use crate::store::CellState;

/// Normalize one cell into the commit model.
pub fn normalize(service: &ServiceDescriptor, cell: &CellState) -> ServiceCommitData {
    match cell {
        CellState::Loading { .. } => ServiceCommitData::loading(&service.name),
        CellState::Errored { error, .. } => {
            ServiceCommitData::errored(&service.name, error.user_message())
        }
        CellState::Loaded { payload, .. } => normalize_payload(service, payload),
    }
}

fn normalize_payload(service: &ServiceDescriptor, payload: &Value) -> ServiceCommitData {
    // The frontend build-info payload carries no status field; its mere
    // presence means the deployment is serving.
    if service.name == FRONTEND_SERVICE {
        return ServiceCommitData {
            service: service.name.clone(),
            status: HealthState::Healthy,
            commits: payload
                .get(&service.version_path)
                .map(frontend_commits)
                .unwrap_or_default(),
            error: None,
        };
    }

    let status = payload
        .get("status")
        .and_then(Value::as_str)
        .map(HealthState::parse)
        .unwrap_or(HealthState::Unknown);

    let commits = payload
        .get(&service.version_path)
        .map(version_commits)
        .unwrap_or_default();

    ServiceCommitData {
        service: service.name.clone(),
        status,
        commits,
        error: None,
    }
}

/// Extract commits from a `version` value in either shape.
fn version_commits(version: &Value) -> Vec<CommitEntry> {
    // Single-version shape: the version object itself has a commit.
    if let Some(commit) = version.get("commit").and_then(Value::as_str) {
        return if is_valid_commit(commit) {
            vec![CommitEntry::new("main", commit)]
        } else {
            Vec::new()
        };
    }

    // Multi-version shape: name → version object, in mapping order.
    if let Some(map) = version.as_object() {
        return map
            .iter()
            .filter_map(|(name, entry)| {
                entry
                    .get("commit")
                    .and_then(Value::as_str)
                    .filter(|c| is_valid_commit(c))
                    .map(|c| CommitEntry::new(name.clone(), c))
            })
            .collect();
    }

    Vec::new()
}

/// Frontend git info: `shortCommit` is the canonical comparison value,
/// falling back to the first 7 characters of the full commit.
fn frontend_commits(git: &Value) -> Vec<CommitEntry> {
    let short = git
        .get("shortCommit")
        .and_then(Value::as_str)
        .filter(|c| is_valid_commit(c));
    let commit = match short {
        Some(c) => Some(c),
        None => git
            .get("commit")
            .and_then(Value::as_str)
            .filter(|c| is_valid_commit(c))
            .map(truncate7),
    };
    match commit {
        Some(c) => vec![CommitEntry::new("main", c)],
        None => Vec::new(),
    }
}

fn is_valid_commit(commit: &str) -> bool {
    !commit.is_empty() && commit != "Error" && commit != "N/A"
}

fn truncate7(s: &str) -> &str {
    s.get(..7).unwrap_or(s)
}

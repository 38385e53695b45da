//! Aggregation state store.
//!
//! Holds one [`CellState`] per (environment, service) pair, keyed by a
//! composite (environment title, service name) key, total over the
//! cross product from initialization onward. Cell writes replace the
//! whole state under a write lock, so readers never observe a
//! half-updated cell. Snapshot reads are pure and reflect whatever
//! subset of cells has settled without blocking on pending ones.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use drift_core::{CommitTableSnapshot, EnvironmentCommits, Registry};
use drift_fetch::FetchError;

use crate::normalize::normalize;

/// Identifier for one refresh-all invocation.
pub type SessionId = u64;

/// Lifecycle state of one (environment, service) cell.
///
/// Created `Loading` when a fetch starts, replaced exactly once with
/// `Errored` or `Loaded` when the fetch settles, and replaced wholesale
/// by a new `Loading` state when a refresh begins.
#[derive(Debug, Clone, PartialEq)]
pub enum CellState {
    Loading { session: SessionId },
    Errored { session: SessionId, error: FetchError },
    Loaded { session: SessionId, payload: Value },
}

impl CellState {
    pub fn session(&self) -> SessionId {
        match self {
            CellState::Loading { session }
            | CellState::Errored { session, .. }
            | CellState::Loaded { session, .. } => *session,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, CellState::Loading { .. })
    }
}

/// The store. `Clone`-cheap via `Arc` fields is not needed — callers
/// hold it in an `Arc` themselves.
pub struct AggregationStore {
    registry: Arc<Registry>,
    cells: RwLock<HashMap<(String, String), CellState>>,
    /// Session currently allowed to write.
    active_session: AtomicU64,
    /// Highest session closed by the deadline guard (or by settling).
    /// Completions at or below this are discarded.
    closed_through: AtomicU64,
    /// Unix seconds of the last applied write.
    last_updated: AtomicU64,
}

impl AggregationStore {
    /// Create the store with every cell in `Loading` for session 0.
    pub fn new(registry: Arc<Registry>) -> Self {
        let mut cells = HashMap::with_capacity(registry.cell_count());
        for env in registry.environments() {
            for svc in registry.services() {
                cells.insert(
                    (env.title.clone(), svc.name.clone()),
                    CellState::Loading { session: 0 },
                );
            }
        }
        Self {
            registry,
            cells: RwLock::new(cells),
            active_session: AtomicU64::new(0),
            closed_through: AtomicU64::new(0),
            last_updated: AtomicU64::new(epoch_secs()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn active_session(&self) -> SessionId {
        self.active_session.load(Ordering::SeqCst)
    }

    /// Start a new refresh session: bump the active session id and
    /// replace every cell with a fresh `Loading` state for it. Old cell
    /// values are gone before any new fetch is issued, so readers never
    /// see old and new values of one session side by side.
    pub async fn begin_session(&self) -> SessionId {
        // The id is allocated under the write lock so concurrent
        // refreshes reset cells in session order; an older session can
        // never clobber a newer one's states after the lock is won.
        let mut cells = self.cells.write().await;
        let session = self.active_session.fetch_add(1, Ordering::SeqCst) + 1;
        for state in cells.values_mut() {
            *state = CellState::Loading { session };
        }
        self.last_updated.store(epoch_secs(), Ordering::SeqCst);
        debug!(session, "refresh session started");
        session
    }

    /// Close a session: completions tagged with it (or anything older)
    /// are discarded from now on. Idempotent, monotonic.
    pub fn close_session(&self, session: SessionId) {
        self.closed_through.fetch_max(session, Ordering::SeqCst);
    }

    fn is_closed(&self, session: SessionId) -> bool {
        session <= self.closed_through.load(Ordering::SeqCst)
    }

    /// Apply one settled fetch. Returns false when the completion was
    /// discarded because its session is superseded or closed.
    pub async fn commit(
        &self,
        environment: &str,
        service: &str,
        session: SessionId,
        result: Result<Value, FetchError>,
    ) -> bool {
        let mut cells = self.cells.write().await;
        // Checked under the write lock so a concurrent begin_session
        // cannot interleave between the check and the insert.
        if session != self.active_session() || self.is_closed(session) {
            debug!(
                environment,
                service, session, "discarding completion from stale session"
            );
            return false;
        }
        let state = match result {
            Ok(payload) => CellState::Loaded { session, payload },
            Err(error) => CellState::Errored { session, error },
        };
        cells.insert((environment.to_string(), service.to_string()), state);
        self.last_updated.store(epoch_secs(), Ordering::SeqCst);
        true
    }

    /// Current state of one cell. `None` only for pairs outside the
    /// configured matrix.
    pub async fn cell(&self, environment: &str, service: &str) -> Option<CellState> {
        let cells = self.cells.read().await;
        cells
            .get(&(environment.to_string(), service.to_string()))
            .cloned()
    }

    /// Number of settled cells in the active session.
    pub async fn settled_count(&self) -> usize {
        let cells = self.cells.read().await;
        cells.values().filter(|c| c.is_settled()).count()
    }

    /// Build the derived table view from current cell states.
    ///
    /// Pure: repeated calls without intervening writes return
    /// structurally equal snapshots, one row per environment and one
    /// entry per service in registry order.
    pub async fn snapshot(&self) -> CommitTableSnapshot {
        let cells = self.cells.read().await;
        let environments = self
            .registry
            .environments()
            .iter()
            .map(|env| EnvironmentCommits {
                environment: env.title.clone(),
                services: self
                    .registry
                    .services()
                    .iter()
                    .map(|svc| {
                        let state = cells
                            .get(&(env.title.clone(), svc.name.clone()))
                            .cloned()
                            .unwrap_or(CellState::Loading { session: 0 });
                        normalize(svc, &state)
                    })
                    .collect(),
            })
            .collect();
        CommitTableSnapshot {
            environments,
            last_updated: self.last_updated.load(Ordering::SeqCst),
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::{EnvironmentDescriptor, HealthState, ServiceDescriptor};
    use serde_json::json;

    fn test_registry() -> Arc<Registry> {
        let environments = vec![
            EnvironmentDescriptor {
                title: "Staging".to_string(),
                base_url: "https://admin-api.staging.example.com".to_string(),
                frontend_url: None,
            },
            EnvironmentDescriptor {
                title: "Production".to_string(),
                base_url: "https://admin-api.example.com".to_string(),
                frontend_url: None,
            },
        ];
        let services = vec![
            ServiceDescriptor {
                name: "admin".to_string(),
                display_name: "Admin API".to_string(),
                endpoint: "/healthcheck?detailed=true".to_string(),
                version_path: "version".to_string(),
            },
            ServiceDescriptor {
                name: "alerts".to_string(),
                display_name: "Alert Service".to_string(),
                endpoint: "/alert-service/monitoring-service/healthcheck".to_string(),
                version_path: "version".to_string(),
            },
        ];
        Arc::new(Registry::new(environments, services, Some("Production".to_string())).unwrap())
    }

    #[tokio::test]
    async fn initialization_covers_full_cross_product() {
        let store = AggregationStore::new(test_registry());
        for env in ["Staging", "Production"] {
            for svc in ["admin", "alerts"] {
                let cell = store.cell(env, svc).await.unwrap();
                assert_eq!(cell, CellState::Loading { session: 0 });
            }
        }
        assert!(store.cell("Staging", "unknown").await.is_none());
    }

    #[tokio::test]
    async fn snapshot_has_a_row_for_every_pair_in_every_state() {
        let store = AggregationStore::new(test_registry());

        // Startup: everything loading.
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.environments.len(), 2);
        for row in &snapshot.environments {
            assert_eq!(row.services.len(), 2);
            for cell in &row.services {
                assert_eq!(cell.status, HealthState::Loading);
            }
        }

        // Mid-fetch: one cell settled, others untouched.
        let session = store.begin_session().await;
        store
            .commit(
                "Staging",
                "admin",
                session,
                Ok(json!({"status": "HEALTHY", "version": {"commit": "a1b2c3d4"}})),
            )
            .await;
        let snapshot = store.snapshot().await;
        assert_eq!(
            snapshot.cell("Staging", "admin").unwrap().status,
            HealthState::Healthy
        );
        assert_eq!(
            snapshot.cell("Production", "admin").unwrap().status,
            HealthState::Loading
        );

        // Post-error: errored cell present, coverage unchanged.
        store
            .commit("Production", "admin", session, Err(FetchError::Status(503)))
            .await;
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.environments.len(), 2);
        let errored = snapshot.cell("Production", "admin").unwrap();
        assert_eq!(errored.status, HealthState::Unhealthy);
        assert_eq!(errored.error.as_deref(), Some("Server Down"));

        // Post-refresh: everything back to loading.
        store.begin_session().await;
        let snapshot = store.snapshot().await;
        for row in &snapshot.environments {
            for cell in &row.services {
                assert_eq!(cell.status, HealthState::Loading);
            }
        }
    }

    #[tokio::test]
    async fn repeated_snapshots_are_value_equal() {
        let store = AggregationStore::new(test_registry());
        let session = store.begin_session().await;
        store
            .commit(
                "Staging",
                "admin",
                session,
                Ok(json!({"status": "HEALTHY", "version": {"commit": "a1b2c3d4"}})),
            )
            .await;

        let first = store.snapshot().await;
        let second = store.snapshot().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn stale_session_completions_are_discarded() {
        let store = AggregationStore::new(test_registry());
        let first = store.begin_session().await;
        let second = store.begin_session().await;
        assert!(second > first);

        let applied = store
            .commit(
                "Staging",
                "admin",
                first,
                Ok(json!({"status": "HEALTHY", "version": {"commit": "old0000"}})),
            )
            .await;
        assert!(!applied);
        assert_eq!(
            store.cell("Staging", "admin").await.unwrap(),
            CellState::Loading { session: second }
        );

        let applied = store
            .commit(
                "Staging",
                "admin",
                second,
                Ok(json!({"status": "HEALTHY", "version": {"commit": "new0000"}})),
            )
            .await;
        assert!(applied);
        let snapshot = store.snapshot().await;
        assert_eq!(
            snapshot.cell("Staging", "admin").unwrap().commits[0].commit,
            "new0000"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_session_starts_reset_in_session_order() {
        let store = Arc::new(AggregationStore::new(test_registry()));
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.begin_session().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Whatever the interleaving, every cell ends on the newest
        // session: no stale reset may land after a newer one.
        let newest = store.active_session();
        assert_eq!(newest, 32);
        for env in ["Staging", "Production"] {
            for svc in ["admin", "alerts"] {
                assert_eq!(
                    store.cell(env, svc).await.unwrap(),
                    CellState::Loading { session: newest }
                );
            }
        }

        // The newest session is still live and writable.
        let applied = store
            .commit(
                "Staging",
                "admin",
                newest,
                Ok(json!({"status": "HEALTHY", "version": {"commit": "abc1234"}})),
            )
            .await;
        assert!(applied);
    }

    #[tokio::test]
    async fn closed_session_completions_are_discarded() {
        let store = AggregationStore::new(test_registry());
        let session = store.begin_session().await;
        store.close_session(session);

        let applied = store
            .commit(
                "Staging",
                "admin",
                session,
                Ok(json!({"status": "HEALTHY", "version": {"commit": "late000"}})),
            )
            .await;
        assert!(!applied);
        assert_eq!(
            store.cell("Staging", "admin").await.unwrap(),
            CellState::Loading { session }
        );
    }

    #[tokio::test]
    async fn settled_count_tracks_commits() {
        let store = AggregationStore::new(test_registry());
        let session = store.begin_session().await;
        assert_eq!(store.settled_count().await, 0);

        store
            .commit("Staging", "admin", session, Err(FetchError::Timeout))
            .await;
        assert_eq!(store.settled_count().await, 1);
    }
}

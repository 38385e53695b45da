//! Refresh orchestrator.
//!
//! One `refresh_all` invocation is one session: every cell is reset to
//! loading, one fetch per (environment, service) pair is issued
//! concurrently, and the refreshing indicator falls exactly once —
//! when all fetches settle or when the hard deadline fires, whichever
//! comes first. In-flight requests are never aborted; completions of a
//! closed or superseded session are simply discarded by the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use drift_fetch::Fetcher;

use crate::store::AggregationStore;

pub struct RefreshOrchestrator {
    store: Arc<AggregationStore>,
    fetcher: Fetcher,
    deadline: Duration,
    refreshing_tx: watch::Sender<bool>,
}

impl RefreshOrchestrator {
    pub fn new(store: Arc<AggregationStore>, fetcher: Fetcher, deadline: Duration) -> Self {
        let (refreshing_tx, _) = watch::channel(false);
        Self {
            store,
            fetcher,
            deadline,
            refreshing_tx,
        }
    }

    /// Whether a refresh session is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        *self.refreshing_tx.borrow()
    }

    /// Watch the refreshing indicator.
    pub fn subscribe_refreshing(&self) -> watch::Receiver<bool> {
        self.refreshing_tx.subscribe()
    }

    /// Re-fetch the entire matrix.
    ///
    /// A second call while one is in flight supersedes the first: the
    /// session id moves on, so every late completion of the superseded
    /// session is discarded and the indicator is owned by the newest
    /// session alone.
    pub async fn refresh_all(&self) {
        let session = self.store.begin_session().await;
        let _ = self.refreshing_tx.send(true);

        let registry = self.store.registry();
        info!(
            session,
            cells = registry.cell_count(),
            "refresh started"
        );

        let mut handles = Vec::with_capacity(registry.cell_count());
        for env in registry.environments() {
            for svc in registry.services() {
                let url = registry.build_url(env, svc);
                let retry_eligible = svc.is_health_check();
                let environment = env.title.clone();
                let service = svc.name.clone();
                let store = self.store.clone();
                let fetcher = self.fetcher.clone();
                handles.push(tokio::spawn(async move {
                    let result = fetcher.fetch(&url, retry_eligible).await;
                    store.commit(&environment, &service, session, result).await;
                }));
            }
        }

        let all_settled = async {
            for handle in handles {
                let _ = handle.await;
            }
        };

        tokio::select! {
            _ = all_settled => {
                debug!(session, "refresh settled");
            }
            _ = tokio::time::sleep(self.deadline) => {
                warn!(
                    session,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "refresh deadline reached; late results will be discarded"
                );
            }
        }

        self.store.close_session(session);

        // Only the active session owns the indicator; a superseding
        // refresh has taken it over already.
        if self.store.active_session() == session {
            let _ = self.refreshing_tx.send(false);
        }
    }
}

//! drift-dashboard — JSON API and view layer for Driftboard.
//!
//! Provides axum route handlers over the aggregation store and the
//! refresh orchestrator, plus server-held UI state (baseline selection
//! and filters).
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/table` | Commit table with per-cell match status |
//! | GET | `/api/v1/summary` | Status counts and the refreshing flag |
//! | GET | `/api/v1/registry` | Configured environments and services |
//! | POST | `/api/v1/baseline` | Select the baseline environment |
//! | POST | `/api/v1/filter` | Set search / mismatches-only filters |
//! | POST | `/api/v1/refresh` | Trigger a full-matrix refresh |

pub mod handlers;
pub mod views;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::RwLock;

use drift_agg::{AggregationStore, RefreshOrchestrator};

use views::Filters;

/// Mutable UI state shared across handlers.
#[derive(Debug, Clone)]
pub struct UiState {
    /// Selected baseline environment title.
    pub baseline: String,
    pub filters: Filters,
}

/// Shared state for dashboard handlers.
#[derive(Clone)]
pub struct DashboardState {
    pub store: Arc<AggregationStore>,
    pub orchestrator: Arc<RefreshOrchestrator>,
    pub ui: Arc<RwLock<UiState>>,
}

impl DashboardState {
    /// Build state with the baseline defaulting from the registry.
    pub fn new(store: Arc<AggregationStore>, orchestrator: Arc<RefreshOrchestrator>) -> Self {
        let baseline = store.registry().default_baseline().to_string();
        Self {
            store,
            orchestrator,
            ui: Arc::new(RwLock::new(UiState {
                baseline,
                filters: Filters::default(),
            })),
        }
    }
}

/// Build the dashboard API router.
pub fn dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/table", get(handlers::table))
        .route("/summary", get(handlers::summary))
        .route("/registry", get(handlers::registry))
        .route("/baseline", post(handlers::set_baseline))
        .route("/filter", post(handlers::set_filter))
        .route("/refresh", post(handlers::refresh))
        .with_state(state)
}

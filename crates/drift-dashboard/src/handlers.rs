//! Dashboard API handlers.
//!
//! Each handler reads the aggregation store, builds view types, and
//! returns a JSON response. Fetch failures never reach this layer:
//! they are already folded into cell states, so every endpoint stays
//! responsive even when the whole matrix is down.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::views::{build_summary, build_table_view};
use crate::DashboardState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

// ── Reads ──────────────────────────────────────────────────────

/// GET /api/v1/table
pub async fn table(State(state): State<DashboardState>) -> impl IntoResponse {
    let snapshot = state.store.snapshot().await;
    let ui = state.ui.read().await;
    let view = build_table_view(&snapshot, state.store.registry(), &ui.baseline, &ui.filters);
    ApiResponse::ok(view)
}

/// GET /api/v1/summary
pub async fn summary(State(state): State<DashboardState>) -> impl IntoResponse {
    let snapshot = state.store.snapshot().await;
    let ui = state.ui.read().await;
    let view = build_summary(
        &snapshot,
        state.orchestrator.is_refreshing(),
        &ui.baseline,
        &ui.filters,
    );
    ApiResponse::ok(view)
}

#[derive(serde::Serialize)]
pub struct RegistryView {
    environments: Vec<drift_core::EnvironmentDescriptor>,
    services: Vec<drift_core::ServiceDescriptor>,
    default_baseline: String,
}

/// GET /api/v1/registry
pub async fn registry(State(state): State<DashboardState>) -> impl IntoResponse {
    let registry = state.store.registry();
    ApiResponse::ok(RegistryView {
        environments: registry.environments().to_vec(),
        services: registry.services().to_vec(),
        default_baseline: registry.default_baseline().to_string(),
    })
}

// ── Actions ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetBaselineRequest {
    pub environment: String,
}

/// POST /api/v1/baseline
pub async fn set_baseline(
    State(state): State<DashboardState>,
    Json(req): Json<SetBaselineRequest>,
) -> impl IntoResponse {
    if state.store.registry().environment(&req.environment).is_none() {
        return error_response("unknown environment", StatusCode::NOT_FOUND).into_response();
    }
    let mut ui = state.ui.write().await;
    ui.baseline = req.environment.clone();
    info!(baseline = %req.environment, "baseline changed");
    ApiResponse::ok(req.environment).into_response()
}

#[derive(Debug, Deserialize)]
pub struct SetFilterRequest {
    pub search: Option<String>,
    pub mismatches_only: Option<bool>,
}

/// POST /api/v1/filter
pub async fn set_filter(
    State(state): State<DashboardState>,
    Json(req): Json<SetFilterRequest>,
) -> impl IntoResponse {
    let mut ui = state.ui.write().await;
    if let Some(search) = req.search {
        ui.filters.search = search;
    }
    if let Some(mismatches_only) = req.mismatches_only {
        ui.filters.mismatches_only = mismatches_only;
    }
    ApiResponse::ok(ui.filters.clone())
}

/// POST /api/v1/refresh
///
/// Fire-and-forget: the refresh runs in the background; progress is
/// visible through the summary's refreshing flag.
pub async fn refresh(State(state): State<DashboardState>) -> impl IntoResponse {
    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        orchestrator.refresh_all().await;
    });
    (StatusCode::ACCEPTED, ApiResponse::ok("refresh started"))
}

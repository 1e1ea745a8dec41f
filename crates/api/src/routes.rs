//! Administrative routes

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::{AppState, VersionInfo};

/// Build the router with request tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .route("/ping", get(ping_handler))
        .route("/debug", get(debug_handler))
        .route("/empty", get(empty_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /version
async fn version_handler(State(state): State<AppState>) -> ApiResponse<VersionInfo> {
    ApiResponse::ok(VersionInfo::clone(&state.version))
}

/// GET /ping
async fn ping_handler() -> &'static str {
    "OK"
}

/// GET /debug
///
/// Version line followed by the agent's diagnostic dump.
async fn debug_handler(State(state): State<AppState>) -> String {
    let v = &state.version;
    format!(
        "version: {} {} ({}/{})\n{}",
        v.name,
        v.version,
        v.os,
        v.arch,
        state.agent.debug_dump()
    )
}

/// GET /empty
///
/// Discards everything currently queued.
async fn empty_handler(State(state): State<AppState>) -> String {
    let report = state.agent.empty();
    tracing::info!(
        ingest = report.ingest,
        egress = report.egress,
        "queues emptied via API"
    );
    format!(
        "emptied {} items (ingest={} egress={})\n",
        report.total(),
        report.ingest,
        report.egress
    )
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

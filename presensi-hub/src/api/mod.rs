//! REST API for the Presensi hub

pub mod handlers;
pub mod sse;

use crate::state::AppState;
use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))
        // API v1 routes
        .nest(
            "/api/v1",
            Router::new()
                // Scan session endpoints
                .route("/scan", post(handlers::scan))
                .route("/scan/confirm", post(handlers::confirm_scan))
                .route("/scan/cancel", post(handlers::cancel_scan))
                // Roster endpoints
                .route("/roster", get(handlers::list_roster))
                .route("/roster", post(handlers::add_student))
                .route("/roster/attendance", post(handlers::roster_attendance))
                // Read endpoints
                .route("/attendance/:day", get(handlers::get_partition))
                .route("/dashboard", get(handlers::get_dashboard))
                .route("/stats", get(handlers::get_stats))
                // Admin endpoints
                .route(
                    "/operators/:name/records",
                    delete(handlers::delete_operator_records),
                )
                // SSE events
                .route("/events", get(sse::sse_handler)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(_state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "presensi-hub",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/health
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/status
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Slot, session and queue counters plus the dedupe store size.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.coordinator.status();
    Json(serde_json::json!({
        "slot_held": status.slot_held,
        "active_thread_id": status.active_thread_id,
        "active_since": status.active_since,
        "sessions": status.sessions,
        "queued": status.queued,
        "runs_started": state.coordinator.slot().acquisitions(),
        "dedupe_entries": state.dedupe.len(),
    }))
}

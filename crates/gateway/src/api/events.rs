//! Lark event callback endpoint.
//!
//! `POST /lark/events` answers the URL-verification handshake, checks the
//! verification token, drops redelivered events, and hands message events to
//! the coordinator. Lark only needs a 200 within a few seconds; all real work
//! happens on the dispatcher's tasks.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use vmm_lark::event::parse_callback;
use vmm_lark::verify::verify_token;
use vmm_lark::Callback;

use crate::api::api_error;
use crate::state::AppState;

fn ack() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "code": 0 }))).into_response()
}

pub async fn lark_events(State(state): State<AppState>, body: Bytes) -> Response {
    let callback = match parse_callback(&body) {
        Ok(callback) => callback,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable event callback");
            return api_error(StatusCode::BAD_REQUEST, format!("invalid callback: {e}"));
        }
    };

    if !verify_token(state.verification_token.as_deref(), callback.token()) {
        tracing::warn!(event_id = ?callback.event_id(), "callback with bad verification token");
        return api_error(StatusCode::UNAUTHORIZED, "invalid verification token");
    }

    match callback {
        Callback::UrlVerification { challenge, .. } => {
            tracing::info!("url verification handshake");
            Json(serde_json::json!({ "challenge": challenge })).into_response()
        }
        Callback::Ignored {
            event_id,
            event_type,
            ..
        } => {
            tracing::debug!(event_id = %event_id, event_type = %event_type, "event ignored");
            ack()
        }
        Callback::Message {
            event_id, event, ..
        } => {
            if !event_id.is_empty() && !state.dedupe.check_and_insert(&event_id) {
                tracing::debug!(event_id = %event_id, "duplicate delivery dropped");
                return ack();
            }
            let outcome = state.coordinator.ingest(event);
            tracing::debug!(event_id = %event_id, outcome = ?outcome, "event ingested");
            ack()
        }
    }
}

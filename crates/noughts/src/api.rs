//! Request-response routes: session creation and snapshot fetch.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use noughts_protocol::{CreateSessionResponse, ErrorBody, SessionId};
use noughts_session::RegistryError;

use crate::server::ServerState;

/// Body returned by `GET /game/{id}` for unknown or malformed ids.
pub const NOT_FOUND_MESSAGE: &str = "Game not found";

/// `POST /create`: allocates a session and returns its id.
pub(crate) async fn create_session(State(state): State<Arc<ServerState>>) -> Response {
    match state.registry.create_session() {
        Ok(session_id) => Json(CreateSessionResponse { session_id }).into_response(),
        Err(err) => {
            let status = match err {
                RegistryError::Full(_) | RegistryError::IdSpaceExhausted(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            tracing::warn!(error = %err, "session creation failed");
            (status, Json(ErrorBody::new(err.to_string()))).into_response()
        }
    }
}

/// `GET /game/{id}`: the session's snapshot, or 404.
pub(crate) async fn fetch_session(
    State(state): State<Arc<ServerState>>,
    Path(raw_id): Path<String>,
) -> Response {
    let session = SessionId::parse(&raw_id)
        .ok()
        .and_then(|id| state.registry.get_session(&id).ok());

    match session {
        Some(session) => Json(session.snapshot()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(ErrorBody::new(NOT_FOUND_MESSAGE))).into_response(),
    }
}

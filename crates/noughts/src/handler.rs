//! Per-connection handler: admission, outbound writer and intent routing.
//!
//! Each upgraded socket gets its own Tokio task running this handler.
//! The flow is:
//!   1. Admit the connection into its session's group → role bound
//!   2. Spawn a writer task draining the connection's outbound queue
//!   3. Loop: receive client messages → forward intents to the group

use std::sync::Arc;

use axum::Json;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use noughts_hub::{Admission, HubError};
use noughts_protocol::{ClientMessage, CloseCode, Codec, ErrorBody, ServerMessage, SessionId};
use noughts_session::RegistryError;
use noughts_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::NoughtsError;
use crate::server::ServerState;

/// Drop guard that removes a connection from the hub when the handler
/// exits, on every path including panics. `Drop` is synchronous, so the
/// async removal runs on a spawned task.
///
/// A half-open socket is only noticed by the idle timeout, so its seat
/// stays taken until then and a reconnect in the meantime gets 4001.
struct AdmissionGuard {
    session_id: SessionId,
    conn_id: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        let session_id = self.session_id.clone();
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut hub = state.hub.lock().await;
            if let Err(e) = hub.remove(&session_id, conn_id).await {
                tracing::debug!(%session_id, %conn_id, error = %e, "remove failed");
            }
        });
    }
}

/// `GET /ws/{id}`: validates the id, then upgrades.
pub(crate) async fn upgrade(
    State(state): State<Arc<ServerState>>,
    Path(raw_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    let session_id = match SessionId::parse(&raw_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(%raw_id, error = %e, "rejected upgrade");
            return (StatusCode::BAD_REQUEST, Json(ErrorBody::new(e.to_string()))).into_response();
        }
    };

    ws.on_upgrade(move |socket| async move {
        let conn = WebSocketConnection::new(socket);
        if let Err(e) = handle_connection(conn, session_id, state).await {
            tracing::debug!(error = %e, "connection ended with error");
        }
    })
}

/// Handles a single connection from admission to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    session_id: SessionId,
    state: Arc<ServerState>,
) -> Result<(), NoughtsError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let (tx, rx) = mpsc::unbounded_channel();

    // --- Step 1: Admission ---
    // Lock only for the admission, drop before any network I/O.
    let admitted = {
        let mut hub = state.hub.lock().await;
        hub.admit(&session_id, conn_id, tx).await
    };

    let admission = match admitted {
        Ok(admission) => admission,
        Err(e) => {
            let code = close_code_for(&e);
            tracing::info!(%session_id, %conn_id, error = %e, "admission refused");
            let _ = conn.close(code.as_u16(), code.reason()).await;
            return Err(e.into());
        }
    };

    // Admitted: from here on every exit path leaves the group.
    let _guard = AdmissionGuard {
        session_id: session_id.clone(),
        conn_id,
        state: Arc::clone(&state),
    };
    tracing::info!(%session_id, %conn_id, role = %admission.role, "player connected");

    // --- Step 2: Writer ---
    let writer = tokio::spawn(write_outbound(Arc::clone(&conn), state.codec, rx));

    // --- Step 3: Read loop ---
    let result = read_intents(&conn, &state, &admission).await;

    writer.abort();
    // _guard drops here → removal from the hub fires.
    result
}

/// Drains the outbound queue onto the socket until either side closes.
async fn write_outbound(
    conn: Arc<WebSocketConnection>,
    codec: impl Codec,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
) {
    let conn_id = conn.id();
    while let Some(msg) = rx.recv().await {
        let bytes = match codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "failed to encode outbound message");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, writer stopping");
            break;
        }
    }
}

async fn read_intents(
    conn: &WebSocketConnection,
    state: &ServerState,
    admission: &Admission,
) -> Result<(), NoughtsError> {
    let conn_id = conn.id();

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                return Ok(());
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                return Err(e.into());
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection idle, closing");
                let code = CloseCode::IdleTimeout;
                let _ = conn.close(code.as_u16(), code.reason()).await;
                return Ok(());
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "ignoring malformed client message");
                continue;
            }
        };

        admission.handle.dispatch(conn_id, msg).await?;
    }
}

fn close_code_for(err: &HubError) -> CloseCode {
    match err {
        HubError::SessionFull(_) => CloseCode::SessionFull,
        HubError::Registry(RegistryError::Full(_) | RegistryError::IdSpaceExhausted(_)) => {
            CloseCode::RegistryFull
        }
        _ => CloseCode::UnknownError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_code_for_hub_errors() {
        let id = SessionId::parse("ABCDE").unwrap();
        assert_eq!(
            close_code_for(&HubError::SessionFull(id.clone())),
            CloseCode::SessionFull
        );
        assert_eq!(
            close_code_for(&HubError::Registry(RegistryError::Full(10))),
            CloseCode::RegistryFull
        );
        assert_eq!(
            close_code_for(&HubError::Unavailable(id)),
            CloseCode::UnknownError
        );
    }
}

//! Error types for the hub layer.

use noughts_protocol::SessionId;
use noughts_session::RegistryError;

/// Errors that can occur during hub operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Both roles of the session are already bound to live connections.
    #[error("session {0} is full")]
    SessionFull(SessionId),

    /// The registry refused the operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The session's group actor has stopped or its mailbox is closed.
    #[error("session group {0} is unavailable")]
    Unavailable(SessionId),
}

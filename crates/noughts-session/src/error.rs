//! Error types for the session layer.

use noughts_protocol::{Mark, SessionId};

/// Why a move was refused. A rejected move never changes the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The game already has a winner or ended in a draw.
    #[error("game is over")]
    GameOver,

    /// The submitting mark is not the one due to move.
    #[error("not {got}'s turn (expected {expected})")]
    NotYourTurn { expected: Mark, got: Mark },

    /// The cell index is outside `0..9`.
    #[error("cell {0} is out of bounds")]
    OutOfBounds(usize),

    /// The cell already holds a mark.
    #[error("cell {0} is occupied")]
    Occupied(usize),
}

/// Errors that can occur in registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No session exists for the given id (never created, or evicted).
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// A move was refused by the game rules.
    #[error("move rejected: {0}")]
    Rejected(#[from] Rejection),

    /// The registry already holds `max_sessions` sessions.
    #[error("session registry is full ({0} sessions)")]
    Full(usize),

    /// Every generated id collided with a live session.
    #[error("could not allocate a free session id after {0} attempts")]
    IdSpaceExhausted(usize),
}

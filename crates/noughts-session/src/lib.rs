//! Authoritative game state for noughts.
//!
//! This crate owns the truth about every game:
//!
//! 1. **Rules** ([`evaluate`], [`WINNING_LINES`]) for a 3×3 board
//! 2. **Sessions** ([`Session`]) with turn order, outcome and scores
//! 3. **Registry** ([`SessionRegistry`]) storing sessions by id, with
//!    capacity and idle-eviction policy ([`RegistryConfig`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Hub Layer (above)  ← one actor per session calls into the registry
//!     ↕
//! Session Layer (this crate)  ← validates and applies moves
//!     ↕
//! Protocol Layer (below)  ← provides SessionId, Mark, SessionSnapshot
//! ```

mod error;
mod game;
mod registry;
mod session;

pub use error::{Rejection, RegistryError};
pub use game::{Board, CELLS, Evaluation, WINNING_LINES, evaluate};
pub use registry::SessionRegistry;
pub use session::{RegistryConfig, Session};

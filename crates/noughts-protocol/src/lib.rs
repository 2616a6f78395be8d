//! Wire protocol for noughts.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`SessionId`], [`SessionSnapshot`], [`ClientMessage`],
//!   [`ServerMessage`], …): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about connections or game rules.
//!
//! ```text
//! Transport (bytes) → Protocol (messages) → Session registry / Hub
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, CloseCode, CreateSessionResponse, ErrorBody, Mark, SESSION_ID_ALPHABET,
    SESSION_ID_LEN, Scores, ServerMessage, SessionId, SessionSnapshot, Winner,
};

//! # noughts
//!
//! Real-time tic-tac-toe session server.
//!
//! Clients create a session over HTTP, then both players connect to it
//! over WebSocket. The server owns the board: it validates every move,
//! applies it and broadcasts the resulting state to both players.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use noughts::prelude::*;
//!
//! # async fn run() -> Result<(), NoughtsError> {
//! let config = ServerConfig::from_env()?;
//! let server = NoughtsServer::builder().config(config).build().await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Routes
//!
//! | method | path         | purpose                                   |
//! |--------|--------------|-------------------------------------------|
//! | POST   | `/create`    | create a session, returns `{"sessionId"}` |
//! | GET    | `/game/{id}` | fetch a session snapshot                  |
//! | GET    | `/ws/{id}`   | join a session over WebSocket             |

mod api;
mod config;
mod error;
mod handler;
mod server;
pub mod telemetry;

pub use api::NOT_FOUND_MESSAGE;
pub use config::ServerConfig;
pub use error::{ConfigError, NoughtsError};
pub use server::{NoughtsServer, NoughtsServerBuilder};

/// Everything needed to run a server or talk to one.
pub mod prelude {
    pub use crate::{ConfigError, NoughtsError, NoughtsServer, NoughtsServerBuilder, ServerConfig};
    pub use noughts_hub::{Admission, GroupHandle, Hub, HubConfig, HubError};
    pub use noughts_protocol::{
        ClientMessage, CloseCode, Codec, CreateSessionResponse, ErrorBody, JsonCodec, Mark,
        ProtocolError, Scores, ServerMessage, SessionId, SessionSnapshot, Winner,
    };
    pub use noughts_session::{Rejection, RegistryConfig, RegistryError, Session, SessionRegistry};
    pub use noughts_transport::{Connection, ConnectionId, TransportError};
}

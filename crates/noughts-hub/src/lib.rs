//! Connection hub for noughts.
//!
//! Each session with connected players runs as an isolated Tokio task
//! (actor model) that owns the session's fan-out set and role bindings.
//!
//! # Key types
//!
//! - [`Hub`]: admits and removes connections, one group per session
//! - [`GroupHandle`]: send intents and broadcasts to a running group
//! - [`Admission`]: the role a connection was bound to, plus its handle
//! - [`HubConfig`]: mailbox sizing

mod config;
mod error;
mod group;
mod hub;

pub use config::HubConfig;
pub use error::HubError;
pub use group::{ConnectionSender, GroupHandle};
pub use hub::{Admission, Hub};

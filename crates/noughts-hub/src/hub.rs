//! The hub: routes connections to their session's group actor.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use noughts_protocol::{Mark, ServerMessage, SessionId};
use noughts_session::SessionRegistry;
use noughts_transport::ConnectionId;

use crate::group::spawn_group;
use crate::{ConnectionSender, GroupHandle, HubConfig, HubError};

/// The result of admitting a connection.
pub struct Admission {
    /// The role bound to the connection for as long as it stays.
    pub role: Mark,
    /// Handle for dispatching the connection's intents.
    pub handle: GroupHandle,
}

/// Tracks one group actor per session that has connected players.
///
/// This is the entry point for connection bookkeeping from the server.
/// It is not internally synchronized; the server keeps it behind a
/// mutex and holds the lock only for admission and removal. Intents
/// bypass the hub and go straight to the [`GroupHandle`].
pub struct Hub {
    registry: Arc<SessionRegistry>,
    groups: HashMap<SessionId, GroupHandle>,
    config: HubConfig,
}

impl Hub {
    pub fn new(registry: Arc<SessionRegistry>, config: HubConfig) -> Self {
        Self {
            registry,
            groups: HashMap::new(),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Admits a connection into a session's group.
    ///
    /// Creates the session if it is unknown and spawns the group actor
    /// if nobody is connected yet. The connection receives a snapshot
    /// first; when the group reaches two members, everyone receives the
    /// snapshot with `playerJoined` set.
    ///
    /// # Errors
    /// - [`HubError::SessionFull`] if both roles are taken
    /// - [`HubError::Registry`] if the session cannot be created
    /// - [`HubError::Unavailable`] if the group actor has stopped
    pub async fn admit(
        &mut self,
        session_id: &SessionId,
        conn_id: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<Admission, HubError> {
        self.registry.get_or_create(session_id)?;

        let handle = self
            .groups
            .entry(session_id.clone())
            .or_insert_with(|| {
                spawn_group(
                    session_id.clone(),
                    Arc::clone(&self.registry),
                    self.config.mailbox_size,
                )
            })
            .clone();

        match handle.join(conn_id, sender).await {
            Ok(role) => Ok(Admission { role, handle }),
            Err(HubError::Unavailable(id)) => {
                self.groups.remove(&id);
                Err(HubError::Unavailable(id))
            }
            Err(err) => Err(err),
        }
    }

    /// Removes a connection from its session's group.
    ///
    /// The group is shut down once empty. The session itself stays in
    /// the registry until the reaper evicts it.
    pub async fn remove(
        &mut self,
        session_id: &SessionId,
        conn_id: ConnectionId,
    ) -> Result<(), HubError> {
        let Some(handle) = self.groups.get(session_id) else {
            tracing::debug!(%session_id, %conn_id, "no group to leave");
            return Ok(());
        };

        let remaining = match handle.leave(conn_id).await {
            Ok(remaining) => remaining,
            Err(err) => {
                self.groups.remove(session_id);
                return Err(err);
            }
        };

        if remaining == 0 {
            if let Some(handle) = self.groups.remove(session_id) {
                let _ = handle.shutdown().await;
            }
            tracing::info!(%session_id, "group closed");
        }
        Ok(())
    }

    /// Sends `msg` to every connection in the session's group. A session
    /// with no connections is a no-op.
    pub async fn broadcast(
        &self,
        session_id: &SessionId,
        msg: ServerMessage,
    ) -> Result<(), HubError> {
        match self.groups.get(session_id) {
            Some(handle) => handle.broadcast(msg).await,
            None => Ok(()),
        }
    }

    /// Ids of sessions that currently have at least one connection.
    pub fn live_sessions(&self) -> HashSet<SessionId> {
        self.groups.keys().cloned().collect()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

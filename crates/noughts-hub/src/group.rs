//! Session group actor: an isolated Tokio task per live session.
//!
//! The actor owns the session's fan-out set and its role bindings, and
//! is the only caller that mutates its session through the registry.
//! Commands are handled one at a time, so moves on one session are
//! serialized and every member sees broadcasts in the same order.

use std::collections::BTreeMap;
use std::sync::Arc;

use noughts_protocol::{ClientMessage, Mark, ServerMessage, SessionId};
use noughts_session::{RegistryError, SessionRegistry};
use noughts_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::HubError;

/// Channel sender for delivering outbound messages to one connection.
///
/// Unbounded so a slow socket never stalls the actor; the connection's
/// writer task drains it.
pub type ConnectionSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a group actor through its mailbox.
pub(crate) enum GroupCommand {
    /// Admit a connection and bind it to a free role.
    Join {
        conn_id: ConnectionId,
        sender: ConnectionSender,
        reply: oneshot::Sender<Result<Mark, HubError>>,
    },

    /// Drop a connection. Replies with the number of members left.
    Leave {
        conn_id: ConnectionId,
        reply: oneshot::Sender<usize>,
    },

    /// Deliver a client intent from a member.
    Dispatch {
        conn_id: ConnectionId,
        msg: ClientMessage,
    },

    /// Send a message to every member.
    Broadcast { msg: ServerMessage },

    /// Report the current member count.
    Members { reply: oneshot::Sender<usize> },

    /// Stop the actor.
    Shutdown,
}

/// Handle to a running group actor.
///
/// Cheap to clone. The [`Hub`](crate::Hub) keeps one per live session
/// and each admitted connection holds another for dispatching intents.
#[derive(Clone)]
pub struct GroupHandle {
    session_id: SessionId,
    sender: mpsc::Sender<GroupCommand>,
}

impl GroupHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Admits a connection. Returns the role it was bound to.
    ///
    /// Roles follow socket arrival order, not who created the session:
    /// the first connection to arrive is X. The role is not announced on
    /// the wire, so moves sent under the other label are dropped.
    ///
    /// # Errors
    /// - [`HubError::SessionFull`] if both roles are taken
    /// - [`HubError::Unavailable`] if the actor has stopped
    pub async fn join(
        &self,
        conn_id: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<Mark, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GroupCommand::Join {
            conn_id,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Removes a connection. Returns how many members remain.
    pub async fn leave(&self, conn_id: ConnectionId) -> Result<usize, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GroupCommand::Leave {
            conn_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Forwards a client intent (fire-and-forget).
    ///
    /// Rejected moves produce no error here and no broadcast.
    pub async fn dispatch(
        &self,
        conn_id: ConnectionId,
        msg: ClientMessage,
    ) -> Result<(), HubError> {
        self.send(GroupCommand::Dispatch { conn_id, msg }).await
    }

    /// Sends `msg` to every member.
    pub async fn broadcast(&self, msg: ServerMessage) -> Result<(), HubError> {
        self.send(GroupCommand::Broadcast { msg }).await
    }

    pub async fn member_count(&self) -> Result<usize, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GroupCommand::Members { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), HubError> {
        self.send(GroupCommand::Shutdown).await
    }

    async fn send(&self, cmd: GroupCommand) -> Result<(), HubError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> HubError {
        HubError::Unavailable(self.session_id.clone())
    }
}

struct Member {
    mark: Mark,
    sender: ConnectionSender,
}

/// The internal actor state. Runs inside a Tokio task.
struct GroupActor {
    session_id: SessionId,
    registry: Arc<SessionRegistry>,
    members: BTreeMap<ConnectionId, Member>,
    receiver: mpsc::Receiver<GroupCommand>,
}

impl GroupActor {
    async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "group actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                GroupCommand::Join {
                    conn_id,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(conn_id, sender);
                    let _ = reply.send(result);
                }
                GroupCommand::Leave { conn_id, reply } => {
                    self.handle_leave(conn_id);
                    let _ = reply.send(self.members.len());
                }
                GroupCommand::Dispatch { conn_id, msg } => {
                    self.handle_dispatch(conn_id, msg);
                }
                GroupCommand::Broadcast { msg } => {
                    self.broadcast(&msg);
                }
                GroupCommand::Members { reply } => {
                    let _ = reply.send(self.members.len());
                }
                GroupCommand::Shutdown => break,
            }
        }

        tracing::info!(session_id = %self.session_id, "group actor stopped");
    }

    fn handle_join(
        &mut self,
        conn_id: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<Mark, HubError> {
        if let Some(member) = self.members.get(&conn_id) {
            return Ok(member.mark);
        }

        let mark = Mark::ALL
            .into_iter()
            .find(|mark| self.members.values().all(|m| m.mark != *mark))
            .ok_or_else(|| HubError::SessionFull(self.session_id.clone()))?;

        let session = self.registry.get_or_create(&self.session_id)?;
        let _ = sender.send(ServerMessage::StateUpdate(session.snapshot()));
        self.members.insert(conn_id, Member { mark, sender });

        tracing::info!(
            session_id = %self.session_id,
            %conn_id,
            %mark,
            members = self.members.len(),
            "connection admitted"
        );

        if self.members.len() >= 2 {
            match self.registry.mark_joined(&self.session_id) {
                Ok(session) => {
                    self.broadcast(&ServerMessage::StateUpdate(session.snapshot()));
                }
                Err(err) => {
                    tracing::warn!(
                        session_id = %self.session_id,
                        error = %err,
                        "could not mark session joined"
                    );
                }
            }
        }

        Ok(mark)
    }

    fn handle_leave(&mut self, conn_id: ConnectionId) {
        if let Some(member) = self.members.remove(&conn_id) {
            tracing::info!(
                session_id = %self.session_id,
                %conn_id,
                mark = %member.mark,
                members = self.members.len(),
                "connection left"
            );
        }
    }

    fn handle_dispatch(&mut self, conn_id: ConnectionId, msg: ClientMessage) {
        let Some(mark) = self.members.get(&conn_id).map(|m| m.mark) else {
            tracing::warn!(
                session_id = %self.session_id,
                %conn_id,
                "intent from non-member, ignoring"
            );
            return;
        };

        let result = match msg {
            ClientMessage::MakeMove { index, player } => {
                if player != mark {
                    tracing::debug!(
                        session_id = %self.session_id,
                        %conn_id,
                        bound = %mark,
                        claimed = %player,
                        "move under another role's label, ignoring"
                    );
                    return;
                }
                self.registry.apply_move(&self.session_id, index, mark)
            }
            ClientMessage::ResetGame => self.registry.reset_session(&self.session_id),
        };

        match result {
            Ok(session) => {
                self.broadcast(&ServerMessage::StateUpdate(session.snapshot()));
            }
            Err(RegistryError::Rejected(reason)) => {
                tracing::debug!(
                    session_id = %self.session_id,
                    %conn_id,
                    %reason,
                    "move rejected"
                );
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    %conn_id,
                    error = %err,
                    "intent failed"
                );
            }
        }
    }

    /// Sends to every member. A closed queue is skipped silently; the
    /// member is dropped when its handler reports the disconnect.
    fn broadcast(&self, msg: &ServerMessage) {
        for member in self.members.values() {
            let _ = member.sender.send(msg.clone());
        }
    }
}

/// Spawns a group actor for `session_id` and returns its handle.
pub(crate) fn spawn_group(
    session_id: SessionId,
    registry: Arc<SessionRegistry>,
    mailbox_size: usize,
) -> GroupHandle {
    let (tx, rx) = mpsc::channel(mailbox_size);

    let actor = GroupActor {
        session_id: session_id.clone(),
        registry,
        members: BTreeMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    GroupHandle {
        session_id,
        sender: tx,
    }
}

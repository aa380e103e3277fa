//! Connected clients and the administrative handle.
//!
//! The registry never holds a [`Session`](bailiff_auth::Session). Each
//! session lives inside its connection task; the registry only keeps a
//! channel into that task. Anything that wants to read or change a
//! client's rank sends a [`SessionCommand`] and the owning task applies
//! it, the same way a room actor applies commands from its handle.

use std::collections::HashMap;

use bailiff_auth::{Privilege, SessionError};
use bailiff_protocol::{ClientId, Payload};
use tokio::sync::{Mutex, mpsc, oneshot};

/// Capacity of each connection's command channel.
pub(crate) const COMMAND_BUFFER: usize = 64;

/// Requests delivered to a connection task.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    /// Set the privilege directly, bypassing passwords.
    ForceSet {
        privilege: Privilege,
        reply: oneshot::Sender<Privilege>,
    },

    /// Report the current privilege.
    Privilege { reply: oneshot::Sender<Privilege> },

    /// Send a payload to this client (relayed OOC chat).
    Deliver(Payload),
}

/// A cloneable channel into one connection task.
#[derive(Debug, Clone)]
pub(crate) struct SessionHandle {
    client_id: ClientId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(client_id: ClientId, sender: mpsc::Sender<SessionCommand>) -> Self {
        Self { client_id, sender }
    }

    pub(crate) async fn force_set(&self, privilege: Privilege) -> Result<Privilege, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::ForceSet {
                privilege,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Unavailable(self.client_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.client_id))
    }

    pub(crate) async fn privilege(&self) -> Result<Privilege, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Privilege { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Unavailable(self.client_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.client_id))
    }

    /// Queues a payload without waiting. A client whose queue is full
    /// misses the line.
    pub(crate) fn deliver(&self, payload: Payload) {
        if let Err(e) = self.sender.try_send(SessionCommand::Deliver(payload)) {
            tracing::debug!(client_id = %self.client_id, error = %e, "dropped relayed payload");
        }
    }
}

/// Every connected client, by id.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    sessions: Mutex<HashMap<ClientId, SessionHandle>>,
}

impl Registry {
    pub(crate) async fn insert(&self, handle: SessionHandle) {
        self.sessions.lock().await.insert(handle.client_id, handle);
    }

    pub(crate) async fn remove(&self, client_id: ClientId) -> bool {
        self.sessions.lock().await.remove(&client_id).is_some()
    }

    /// Removes without waiting, if the lock is free right now.
    pub(crate) fn try_remove(&self, client_id: ClientId) -> Option<bool> {
        let mut sessions = self.sessions.try_lock().ok()?;
        Some(sessions.remove(&client_id).is_some())
    }

    pub(crate) async fn get(&self, client_id: ClientId) -> Option<SessionHandle> {
        self.sessions.lock().await.get(&client_id).cloned()
    }

    pub(crate) async fn handles(&self) -> Vec<SessionHandle> {
        self.sessions.lock().await.values().cloned().collect()
    }

    pub(crate) async fn client_ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<_> = self.sessions.lock().await.keys().copied().collect();
        ids.sort();
        ids
    }
}

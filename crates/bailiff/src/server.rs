//! `BailiffServer` builder, administrative handle, and accept loop.
//!
//! This ties the layers together: transport → protocol → auth.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bailiff_auth::{
    Clock, CredentialSet, CredentialStore, DEFAULT_HOST_NAME, NotificationEmitter, Privilege,
    SessionError, SystemClock,
};
use bailiff_protocol::{ClientId, JsonCodec};
use bailiff_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::registry::Registry;
use crate::{BailiffError, ServerConfig};

/// The current protocol version. Clients must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// How long a connection may go without sending any frame before it is
/// dropped, unless the builder overrides it.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared server state passed to each connection task.
pub(crate) struct ServerState<C: Clock> {
    pub(crate) registry: Arc<Registry>,
    pub(crate) credentials: Arc<CredentialStore<C>>,
    pub(crate) emitter: Arc<NotificationEmitter>,
    pub(crate) character_dir: PathBuf,
    pub(crate) idle_timeout: Duration,
    pub(crate) codec: JsonCodec,
    pub(crate) started: Instant,
    next_client_id: AtomicU64,
}

impl<C: Clock> ServerState<C> {
    /// Hands out ids starting at 1. Ids are never reused.
    pub(crate) fn next_client_id(&self) -> ClientId {
        ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Milliseconds since the server started.
    pub(crate) fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a Bailiff server.
///
/// # Example
///
/// ```rust,no_run
/// use bailiff::prelude::*;
///
/// # async fn start(credentials: CredentialSet) -> Result<(), BailiffError> {
/// let server = BailiffServer::builder()
///     .bind("0.0.0.0:27016")
///     .character_dir("characters")
///     .build(credentials, SystemClock)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct BailiffServerBuilder {
    bind_addr: String,
    host_name: String,
    character_dir: PathBuf,
    idle_timeout: Duration,
}

impl BailiffServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:27016".to_string(),
            host_name: DEFAULT_HOST_NAME.to_string(),
            character_dir: PathBuf::from("characters"),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Takes every setting except the credentials from `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new()
            .bind(&config.bind)
            .host_name(&config.host_name)
            .character_dir(&config.character_dir)
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the sender name on server OOC replies.
    pub fn host_name(mut self, name: &str) -> Self {
        self.host_name = name.to_string();
        self
    }

    /// Sets the directory that holds each character's `char.ini`.
    pub fn character_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.character_dir = dir.into();
        self
    }

    /// Sets how long a silent client stays connected. Any frame resets
    /// the timer, `Heartbeat` payloads and WebSocket pings included.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Validates the credentials, binds the listener, and returns the
    /// server ready to [`run`](BailiffServer::run).
    pub async fn build<C: Clock>(
        self,
        credentials: CredentialSet,
        clock: C,
    ) -> Result<BailiffServer<C>, BailiffError> {
        let credentials = CredentialStore::new(credentials, clock)?;
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Arc::new(Registry::default()),
            credentials: Arc::new(credentials),
            emitter: Arc::new(NotificationEmitter::new(self.host_name)),
            character_dir: self.character_dir,
            idle_timeout: self.idle_timeout,
            codec: JsonCodec,
            started: Instant::now(),
            next_client_id: AtomicU64::new(1),
        });

        Ok(BailiffServer { transport, state })
    }
}

impl Default for BailiffServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A bound Bailiff server.
///
/// Take a [`handle`](Self::handle) first if anything needs to manage
/// clients, then call [`run`](Self::run).
pub struct BailiffServer<C: Clock = SystemClock> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl BailiffServer<SystemClock> {
    /// Creates a new builder.
    pub fn builder() -> BailiffServerBuilder {
        BailiffServerBuilder::new()
    }
}

impl<C: Clock> BailiffServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, BailiffError> {
        Ok(self.transport.local_addr()?)
    }

    /// An administrative handle on the connected clients.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            registry: Arc::clone(&self.state.registry),
        }
    }

    /// Runs the accept loop, one task per connection, until the process
    /// is terminated.
    pub async fn run(mut self) -> Result<(), BailiffError> {
        tracing::info!("Bailiff server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ServerHandle
// ---------------------------------------------------------------------------

/// Administrative access to connected clients.
///
/// Only in-process code holding this handle can use it; nothing a client
/// sends reaches these methods. Every request is carried to the task that
/// owns the client's session and applied there.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    registry: Arc<Registry>,
}

impl ServerHandle {
    /// Sets a client's privilege without a password. The client gets the
    /// refresh signal but no OOC text.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the client isn't connected,
    /// [`SessionError::Unavailable`] if it disconnected mid-request.
    pub async fn force_set(
        &self,
        client_id: ClientId,
        privilege: Privilege,
    ) -> Result<Privilege, SessionError> {
        let handle = self
            .registry
            .get(client_id)
            .await
            .ok_or(SessionError::NotFound(client_id))?;
        handle.force_set(privilege).await
    }

    /// The privilege a client currently holds.
    ///
    /// # Errors
    /// As for [`force_set`](Self::force_set).
    pub async fn privilege_of(&self, client_id: ClientId) -> Result<Privilege, SessionError> {
        let handle = self
            .registry
            .get(client_id)
            .await
            .ok_or(SessionError::NotFound(client_id))?;
        handle.privilege().await
    }

    /// Ids of every connected client, ascending.
    pub async fn connected_clients(&self) -> Vec<ClientId> {
        self.registry.client_ids().await
    }
}

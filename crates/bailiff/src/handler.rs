//! Per-connection handler: handshake, session, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version, note the character
//!   2. Send HandshakeAck → client is connected as a guest
//!   3. Loop: inbound envelopes and administrative commands, one at a time
//!
//! The task is the only owner of the client's [`Session`], so rank changes
//! for this client happen here and nowhere else.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bailiff_auth::{Clock, Session};
use bailiff_emotes::EmoteValidator;
use bailiff_protocol::{ClientId, Codec, Envelope, Payload, ProtocolError};
use bailiff_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::BailiffError;
use crate::registry::{COMMAND_BUFFER, Registry, SessionCommand, SessionHandle};
use crate::server::{PROTOCOL_VERSION, ServerState};

/// How long a new connection has to send its Handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reply to a `/command` nobody handles.
const INVALID_COMMAND: &str = "Invalid command.";

/// Reply to an OOC line sent under the server's own name.
const RESERVED_NAME: &str = "That name is reserved.";

/// Owns the session for the life of the connection.
///
/// Dropping it clears the client's rank and removes the client from the
/// registry, exactly once, however the handler exits. Registry removal
/// needs the async lock, so if the lock is busy it is finished in a
/// spawned task.
struct ConnectionGuard<C: Clock> {
    session: Session<C>,
    registry: Arc<Registry>,
}

impl<C: Clock> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        self.session.disconnect();
        let client_id = self.session.client_id();
        if self.registry.try_remove(client_id).is_none() {
            let registry = Arc::clone(&self.registry);
            tokio::spawn(async move {
                registry.remove(client_id).await;
            });
        }
    }
}

/// What the loop does after handling one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Clock>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), BailiffError> {
    let peer = conn.peer_addr();
    tracing::debug!(%peer, "handling new connection");

    // --- Step 1: Handshake ---
    let character = receive_handshake(&conn, &state).await?;
    let client_id = state.next_client_id();

    // A client that has its ack is always in the registry.
    let (tx, mut commands) = mpsc::channel(COMMAND_BUFFER);
    state.registry.insert(SessionHandle::new(client_id, tx)).await;
    let mut guard = ConnectionGuard {
        session: Session::new(
            client_id,
            character.as_str(),
            Arc::clone(&state.credentials),
            Arc::clone(&state.emitter),
        ),
        registry: Arc::clone(&state.registry),
    };
    let emotes = load_emotes(&state.character_dir, &character).await;

    let ack = Payload::HandshakeAck {
        client_id,
        server_time: state.elapsed_ms(),
    };
    send_payload(&conn, &state, 0, ack).await?;
    tracing::info!(%client_id, %peer, %character, "client connected");

    // --- Step 2: Message loop ---
    let mut seq: u64 = 1;
    let idle_timeout = state.idle_timeout;
    let idle = tokio::time::sleep(idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%client_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%client_id, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut().reset(tokio::time::Instant::now() + idle_timeout);

                let envelope: Envelope = match state.codec.decode(&data) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::debug!(%client_id, error = %e, "failed to decode envelope");
                        continue;
                    }
                };

                let flow = handle_payload(
                    &conn,
                    &state,
                    &mut guard.session,
                    &emotes,
                    envelope.payload,
                    &mut seq,
                )
                .await?;
                if flow == Flow::Close {
                    if let Err(e) = conn.close().await {
                        tracing::debug!(%client_id, error = %e, "close failed");
                    }
                    break;
                }
            }

            Some(command) = commands.recv() => {
                handle_command(&conn, &state, &mut guard.session, command, &mut seq).await?;
            }

            () = &mut idle => {
                // Pings are answered inside the transport and only show up here.
                let deadline =
                    tokio::time::Instant::from_std(conn.last_activity()) + idle_timeout;
                if deadline > tokio::time::Instant::now() {
                    idle.as_mut().reset(deadline);
                    continue;
                }
                tracing::info!(%client_id, "connection timed out");
                break;
            }
        }
    }

    // guard drops here → rank cleared, client deregistered.
    Ok(())
}

/// Receives and checks the Handshake. Returns the character name.
async fn receive_handshake<C: Clock>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
) -> Result<String, BailiffError> {
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before handshake".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(BailiffError::Transport(e)),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let envelope: Envelope = state.codec.decode(&data)?;

    let (version, character) = match envelope.payload {
        Payload::Handshake { version, character } => (version, character),
        _ => {
            send_error(conn, state, 400, "expected Handshake", 0).await?;
            return Err(
                ProtocolError::InvalidMessage("first message must be Handshake".into()).into(),
            );
        }
    };

    if version != PROTOCOL_VERSION {
        send_error(
            conn,
            state,
            400,
            &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
            0,
        )
        .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    Ok(character)
}

/// Handles one inbound payload.
async fn handle_payload<C: Clock>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    session: &mut Session<C>,
    emotes: &EmoteValidator,
    payload: Payload,
    seq: &mut u64,
) -> Result<Flow, BailiffError> {
    let client_id = session.client_id();

    match payload {
        Payload::Heartbeat { client_time } => {
            let ack = Payload::HeartbeatAck {
                client_time,
                server_time: state.elapsed_ms(),
            };
            send_payload(conn, state, next_seq(seq), ack).await?;
        }

        Payload::Ooc { name, text } => {
            if is_reserved_name(&name, state.emitter.host_name()) {
                tracing::debug!(%client_id, %name, "OOC line under reserved name");
                let reply = state.emitter.ooc(RESERVED_NAME);
                send_payload(conn, state, next_seq(seq), reply).await?;
            } else if let Some(replies) = session.handle_ooc(&text) {
                for reply in replies {
                    send_payload(conn, state, next_seq(seq), reply).await?;
                }
            } else if text.starts_with('/') {
                let reply = state.emitter.ooc(INVALID_COMMAND);
                send_payload(conn, state, next_seq(seq), reply).await?;
            } else {
                relay_ooc(&state.registry, client_id, name, text).await;
            }
        }

        Payload::Emote { preanim, anim, sfx } => {
            if emotes.validate(&preanim, &anim, &sfx) {
                let echo = Payload::Emote { preanim, anim, sfx };
                send_payload(conn, state, next_seq(seq), echo).await?;
            } else {
                tracing::debug!(%client_id, %preanim, %anim, "emote rejected");
                let message = format!(
                    "emote {preanim}/{anim} is not available for {}",
                    session.character()
                );
                send_error(conn, state, 400, &message, next_seq(seq)).await?;
            }
        }

        Payload::Disconnect { reason } => {
            tracing::info!(%client_id, %reason, "client disconnected");
            return Ok(Flow::Close);
        }

        _ => {
            tracing::debug!(%client_id, "ignoring unexpected message");
            send_error(conn, state, 400, "unexpected message", next_seq(seq)).await?;
        }
    }

    Ok(Flow::Continue)
}

/// Applies one administrative command to the session this task owns.
async fn handle_command<C: Clock>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    session: &mut Session<C>,
    command: SessionCommand,
    seq: &mut u64,
) -> Result<(), BailiffError> {
    match command {
        SessionCommand::ForceSet { privilege, reply } => {
            let payloads = session.force_set(privilege);
            // Answer the caller before touching the network.
            let _ = reply.send(session.privilege());
            for payload in payloads {
                send_payload(conn, state, next_seq(seq), payload).await?;
            }
        }
        SessionCommand::Privilege { reply } => {
            let _ = reply.send(session.privilege());
        }
        SessionCommand::Deliver(payload) => {
            send_payload(conn, state, next_seq(seq), payload).await?;
        }
    }
    Ok(())
}

/// Reads the character's emote list on the blocking pool. A failed task
/// fails open like any other load error.
async fn load_emotes(char_dir: &Path, character: &str) -> EmoteValidator {
    let dir = char_dir.to_path_buf();
    let name = character.to_string();
    match tokio::task::spawn_blocking(move || EmoteValidator::load(dir, &name)).await {
        Ok(validator) => validator,
        Err(e) => {
            tracing::warn!(%character, error = %e, "emote load task failed, emotes unrestricted");
            EmoteValidator::unrestricted(character)
        }
    }
}

/// Whether an OOC name would pass for the server's own. Surrounding
/// whitespace and ASCII case are ignored.
fn is_reserved_name(name: &str, host_name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(host_name.trim())
}

/// Queues a plain OOC line for every connected client, sender included.
async fn relay_ooc(registry: &Registry, from: ClientId, name: String, text: String) {
    let handles = registry.handles().await;
    tracing::debug!(client_id = %from, recipients = handles.len(), "relaying OOC line");
    for handle in handles {
        handle.deliver(Payload::Ooc {
            name: name.clone(),
            text: text.clone(),
        });
    }
}

/// Encodes and sends one payload.
async fn send_payload<C: Clock>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    seq: u64,
    payload: Payload,
) -> Result<(), BailiffError> {
    let envelope = Envelope {
        seq,
        timestamp: state.elapsed_ms(),
        payload,
    };
    let bytes = state.codec.encode(&envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}

/// Sends an `Error` payload to the client.
async fn send_error<C: Clock>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    code: u16,
    message: &str,
    seq: u64,
) -> Result<(), BailiffError> {
    let payload = Payload::Error {
        code,
        message: message.to_string(),
    };
    send_payload(conn, state, seq, payload).await
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}

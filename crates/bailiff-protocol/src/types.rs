//! Core protocol types for Bailiff's wire format.
//!
//! Everything here is serialized, sent, and deserialized on the other
//! side, so the serde attributes are part of the contract with clients.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifies one live connection.
///
/// A newtype over `u64` so a client id can never be confused with a
/// sequence number or a timestamp. Ids are handed out by the server at
/// handshake and are never reused within a process, which is why a
/// reconnecting player always starts a brand-new session.
///
/// `#[serde(transparent)]` keeps it a plain number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Every message kind that can travel in an [`Envelope`], in either
/// direction.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "Ooc", "name": "Phoenix", "text": "/logout" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Payload {
    // -- Connection lifecycle --
    /// Client → Server: first message on every connection. `character`
    /// selects the char.ini used to validate emotes.
    Handshake { version: u32, character: String },

    /// Server → Client: the handshake was accepted.
    HandshakeAck { client_id: ClientId, server_time: u64 },

    /// Either direction: "I'm going away."
    Disconnect { reason: String },

    // -- Keep-alive --
    /// Client → Server: "I'm still here." Sent every few seconds by an
    /// otherwise silent client so the idle timeout never fires.
    Heartbeat { client_time: u64 },

    /// Server → Client: answer to a Heartbeat. `client_time` is echoed
    /// back so the client can measure round-trip time.
    HeartbeatAck { client_time: u64, server_time: u64 },

    // -- Out-of-character channel --
    /// Client → Server: a line typed into the OOC box, `name` being the
    /// OOC name the client chose.
    /// Server → Client: a line to show in the OOC log, `name` being the
    /// sender (the configured host name for server replies).
    Ooc { name: String, text: String },

    /// Server → Client: privilege-dependent state changed; re-request
    /// anything that depends on rank (area lists, music lists, …).
    FeatureRefresh,

    // -- In-character --
    /// Client → Server: the emote a character wants to play.
    /// Server → Client: the emote was accepted.
    Emote {
        preanim: String,
        anim: String,
        sfx: String,
    },

    // -- Errors --
    /// Server → Client: something was rejected. `code` follows HTTP
    /// conventions (400 bad request, 401 unauthorized, …).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level wire message.
///
/// ```text
/// ┌──────────────────────────────┐
/// │ seq: 12                      │  ← per-sender counter
/// │ timestamp: 4031              │  ← ms since the sender started
/// │ ┌──────────────────────────┐ │
/// │ │ payload: Ooc { .. }      │ │
/// │ └──────────────────────────┘ │
/// └──────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub seq: u64,
    pub timestamp: u64,
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================

//! Wire protocol for Bailiff.
//!
//! This crate defines what clients and the server exchange:
//!
//! - **Types** ([`Envelope`], [`Payload`], [`ClientId`]): the structures
//!   that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures are
//!   turned into bytes and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw frames) and the
//! authorization layer (who holds which rank). It knows nothing about
//! passwords or connections.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Auth (per-client session)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientId, Envelope, Payload};

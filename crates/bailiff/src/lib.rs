//! # Bailiff
//!
//! A courtroom roleplay server with rank-based staff authorization.
//!
//! Players connect over WebSocket, pick a character, and chat on the
//! out-of-character (OOC) channel. Staff raise their privilege from the
//! same channel with `/login`, `/logincm`, `/loginrp` and drop it with
//! `/logout`; administrators holding a [`ServerHandle`] can set any
//! client's privilege directly.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bailiff::prelude::*;
//!
//! # async fn start() -> anyhow::Result<()> {
//! let config = ServerConfig::load("config.toml")?;
//! let server = BailiffServerBuilder::from_config(&config)
//!     .build(config.credentials.clone(), SystemClock)
//!     .await?;
//! let admin = server.handle();
//! tokio::spawn(server.run());
//! # let _ = admin;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod handler;
mod registry;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::BailiffError;
pub use server::{
    BailiffServer, BailiffServerBuilder, DEFAULT_IDLE_TIMEOUT, PROTOCOL_VERSION, ServerHandle,
};

/// Everything needed to start a server and talk to it.
pub mod prelude {
    pub use crate::{
        BailiffError, BailiffServer, BailiffServerBuilder, ConfigError, PROTOCOL_VERSION,
        ServerConfig, ServerHandle,
    };
    pub use bailiff_auth::{
        AuthError, Clock, CredentialSet, FixedClock, Privilege, Rank, SessionError, SystemClock,
    };
    pub use bailiff_protocol::{ClientId, Codec, Envelope, JsonCodec, Payload};
}

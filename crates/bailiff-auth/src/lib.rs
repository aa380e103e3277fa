//! Rank-based authorization for Bailiff.
//!
//! This crate decides which connections may act as moderator, community
//! manager, or game master:
//!
//! 1. **Credentials**: shared secrets, one of which rotates daily
//!    ([`CredentialStore`], [`Clock`])
//! 2. **Rank state**: the single privilege a connection holds
//!    ([`RankState`], [`Privilege`])
//! 3. **Commands**: `/login`, `/logincm`, `/loginrp`, `/logout`
//!    ([`LoginCommandProcessor`])
//! 4. **Notifications**: what the connection is told afterwards
//!    ([`NotificationEmitter`])
//!
//! [`Session`] ties the four together for one connection.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)     ← owns one Session per connection task
//!     ↕
//! Auth (this crate)  ← validates claims, tracks privilege
//!     ↕
//! Protocol (below)   ← ClientId, Payload
//! ```

mod clock;
mod command;
mod credentials;
mod error;
mod notify;
mod rank;
mod session;

pub use clock::{Clock, FixedClock, SystemClock};
pub use command::{LoginCommand, LoginCommandProcessor, OocCommand};
pub use credentials::{CredentialSet, CredentialStore, ROTATION_HOUR, effective_weekday};
pub use error::{AuthError, SessionError};
pub use notify::{DEFAULT_HOST_NAME, NotificationEmitter};
pub use rank::{Privilege, Rank, RankState, Transition};
pub use session::Session;

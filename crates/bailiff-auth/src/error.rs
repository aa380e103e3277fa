//! Error types for the authorization layer.

use bailiff_protocol::ClientId;

/// Why a login or logout command was refused.
///
/// The `Display` text of [`Usage`](Self::Usage) and
/// [`InvalidPassword`](Self::InvalidPassword) is exactly what the issuing
/// client sees in its OOC log, so it must not change.
///
/// Re-logging into the rank already held is not an error; see
/// [`Transition::AlreadyLoggedIn`](crate::Transition::AlreadyLoggedIn).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The command was malformed, e.g. `/logout` with trailing text.
    /// Echoed verbatim.
    #[error("{0}")]
    Usage(String),

    /// The password did not match. Says nothing about which
    /// secrets exist or how close the guess was.
    #[error("Invalid password.")]
    InvalidPassword,

    /// A configured secret is empty. Raised when building a
    /// [`CredentialStore`](crate::CredentialStore), never per command.
    #[error("credential `{0}` must not be empty")]
    EmptySecret(&'static str),
}

/// Errors from looking up or talking to a connection's session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No connected client has this id (never connected, or already gone).
    #[error("no session for client {0}")]
    NotFound(ClientId),

    /// The client's task stopped before it could answer.
    #[error("session for client {0} is unavailable")]
    Unavailable(ClientId),
}

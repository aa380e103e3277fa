//! Unified error type for the Bailiff server.

use bailiff_auth::{AuthError, SessionError};
use bailiff_protocol::ProtocolError;
use bailiff_transport::TransportError;

use crate::ConfigError;

/// Top-level error wrapping every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum BailiffError {
    /// Binding, accepting, sending or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded, or broke the handshake.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An administrative request named a client that isn't connected.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The configured credentials were unusable.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The config file could not be read or parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use bailiff_protocol::ClientId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::SendFailed(std::io::Error::other("gone"));
        let bailiff_err: BailiffError = err.into();
        assert!(matches!(bailiff_err, BailiffError::Transport(_)));
        assert!(bailiff_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let bailiff_err: BailiffError = err.into();
        assert!(matches!(bailiff_err, BailiffError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error_is_transparent() {
        let err = SessionError::NotFound(ClientId(4));
        let bailiff_err: BailiffError = err.into();
        assert_eq!(bailiff_err.to_string(), "no session for client C-4");
    }

    #[test]
    fn test_from_auth_error() {
        let bailiff_err: BailiffError = AuthError::EmptySecret("cm_password").into();
        assert!(matches!(bailiff_err, BailiffError::Auth(_)));
    }
}

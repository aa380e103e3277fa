//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding envelopes.
///
/// Each crate in Bailiff owns its error enum, so a `ProtocolError` always
/// means "the bytes were wrong", never "the password was wrong".
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Turning a value into bytes failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes could not be turned back into a value: malformed JSON,
    /// a missing field, or an unknown `type` tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but breaks a protocol rule, e.g. a client
    /// that opens with anything other than a handshake.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

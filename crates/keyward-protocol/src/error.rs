//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding payload bodies.
///
/// Each crate in Keyward defines its own error enum, so a `ProtocolError`
/// always means "the bytes were wrong", never "the network was down".
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing required fields,
    /// or a body that does not match the expected shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The body violates a protocol rule, e.g. a wallet status response
    /// with no body at all.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

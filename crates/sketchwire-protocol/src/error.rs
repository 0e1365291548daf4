//! Error types for the protocol layer.
//!
//! Each crate in Sketchwire defines its own error enum. A `ProtocolError`
//! always means the bytes could not be turned into (or out of) one of the
//! protocol types; it never says anything about game rules.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown `type` tag, or a
    /// missing field on a command.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}

//! Unified error type for the Sketchwire server.

use sketchwire_protocol::ProtocolError;
use sketchwire_session::SessionError;
use sketchwire_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SketchwireError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level refusal (bad name, not enough players).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A configuration value could not be used.
    #[error("invalid value for {key}: {value:?}")]
    Config { key: &'static str, value: String },

    /// Local I/O outside the transport (e.g. reading the bound address).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

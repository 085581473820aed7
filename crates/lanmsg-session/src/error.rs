//! Error types for the session layer.

use lanmsg_protocol::ProtocolError;

/// Reasons a connection loop stopped abnormally.
///
/// A peer closing its end is not an error; the loop just returns `Ok`.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The socket failed while waiting, reading or writing.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer sent a frame that breaks the wire format, or a handler
    /// queued a message that cannot be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

//! Error types for the client.

use lanmsg_session::SessionError;
use lanmsg_transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connecting to the server failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The connection loop failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The server did not finish the handshake in time.
    #[error("server did not complete the handshake within {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// The session has ended; nothing more can be sent.
    #[error("disconnected from server")]
    Disconnected,

    /// The connection task panicked or was aborted.
    #[error("connection task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

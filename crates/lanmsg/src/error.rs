//! Unified error type for the lanmsg server.

use lanmsg_protocol::ProtocolError;
use lanmsg_room::RoomError;
use lanmsg_session::SessionError;
use lanmsg_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LanMsgError {
    /// Binding, accepting or dialing failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A connection loop failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The room rejected a request or has stopped.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The configuration is not valid JSON for [`ServerConfig`](crate::ServerConfig).
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("cannot read configuration file {path}: {source}")]
    ConfigFile {
        path: String,
        source: std::io::Error,
    },
}

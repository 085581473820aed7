//! Error types for the room layer.

use lanmsg_transport::ConnectionId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The session is not registered in the room.
    ///
    /// Sessions register before their loop starts and leave after it
    /// ends, so this always points at a bug in the caller.
    #[error("session {0} not found in room")]
    NotFound(ConnectionId),

    /// The session is already registered.
    #[error("session {0} already registered")]
    AlreadyRegistered(ConnectionId),

    /// The room actor has stopped.
    #[error("room is unavailable")]
    Unavailable,
}

//! The chat room for lanmsg.
//!
//! The server has exactly one room. It runs as an isolated Tokio task
//! (actor model) that owns every connected session's nickname and
//! handshake state, fans chat out, and negotiates file transfers.
//!
//! # Key types
//!
//! - [`RoomHandle`]: send commands to the running room actor
//! - [`ClientState`]: per-client handshake state machine
//! - [`SessionCommand`]: what the room asks a session's connection to do
//! - [`RelayCredit`]: bounds the file chunks queued for one session
//! - [`RoomConfig`]: room settings

mod config;
mod error;
mod room;

pub use config::{ClientState, RoomConfig};
pub use error::RoomError;
pub use room::{
    RelayCredit, RequestOutcome, RoomHandle, RoomInfo, SessionCommand, SessionSender,
    TransferPhase, sanitize_nickname, spawn_room,
};

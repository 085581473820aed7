//! Wire protocol for lanmsg.
//!
//! This crate defines the "language" that chat clients and the server
//! speak over TCP:
//!
//! - **Types** ([`Message`], [`MessageKind`], [`StatusCode`],
//!   [`FileChunk`]): the message catalog, one enum variant per kind.
//! - **Codec** ([`FrameCodec`], [`Decoded`]): the length-prefixed binary
//!   framing and each kind's payload layout.
//! - **Errors** ([`ProtocolError`]): everything that makes a frame
//!   invalid.
//!
//! # Architecture
//!
//! The protocol layer sits between the socket (raw bytes) and the
//! session (per-connection queues). It knows nothing about connections
//! or chat rooms; it only turns bytes into messages and back.
//!
//! ```text
//! TcpStream (bytes) → Protocol (Message) → Session (queues, state)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::{
    DEFAULT_MAX_FRAME_SIZE, Decoded, FILE_DATA_FIXED_SIZE, FrameCodec, HEADER_SIZE,
};
pub use error::ProtocolError;
pub use types::{
    FILE_NAME_FIELD_SIZE, FileChunk, MAX_CHAT_TEXT_LEN, MAX_NICKNAME_LEN, Message,
    MessageKind, NICKNAME_FIELD_SIZE, StatusCode, truncate_to_boundary,
};

/// TCP port the server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 12345;

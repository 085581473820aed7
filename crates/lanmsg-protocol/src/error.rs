//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the bytes on the wire (or the message
//! about to be written) break the frame format. The connection that
//! produced it cannot be trusted any further and is closed without a
//! graceful goodbye.

use crate::MessageKind;

/// Errors raised while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The header command is not one of the known mnemonics.
    #[error("unknown command {0:?}")]
    UnknownCommand([u8; 4]),

    /// The header announces a payload larger than the codec accepts.
    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    Oversize { size: usize, max: usize },

    /// The header announces a negative payload size.
    #[error("negative payload size {0}")]
    NegativeSize(i32),

    /// The payload is shorter than the fixed part of its kind.
    #[error("{kind} payload too short: got {got} bytes, need {need}")]
    Truncated {
        kind: MessageKind,
        got: usize,
        need: usize,
    },

    /// The payload is well sized but one of its fields is out of range.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

//! Connection sessions for lanmsg.
//!
//! A session is one live TCP connection plus its protocol state. This
//! crate provides the engine both the server and the client run for each
//! of their connections:
//!
//! 1. **Queues**: an inbound FIFO of decoded messages and a bounded
//!    outbound FIFO ([`SessionContext`])
//! 2. **The loop**: reassembling frames from the socket, writing queued
//!    frames, and ticking ([`Connection`])
//! 3. **Hooks**: the protocol behavior plugged into the loop
//!    ([`SessionHandler`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Room / Client layer (above)  ← implements SessionHandler
//!     ↕
//! Session Layer (this crate)   ← owns one socket, its buffers and queues
//!     ↕
//! Protocol + Transport (below) ← frames, TcpStream, ConnectionId
//! ```

mod connection;
mod error;
mod handler;
mod session;

pub use connection::{CommandReceiver, CommandSender, Connection};
pub use error::SessionError;
pub use handler::SessionHandler;
pub use session::{SessionConfig, SessionContext};

//! # lanmsg
//!
//! A chat server for the local network. Every client joins one shared
//! room, picks a nickname, chats with everyone else, and can offer a file
//! to the whole room.
//!
//! The server ties the layers together: transport (TCP accept) → session
//! (framed I/O loop per client) → room (shared state actor).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lanmsg::prelude::*;
//!
//! # async fn run() -> Result<(), LanMsgError> {
//! let server = ChatServer::builder()
//!     .bind("0.0.0.0:12345")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::LanMsgError;
pub use handler::ClientSession;
pub use server::{ChatServer, ChatServerBuilder};

/// Everything needed to embed a server.
pub mod prelude {
    pub use crate::{ChatServer, ChatServerBuilder, LanMsgError, ServerConfig};
    pub use lanmsg_protocol::{DEFAULT_PORT, Message, StatusCode};
    pub use lanmsg_room::{RoomConfig, RoomHandle, RoomInfo};
    pub use lanmsg_session::SessionConfig;
}

//! Client library for lanmsg.
//!
//! [`ChatClient::connect`] dials a server, completes the greeting and
//! returns a handle for chatting, renaming and offering files. Everything
//! the server reports comes back through a [`ChatUi`] the embedder
//! provides; files are read and written through a [`FileStore`].

mod client;
mod error;
mod session;
mod store;
mod ui;

pub use client::{ChatClient, ClientConfig};
pub use error::ClientError;
pub use store::{Chunk, DiskStore, FileStore};
pub use ui::{ChatUi, FileDecision};

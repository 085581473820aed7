//! What the client reports to, and asks of, its user.

use std::future::Future;
use std::path::PathBuf;

/// The user's answer to an incoming file offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDecision {
    pub accept: bool,
    /// Where to save the file. Ignored when rejecting.
    pub destination: PathBuf,
}

impl FileDecision {
    pub fn accept(destination: impl Into<PathBuf>) -> Self {
        Self {
            accept: true,
            destination: destination.into(),
        }
    }

    pub fn reject() -> Self {
        Self {
            accept: false,
            destination: PathBuf::new(),
        }
    }
}

/// The user interface a [`ChatClient`](crate::ChatClient) reports to.
///
/// Notifications are synchronous and run on the connection task, so they
/// should return quickly. The file offer prompt is asynchronous and runs
/// on its own task: the connection keeps reading and writing while the
/// user makes up their mind.
pub trait ChatUi: Send + Sync + 'static {
    /// A human-readable notice, such as "There are no other participants
    /// to the chat!".
    fn on_status(&self, text: &str);

    /// The server confirmed a nickname for this client.
    fn on_nickname_changed(&self, nickname: &str);

    fn on_chat(&self, sender: &str, text: &str);

    /// Another participant offers a file. Resolve once the user decides.
    fn on_file_transfer_request(
        &self,
        sender: &str,
        file_name: &str,
    ) -> impl Future<Output = FileDecision> + Send;

    /// The connection has ended.
    fn on_connection_closed(&self) {}
}

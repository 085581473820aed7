//! `ChatClient`: connect to a server and talk to the room.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lanmsg_session::{CommandSender, Connection, SessionConfig, SessionError};
use lanmsg_transport::TcpConnection;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::session::{ClientCommand, ServerSession};
use crate::{ChatUi, ClientError, FileStore};

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub session: SessionConfig,
    /// Nickname to claim right after connecting. `None` keeps the one the
    /// server assigns.
    pub nickname: Option<String>,
    /// How long [`ChatClient::connect`] waits for the server to finish the
    /// handshake.
    pub handshake_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            nickname: None,
            handshake_timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

/// A connected chat client.
///
/// Every method only posts a request to the connection task and returns
/// immediately; outcomes are reported through the [`ChatUi`].
///
/// # Example
///
/// ```rust,no_run
/// # use lanmsg_client::*;
/// # async fn demo(ui: impl ChatUi) -> Result<(), ClientError> {
/// let client = ChatClient::connect("127.0.0.1:12345", ui, DiskStore, ClientConfig::default()).await?;
/// client.send_chat_message("hello")?;
/// client.disconnect()?;
/// client.closed().await
/// # }
/// ```
pub struct ChatClient {
    commands: CommandSender<ClientCommand>,
    task: JoinHandle<Result<(), SessionError>>,
}

impl ChatClient {
    /// Connects, greets the server and waits until the nickname is
    /// settled. Chat and file transfer are allowed once this returns.
    pub async fn connect<U: ChatUi, S: FileStore>(
        addr: &str,
        ui: U,
        store: S,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let conn = TcpConnection::connect(addr).await?;
        let (id, stream) = conn.into_parts();

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (joined_tx, joined_rx) = oneshot::channel();
        let session = ServerSession::new(
            Arc::new(ui),
            store,
            commands_tx.clone(),
            config.nickname.clone(),
            joined_tx,
            config.session.codec().max_file_chunk(),
        );
        let connection = Connection::new(id, stream, session, commands_rx, config.session.clone());
        let task = tokio::spawn(connection.run());
        let client = Self {
            commands: commands_tx,
            task,
        };

        let timeout = config.handshake_timeout();
        match tokio::time::timeout(timeout, joined_rx).await {
            Ok(Ok(())) => {
                tracing::info!(%id, %addr, "joined chat");
                Ok(client)
            }
            // The loop ended before the handshake did.
            Ok(Err(_)) => match client.task.await? {
                Ok(()) => Err(ClientError::Disconnected),
                Err(e) => Err(e.into()),
            },
            Err(_) => {
                client.task.abort();
                Err(ClientError::HandshakeTimeout(timeout))
            }
        }
    }

    pub fn send_chat_message(&self, text: impl Into<String>) -> Result<(), ClientError> {
        self.post(ClientCommand::Chat(text.into()))
    }

    /// Offers a file to everyone else in the room.
    pub fn send_file(&self, path: impl Into<PathBuf>) -> Result<(), ClientError> {
        self.post(ClientCommand::SendFile(path.into()))
    }

    pub fn set_nickname(&self, nickname: impl Into<String>) -> Result<(), ClientError> {
        self.post(ClientCommand::SetNickname(nickname.into()))
    }

    /// Says goodbye and closes once everything queued has been sent.
    pub fn disconnect(&self) -> Result<(), ClientError> {
        self.post(ClientCommand::Disconnect)
    }

    /// Whether the connection is still running.
    pub fn is_connected(&self) -> bool {
        !self.task.is_finished()
    }

    /// Waits for the connection to end.
    pub async fn closed(self) -> Result<(), ClientError> {
        Ok(self.task.await??)
    }

    fn post(&self, command: ClientCommand) -> Result<(), ClientError> {
        if self.task.is_finished() {
            return Err(ClientError::Disconnected);
        }
        self.commands
            .send(command)
            .map_err(|_| ClientError::Disconnected)
    }
}

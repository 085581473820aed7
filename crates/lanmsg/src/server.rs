//! `ChatServer` builder and accept loop.
//!
//! This is the entry point for running a lanmsg server. It ties together
//! all the layers: transport → session → room.

use std::future::Future;
use std::net::SocketAddr;

use lanmsg_room::{RelayCredit, RoomConfig, RoomError, RoomHandle, spawn_room};
use lanmsg_session::{Connection, SessionConfig};
use lanmsg_transport::{TcpConnection, TcpTransport, Transport};
use tokio::sync::mpsc;

use crate::{ClientSession, LanMsgError, ServerConfig};

/// Builder for configuring and starting a chat server.
///
/// # Example
///
/// ```rust,no_run
/// use lanmsg::prelude::*;
///
/// # async fn start() -> Result<(), LanMsgError> {
/// let server = ChatServer::builder()
///     .bind("127.0.0.1:0")
///     .session_config(SessionConfig::default().with_max_outbound_queue(16))
///     .build()
///     .await?;
/// println!("listening on {}", server.local_addr()?);
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChatServerBuilder {
    config: ServerConfig,
}

impl ChatServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every setting with `config`.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration applied to every client connection.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    /// Binds the listener and starts the room actor.
    pub async fn build(self) -> Result<ChatServer, LanMsgError> {
        let transport = TcpTransport::bind(&self.config.bind_addr).await?;
        let room = spawn_room(self.config.room.clone());

        Ok(ChatServer {
            transport,
            room,
            session_config: self.config.session,
            connections: 0,
        })
    }
}

/// A bound chat server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ChatServer {
    transport: TcpTransport,
    room: RoomHandle,
    session_config: SessionConfig,
    /// Connections accepted so far; numbers the default nicknames.
    connections: u64,
}

impl ChatServer {
    /// Creates a new builder.
    pub fn builder() -> ChatServerBuilder {
        ChatServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, LanMsgError> {
        Ok(self.transport.local_addr()?)
    }

    /// A handle to the server's room, for inspecting or shutting it down.
    pub fn room(&self) -> RoomHandle {
        self.room.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), LanMsgError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// On shutdown the listener is closed and every connected client is
    /// sent `Bye`. Connections finish flushing on their own tasks.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), LanMsgError> {
        tracing::info!(addr = %self.local_addr()?, "lanmsg server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => self.admit(conn).await,
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                },
                () = &mut shutdown => break,
            }
        }

        tracing::info!("lanmsg server shutting down");
        match self.room.shutdown().await {
            Ok(()) | Err(RoomError::Unavailable) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Registers a new client under a default nickname and spawns its
    /// connection task.
    async fn admit(&mut self, conn: TcpConnection) {
        let peer = conn.peer_addr();
        let (id, stream) = conn.into_parts();

        self.connections += 1;
        let nickname = format!("User {}", self.connections);

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        // Relayed chunks waiting in the mailbox are capped like the
        // outbound queue they drain into.
        let credit = RelayCredit::new(self.session_config.max_outbound_queue);
        let registered = self
            .room
            .register(id, nickname.clone(), commands_tx, credit.clone())
            .await;
        if let Err(e) = registered {
            tracing::error!(%id, %peer, error = %e, "failed to register connection");
            return;
        }
        tracing::info!(%id, %peer, %nickname, "client connected");

        let session = ClientSession::new(id, nickname, self.room.clone(), credit);
        let connection = Connection::new(
            id,
            stream,
            session,
            commands_rx,
            self.session_config.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = connection.run().await {
                tracing::debug!(%id, error = %e, "connection ended with error");
            }
        });
    }
}

//! TCP transport built on tokio's listener and stream types.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::{TcpListener, TcpStream};

use crate::{ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> ConnectionId {
    ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

/// Resolves `addr` to the first socket address it names.
async fn resolve(addr: &str) -> Result<SocketAddr, TransportError> {
    let mut addrs = tokio::net::lookup_host(addr).await.map_err(|source| {
        TransportError::InvalidAddress {
            addr: addr.to_owned(),
            source: Some(source),
        }
    })?;
    addrs.next().ok_or_else(|| TransportError::InvalidAddress {
        addr: addr.to_owned(),
        source: None,
    })
}

/// A TCP [`Transport`] that listens for incoming chat clients.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a listener to `addr` (`host:port`).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let socket_addr = resolve(addr).await?;
        let listener = TcpListener::bind(socket_addr)
            .await
            .map_err(|source| TransportError::BindFailed {
                addr: socket_addr,
                source,
            })?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer_addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        stream.set_nodelay(true).map_err(TransportError::SocketOption)?;

        let id = next_id();
        tracing::debug!(%id, %peer_addr, "accepted TCP connection");
        Ok(TcpConnection {
            id,
            stream,
            peer_addr,
        })
    }

    fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
        self.listener.local_addr().map_err(TransportError::SocketOption)
    }
}

/// One established TCP connection, either accepted or dialed.
///
/// The stream is handed over whole to the connection session that drives
/// it; this type only carries the identity that goes with it.
#[derive(Debug)]
pub struct TcpConnection {
    id: ConnectionId,
    stream: TcpStream,
    peer_addr: SocketAddr,
}

impl TcpConnection {
    /// Dials a server at `addr` (`host:port`).
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let socket_addr = resolve(addr).await?;
        let stream = TcpStream::connect(socket_addr)
            .await
            .map_err(|source| TransportError::ConnectFailed {
                addr: socket_addr,
                source,
            })?;
        stream.set_nodelay(true).map_err(TransportError::SocketOption)?;

        let id = next_id();
        tracing::debug!(%id, peer_addr = %socket_addr, "connected to server");
        Ok(Self {
            id,
            stream,
            peer_addr: socket_addr,
        })
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Splits the connection into its identity and the raw stream.
    pub fn into_parts(self) -> (ConnectionId, TcpStream) {
        (self.id, self.stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_accept_and_connect_on_loopback() {
        let mut transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap().to_string();

        let (accepted, dialed) =
            tokio::join!(transport.accept(), TcpConnection::connect(&addr));
        let accepted = accepted.unwrap();
        let dialed = dialed.unwrap();

        assert_ne!(accepted.id(), dialed.id());
        assert_eq!(dialed.peer_addr().to_string(), addr);
    }

    #[tokio::test]
    async fn test_accepted_ids_are_unique() {
        let mut transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap().to_string();

        let _a = TcpConnection::connect(&addr).await.unwrap();
        let _b = TcpConnection::connect(&addr).await.unwrap();
        let first = transport.accept().await.unwrap();
        let second = transport.accept().await.unwrap();

        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_bind_invalid_address_is_typed_error() {
        let result = TcpTransport::bind("not an address").await;
        assert!(matches!(result, Err(TransportError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn test_connect_refused_is_typed_error() {
        // Grab a free port, then release it so nothing listens there.
        let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap().to_string();
        drop(transport);

        let result = TcpConnection::connect(&addr).await;
        assert!(matches!(result, Err(TransportError::ConnectFailed { .. })));
    }
}

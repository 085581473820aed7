use std::net::SocketAddr;

/// Errors that can occur in the transport layer.
///
/// Each one is fatal to the connection attempt that raised it and to
/// nothing else.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The address could not be parsed or resolved.
    #[error("invalid address {addr:?}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Binding the listening socket failed.
    #[error("bind to {addr} failed: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Accepting an incoming connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Dialing the server failed.
    #[error("connect to {addr} failed: {source}")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Setting or reading a socket option failed.
    #[error("socket option failed: {0}")]
    SocketOption(#[source] std::io::Error),
}

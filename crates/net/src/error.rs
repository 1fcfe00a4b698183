use std::net::SocketAddr;

use photon_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("Failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to send datagram to {target}: {source}")]
    Send {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid target address: {0}")]
    InvalidTarget(String),

    #[error("Datagram channel is closed")]
    Closed,

    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<NetError> for CoreError {
    fn from(err: NetError) -> Self {
        match err {
            NetError::InvalidTarget(msg) => CoreError::InvalidInput(msg),
            other => CoreError::TransportFault(other.to_string()),
        }
    }
}

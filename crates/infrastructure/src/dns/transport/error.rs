use crate::dns::wire::WireError;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Failure of a single transport attempt.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Timeout waiting for {protocol} response from {server}")]
    Timeout {
        server: SocketAddr,
        protocol: &'static str,
    },

    #[error("Connection refused by {protocol} server {server}")]
    ConnectionRefused {
        server: SocketAddr,
        protocol: &'static str,
    },

    #[error("Connection to {protocol} server {server} was reset")]
    ConnectionReset {
        server: SocketAddr,
        protocol: &'static str,
    },

    #[error("{protocol} I/O error with {server}: {message}")]
    Io {
        server: SocketAddr,
        protocol: &'static str,
        kind: io::ErrorKind,
        message: String,
    },

    #[error("Query cancelled")]
    Cancelled,

    #[error("Transaction id mismatch from {server}: expected {expected}, received {received}")]
    IdMismatch {
        server: SocketAddr,
        expected: u16,
        received: u16,
    },

    #[error("Malformed response from {server}: {source}")]
    Malformed {
        server: SocketAddr,
        #[source]
        source: WireError,
    },

    #[error("Failed to encode request: {0}")]
    Encode(#[source] WireError),
}

impl TransportError {
    pub fn from_io(server: SocketAddr, protocol: &'static str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused { server, protocol },
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => Self::ConnectionReset { server, protocol },
            io::ErrorKind::TimedOut => Self::Timeout { server, protocol },
            kind => Self::Io {
                server,
                protocol,
                kind,
                message: err.to_string(),
            },
        }
    }

    /// Failures worth retrying against the same or another server.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ConnectionRefused { .. }
                | Self::ConnectionReset { .. }
                | Self::Io { .. }
                | Self::IdMismatch { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

use crate::dns::transport::TransportError;
use crate::dns::wire::WireError;
use ferrous_lookup_domain::{DomainError, QueryResponse};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a whole lookup, after retries and failover were applied.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Failed to encode query: {0}")]
    Encode(#[source] WireError),

    #[error("Server {} answered with {}", .response.name_server(), .response.error_message())]
    DnsResponse { response: Box<QueryResponse> },

    #[error("Malformed response from {server}: {source}")]
    Parse {
        server: SocketAddr,
        #[source]
        source: WireError,
        audit_trail: Option<Arc<str>>,
    },

    #[error("Response from {server} was truncated and TCP fallback is disabled")]
    Truncated {
        server: SocketAddr,
        audit_trail: Option<Arc<str>>,
    },

    #[error("Response from {server} was truncated over TCP")]
    TruncatedOverTcp {
        server: SocketAddr,
        audit_trail: Option<Arc<str>>,
    },

    #[error(
        "No usable response from {}{}",
        format_servers(.servers),
        .last_error.as_ref().map(|e| format!(": {}", e)).unwrap_or_default()
    )]
    ConnectionTimeout {
        servers: Vec<SocketAddr>,
        last_error: Option<TransportError>,
        audit_trail: Option<Arc<str>>,
    },

    #[error("Query cancelled")]
    Cancelled { audit_trail: Option<Arc<str>> },

    #[error("Failed to start blocking runtime: {0}")]
    Runtime(String),
}

fn format_servers(servers: &[SocketAddr]) -> String {
    let list: Vec<String> = servers.iter().map(SocketAddr::to_string).collect();
    format!("[{}]", list.join(", "))
}

impl LookupError {
    pub fn audit_trail(&self) -> Option<&str> {
        match self {
            Self::DnsResponse { response } => response.audit_trail(),
            Self::Parse { audit_trail, .. }
            | Self::Truncated { audit_trail, .. }
            | Self::TruncatedOverTcp { audit_trail, .. }
            | Self::ConnectionTimeout { audit_trail, .. }
            | Self::Cancelled { audit_trail } => audit_trail.as_deref(),
            Self::Domain(_) | Self::Encode(_) | Self::Runtime(_) => None,
        }
    }

    /// The erroring response, for DNS-level failures.
    pub fn response(&self) -> Option<&QueryResponse> {
        match self {
            Self::DnsResponse { response } => Some(response),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

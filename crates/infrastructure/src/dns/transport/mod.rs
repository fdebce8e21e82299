pub mod buffer_pool;
pub mod error;
pub mod tcp;
pub mod udp;

use crate::dns::wire::DnsRequestMessage;
use async_trait::async_trait;
use ferrous_lookup_domain::{DnsMessage, NameServer};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub use buffer_pool::{BufferPool, BufferPoolStats, PooledBuffer};
pub use error::TransportError;
pub use tcp::{TcpPoolStats, TcpTransport};
pub use udp::UdpTransport;

#[derive(Debug)]
pub struct TransportResponse {
    pub message: DnsMessage,

    pub protocol_used: &'static str,
}

/// One request/response exchange with one name server.
///
/// Implementations must honor both `timeout` and `cancel` at every
/// suspension point and never return a response whose id differs from
/// `request.id`.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn query(
        &self,
        server: &NameServer,
        request: &DnsRequestMessage,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, TransportError>;

    fn protocol_name(&self) -> &'static str;
}

/// Runs `fut` under a single deadline and the caller's cancellation token,
/// whichever fires first.
pub(crate) async fn bounded<T, F>(
    fut: F,
    timeout: Duration,
    cancel: &CancellationToken,
    server: SocketAddr,
    protocol: &'static str,
) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransportError::Cancelled),
        result = tokio::time::timeout(timeout, fut) => match result {
            Ok(inner) => inner,
            Err(_) => Err(TransportError::Timeout { server, protocol }),
        },
    }
}

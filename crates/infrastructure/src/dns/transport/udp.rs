//! UDP transport for DNS queries (RFC 1035 §4.2.1)
//!
//! One datagram out, one datagram back. The receive buffer is sized to the
//! larger of the requested EDNS payload and the size the server last
//! advertised, so oversized replies surface as decode errors rather than
//! silent truncation.

use super::buffer_pool::BufferPool;
use super::error::TransportError;
use super::{bounded, DnsTransport, TransportResponse};
use crate::dns::diagnostics::Diagnostics;
use crate::dns::wire::{decode_message, header, DnsRequestMessage};
use async_trait::async_trait;
use ferrous_lookup_domain::{NameServer, LEGACY_UDP_PAYLOAD_SIZE};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const PROTOCOL: &str = "UDP";

/// DNS over UDP transport
pub struct UdpTransport {
    buffers: BufferPool,
}

impl UdpTransport {
    pub fn new() -> Self {
        Self {
            buffers: BufferPool::default(),
        }
    }

    pub fn buffer_pool(&self) -> &BufferPool {
        &self.buffers
    }

    fn create_socket(server: SocketAddr) -> std::io::Result<UdpSocket> {
        use socket2::{Domain, Protocol, Socket, Type};

        let (domain, bind_addr) = if server.is_ipv4() {
            (
                Domain::IPV4,
                SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            )
        } else {
            (
                Domain::IPV6,
                SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
            )
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_recv_buffer_size(256 * 1024)?;
        socket.bind(&bind_addr.into())?;
        socket.set_nonblocking(true)?;

        let std_socket: std::net::UdpSocket = socket.into();
        UdpSocket::from_std(std_socket)
    }

    async fn exchange(
        &self,
        server: &NameServer,
        request: &DnsRequestMessage,
        payload: &[u8],
    ) -> Result<TransportResponse, TransportError> {
        let addr = server.addr();
        let io_err = |e| TransportError::from_io(addr, PROTOCOL, e);

        let socket = Self::create_socket(addr).map_err(io_err)?;
        // A connected socket only accepts datagrams from the server.
        socket.connect(addr).await.map_err(io_err)?;

        let bytes_sent = socket.send(payload).await.map_err(io_err)?;
        debug!(server = %addr, id = request.id, bytes_sent, "UDP query sent");

        let capacity = request
            .max_udp_payload()
            .max(server.supported_udp_payload_size())
            .max(LEGACY_UDP_PAYLOAD_SIZE);
        let mut buffer = self.buffers.acquire(usize::from(capacity));

        let received = socket.recv(&mut buffer).await.map_err(io_err)?;
        let bytes = &buffer[..received];

        if let Some(received_id) = header::peek_id(bytes) {
            if received_id != request.id {
                return Err(TransportError::IdMismatch {
                    server: addr,
                    expected: request.id,
                    received: received_id,
                });
            }
        }

        let message = decode_message(bytes).map_err(|source| TransportError::Malformed {
            server: addr,
            source,
        })?;

        if let Some(size) = message.edns_udp_payload_size() {
            server.update_udp_payload_size(size);
        }

        debug!(
            server = %addr,
            id = request.id,
            bytes_received = received,
            truncated = message.header.truncated,
            "UDP response received"
        );

        Ok(TransportResponse {
            message,
            protocol_used: PROTOCOL,
        })
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn query(
        &self,
        server: &NameServer,
        request: &DnsRequestMessage,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, TransportError> {
        Diagnostics::global().udp_attempt();
        let payload = request.encode().map_err(TransportError::Encode)?;

        bounded(
            self.exchange(server, request, &payload),
            timeout,
            cancel,
            server.addr(),
            PROTOCOL,
        )
        .await
    }

    fn protocol_name(&self) -> &'static str {
        PROTOCOL
    }
}

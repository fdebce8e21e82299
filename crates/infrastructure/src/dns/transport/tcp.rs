//! TCP transport with per-server connection pooling (RFC 1035 §4.2.2)
//!
//! Every message is framed with a two-byte big-endian length. Idle
//! connections are kept per server and handed out exclusively; a connection
//! that errors, times out or is cancelled mid-exchange is dropped, never
//! pooled.

use super::error::TransportError;
use super::{bounded, DnsTransport, TransportResponse};
use crate::dns::diagnostics::Diagnostics;
use crate::dns::wire::{decode_message, DnsRequestMessage};
use async_trait::async_trait;
use dashmap::DashMap;
use ferrous_lookup_domain::{DnsMessage, LookupSettings, NameServer};
use futures::FutureExt;
use rustc_hash::FxBuildHasher;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const PROTOCOL: &str = "TCP";
const DEFAULT_MAX_IDLE_PER_SERVER: usize = 2;
const DEFAULT_CONNECTION_LIFETIME: Duration = Duration::from_secs(60);

struct PooledConnection {
    stream: TcpStream,
    created: Instant,
}

type TcpConnectionPool = DashMap<SocketAddr, Vec<PooledConnection>, FxBuildHasher>;

pub struct TcpTransport {
    pool: TcpConnectionPool,
    max_idle_per_server: usize,
    connection_lifetime: Duration,
    opened: AtomicU64,
    reused: AtomicU64,
    discarded: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpPoolStats {
    pub opened: u64,
    pub reused: u64,
    pub discarded: u64,
    pub idle: usize,
}

/// Counts the connection as discarded unless disarmed before drop. Dropping
/// the exchange future on timeout or cancellation drops this with it.
struct DiscardGuard<'a> {
    transport: &'a TcpTransport,
    server: SocketAddr,
    armed: bool,
}

impl DiscardGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for DiscardGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.transport.discarded.fetch_add(1, Ordering::Relaxed);
            Diagnostics::global().tcp_connection_discarded();
            warn!(server = %self.server, "Discarding TCP connection");
        }
    }
}

impl TcpTransport {
    pub fn new(max_idle_per_server: usize, connection_lifetime: Duration) -> Self {
        Self {
            pool: TcpConnectionPool::default(),
            max_idle_per_server,
            connection_lifetime,
            opened: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    pub fn from_settings(settings: &LookupSettings) -> Self {
        Self::new(
            settings.tcp_max_idle_per_server(),
            settings.tcp_connection_lifetime(),
        )
    }

    pub fn idle_connections(&self, server: SocketAddr) -> usize {
        self.pool.get(&server).map(|e| e.len()).unwrap_or(0)
    }

    pub fn stats(&self) -> TcpPoolStats {
        TcpPoolStats {
            opened: self.opened.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            idle: self.pool.iter().map(|e| e.len()).sum(),
        }
    }

    /// Drops every idle connection.
    pub fn clear(&self) {
        self.pool.clear();
    }

    fn is_reusable(&self, conn: &PooledConnection) -> bool {
        if conn.created.elapsed() >= self.connection_lifetime {
            return false;
        }
        // An idle connection must have nothing to read: EOF or stray bytes
        // both mean it can't carry a fresh exchange.
        let mut probe = [0u8; 1];
        matches!(
            conn.stream.try_read(&mut probe),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock
        )
    }

    fn take_pooled(&self, server: SocketAddr) -> Option<PooledConnection> {
        let mut entry = self.pool.get_mut(&server)?;
        while let Some(conn) = entry.pop() {
            if self.is_reusable(&conn) {
                return Some(conn);
            }
            self.discarded.fetch_add(1, Ordering::Relaxed);
            Diagnostics::global().tcp_connection_discarded();
            debug!(server = %server, "Dropping stale pooled TCP connection");
        }
        None
    }

    fn return_to_pool(&self, server: SocketAddr, conn: PooledConnection) {
        if conn.created.elapsed() >= self.connection_lifetime {
            return;
        }
        let mut entry = self.pool.entry(server).or_default();
        if entry.len() < self.max_idle_per_server {
            entry.push(conn);
        }
    }

    async fn connect_new(&self, server: SocketAddr) -> Result<PooledConnection, TransportError> {
        let stream = TcpStream::connect(server)
            .await
            .map_err(|e| TransportError::from_io(server, PROTOCOL, e))?;
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::from_io(server, PROTOCOL, e))?;

        self.opened.fetch_add(1, Ordering::Relaxed);
        Diagnostics::global().tcp_connection_opened();
        debug!(server = %server, "Opened TCP connection");

        Ok(PooledConnection {
            stream,
            created: Instant::now(),
        })
    }

    async fn exchange(
        &self,
        server: SocketAddr,
        request: &DnsRequestMessage,
        payload: &[u8],
    ) -> Result<TransportResponse, TransportError> {
        let mut conn = match self.take_pooled(server) {
            Some(conn) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                Diagnostics::global().tcp_connection_reused();
                conn
            }
            None => self.connect_new(server).await?,
        };
        let guard = DiscardGuard {
            transport: self,
            server,
            armed: true,
        };

        let io_err = |e| TransportError::from_io(server, PROTOCOL, e);

        send_with_length_prefix(&mut conn.stream, payload)
            .await
            .map_err(io_err)?;
        debug!(server = %server, id = request.id, message_len = payload.len(), "TCP query sent");

        let first = read_with_length_prefix(&mut conn.stream)
            .await
            .map_err(io_err)?;
        let mut message = decode_frame(server, request.id, &first)?;
        let mut total_len = first.len();

        // Multi-message replies: keep reading while another complete frame
        // is already buffered on the socket.
        while let Some(frame) = next_buffered_frame(&mut conn.stream).await.map_err(io_err)? {
            let next = decode_frame(server, request.id, &frame)?;
            total_len += frame.len();
            merge_frame(&mut message, next);
        }
        message.message_size = total_len;

        debug!(
            server = %server,
            id = request.id,
            response_len = total_len,
            "TCP response received"
        );

        guard.disarm();
        self.return_to_pool(server, conn);

        Ok(TransportResponse {
            message,
            protocol_used: PROTOCOL,
        })
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE_PER_SERVER, DEFAULT_CONNECTION_LIFETIME)
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn query(
        &self,
        server: &NameServer,
        request: &DnsRequestMessage,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, TransportError> {
        Diagnostics::global().tcp_attempt();
        let payload = request.encode().map_err(TransportError::Encode)?;
        let addr = server.addr();

        bounded(self.exchange(addr, request, &payload), timeout, cancel, addr, PROTOCOL).await
    }

    fn protocol_name(&self) -> &'static str {
        PROTOCOL
    }
}

fn decode_frame(server: SocketAddr, expected: u16, frame: &[u8]) -> Result<DnsMessage, TransportError> {
    let message =
        decode_message(frame).map_err(|source| TransportError::Malformed { server, source })?;
    if message.header.id != expected {
        return Err(TransportError::IdMismatch {
            server,
            expected,
            received: message.header.id,
        });
    }
    Ok(message)
}

fn merge_frame(into: &mut DnsMessage, next: DnsMessage) {
    into.header.answer_count = into.header.answer_count.saturating_add(next.header.answer_count);
    into.header.authority_count = into
        .header
        .authority_count
        .saturating_add(next.header.authority_count);
    into.header.additional_count = into
        .header
        .additional_count
        .saturating_add(next.header.additional_count);
    into.answers.extend(next.answers);
    into.authorities.extend(next.authorities);
    into.additionals.extend(next.additionals);
}

pub(crate) async fn send_with_length_prefix<S>(stream: &mut S, message_bytes: &[u8]) -> io::Result<()>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "message exceeds 65535 bytes"))?;

    let mut framed = Vec::with_capacity(message_bytes.len() + 2);
    framed.extend_from_slice(&length.to_be_bytes());
    framed.extend_from_slice(message_bytes);

    stream.write_all(&framed).await?;
    stream.flush().await
}

pub(crate) async fn read_with_length_prefix<S>(stream: &mut S) -> io::Result<Vec<u8>>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;

    let response_len = usize::from(u16::from_be_bytes(len_buf));

    let mut response = vec![0u8; response_len];
    stream.read_exact(&mut response).await?;
    Ok(response)
}

/// Reads one more frame only if its length prefix is already readable
/// without waiting.
async fn next_buffered_frame(stream: &mut TcpStream) -> io::Result<Option<Vec<u8>>> {
    let mut probe = [0u8; 2];
    match stream.peek(&mut probe).now_or_never() {
        Some(Ok(n)) if n == probe.len() => read_with_length_prefix(stream).await.map(Some),
        Some(Ok(_)) | None => Ok(None),
        Some(Err(e)) => Err(e),
    }
}

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

/// Maps a raw query to the raw replies to send back. An empty list means
/// stay silent. Over TCP every reply becomes one length-prefixed frame.
pub type Handler = dyn Fn(Protocol, &[u8]) -> Vec<Vec<u8>> + Send + Sync;

#[derive(Default)]
pub struct Counters {
    pub udp_queries: AtomicUsize,
    pub tcp_queries: AtomicUsize,
    pub tcp_connections: AtomicUsize,
}

/// Local DNS server answering on the same port over UDP and TCP.
pub struct MockDnsServer {
    addr: SocketAddr,
    counters: Arc<Counters>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(
        handler: impl Fn(Protocol, &[u8]) -> Vec<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        Self::start_with(handler, false).await
    }

    /// Like `start`, but closes every TCP connection after one reply.
    pub async fn start_closing(
        handler: impl Fn(Protocol, &[u8]) -> Vec<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        Self::start_with(handler, true).await
    }

    async fn start_with(
        handler: impl Fn(Protocol, &[u8]) -> Vec<Vec<u8>> + Send + Sync + 'static,
        close_after_reply: bool,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let socket = UdpSocket::bind(addr).await.unwrap();

        let handler: Arc<Handler> = Arc::new(handler);
        let counters = Arc::new(Counters::default());
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let udp_handler = Arc::clone(&handler);
        let udp_counters = Arc::clone(&counters);
        let tcp_counters = Arc::clone(&counters);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            udp_counters.udp_queries.fetch_add(1, Ordering::SeqCst);
                            for reply in udp_handler(Protocol::Udp, &buf[..len]) {
                                let _ = socket.send_to(&reply, peer).await;
                            }
                        }
                    }
                    accepted = listener.accept() => {
                        if let Ok((stream, _)) = accepted {
                            tcp_counters.tcp_connections.fetch_add(1, Ordering::SeqCst);
                            tokio::spawn(serve_tcp(
                                stream,
                                Arc::clone(&handler),
                                Arc::clone(&tcp_counters),
                                close_after_reply,
                            ));
                        }
                    }
                }
            }
        });

        Self {
            addr,
            counters,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.counters.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.counters.tcp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_connections(&self) -> usize {
        self.counters.tcp_connections.load(Ordering::SeqCst)
    }
}

async fn serve_tcp(
    mut stream: TcpStream,
    handler: Arc<Handler>,
    counters: Arc<Counters>,
    close_after_reply: bool,
) {
    loop {
        let mut len_buf = [0u8; 2];
        if stream.read_exact(&mut len_buf).await.is_err() {
            return;
        }
        let mut query = vec![0u8; usize::from(u16::from_be_bytes(len_buf))];
        if stream.read_exact(&mut query).await.is_err() {
            return;
        }
        counters.tcp_queries.fetch_add(1, Ordering::SeqCst);

        let mut out = Vec::new();
        for reply in handler(Protocol::Tcp, &query) {
            out.extend_from_slice(&(reply.len() as u16).to_be_bytes());
            out.extend_from_slice(&reply);
        }
        if !out.is_empty() && stream.write_all(&out).await.is_err() {
            return;
        }
        if close_after_reply {
            return;
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

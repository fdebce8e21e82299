use super::engine::ResolutionEngine;
use super::error::LookupError;
use crate::dns::cache::{CacheKey, ResponseCache};
use crate::dns::events::AttemptEventEmitter;
use crate::dns::transport::{DnsTransport, TcpTransport, UdpTransport};
use ferrous_lookup_domain::{
    DnsClass, DomainError, LookupOptions, LookupSettings, NameServer, QueryResponse, Question,
    RecordType,
};
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::runtime::{Builder, Handle};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Entry point for lookups. Cheap to share behind an `Arc`; concurrent
/// queries on one client are supported.
pub struct LookupClient {
    settings: Arc<LookupSettings>,
    engine: ResolutionEngine,
    tcp_pool: Option<Arc<TcpTransport>>,
    shutdown: CancellationToken,
}

impl LookupClient {
    pub fn new(options: &LookupOptions) -> Result<Self, LookupError> {
        Ok(Self::from_settings(options.build()?))
    }

    /// Client over the built-in UDP and pooled TCP transports.
    pub fn from_settings(settings: Arc<LookupSettings>) -> Self {
        let tcp = Arc::new(TcpTransport::from_settings(&settings));
        let mut client = Self::with_transports(
            settings,
            Arc::new(UdpTransport::new()),
            Arc::clone(&tcp) as Arc<dyn DnsTransport>,
        );
        client.tcp_pool = Some(tcp);
        client
    }

    pub fn with_transports(
        settings: Arc<LookupSettings>,
        udp: Arc<dyn DnsTransport>,
        tcp: Arc<dyn DnsTransport>,
    ) -> Self {
        let cache = Arc::new(ResponseCache::from_settings(&settings));
        let shutdown = CancellationToken::new();

        if settings.use_cache() && Handle::try_current().is_ok() {
            cache.spawn_sweeper(shutdown.clone());
        }

        info!(
            servers = settings.name_servers().len(),
            retries = settings.retries(),
            timeout_ms = settings.timeout().as_millis() as u64,
            tcp_only = settings.use_tcp_only(),
            cache = settings.use_cache(),
            "Lookup client created"
        );

        Self {
            engine: ResolutionEngine::new(udp, tcp, cache),
            settings,
            tcp_pool: None,
            shutdown,
        }
    }

    pub fn with_event_emitter(mut self, emitter: AttemptEventEmitter) -> Self {
        self.engine.set_event_emitter(emitter);
        self
    }

    pub fn settings(&self) -> &Arc<LookupSettings> {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        self.engine.cache()
    }

    /// The built-in TCP transport, when the client owns one.
    pub fn tcp_pool(&self) -> Option<&Arc<TcpTransport>> {
        self.tcp_pool.as_ref()
    }

    pub async fn query(&self, question: &Question) -> Result<QueryResponse, LookupError> {
        self.query_with_cancel(question, &self.shutdown.child_token())
            .await
    }

    pub async fn query_with_cancel(
        &self,
        question: &Question,
        cancel: &CancellationToken,
    ) -> Result<QueryResponse, LookupError> {
        self.engine
            .resolve(question, self.settings.name_servers(), &self.settings, cancel)
            .await
    }

    pub async fn query_name(
        &self,
        name: &str,
        record_type: RecordType,
        class: DnsClass,
    ) -> Result<QueryResponse, LookupError> {
        let question = Question::parse(name, record_type, class)?;
        self.query(&question).await
    }

    pub async fn query_name_with_cancel(
        &self,
        name: &str,
        record_type: RecordType,
        class: DnsClass,
        cancel: &CancellationToken,
    ) -> Result<QueryResponse, LookupError> {
        let question = Question::parse(name, record_type, class)?;
        self.query_with_cancel(&question, cancel).await
    }

    /// PTR lookup under `in-addr.arpa.` or `ip6.arpa.`.
    pub async fn query_reverse(&self, ip: IpAddr) -> Result<QueryResponse, LookupError> {
        self.query(&Question::reverse(ip)).await
    }

    pub async fn query_reverse_with_cancel(
        &self,
        ip: IpAddr,
        cancel: &CancellationToken,
    ) -> Result<QueryResponse, LookupError> {
        self.query_with_cancel(&Question::reverse(ip), cancel).await
    }

    /// Queries an explicit server list instead of the configured one.
    pub async fn query_server(
        &self,
        question: &Question,
        servers: &[Arc<NameServer>],
    ) -> Result<QueryResponse, LookupError> {
        self.query_server_with_cancel(question, servers, &self.shutdown.child_token())
            .await
    }

    pub async fn query_server_with_cancel(
        &self,
        question: &Question,
        servers: &[Arc<NameServer>],
        cancel: &CancellationToken,
    ) -> Result<QueryResponse, LookupError> {
        if servers.is_empty() {
            return Err(DomainError::InvalidArgument("server list is empty".into()).into());
        }
        self.engine
            .resolve(question, servers, &self.settings, cancel)
            .await
    }

    /// Cache-only lookup. Never touches the network.
    pub fn query_cache(&self, question: &Question) -> Option<QueryResponse> {
        if !self.settings.use_cache() {
            return None;
        }
        self.cache().get(&CacheKey::from(question))
    }

    pub fn query_blocking(&self, question: &Question) -> Result<QueryResponse, LookupError> {
        self.block_on(self.query(question))?
    }

    pub fn query_name_blocking(
        &self,
        name: &str,
        record_type: RecordType,
        class: DnsClass,
    ) -> Result<QueryResponse, LookupError> {
        self.block_on(self.query_name(name, record_type, class))?
    }

    pub fn query_reverse_blocking(&self, ip: IpAddr) -> Result<QueryResponse, LookupError> {
        self.block_on(self.query_reverse(ip))?
    }

    pub fn query_server_blocking(
        &self,
        question: &Question,
        servers: &[Arc<NameServer>],
    ) -> Result<QueryResponse, LookupError> {
        self.block_on(self.query_server(question, servers))?
    }

    /// Runs `fut` to completion on a private current-thread runtime.
    fn block_on<F: Future>(&self, fut: F) -> Result<F::Output, LookupError> {
        if Handle::try_current().is_ok() {
            return Err(DomainError::InvalidArgument(
                "blocking lookups cannot run inside an async runtime".into(),
            )
            .into());
        }

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LookupError::Runtime(e.to_string()))?;
        let output = runtime.block_on(fut);

        // Pooled streams are bound to the runtime that opened them.
        if let Some(tcp) = &self.tcp_pool {
            tcp.clear();
        }
        drop(runtime);
        Ok(output)
    }
}

impl Drop for LookupClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for LookupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupClient")
            .field("servers", &self.settings.name_servers().len())
            .field("cache_entries", &self.cache().len())
            .finish()
    }
}

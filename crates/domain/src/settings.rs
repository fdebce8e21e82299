use std::sync::Arc;
use std::time::Duration;

use crate::NameServer;

/// Immutable snapshot of the lookup options consumed by one or more queries.
///
/// Built by `LookupOptions::build`; never mutated afterwards, so concurrent
/// queries share it through an `Arc`. The only interior mutability is the
/// UDP payload size hint on each [`NameServer`].
#[derive(Debug)]
pub struct LookupSettings {
    pub(crate) name_servers: Vec<Arc<NameServer>>,
    pub(crate) use_cache: bool,
    pub(crate) minimum_cache_timeout: Option<Duration>,
    pub(crate) maximum_cache_timeout: Option<Duration>,
    pub(crate) cache_failed_results: bool,
    pub(crate) failed_results_cache_duration: Duration,
    pub(crate) cache_sweep_interval: Duration,
    pub(crate) recursion: bool,
    pub(crate) retries: u32,
    pub(crate) timeout: Duration,
    pub(crate) use_tcp_only: bool,
    pub(crate) use_tcp_fallback: bool,
    pub(crate) continue_on_dns_error: bool,
    pub(crate) continue_on_empty_response: bool,
    pub(crate) throw_dns_errors: bool,
    pub(crate) use_random_name_server: bool,
    pub(crate) extended_dns_buffer_size: u16,
    pub(crate) request_dnssec_records: bool,
    pub(crate) enable_audit_trail: bool,
    pub(crate) tcp_max_idle_per_server: usize,
    pub(crate) tcp_connection_lifetime: Duration,
}

impl LookupSettings {
    pub fn name_servers(&self) -> &[Arc<NameServer>] {
        &self.name_servers
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    pub fn minimum_cache_timeout(&self) -> Option<Duration> {
        self.minimum_cache_timeout
    }

    pub fn maximum_cache_timeout(&self) -> Option<Duration> {
        self.maximum_cache_timeout
    }

    pub fn cache_failed_results(&self) -> bool {
        self.cache_failed_results
    }

    pub fn failed_results_cache_duration(&self) -> Duration {
        self.failed_results_cache_duration
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        self.cache_sweep_interval
    }

    pub fn recursion(&self) -> bool {
        self.recursion
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn use_tcp_only(&self) -> bool {
        self.use_tcp_only
    }

    pub fn use_tcp_fallback(&self) -> bool {
        self.use_tcp_fallback
    }

    pub fn continue_on_dns_error(&self) -> bool {
        self.continue_on_dns_error
    }

    pub fn continue_on_empty_response(&self) -> bool {
        self.continue_on_empty_response
    }

    pub fn throw_dns_errors(&self) -> bool {
        self.throw_dns_errors
    }

    pub fn use_random_name_server(&self) -> bool {
        self.use_random_name_server
    }

    pub fn extended_dns_buffer_size(&self) -> u16 {
        self.extended_dns_buffer_size
    }

    pub fn request_dnssec_records(&self) -> bool {
        self.request_dnssec_records
    }

    /// An OPT record is attached when a buffer above 512 octets or DNSSEC
    /// records are requested.
    pub fn use_extended_dns(&self) -> bool {
        self.extended_dns_buffer_size > 512 || self.request_dnssec_records
    }

    pub fn enable_audit_trail(&self) -> bool {
        self.enable_audit_trail
    }

    pub fn tcp_max_idle_per_server(&self) -> usize {
        self.tcp_max_idle_per_server
    }

    pub fn tcp_connection_lifetime(&self) -> Duration {
        self.tcp_connection_lifetime
    }
}

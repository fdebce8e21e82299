use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::settings::LookupSettings;
use crate::{DomainError, NameServer};

pub const MIN_EDNS_BUFFER_SIZE: u16 = 512;

/// Mutable lookup options. Turned into an immutable [`LookupSettings`]
/// snapshot with [`LookupOptions::build`] before any query runs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupOptions {
    #[serde(default = "default_name_servers")]
    pub name_servers: Vec<String>,

    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Floor applied to cached TTLs.
    #[serde(default)]
    pub minimum_cache_timeout_ms: Option<u64>,

    /// Ceiling applied to cached TTLs.
    #[serde(default)]
    pub maximum_cache_timeout_ms: Option<u64>,

    #[serde(default = "default_false")]
    pub cache_failed_results: bool,

    #[serde(default = "default_failed_results_cache_duration_ms")]
    pub failed_results_cache_duration_ms: u64,

    #[serde(default = "default_cache_sweep_interval_ms")]
    pub cache_sweep_interval_ms: u64,

    #[serde(default = "default_true")]
    pub recursion: bool,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_false")]
    pub use_tcp_only: bool,

    #[serde(default = "default_true")]
    pub use_tcp_fallback: bool,

    #[serde(default = "default_true")]
    pub continue_on_dns_error: bool,

    #[serde(default = "default_true")]
    pub continue_on_empty_response: bool,

    #[serde(default = "default_false")]
    pub throw_dns_errors: bool,

    #[serde(default = "default_true")]
    pub use_random_name_server: bool,

    #[serde(default = "default_extended_dns_buffer_size")]
    pub extended_dns_buffer_size: u16,

    #[serde(default = "default_false")]
    pub request_dnssec_records: bool,

    #[serde(default = "default_false")]
    pub enable_audit_trail: bool,

    #[serde(default = "default_tcp_max_idle_per_server")]
    pub tcp_max_idle_per_server: usize,

    #[serde(default = "default_tcp_connection_lifetime_ms")]
    pub tcp_connection_lifetime_ms: u64,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            name_servers: default_name_servers(),
            use_cache: true,
            minimum_cache_timeout_ms: None,
            maximum_cache_timeout_ms: None,
            cache_failed_results: false,
            failed_results_cache_duration_ms: default_failed_results_cache_duration_ms(),
            cache_sweep_interval_ms: default_cache_sweep_interval_ms(),
            recursion: true,
            retries: default_retries(),
            timeout_ms: default_timeout_ms(),
            use_tcp_only: false,
            use_tcp_fallback: true,
            continue_on_dns_error: true,
            continue_on_empty_response: true,
            throw_dns_errors: false,
            use_random_name_server: true,
            extended_dns_buffer_size: default_extended_dns_buffer_size(),
            request_dnssec_records: false,
            enable_audit_trail: false,
            tcp_max_idle_per_server: default_tcp_max_idle_per_server(),
            tcp_connection_lifetime_ms: default_tcp_connection_lifetime_ms(),
        }
    }
}

impl LookupOptions {
    pub fn with_name_servers<I, S>(servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name_servers: servers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Validates the options and freezes them into a shareable snapshot.
    pub fn build(&self) -> Result<Arc<LookupSettings>, DomainError> {
        if self.name_servers.is_empty() {
            return Err(DomainError::InvalidArgument(
                "No name servers configured".to_string(),
            ));
        }
        let name_servers = self
            .name_servers
            .iter()
            .map(|s| s.parse::<NameServer>().map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        if self.timeout_ms == 0 {
            return Err(DomainError::ValueOutOfRange(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.extended_dns_buffer_size < MIN_EDNS_BUFFER_SIZE {
            return Err(DomainError::ValueOutOfRange(format!(
                "extended_dns_buffer_size must be between {} and 65535, got {}",
                MIN_EDNS_BUFFER_SIZE, self.extended_dns_buffer_size
            )));
        }
        if let (Some(min), Some(max)) = (self.minimum_cache_timeout_ms, self.maximum_cache_timeout_ms)
        {
            if min > max {
                return Err(DomainError::ValueOutOfRange(format!(
                    "minimum_cache_timeout_ms ({}) exceeds maximum_cache_timeout_ms ({})",
                    min, max
                )));
            }
        }
        if self.cache_sweep_interval_ms == 0 {
            return Err(DomainError::ValueOutOfRange(
                "cache_sweep_interval_ms must be greater than zero".to_string(),
            ));
        }

        Ok(Arc::new(LookupSettings {
            name_servers,
            use_cache: self.use_cache,
            minimum_cache_timeout: self.minimum_cache_timeout_ms.map(Duration::from_millis),
            maximum_cache_timeout: self.maximum_cache_timeout_ms.map(Duration::from_millis),
            cache_failed_results: self.cache_failed_results,
            failed_results_cache_duration: Duration::from_millis(
                self.failed_results_cache_duration_ms,
            ),
            cache_sweep_interval: Duration::from_millis(self.cache_sweep_interval_ms),
            recursion: self.recursion,
            retries: self.retries,
            timeout: Duration::from_millis(self.timeout_ms),
            use_tcp_only: self.use_tcp_only,
            use_tcp_fallback: self.use_tcp_fallback,
            continue_on_dns_error: self.continue_on_dns_error,
            continue_on_empty_response: self.continue_on_empty_response,
            throw_dns_errors: self.throw_dns_errors,
            use_random_name_server: self.use_random_name_server,
            extended_dns_buffer_size: self.extended_dns_buffer_size,
            request_dnssec_records: self.request_dnssec_records,
            enable_audit_trail: self.enable_audit_trail,
            tcp_max_idle_per_server: self.tcp_max_idle_per_server,
            tcp_connection_lifetime: Duration::from_millis(self.tcp_connection_lifetime_ms),
        }))
    }
}

fn default_name_servers() -> Vec<String> {
    vec!["1.1.1.1".to_string(), "8.8.8.8".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_retries() -> u32 {
    2
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_failed_results_cache_duration_ms() -> u64 {
    5000
}

fn default_cache_sweep_interval_ms() -> u64 {
    60_000
}

fn default_extended_dns_buffer_size() -> u16 {
    4096
}

fn default_tcp_max_idle_per_server() -> usize {
    2
}

fn default_tcp_connection_lifetime_ms() -> u64 {
    60_000
}

pub mod key;
pub mod metrics;
pub mod storage;
pub mod sweep;

pub use key::CacheKey;
pub use metrics::CacheMetrics;
pub use storage::ResponseCache;

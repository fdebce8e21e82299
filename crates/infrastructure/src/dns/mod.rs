pub mod cache;
pub mod diagnostics;
pub mod events;
pub mod resolver;
pub mod transport;
pub mod wire;

pub use cache::{CacheKey, CacheMetrics, ResponseCache};
pub use diagnostics::{Diagnostics, DiagnosticsSnapshot};
pub use events::{AttemptEvent, AttemptEventEmitter, AttemptOutcome, EventFilter};
pub use resolver::{LookupClient, LookupError, ResolutionEngine};
pub use transport::{
    DnsTransport, TcpPoolStats, TcpTransport, TransportError, TransportResponse, UdpTransport,
};

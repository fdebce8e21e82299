use ferrous_lookup_domain::{RecordType, ResponseCode};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// How a single attempt against one server ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Empty,
    Truncated,
    ResponseError(ResponseCode),
    Timeout,
    TransportError(Arc<str>),
    IdMismatch,
    Malformed(Arc<str>),
    Cancelled,
}

impl AttemptOutcome {
    /// Anything that made the engine retry, move on or give up.
    pub fn is_failure(&self) -> bool {
        *self != Self::Success
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Empty => f.write_str("empty response"),
            Self::Truncated => f.write_str("truncated"),
            Self::ResponseError(code) => write!(f, "response code {}", code),
            Self::Timeout => f.write_str("timeout"),
            Self::TransportError(msg) => write!(f, "transport error: {}", msg),
            Self::IdMismatch => f.write_str("transaction id mismatch"),
            Self::Malformed(msg) => write!(f, "malformed response: {}", msg),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttemptEvent {
    pub question: Arc<str>,

    pub record_type: RecordType,

    pub server: SocketAddr,

    pub protocol: &'static str,

    pub id: u16,

    /// 1-based try number against `server`.
    pub attempt: u32,

    pub elapsed_us: u64,

    pub outcome: AttemptOutcome,
}

impl AttemptEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        question: impl Into<Arc<str>>,
        record_type: RecordType,
        server: SocketAddr,
        protocol: &'static str,
        id: u16,
        attempt: u32,
        elapsed: Duration,
        outcome: AttemptOutcome,
    ) -> Self {
        Self {
            question: question.into(),
            record_type,
            server,
            protocol,
            id,
            attempt,
            elapsed_us: elapsed.as_micros() as u64,
            outcome,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_us as f64 / 1000.0
    }

    pub fn is_success(&self) -> bool {
        self.outcome == AttemptOutcome::Success
    }
}

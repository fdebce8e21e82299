use crate::dns::events::AttemptOutcome;
use chrono::Local;
use ferrous_lookup_domain::{NameServer, QueryResponse, Question};
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Human-readable record of one lookup. A disabled trail ignores every call
/// and finishes as `None`.
#[derive(Debug)]
pub struct AuditTrail {
    text: Option<String>,
}

impl AuditTrail {
    pub fn new(enabled: bool, question: &Question, servers: &[Arc<NameServer>]) -> Self {
        if !enabled {
            return Self { text: None };
        }
        let mut text = String::with_capacity(512);
        let _ = writeln!(text, "; <<>> ferrous-lookup <<>> {}", question);
        let list: Vec<String> = servers.iter().map(|s| s.addr().to_string()).collect();
        let _ = writeln!(text, "; servers: {}", list.join(", "));
        Self { text: Some(text) }
    }

    pub fn is_enabled(&self) -> bool {
        self.text.is_some()
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        if let Some(text) = self.text.as_mut() {
            let _ = text.write_fmt(args);
            text.push('\n');
        }
    }

    pub fn cache_hit(&mut self, response: &QueryResponse) {
        self.line(format_args!(
            ";; served from cache (originally from {})",
            response.name_server()
        ));
    }

    pub fn switch_to_tcp(&mut self) {
        self.line(format_args!(";; retrying over TCP"));
    }

    pub fn attempt(
        &mut self,
        server: SocketAddr,
        protocol: &str,
        id: u16,
        attempt: u32,
        elapsed: Duration,
        outcome: &AttemptOutcome,
    ) {
        self.line(format_args!(
            ";; try {} to {} over {} (id {}): {} in {} ms",
            attempt,
            server,
            protocol,
            id,
            outcome,
            elapsed.as_millis()
        ));
    }

    pub fn response(&mut self, response: &QueryResponse, elapsed: Duration) {
        if self.text.is_none() {
            return;
        }
        self.line(format_args!("{}", response.message()));
        self.line(format_args!(";; Query time: {} msec", elapsed.as_millis()));
        self.line(format_args!(";; SERVER: {}", response.name_server()));
        self.line(format_args!(
            ";; WHEN: {}",
            Local::now().format("%a %b %d %H:%M:%S %Z %Y")
        ));
        self.line(format_args!(";; MSG SIZE  rcvd: {}", response.message_size()));
    }

    pub fn finish(self) -> Option<Arc<str>> {
        self.text.map(Arc::from)
    }
}

use super::audit::AuditTrail;
use super::error::LookupError;
use super::policy::has_matching_answer;
use crate::dns::cache::{CacheKey, ResponseCache};
use crate::dns::diagnostics::Diagnostics;
use crate::dns::events::{AttemptEvent, AttemptEventEmitter, AttemptOutcome};
use crate::dns::transport::{DnsTransport, TransportError, TransportResponse};
use crate::dns::wire::{next_transaction_id, DnsRequestMessage};
use ferrous_lookup_domain::{
    DomainError, LookupSettings, NameServer, QueryResponse, Question, ResponseCode,
};
use smallvec::SmallVec;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Result of driving the server list once over one protocol.
enum Pass {
    Resolved(QueryResponse),
    SwitchToTcp,
}

/// Transaction ids handed out during one lookup. No two tries of a lookup
/// share an id, across retries, servers and the TCP re-drive.
#[derive(Default)]
struct IssuedIds(SmallVec<[u16; 8]>);

impl IssuedIds {
    fn next(&mut self) -> u16 {
        self.next_from(next_transaction_id)
    }

    fn next_from(&mut self, mut draw: impl FnMut() -> u16) -> u16 {
        // Every id is taken; start over rather than spin.
        if self.0.len() > usize::from(u16::MAX) {
            self.0.clear();
        }
        loop {
            let id = draw();
            if !self.0.contains(&id) {
                self.0.push(id);
                return id;
            }
        }
    }
}

/// One in-flight try against one server.
struct Attempt<'a> {
    question: &'a Question,
    server: SocketAddr,
    protocol: &'static str,
    id: u16,
    number: u32,
    started: Instant,
}

/// Drives a question across the configured servers: cache lookup, retries,
/// failover and UDP→TCP fallback.
pub struct ResolutionEngine {
    udp: Arc<dyn DnsTransport>,
    tcp: Arc<dyn DnsTransport>,
    cache: Arc<ResponseCache>,
    emitter: AttemptEventEmitter,
}

impl ResolutionEngine {
    pub fn new(
        udp: Arc<dyn DnsTransport>,
        tcp: Arc<dyn DnsTransport>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            udp,
            tcp,
            cache,
            emitter: AttemptEventEmitter::new_disabled(),
        }
    }

    pub fn set_event_emitter(&mut self, emitter: AttemptEventEmitter) {
        self.emitter = emitter;
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub async fn resolve(
        &self,
        question: &Question,
        servers: &[Arc<NameServer>],
        settings: &Arc<LookupSettings>,
        cancel: &CancellationToken,
    ) -> Result<QueryResponse, LookupError> {
        Diagnostics::global().query_started();

        if servers.is_empty() {
            return Err(DomainError::InvalidArgument("no name servers to query".into()).into());
        }

        let started = Instant::now();
        let mut audit = AuditTrail::new(settings.enable_audit_trail(), question, servers);
        let key = CacheKey::from(question);

        if settings.use_cache() {
            if let Some(hit) = self.cache.get(&key) {
                audit.cache_hit(&hit);
                audit.response(&hit, started.elapsed());
                return Ok(hit.with_audit_trail(audit.finish()));
            }
        }

        let mut order = servers.to_vec();
        if settings.use_random_name_server() && order.len() > 1 {
            fastrand::shuffle(&mut order);
        }

        let mut ids = IssuedIds::default();
        let mut over_tcp = settings.use_tcp_only();
        loop {
            let pass = self
                .drive(question, &order, settings, over_tcp, cancel, &mut ids, &mut audit)
                .await;
            match pass {
                Ok(Pass::Resolved(response)) => {
                    if settings.use_cache() {
                        self.cache.add(key, &response, settings);
                    }
                    audit.response(&response, started.elapsed());
                    return Ok(response.with_audit_trail(audit.finish()));
                }
                Ok(Pass::SwitchToTcp) => {
                    // drive() only asks for TCP while still on UDP.
                    debug!(question = %question, "Re-driving query over TCP");
                    audit.switch_to_tcp();
                    over_tcp = true;
                }
                Err(mut err) => {
                    attach_trail(&mut err, audit, started);
                    return Err(err);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn drive(
        &self,
        question: &Question,
        order: &[Arc<NameServer>],
        settings: &Arc<LookupSettings>,
        over_tcp: bool,
        cancel: &CancellationToken,
        ids: &mut IssuedIds,
        audit: &mut AuditTrail,
    ) -> Result<Pass, LookupError> {
        let transport = if over_tcp { &self.tcp } else { &self.udp };
        let protocol = transport.protocol_name();
        let can_switch = !over_tcp && settings.use_tcp_fallback();
        let tries = settings.retries().saturating_add(1);
        let last_index = order.len() - 1;
        let mut last_error = None;

        'servers: for (index, server) in order.iter().enumerate() {
            let is_last_server = index == last_index;

            for number in 1..=tries {
                let has_tries_left = number < tries;
                let request = DnsRequestMessage::with_id(ids.next(), question.clone(), settings);
                let attempt = Attempt {
                    question,
                    server: server.addr(),
                    protocol,
                    id: request.id,
                    number,
                    started: Instant::now(),
                };

                let result = transport
                    .query(server, &request, settings.timeout(), cancel)
                    .await;

                let err = match result {
                    Ok(TransportResponse { message, .. }) => {
                        if message.header.truncated {
                            self.finish_attempt(&attempt, AttemptOutcome::Truncated, audit);
                            if over_tcp {
                                return Err(LookupError::TruncatedOverTcp {
                                    server: attempt.server,
                                    audit_trail: None,
                                });
                            }
                            if settings.use_tcp_fallback() {
                                return Ok(Pass::SwitchToTcp);
                            }
                            return Err(LookupError::Truncated {
                                server: attempt.server,
                                audit_trail: None,
                            });
                        }

                        let response =
                            QueryResponse::new(message, attempt.server, Arc::clone(settings));
                        let rcode = response.response_code();

                        if rcode.is_error() {
                            self.finish_attempt(&attempt, AttemptOutcome::ResponseError(rcode), audit);
                            if settings.throw_dns_errors() {
                                return Err(LookupError::DnsResponse {
                                    response: Box::new(response),
                                });
                            }
                            if settings.continue_on_dns_error() && !is_last_server {
                                warn!(server = %attempt.server, rcode = %rcode, "DNS error, trying next server");
                                continue 'servers;
                            }
                            if matches!(rcode, ResponseCode::ServFail | ResponseCode::FormErr)
                                && has_tries_left
                            {
                                continue;
                            }
                            return Ok(Pass::Resolved(response));
                        }

                        if !has_matching_answer(question, response.message()) {
                            self.finish_attempt(&attempt, AttemptOutcome::Empty, audit);
                            if settings.continue_on_empty_response() && !is_last_server {
                                warn!(server = %attempt.server, "Empty response, trying next server");
                                continue 'servers;
                            }
                            return Ok(Pass::Resolved(response));
                        }

                        self.finish_attempt(&attempt, AttemptOutcome::Success, audit);
                        return Ok(Pass::Resolved(response));
                    }
                    Err(err) => err,
                };

                match err {
                    TransportError::Cancelled => {
                        self.finish_attempt(&attempt, AttemptOutcome::Cancelled, audit);
                        return Err(LookupError::Cancelled { audit_trail: None });
                    }
                    TransportError::Encode(source) => {
                        return Err(LookupError::Encode(source));
                    }
                    TransportError::Malformed { server: addr, source } => {
                        self.finish_attempt(
                            &attempt,
                            AttemptOutcome::Malformed(source.to_string().into()),
                            audit,
                        );
                        if can_switch {
                            return Ok(Pass::SwitchToTcp);
                        }
                        if over_tcp || is_last_server {
                            return Err(LookupError::Parse {
                                server: addr,
                                source,
                                audit_trail: None,
                            });
                        }
                        warn!(server = %addr, "Malformed response, trying next server");
                        continue 'servers;
                    }
                    TransportError::IdMismatch { .. } if can_switch => {
                        self.finish_attempt(&attempt, AttemptOutcome::IdMismatch, audit);
                        return Ok(Pass::SwitchToTcp);
                    }
                    other => {
                        let outcome = match &other {
                            TransportError::Timeout { .. } => AttemptOutcome::Timeout,
                            TransportError::IdMismatch { .. } => AttemptOutcome::IdMismatch,
                            e => AttemptOutcome::TransportError(e.to_string().into()),
                        };
                        self.finish_attempt(&attempt, outcome, audit);
                        last_error = Some(other);
                        if !has_tries_left {
                            warn!(
                                server = %attempt.server,
                                tries,
                                "Server exhausted its tries, moving on"
                            );
                        }
                    }
                }
            }
        }

        Err(LookupError::ConnectionTimeout {
            servers: order.iter().map(|s| s.addr()).collect(),
            last_error,
            audit_trail: None,
        })
    }

    fn finish_attempt(&self, attempt: &Attempt<'_>, outcome: AttemptOutcome, audit: &mut AuditTrail) {
        let elapsed = attempt.started.elapsed();

        debug!(
            server = %attempt.server,
            protocol = attempt.protocol,
            id = attempt.id,
            attempt = attempt.number,
            elapsed_ms = elapsed.as_millis() as u64,
            outcome = %outcome,
            "Attempt finished"
        );

        audit.attempt(
            attempt.server,
            attempt.protocol,
            attempt.id,
            attempt.number,
            elapsed,
            &outcome,
        );

        if self.emitter.wants(&outcome) {
            self.emitter.emit(AttemptEvent::new(
                attempt.question.name.to_text(),
                attempt.question.record_type,
                attempt.server,
                attempt.protocol,
                attempt.id,
                attempt.number,
                elapsed,
                outcome,
            ));
        }
    }
}

fn attach_trail(err: &mut LookupError, audit: AuditTrail, started: Instant) {
    if let LookupError::DnsResponse { response } = err {
        let mut audit = audit;
        audit.response(response, started.elapsed());
        **response = response.as_ref().clone().with_audit_trail(audit.finish());
        return;
    }

    let trail = audit.finish();
    match err {
        LookupError::Parse { audit_trail, .. }
        | LookupError::Truncated { audit_trail, .. }
        | LookupError::TruncatedOverTcp { audit_trail, .. }
        | LookupError::ConnectionTimeout { audit_trail, .. }
        | LookupError::Cancelled { audit_trail } => *audit_trail = trail,
        _ => {}
    }
}

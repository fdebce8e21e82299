use async_trait::async_trait;
use ferrous_lookup_domain::{DnsMessage, NameServer};
use ferrous_lookup_infrastructure::dns::transport::{
    DnsTransport, TransportError, TransportResponse,
};
use ferrous_lookup_infrastructure::dns::wire::DnsRequestMessage;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One recorded attempt.
#[derive(Debug, Clone)]
pub struct Call {
    pub index: usize,
    pub server: SocketAddr,
    pub request: DnsRequestMessage,
}

pub enum Reply {
    Message(DnsMessage),
    Error(TransportError),
    /// Never answers; ends on timeout or cancellation.
    Hang,
}

type Script = dyn Fn(&Call) -> Reply + Send + Sync;

/// Transport that answers from a closure and records every call.
pub struct ScriptedTransport {
    protocol: &'static str,
    script: Box<Script>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(protocol: &'static str, script: impl Fn(&Call) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            protocol,
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn udp(script: impl Fn(&Call) -> Reply + Send + Sync + 'static) -> Self {
        Self::new("UDP", script)
    }

    pub fn tcp(script: impl Fn(&Call) -> Reply + Send + Sync + 'static) -> Self {
        Self::new("TCP", script)
    }

    /// A transport that must never be used.
    pub fn unused(protocol: &'static str) -> Self {
        Self::new(protocol, |call| panic!("unexpected call {:?}", call))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, server: SocketAddr) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.server == server)
            .count()
    }
}

pub fn timed_out(call: &Call) -> Reply {
    Reply::Error(TransportError::Timeout {
        server: call.server,
        protocol: "UDP",
    })
}

#[async_trait]
impl DnsTransport for ScriptedTransport {
    async fn query(
        &self,
        server: &NameServer,
        request: &DnsRequestMessage,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, TransportError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let call = Call {
                index: calls.len(),
                server: server.addr(),
                request: request.clone(),
            };
            calls.push(call.clone());
            call
        };

        match (self.script)(&call) {
            Reply::Message(message) => Ok(TransportResponse {
                message,
                protocol_used: self.protocol,
            }),
            Reply::Error(err) => Err(err),
            Reply::Hang => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(TransportError::Cancelled),
                    _ = tokio::time::sleep(timeout) => Err(TransportError::Timeout {
                        server: server.addr(),
                        protocol: self.protocol,
                    }),
                }
            }
        }
    }

    fn protocol_name(&self) -> &'static str {
        self.protocol
    }
}

use std::net::SocketAddr;
use std::sync::Arc;

use crate::settings::LookupSettings;
use crate::{DnsMessage, Header, Question, RecordType, ResourceRecord, ResponseCode};

/// The result handed back to callers: a decoded message plus where it came
/// from and how it was obtained.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    message: DnsMessage,
    name_server: SocketAddr,
    settings: Arc<LookupSettings>,
    audit_trail: Option<Arc<str>>,
    from_cache: bool,
}

impl QueryResponse {
    pub fn new(message: DnsMessage, name_server: SocketAddr, settings: Arc<LookupSettings>) -> Self {
        Self {
            message,
            name_server,
            settings,
            audit_trail: None,
            from_cache: false,
        }
    }

    pub fn with_audit_trail(mut self, audit_trail: Option<Arc<str>>) -> Self {
        self.audit_trail = audit_trail;
        self
    }

    pub fn served_from_cache(mut self) -> Self {
        self.from_cache = true;
        self
    }

    /// Copy whose record TTLs are reduced by `elapsed_secs`.
    pub fn aged_by(&self, elapsed_secs: u32) -> Self {
        Self {
            message: self.message.aged_by(elapsed_secs),
            name_server: self.name_server,
            settings: Arc::clone(&self.settings),
            audit_trail: self.audit_trail.clone(),
            from_cache: self.from_cache,
        }
    }

    pub fn message(&self) -> &DnsMessage {
        &self.message
    }

    pub fn header(&self) -> &Header {
        &self.message.header
    }

    pub fn questions(&self) -> &[Question] {
        &self.message.questions
    }

    pub fn answers(&self) -> &[ResourceRecord] {
        &self.message.answers
    }

    pub fn authorities(&self) -> &[ResourceRecord] {
        &self.message.authorities
    }

    pub fn additionals(&self) -> &[ResourceRecord] {
        &self.message.additionals
    }

    pub fn answers_of_type(&self, record_type: RecordType) -> impl Iterator<Item = &ResourceRecord> {
        self.message.answers_of_type(record_type)
    }

    pub fn name_server(&self) -> SocketAddr {
        self.name_server
    }

    pub fn settings(&self) -> &Arc<LookupSettings> {
        &self.settings
    }

    pub fn audit_trail(&self) -> Option<&str> {
        self.audit_trail.as_deref()
    }

    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn message_size(&self) -> usize {
        self.message.message_size
    }

    pub fn response_code(&self) -> ResponseCode {
        self.message.response_code()
    }

    pub fn has_error(&self) -> bool {
        self.response_code().is_error()
    }

    /// Empty when the response code is NOERROR.
    pub fn error_message(&self) -> String {
        let code = self.response_code();
        if code.is_error() {
            format!("{}: {}", code, code.description())
        } else {
            String::new()
        }
    }
}

use crate::{DnsClass, DomainError, DomainName, RecordType};
use std::fmt;
use std::sync::Arc;

/// The identity of a lookup: name, type and class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    pub name: DomainName,
    pub record_type: RecordType,
    pub class: DnsClass,
}

impl Question {
    pub fn new(name: DomainName, record_type: RecordType, class: DnsClass) -> Self {
        Self {
            name,
            record_type,
            class,
        }
    }

    /// Parses `name` from presentation format.
    pub fn parse(name: &str, record_type: RecordType, class: DnsClass) -> Result<Self, DomainError> {
        Ok(Self::new(name.parse()?, record_type, class))
    }

    /// PTR question for the reverse-mapping name of `ip`.
    pub fn reverse(ip: std::net::IpAddr) -> Self {
        Self::new(DomainName::reverse(ip), RecordType::PTR, DnsClass::IN)
    }

    /// Canonical `name:class:type` text used as a cache key.
    pub fn canonical_key(&self) -> Arc<str> {
        format!("{}:{}:{}", self.name, self.class.to_u16(), self.record_type.to_u16()).into()
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.name, self.class, self.record_type)
    }
}

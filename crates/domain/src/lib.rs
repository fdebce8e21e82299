//! ferrous-lookup domain layer: names, records, messages and lookup settings.
pub mod config;
pub mod dns_record;
pub mod domain_name;
pub mod errors;
pub mod message;
pub mod name_server;
pub mod query_response;
pub mod question;
pub mod settings;

pub use config::{CliOverrides, Config, ConfigError, LoggingConfig, LookupOptions};
pub use dns_record::{Caa, DnsClass, EdnsOption, RecordData, RecordType, ResourceRecord, Soa};
pub use domain_name::{DomainName, MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
pub use errors::DomainError;
pub use message::{DnsMessage, Header, Opcode, ResponseCode};
pub use name_server::{NameServer, DEFAULT_DNS_PORT, LEGACY_UDP_PAYLOAD_SIZE};
pub use query_response::QueryResponse;
pub use question::Question;
pub use settings::LookupSettings;

use thiserror::Error;

/// Errors raised while building domain values. None of these are retried:
/// they describe input that can never succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Label exceeds 63 octets ({0} octets)")]
    LabelTooLong(usize),

    #[error("Domain name exceeds 255 octets ({0} octets)")]
    NameTooLong(usize),

    #[error("Invalid name server endpoint: {0}")]
    InvalidNameServer(String),

    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

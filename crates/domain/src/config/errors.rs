/// Failures while loading, validating or saving a `ferrous-lookup` config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {0}: {1}")]
    FileRead(String, String),

    #[error("Cannot write config file {0}: {1}")]
    FileWrite(String, String),

    #[error("Invalid config syntax: {0}")]
    Parse(String),

    #[error("Invalid lookup configuration: {0}")]
    Validation(String),
}

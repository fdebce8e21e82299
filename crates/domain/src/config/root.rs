use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::lookup::LookupOptions;

pub const LOCAL_CONFIG_PATH: &str = "ferrous-lookup.toml";
pub const SYSTEM_CONFIG_PATH: &str = "/etc/ferrous-lookup/config.toml";

/// Main configuration structure for ferrous-lookup
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Resolution options
    #[serde(default)]
    pub lookup: LookupOptions,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-lookup.toml in current directory
    /// 3. /etc/ferrous-lookup/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(found) = Self::get_config_path() {
            Self::from_file(&found)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if !overrides.name_servers.is_empty() {
            self.lookup.name_servers = overrides.name_servers;
        }
        if let Some(retries) = overrides.retries {
            self.lookup.retries = retries;
        }
        if let Some(timeout) = overrides.timeout_ms {
            self.lookup.timeout_ms = timeout;
        }
        if overrides.use_tcp_only {
            self.lookup.use_tcp_only = true;
        }
        if overrides.no_cache {
            self.lookup.use_cache = false;
        }
        if overrides.no_recursion {
            self.lookup.recursion = false;
        }
        if overrides.request_dnssec_records {
            self.lookup.request_dnssec_records = true;
        }
        if overrides.enable_audit_trail {
            self.lookup.enable_audit_trail = true;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lookup
            .build()
            .map(|_| ())
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "Unknown log format '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Some(LOCAL_CONFIG_PATH.to_string())
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Some(SYSTEM_CONFIG_PATH.to_string())
        } else {
            None
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub name_servers: Vec<String>,
    pub retries: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub use_tcp_only: bool,
    pub no_cache: bool,
    pub no_recursion: bool,
    pub request_dnssec_records: bool,
    pub enable_audit_trail: bool,
    pub log_level: Option<String>,
}

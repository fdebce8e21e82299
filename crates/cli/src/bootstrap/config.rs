use ferrous_lookup_domain::{CliOverrides, Config};
use tracing::error;

pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        anyhow::anyhow!(e)
    })?;

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        anyhow::anyhow!(e)
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_values_are_overridden_by_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[lookup]\nname_servers = [\"192.0.2.1:53\"]\nretries = 5\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let overrides = CliOverrides {
            retries: Some(1),
            use_tcp_only: true,
            ..Default::default()
        };
        let config = load_config(file.path().to_str(), overrides).unwrap();

        assert_eq!(config.lookup.name_servers, vec!["192.0.2.1:53".to_string()]);
        assert_eq!(config.lookup.retries, 1);
        assert!(config.lookup.use_tcp_only);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_log_format_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nformat = \"yaml\"").unwrap();
        assert!(load_config(file.path().to_str(), CliOverrides::default()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_config(Some("/nonexistent/ferrous-lookup.toml"), CliOverrides::default()).is_err());
    }
}

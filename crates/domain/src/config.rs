pub mod errors;
pub mod logging;
pub mod lookup;
pub mod root;

pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use lookup::LookupOptions;
pub use root::{CliOverrides, Config};

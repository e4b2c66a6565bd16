//! Logging setup.
//!
//! Everything in tranche logs through `tracing`; this module installs a
//! `tracing-subscriber` for binaries and tests that want the output.
//!
//! Format is controlled via `TRANCHE_LOG_FORMAT` (`json`, `pretty`,
//! `compact`), the filter via `TRANCHE_LOG_LEVEL` or `RUST_LOG`.
//!
//! ```ignore
//! use tranche_executor::observability::{TracingConfig, init_tracing};
//!
//! init_tracing(TracingConfig::from_env())?;
//! ```

mod config;
mod tracing_setup;

pub use config::{LogFormat, TracingConfig};
pub use tracing_setup::init_tracing;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.log_format(), LogFormat::Compact);
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn config_setters() {
        let config = TracingConfig::default()
            .with_log_format(LogFormat::Json)
            .with_log_filter("debug,tranche_core=trace")
            .with_location(true);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.log_filter(), "debug,tranche_core=trace");
        assert!(config.include_location());
    }

    #[test]
    fn format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert_eq!("other".parse::<LogFormat>(), Ok(LogFormat::Compact));
    }
}

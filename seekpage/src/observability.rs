//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogFormat};
use crate::error::Result;

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global `fmt` subscriber described by `config.service`
///
/// An unparsable log level falls back to `info`. Calling this twice keeps
/// the first subscriber.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = env_filter(&config.service.log_level);

    let installed = match config.service.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    if installed.is_ok() {
        tracing::info!("Tracing initialized for service: {}", config.service.name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        let config = Config::default();
        assert!(init_tracing(&config).is_ok());
        assert!(init_tracing(&config).is_ok());
    }

    #[test]
    fn test_bad_level_falls_back() {
        let filter = env_filter("seekpage=loud");
        assert_eq!(filter.to_string(), "info");
        assert_eq!(env_filter("debug").to_string(), "debug");
    }
}

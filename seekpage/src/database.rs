//! Database connection pool management

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::{sanitize_url, DatabaseError, Result};

/// Create a PostgreSQL connection pool with retry logic
///
/// Retries `config.max_retries` times with exponential backoff starting at
/// `config.retry_delay_secs`. The URL is logged with its credentials removed.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let mut attempt = 0;

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                if attempt > 0 {
                    tracing::info!(
                        "Database connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        url = %sanitize_url(&config.url),
                        "Database connection pool created: max={}, min={}",
                        config.max_connections,
                        config.min_connections
                    );
                }
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to database after {} attempts: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e.into());
                }

                let delay = backoff_delay(config.retry_delay_secs, attempt);
                tracing::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based)
fn backoff_delay(base_secs: u64, attempt: u32) -> Duration {
    let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1));
    Duration::from_secs(base_secs).saturating_mul(multiplier)
}

/// Attempt to create a database pool (single try)
async fn try_create_pool(config: &DatabaseConfig) -> std::result::Result<PgPool, DatabaseError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connection_timeout())
        .connect(&config.url)
        .await
        .map_err(|e| {
            let category = categorize_db_error(&e);
            DatabaseError::from(e).add_context(format!("{} at {}", category, sanitize_url(&config.url)))
        })
}

/// Categorize database error for better user guidance
fn categorize_db_error(err: &sqlx::Error) -> &'static str {
    use sqlx::Error;
    match err {
        Error::Configuration(_) => "Configuration error",
        Error::Database(_) => "Database error",
        Error::Io(_) => "Network I/O error - check connectivity",
        Error::Tls(_) => "TLS/SSL error - check certificate configuration",
        Error::PoolTimedOut => "Connection pool timeout - database may be overloaded",
        Error::PoolClosed => "Connection pool closed",
        Error::WorkerCrashed => "Database worker crashed",
        _ => "Connection error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DatabaseErrorKind, Error};

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(2, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2, 2), Duration::from_secs(4));
        assert_eq!(backoff_delay(2, 3), Duration::from_secs(8));
        assert_eq!(backoff_delay(0, 5), Duration::ZERO);
    }

    #[test]
    fn test_categorize() {
        assert_eq!(
            categorize_db_error(&sqlx::Error::PoolTimedOut),
            "Connection pool timeout - database may be overloaded"
        );
    }

    #[tokio::test]
    async fn test_bad_url_is_configuration_error() {
        let config = DatabaseConfig {
            max_retries: 0,
            ..DatabaseConfig::new("not-a-url")
        };

        let err = create_pool(&config).await.unwrap_err();
        match err {
            Error::DataAccess(e) => {
                assert_eq!(e.kind, DatabaseErrorKind::Configuration);
                assert!(e.context.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! Centralized PostgreSQL connection pool.
//!
//! The pool is created once at startup from [`DatabaseConfig`] and shared by
//! every component that touches the database, instead of each adapter
//! opening its own connections.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use veriflow_shared::DatabaseConfig;

/// Shared PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Connect a new pool with the configured sizing.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, PoolError> {
        info!(
            max = config.pool_size,
            min = config.min_idle,
            timeout_secs = config.connect_timeout_secs,
            "creating PostgreSQL pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .min_connections(config.min_idle)
            .acquire_timeout(config.connect_timeout())
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&config.url)
            .await
            .map_err(|e| PoolError::ConnectionFailed(e.to_string()))?;

        info!("PostgreSQL pool ready");
        Ok(Self { pool })
    }

    #[inline]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Clone the inner `PgPool` for adapters that hold their own handle.
    #[inline]
    pub fn pg_pool(&self) -> PgPool {
        self.pool.clone()
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),
}

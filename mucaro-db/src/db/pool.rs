/// Database connection pool management
///
/// This module provides the PostgreSQL connection pool using sqlx, built
/// from a resolved [`DatabaseConfig`]. The pool is the only shared mutable
/// resource in this crate: concurrency comes entirely from simultaneous
/// callers sharing it, and acquisition blocks until a connection frees up
/// or the configured connect timeout elapses.
///
/// # Example
///
/// ```no_run
/// use mucaro_db::config::DatabaseConfig;
/// use mucaro_db::db::pool::{create_pool, health_check};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = create_pool(&config).await?;
///     assert!(health_check(&pool).await);
///     Ok(())
/// }
/// ```

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::DbError;

/// Creates a bounded PostgreSQL connection pool
///
/// Connects eagerly and verifies the connection with a health probe, so a
/// returned pool is known to be usable at least once.
///
/// # Errors
///
/// Returns `DbError::Configuration` for an unparseable connection URI and
/// `DbError::Connection` when the server cannot be reached or the probe
/// fails.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    info!(
        max_connections = config.max_connections,
        connect_timeout_seconds = config.connect_timeout_seconds,
        idle_timeout_seconds = config.idle_timeout_seconds,
        "Creating database connection pool"
    );

    let options = config.connect_options()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect_with(options)
        .await?;

    if !health_check(&pool).await {
        warn!("Database reachable but health probe failed");
        return Err(DbError::Connection(
            "health check failed after pool creation".to_string(),
        ));
    }

    info!("Database connection pool created successfully");
    Ok(pool)
}

/// Performs a health probe against the database
///
/// Issues a trivial round-trip query. Returns `false` on any failure,
/// including network loss and pool exhaustion; never errors.
pub async fn health_check(pool: &PgPool) -> bool {
    debug!("Performing database health check");

    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(1) => true,
        Ok(other) => {
            warn!(value = other, "Health check returned unexpected value");
            false
        }
        Err(e) => {
            warn!(error = %e, "Health check failed");
            false
        }
    }
}

/// Snapshot of the pool's current state, for monitoring
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub active_connections: usize,

    /// Number of idle connections available
    pub idle_connections: usize,

    /// Total connections in the pool
    pub total_connections: usize,
}

pub fn get_pool_stats(pool: &PgPool) -> PoolStats {
    let size = pool.size();
    let idle = pool.num_idle();

    PoolStats {
        active_connections: (size as usize).saturating_sub(idle),
        idle_connections: idle,
        total_connections: size as usize,
    }
}

/// Gracefully closes the connection pool
///
/// Called during application shutdown so all connections are released.
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
    info!("Database connection pool closed");
}

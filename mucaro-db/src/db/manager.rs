/// Connection lifecycle management
///
/// [`ConnectionManager`] is an explicit value owning the process's one
/// pooled connection: constructed once by the entry point and passed by
/// reference to whatever executes CRUD operations. There is no module-level
/// global state.
///
/// The first `get()` opens the pool and runs pending migrations before the
/// handle is considered ready; later calls return the cached handle after a
/// health re-probe. Concurrent first callers serialize on an internal lock,
/// so exactly one of them performs initialization (and migrations run at
/// most once per process) while the rest wait for its outcome.
///
/// # Failure caching
///
/// Once initial establishment fails, the manager caches the error and
/// returns it immediately on every later `get()` without reconnecting.
/// Under a sustained outage this prevents a stampede of doomed reconnect
/// attempts from every incoming request. The manager does NOT self-heal:
/// only an explicit [`ConnectionManager::reset`] clears the cached failure.
///
/// # Example
///
/// ```no_run
/// use mucaro_db::config::DatabaseConfig;
/// use mucaro_db::db::manager::ConnectionManager;
/// use mucaro_db::db::migrations::default_migrations_dir;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = ConnectionManager::new(
///         DatabaseConfig::from_env()?,
///         default_migrations_dir(),
///     );
///
///     let pool = manager.get().await?;
///     // hand `pool` (or `&manager`) to the operations layer
///     # let _ = pool;
///     Ok(())
/// }
/// ```

use std::path::PathBuf;

use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::db::migrations;
use crate::db::pool::{close_pool, create_pool, health_check};
use crate::error::DbError;

enum ManagerState {
    NotConnected,
    Ready(PgPool),
    Failed(String),
}

/// Owns the pooled connection and its lazy, once-only initialization
pub struct ConnectionManager {
    config: DatabaseConfig,
    migrations_dir: PathBuf,
    state: Mutex<ManagerState>,
}

impl ConnectionManager {
    /// Creates a manager; no connection is attempted until [`get`](Self::get)
    pub fn new(config: DatabaseConfig, migrations_dir: PathBuf) -> Self {
        Self {
            config,
            migrations_dir,
            state: Mutex::new(ManagerState::NotConnected),
        }
    }

    /// Creates a manager from the process environment with the conventional
    /// migrations directory
    pub fn from_env() -> Result<Self, DbError> {
        Ok(Self::new(
            DatabaseConfig::from_env()?,
            migrations::default_migrations_dir(),
        ))
    }

    /// Returns the pooled connection handle, initializing it on first use
    ///
    /// # Errors
    ///
    /// - `Configuration`/`Connection`/`Migration` on a failed first
    ///   initialization (the failure is then cached)
    /// - `Connection` immediately on every call after a cached failure
    /// - `Connection` when the cached handle fails its health re-probe (the
    ///   handle is kept; a transient probe failure is not a cached failure)
    pub async fn get(&self) -> Result<PgPool, DbError> {
        let mut state = self.state.lock().await;

        match &*state {
            ManagerState::Ready(pool) => {
                if health_check(pool).await {
                    Ok(pool.clone())
                } else {
                    warn!("Cached connection failed health re-probe");
                    Err(DbError::Connection(
                        "cached connection failed health check".to_string(),
                    ))
                }
            }
            ManagerState::Failed(message) => {
                Err(DbError::Connection(message.clone()))
            }
            ManagerState::NotConnected => match self.initialize().await {
                Ok(pool) => {
                    *state = ManagerState::Ready(pool.clone());
                    Ok(pool)
                }
                Err(e) => {
                    warn!(error = %e, "Database initialization failed; caching failure");
                    *state = ManagerState::Failed(e.to_string());
                    Err(e)
                }
            },
        }
    }

    /// Whether the cached handle is currently usable; never errors
    pub async fn is_healthy(&self) -> bool {
        let state = self.state.lock().await;
        match &*state {
            ManagerState::Ready(pool) => health_check(pool).await,
            _ => false,
        }
    }

    /// Tears down the pool and clears any cached handle or failure
    ///
    /// For controlled restarts and operator intervention only; normal
    /// request paths never call this.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        if let ManagerState::Ready(pool) =
            std::mem::replace(&mut *state, ManagerState::NotConnected)
        {
            close_pool(pool).await;
        }
        info!("Connection manager reset");
    }

    async fn initialize(&self) -> Result<PgPool, DbError> {
        let pool = create_pool(&self.config).await?;
        migrations::apply_pending(&pool, &self.migrations_dir).await?;
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_manager() -> ConnectionManager {
        // Port 1 refuses connections immediately on loopback
        let mut config = DatabaseConfig::from_url("postgresql://u:p@127.0.0.1:1/nope");
        config.connect_timeout_seconds = 2;
        ConnectionManager::new(config, migrations::default_migrations_dir())
    }

    #[tokio::test]
    async fn test_first_failure_is_cached() {
        let manager = unreachable_manager();

        let first = manager.get().await.unwrap_err();
        assert!(matches!(first, DbError::Connection(_)));

        // Second call returns the cached failure without reconnecting;
        // the message carries the original failure text
        let second = manager.get().await.unwrap_err();
        assert!(matches!(second, DbError::Connection(_)));
        assert_eq!(second.to_string(), format!("database connection error: {first}"));
    }

    #[tokio::test]
    async fn test_reset_clears_cached_failure() {
        let manager = unreachable_manager();

        manager.get().await.unwrap_err();
        manager.reset().await;

        // After reset the manager attempts establishment again rather than
        // returning the cached error verbatim
        let err = manager.get().await.unwrap_err();
        assert!(!err.to_string().starts_with("database connection error: database connection error:"));
    }

    #[tokio::test]
    async fn test_not_connected_is_unhealthy() {
        let manager = unreachable_manager();
        assert!(!manager.is_healthy().await);
    }
}

/// Connection and migration layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health probes
/// - `manager`: lazy-init-once connection lifecycle with failure caching
/// - `migrations`: ledger-based, ordered migration runner
///
/// # Example
///
/// ```no_run
/// use mucaro_db::db::manager::ConnectionManager;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = ConnectionManager::from_env()?;
///     let pool = manager.get().await?;
///     # let _ = pool;
///     Ok(())
/// }
/// ```

pub mod manager;
pub mod migrations;
pub mod pool;

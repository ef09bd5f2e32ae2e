/// Database migration runner
///
/// Brings a database's schema to the latest known version, safely
/// re-entrant. Scripts are plain `.sql` files in a directory, applied in
/// ascending lexicographic name order. A ledger table records which scripts
/// have already run, so re-invocation is a no-op.
///
/// Each script is applied in its own transaction together with its ledger
/// insert: a failing script aborts the run with everything before it
/// committed and everything after it still pending for the next invocation.
/// There is no partially-applied state beyond what the ledger records.
///
/// # Example
///
/// ```no_run
/// use mucaro_db::config::DatabaseConfig;
/// use mucaro_db::db::migrations::{apply_pending, default_migrations_dir, status};
/// use mucaro_db::db::pool::create_pool;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(&DatabaseConfig::from_env()?).await?;
///     let dir = default_migrations_dir();
///
///     let applied = apply_pending(&pool, &dir).await?;
///     println!("applied {} scripts", applied.len());
///
///     let status = status(&pool, &dir).await?;
///     assert!(status.pending.is_empty());
///     Ok(())
/// }
/// ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sqlx::{Executor, PgPool};
use tracing::{debug, info, warn};

use crate::error::DbError;

/// Ledger table recording applied scripts by name
const LEDGER_TABLE: &str = "_schema_migrations";

/// Which scripts have run and which are still pending
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Script names recorded in the ledger, in applied order
    pub applied: Vec<String>,

    /// Script names present in the directory but not in the ledger
    pub pending: Vec<String>,
}

/// Applies every script not yet recorded in the ledger, in name order
///
/// Returns the names applied during this run (empty when the database is
/// already up to date).
///
/// # Errors
///
/// Returns `DbError::Migration` when:
/// - the scripts directory cannot be read
/// - an unapplied script sorts before an already-applied one (ordering
///   invariant violation; the runner never silently reorders)
/// - a script fails to execute (earlier scripts stay committed)
pub async fn apply_pending(pool: &PgPool, scripts_dir: &Path) -> Result<Vec<String>, DbError> {
    let scripts = read_scripts(scripts_dir)?;
    info!(
        dir = %scripts_dir.display(),
        discovered = scripts.len(),
        "Starting database migrations"
    );

    ensure_ledger(pool).await?;
    let applied = applied_names(pool).await?;
    check_ordering(&scripts, &applied)?;

    let mut newly_applied = Vec::new();
    for (name, sql) in &scripts {
        if applied.contains(name) {
            debug!(script = %name, "Already applied, skipping");
            continue;
        }

        let mut tx = pool.begin().await?;
        if let Err(e) = (&mut *tx).execute(sql.as_str()).await {
            warn!(script = %name, error = %e, "Migration script failed");
            return Err(DbError::Migration(format!("script '{name}' failed: {e}")));
        }
        sqlx::query("INSERT INTO _schema_migrations (name) VALUES ($1)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(script = %name, "Applied migration");
        newly_applied.push(name.clone());
    }

    info!(applied = newly_applied.len(), "Database migrations completed");
    Ok(newly_applied)
}

/// Reports applied and pending scripts without mutating anything
///
/// A database the ledger table has never been created on reports every
/// script as pending.
pub async fn status(pool: &PgPool, scripts_dir: &Path) -> Result<MigrationStatus, DbError> {
    debug!("Checking migration status");

    let scripts = read_scripts(scripts_dir)?;

    let ledger_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = $1
        )",
    )
    .bind(LEDGER_TABLE)
    .fetch_one(pool)
    .await?;

    let applied: Vec<String> = if ledger_exists {
        sqlx::query_scalar("SELECT name FROM _schema_migrations ORDER BY name")
            .fetch_all(pool)
            .await?
    } else {
        Vec::new()
    };

    let applied_set: HashSet<&String> = applied.iter().collect();
    let pending = scripts
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| !applied_set.contains(name))
        .collect();

    Ok(MigrationStatus { applied, pending })
}

/// Conventional location of the migration scripts
///
/// Tries the crate-relative `migrations/` directory first, then a plain
/// `./migrations` relative to the working directory. Deployments may always
/// pass an explicit path to [`apply_pending`] instead.
pub fn default_migrations_dir() -> PathBuf {
    let crate_relative = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    if crate_relative.is_dir() {
        return crate_relative;
    }
    PathBuf::from("migrations")
}

/// Reads and sorts the `.sql` scripts in a directory
fn read_scripts(dir: &Path) -> Result<Vec<(String, String)>, DbError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        DbError::Migration(format!("cannot read migrations directory '{}': {e}", dir.display()))
    })?;

    let mut scripts = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| DbError::Migration(format!("cannot list migrations: {e}")))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("sql") {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let sql = std::fs::read_to_string(&path)
            .map_err(|e| DbError::Migration(format!("cannot read script '{name}': {e}")))?;
        scripts.push((name, sql));
    }

    scripts.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(scripts)
}

async fn ensure_ledger(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS _schema_migrations (
            name TEXT PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn applied_names(pool: &PgPool) -> Result<HashSet<String>, DbError> {
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM _schema_migrations")
        .fetch_all(pool)
        .await?;
    Ok(names.into_iter().collect())
}

/// An unapplied script sorting before an applied one means the directory
/// was edited out from under an existing database. Fail loudly.
fn check_ordering(
    scripts: &[(String, String)],
    applied: &HashSet<String>,
) -> Result<(), DbError> {
    let latest_applied = scripts
        .iter()
        .map(|(name, _)| name)
        .filter(|name| applied.contains(*name))
        .max();

    if let Some(latest) = latest_applied {
        for (name, _) in scripts {
            if !applied.contains(name) && name < latest {
                return Err(DbError::Migration(format!(
                    "unapplied script '{name}' sorts before applied script '{latest}'; \
                     refusing to apply migrations out of order"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripts(names: &[&str]) -> Vec<(String, String)> {
        names
            .iter()
            .map(|n| (n.to_string(), String::new()))
            .collect()
    }

    fn applied(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_ordering_ok_when_prefix_applied() {
        let s = scripts(&["0001_init.sql", "0002_add_index.sql"]);
        assert!(check_ordering(&s, &applied(&["0001_init.sql"])).is_ok());
    }

    #[test]
    fn test_ordering_ok_when_nothing_applied() {
        let s = scripts(&["0001_init.sql", "0002_add_index.sql"]);
        assert!(check_ordering(&s, &applied(&[])).is_ok());
    }

    #[test]
    fn test_ordering_violation_fails_loudly() {
        // 0002 is applied but 0001 is not: someone inserted a script before
        // an already-applied one
        let s = scripts(&["0001_init.sql", "0002_add_index.sql"]);
        let err = check_ordering(&s, &applied(&["0002_add_index.sql"])).unwrap_err();
        assert!(matches!(err, DbError::Migration(_)));
        assert!(err.to_string().contains("0001_init.sql"));
    }

    #[test]
    fn test_read_scripts_sorted_and_filtered() {
        let dir = std::env::temp_dir().join(format!("mucaro-migrations-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("0002_later.sql"), "SELECT 2;").unwrap();
        std::fs::write(dir.join("0001_first.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.join("README.md"), "not a script").unwrap();

        let scripts = read_scripts(&dir).unwrap();
        let names: Vec<&str> = scripts.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["0001_first.sql", "0002_later.sql"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_read_scripts_missing_directory() {
        let err = read_scripts(Path::new("/nonexistent/migrations")).unwrap_err();
        assert!(matches!(err, DbError::Migration(_)));
    }

    #[test]
    fn test_default_migrations_dir_points_at_crate() {
        let dir = default_migrations_dir();
        assert!(dir.join("0001_init.sql").is_file());
    }
}

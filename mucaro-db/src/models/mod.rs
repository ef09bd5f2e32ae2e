/// Database models and their CRUD operations
///
/// Each model is a `sqlx::FromRow` struct with associated async operations
/// taking a `&PgPool`; payload structs validate before any round trip, and
/// every operation returns `Result<_, DbError>` with not-found as
/// `Ok(None)`.
///
/// # Models
///
/// - `user`: identity records plus the external-identity upsert seam
/// - `session`: active auth sessions (storage only)
/// - `account`: linked credential/provider records (storage only)
/// - `verification`: short-lived verification tokens (storage only)
/// - `todo`: ownership-scoped task records with filtering and statistics
///
/// # Example
///
/// ```no_run
/// use mucaro_db::models::todo::{CreateTodo, Todo};
/// use uuid::Uuid;
///
/// # async fn example(pool: sqlx::PgPool, user_id: Uuid) -> Result<(), mucaro_db::error::DbError> {
/// let todo = Todo::create(&pool, CreateTodo {
///     user_id,
///     title: "Water the plants".to_string(),
///     description: None,
///     priority: None,
///     due_date: None,
/// }).await?;
/// # let _ = todo;
/// # Ok(())
/// # }
/// ```

pub mod account;
pub mod session;
pub mod todo;
pub mod user;
pub mod verification;

/// Todo model and database operations
///
/// A todo is owned by exactly one user and is cascade-deleted with them.
/// Every read and write here is ownership-scoped: the requesting user's id
/// is part of the WHERE clause, so another user's rows are unreachable and
/// indistinguishable from nonexistent ones (`Ok(None)` either way). That
/// keeps other users' todo ids unenumerable.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE todo_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE todos (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title TEXT NOT NULL,
///     description TEXT,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     priority todo_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use mucaro_db::models::todo::{CreateTodo, Todo, TodoFilter};
/// use uuid::Uuid;
///
/// # async fn example(pool: sqlx::PgPool, user_id: Uuid) -> Result<(), mucaro_db::error::DbError> {
/// let todo = Todo::create(&pool, CreateTodo {
///     user_id,
///     title: "Buy milk".to_string(),
///     description: None,
///     priority: None, // defaults to medium
///     due_date: None,
/// }).await?;
/// assert!(!todo.completed);
///
/// let open = Todo::list_by_user(&pool, user_id, TodoFilter {
///     completed: Some(false),
///     ..Default::default()
/// }).await?;
/// # let _ = open;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::DbError;
use crate::schema::rules;

const TODO_COLUMNS: &str =
    "id, user_id, title, description, completed, priority, due_date, created_at, updated_at";

/// Todo priority level
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "todo_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parses a priority label; `None` for anything outside the enum
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == label)
    }
}

/// Todo model representing a single task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Todo {
    /// Unique todo ID
    pub id: Uuid,

    /// Owning user; rows disappear when the user is deleted
    pub user_id: Uuid,

    /// Task title (1-255 characters)
    pub title: String,

    /// Optional longer description (at most 1000 characters)
    pub description: Option<String>,

    /// Whether the task is done
    pub completed: bool,

    /// Priority level (defaults to medium)
    pub priority: Priority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// When the todo was created
    pub created_at: DateTime<Utc>,

    /// When the todo was last updated (refreshed on every mutation)
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a todo
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTodo {
    /// Owning user
    pub user_id: Uuid,

    /// Task title (1-255 characters)
    #[validate(custom(function = "crate::schema::rules::validate_title"))]
    pub title: String,

    /// Optional description (at most 1000 characters)
    #[validate(custom(function = "crate::schema::rules::validate_description"))]
    pub description: Option<String>,

    /// Priority; `None` falls back to medium
    pub priority: Option<Priority>,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial patch for an existing todo
///
/// Only `Some` fields are written. The double-`Option` fields distinguish
/// "leave unchanged" (`None`) from "clear to NULL" (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTodo {
    #[validate(custom(function = "crate::schema::rules::validate_title"))]
    pub title: Option<String>,

    pub description: Option<Option<String>>,

    pub completed: Option<bool>,

    pub priority: Option<Priority>,

    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateTodo {
    /// Validates the patch, including the nested description value the
    /// derive cannot reach through the double `Option`
    fn validate_patch(&self) -> Result<(), DbError> {
        self.validate()?;
        if let Some(Some(description)) = &self.description {
            if let Err(e) = rules::validate_description(description) {
                let mut errors = ValidationErrors::new();
                errors.add("description", e);
                return Err(errors.into());
            }
        }
        Ok(())
    }
}

/// Derived per-user statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoStats {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    /// High-priority todos still pending
    pub high_priority: u64,
    /// `round(100 * completed / total)`, 0 when there are no todos
    pub completion_rate: u32,
}

impl TodoStats {
    fn from_rows(todos: &[Todo]) -> Self {
        let total = todos.len() as u64;
        let completed = todos.iter().filter(|t| t.completed).count() as u64;
        let pending = total - completed;
        let high_priority = todos
            .iter()
            .filter(|t| t.priority == Priority::High && !t.completed)
            .count() as u64;
        let completion_rate = if total > 0 {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };

        Self {
            total,
            completed,
            pending,
            high_priority,
            completion_rate,
        }
    }
}

/// Listing filter for [`Todo::list_by_user`]
#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    /// Restrict to done / not-done todos
    pub completed: Option<bool>,

    /// Maximum rows to return (`None` = no limit)
    pub limit: Option<i64>,

    /// Rows to skip for pagination
    pub offset: Option<i64>,
}

impl Todo {
    /// Creates a new todo after validating the payload
    ///
    /// Validation happens before any round trip: an invalid payload
    /// performs no storage mutation.
    ///
    /// # Errors
    ///
    /// - `Validation` for a bad title/description
    /// - `Constraint` when `user_id` does not reference an existing user
    pub async fn create(pool: &PgPool, data: CreateTodo) -> Result<Self, DbError> {
        data.validate()?;
        let priority = data.priority.unwrap_or_default();

        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (user_id, title, description, priority, due_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(priority)
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(todo)
    }

    /// Lists a user's todos, newest first
    ///
    /// Ownership is enforced in the WHERE clause, never by post-filtering
    /// rows in application code.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        filter: TodoFilter,
    ) -> Result<Vec<Self>, DbError> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS}
             FROM todos
             WHERE user_id = $1 AND ($2::boolean IS NULL OR completed = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(user_id)
        .bind(filter.completed)
        .bind(filter.limit) // NULL limit = no limit
        .bind(filter.offset.unwrap_or(0))
        .fetch_all(pool)
        .await?;

        Ok(todos)
    }

    /// Fetches one todo, ownership-scoped
    ///
    /// Returns `Ok(None)` both when the id does not exist and when it
    /// belongs to a different user.
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, DbError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(todo)
    }

    /// Applies a partial patch, refreshing `updated_at`
    ///
    /// Only fields present in the patch are changed. Returns `Ok(None)`
    /// when the todo does not exist for this user.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTodo,
    ) -> Result<Option<Self>, DbError> {
        data.validate_patch()?;

        // Build the update dynamically from the fields present
        let mut query = String::from("UPDATE todos SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${bind_count}"));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${bind_count}"));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${bind_count}"));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {TODO_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Todo>(&query).bind(id).bind(user_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        let todo = q.fetch_optional(pool).await?;
        Ok(todo)
    }

    /// Flips `completed` in a single atomic conditional update
    ///
    /// One round trip, no read-then-write window: two concurrent toggles on
    /// the same row always produce two flips, never a lost update.
    pub async fn toggle_completion(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, DbError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos
             SET completed = NOT completed, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(todo)
    }

    /// Physically deletes a todo, ownership-scoped
    ///
    /// Returns the deleted row, or `Ok(None)` when there was nothing to
    /// delete for this user.
    pub async fn delete(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, DbError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "DELETE FROM todos WHERE id = $1 AND user_id = $2 RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(todo)
    }

    /// Computes per-user statistics
    ///
    /// Loads the user's todos and folds counts in the operations layer.
    pub async fn stats(pool: &PgPool, user_id: Uuid) -> Result<TodoStats, DbError> {
        let todos = Self::list_by_user(pool, user_id, TodoFilter::default()).await?;
        Ok(TodoStats::from_rows(&todos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_create(title: &str) -> CreateTodo {
        CreateTodo {
            user_id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            priority: None,
            due_date: None,
        }
    }

    fn row(completed: bool, priority: Priority) -> Todo {
        Todo {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "t".to_string(),
            description: None,
            completed,
            priority,
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_payload_validation() {
        assert!(sample_create("Buy milk").validate().is_ok());
        assert!(sample_create("").validate().is_err());
        assert!(sample_create(&"x".repeat(255)).validate().is_ok());
        assert!(sample_create(&"x".repeat(256)).validate().is_err());

        let mut with_description = sample_create("ok");
        with_description.description = Some("d".repeat(1000));
        assert!(with_description.validate().is_ok());
        with_description.description = Some("d".repeat(1001));
        assert!(with_description.validate().is_err());
    }

    #[test]
    fn test_update_patch_validation() {
        let patch = UpdateTodo {
            title: Some("".to_string()),
            ..Default::default()
        };
        assert!(patch.validate_patch().is_err());

        let patch = UpdateTodo {
            description: Some(Some("d".repeat(1001))),
            ..Default::default()
        };
        assert!(patch.validate_patch().is_err());

        // Clearing the description is always valid
        let patch = UpdateTodo {
            description: Some(None),
            ..Default::default()
        };
        assert!(patch.validate_patch().is_ok());

        assert!(UpdateTodo::default().validate_patch().is_ok());
    }

    #[test]
    fn test_priority_default_and_labels() {
        assert_eq!(Priority::default(), Priority::Medium);
        for (priority, label) in Priority::ALL.iter().zip(rules::PRIORITY_LABELS) {
            assert_eq!(priority.as_str(), label);
            assert_eq!(Priority::parse(label), Some(*priority));
        }
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn test_priority_serde_labels() {
        let json = serde_json::to_string(&Priority::High).unwrap();
        assert_eq!(json, "\"high\"");
        let parsed: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }

    #[test]
    fn test_stats_fold() {
        let todos = vec![
            row(true, Priority::High),
            row(false, Priority::High),
            row(false, Priority::Medium),
            row(true, Priority::Low),
        ];
        let stats = TodoStats::from_rows(&todos);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.completed + stats.pending, stats.total);
        // Only the pending high-priority todo counts
        assert_eq!(stats.high_priority, 1);
        assert_eq!(stats.completion_rate, 50);
    }

    #[test]
    fn test_stats_rounding() {
        let todos = vec![
            row(true, Priority::Medium),
            row(false, Priority::Medium),
            row(false, Priority::Medium),
        ];
        // 1/3 = 33.33..., rounds to 33
        assert_eq!(TodoStats::from_rows(&todos).completion_rate, 33);

        let todos = vec![
            row(true, Priority::Medium),
            row(true, Priority::Medium),
            row(false, Priority::Medium),
        ];
        // 2/3 = 66.67, rounds to 67
        assert_eq!(TodoStats::from_rows(&todos).completion_rate, 67);
    }

    #[test]
    fn test_stats_empty() {
        let stats = TodoStats::from_rows(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0);
    }
}

/// User model and database operations
///
/// Users are identity records addressed directly by id, unique email, or
/// unique external identity-provider id; there is no ownership scope.
/// Deleting a user cascades to their sessions, accounts, and todos at the
/// storage layer.
///
/// [`User::upsert_from_external_identity`] is the seam the auth
/// collaborator uses to keep local profile rows in sync with
/// identity-provider data. This crate never interprets the identity
/// protocol itself.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     external_id TEXT NOT NULL UNIQUE,
///     email TEXT NOT NULL UNIQUE,
///     name TEXT,
///     avatar_url TEXT,
///     email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use mucaro_db::models::user::{ExternalIdentity, User};
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), mucaro_db::error::DbError> {
/// let user = User::upsert_from_external_identity(&pool, "idp_12345", ExternalIdentity {
///     email: "user@example.com".to_string(),
///     name: Some("Jane Doe".to_string()),
///     avatar_url: None,
///     email_verified: true,
/// }).await?;
/// println!("synced {}", user.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::DbError;

const USER_COLUMNS: &str =
    "id, external_id, email, name, avatar_url, email_verified, created_at, updated_at";

/// User model representing an identity record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Identity-provider id this row mirrors (unique)
    pub external_id: String,

    /// Email address (unique at the storage layer)
    pub email: String,

    /// Optional display name (1-100 characters)
    pub name: Option<String>,

    /// Optional avatar URL
    pub avatar_url: Option<String>,

    /// Whether the identity provider has verified the email
    pub email_verified: bool,

    /// When the row was created
    pub created_at: DateTime<Utc>,

    /// When the row was last updated (refreshed on every mutation)
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    /// Identity-provider id
    #[validate(length(min = 1, message = "external id is required"))]
    pub external_id: String,

    #[validate(email)]
    pub email: String,

    #[validate(custom(function = "crate::schema::rules::validate_display_name"))]
    pub name: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,

    #[serde(default)]
    pub email_verified: bool,
}

/// Partial patch for an existing user
///
/// The double-`Option` fields distinguish "leave unchanged" (`None`) from
/// "clear to NULL" (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(email)]
    pub email: Option<String>,

    pub name: Option<Option<String>>,

    pub avatar_url: Option<Option<String>>,

    pub email_verified: Option<bool>,
}

/// Mutable profile attributes delivered by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
}

impl User {
    /// Creates a new user after validating the payload
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email, name, or avatar URL
    /// - `Constraint` when the email or external id already exists
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, DbError> {
        data.validate()?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (external_id, email, name, avatar_url, email_verified)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(data.external_id)
        .bind(data.email)
        .bind(data.name)
        .bind(data.avatar_url)
        .bind(data.email_verified)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, DbError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, DbError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<Self>, DbError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Applies a partial patch, refreshing `updated_at`
    ///
    /// Only fields present in the patch are changed. Returns `Ok(None)`
    /// when the user does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, DbError> {
        data.validate()?;

        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${bind_count}"));
        }
        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.avatar_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", avatar_url = ${bind_count}"));
        }
        if data.email_verified.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email_verified = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(avatar_url) = data.avatar_url {
            q = q.bind(avatar_url);
        }
        if let Some(email_verified) = data.email_verified {
            q = q.bind(email_verified);
        }

        let user = q.fetch_optional(pool).await?;
        Ok(user)
    }

    /// Physically deletes a user, cascading to their sessions, accounts,
    /// and todos
    ///
    /// Returns the deleted row, or `Ok(None)` when the user did not exist.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, DbError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists users with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, DbError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Creates or refreshes a user from identity-provider data
    ///
    /// Looks up by external id: when found, updates the mutable profile
    /// attributes; when not, creates the row. The auth collaborator calls
    /// this on every sign-in to keep profiles current.
    ///
    /// # Errors
    ///
    /// - `Validation` when the provider-supplied attributes fail the same
    ///   rules as a direct create
    /// - `Constraint` when the email is already taken by another user
    pub async fn upsert_from_external_identity(
        pool: &PgPool,
        external_id: &str,
        attrs: ExternalIdentity,
    ) -> Result<Self, DbError> {
        if let Some(existing) = Self::find_by_external_id(pool, external_id).await? {
            let patch = UpdateUser {
                email: Some(attrs.email),
                name: Some(attrs.name),
                avatar_url: Some(attrs.avatar_url),
                email_verified: Some(attrs.email_verified),
            };
            // The row can only vanish if deleted between the lookup and the
            // update; surface that as a constraint problem rather than None
            Self::update(pool, existing.id, patch).await?.ok_or_else(|| {
                DbError::Constraint(format!("user '{external_id}' disappeared during upsert"))
            })
        } else {
            Self::create(
                pool,
                CreateUser {
                    external_id: external_id.to_string(),
                    email: attrs.email,
                    name: attrs.name,
                    avatar_url: attrs.avatar_url,
                    email_verified: attrs.email_verified,
                },
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_create() -> CreateUser {
        CreateUser {
            external_id: "idp_1".to_string(),
            email: "user@example.com".to_string(),
            name: Some("Jane".to_string()),
            avatar_url: Some("https://example.com/a.png".to_string()),
            email_verified: false,
        }
    }

    #[test]
    fn test_create_payload_valid() {
        assert!(sample_create().validate().is_ok());
    }

    #[test]
    fn test_create_payload_rejects_bad_email() {
        let mut data = sample_create();
        data.email = "not-an-email".to_string();
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_create_payload_rejects_empty_external_id() {
        let mut data = sample_create();
        data.external_id = String::new();
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_create_payload_rejects_bad_avatar_url() {
        let mut data = sample_create();
        data.avatar_url = Some("not a url".to_string());
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_create_payload_name_bounds() {
        let mut data = sample_create();
        data.name = Some("n".repeat(100));
        assert!(data.validate().is_ok());
        data.name = Some("n".repeat(101));
        assert!(data.validate().is_err());
        data.name = None;
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_update_payload_email_validated() {
        let patch = UpdateUser {
            email: Some("broken@".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        assert!(UpdateUser::default().validate().is_ok());
    }
}

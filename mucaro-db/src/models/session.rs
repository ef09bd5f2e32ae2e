/// Session model
///
/// An active authentication session tied to exactly one user and
/// cascade-deleted with them. The auth collaborator issues and validates
/// tokens; this crate only stores and serves the rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

const SESSION_COLUMNS: &str =
    "id, user_id, token, expires_at, ip_address, user_agent, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Opaque session token (unique)
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Session {
    /// # Errors
    ///
    /// `Constraint` when the token already exists or the user does not.
    pub async fn create(pool: &PgPool, data: CreateSession) -> Result<Self, DbError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "INSERT INTO sessions (user_id, token, expires_at, ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(data.user_id)
        .bind(data.token)
        .bind(data.expires_at)
        .bind(data.ip_address)
        .bind(data.user_agent)
        .fetch_one(pool)
        .await?;

        Ok(session)
    }

    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, DbError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, DbError> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(sessions)
    }

    /// Deletes a session by token (sign-out); returns the deleted row
    pub async fn delete_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, DbError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "DELETE FROM sessions WHERE token = $1 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Removes every expired session; returns how many were deleted
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

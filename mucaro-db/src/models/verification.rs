/// Verification token model
///
/// Short-lived tokens for flows like email verification and password reset.
/// Not tied to a user by foreign key: rows are looked up by identifier plus
/// token value, and expired rows are purged in bulk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

const VERIFICATION_COLUMNS: &str = "id, identifier, value, expires_at, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Verification {
    pub id: Uuid,
    /// What is being verified (e.g. an email address)
    pub identifier: String,
    /// The opaque token value
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a verification token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVerification {
    pub identifier: String,
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Verification {
    pub async fn create(pool: &PgPool, data: CreateVerification) -> Result<Self, DbError> {
        let verification = sqlx::query_as::<_, Verification>(&format!(
            "INSERT INTO verifications (identifier, value, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {VERIFICATION_COLUMNS}"
        ))
        .bind(data.identifier)
        .bind(data.value)
        .bind(data.expires_at)
        .fetch_one(pool)
        .await?;

        Ok(verification)
    }

    /// Finds an unexpired token by identifier and value
    ///
    /// An expired token is reported the same as a missing one.
    pub async fn find_valid(
        pool: &PgPool,
        identifier: &str,
        value: &str,
    ) -> Result<Option<Self>, DbError> {
        let verification = sqlx::query_as::<_, Verification>(&format!(
            "SELECT {VERIFICATION_COLUMNS}
             FROM verifications
             WHERE identifier = $1 AND value = $2 AND expires_at > NOW()"
        ))
        .bind(identifier)
        .bind(value)
        .fetch_optional(pool)
        .await?;

        Ok(verification)
    }

    /// Deletes a token after use; returns the consumed row
    pub async fn consume(pool: &PgPool, id: Uuid) -> Result<Option<Self>, DbError> {
        let verification = sqlx::query_as::<_, Verification>(&format!(
            "DELETE FROM verifications WHERE id = $1 RETURNING {VERIFICATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(verification)
    }

    /// Removes every expired token; returns how many were deleted
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM verifications WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

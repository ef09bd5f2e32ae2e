/// Account model
///
/// A linked credential/provider record tied to one user and cascade-deleted
/// with them. For password-based accounts `password_hash` holds the
/// credential hash; the hashing itself is the auth collaborator's problem.
/// Nothing here is interpreted beyond storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

const ACCOUNT_COLUMNS: &str = "id, user_id, provider_id, account_id, password_hash, \
                               access_token, refresh_token, scope, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Provider identifier (e.g. "credential", "github")
    pub provider_id: String,
    /// The user's id at the provider
    pub account_id: String,
    pub password_hash: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub user_id: Uuid,
    pub provider_id: String,
    pub account_id: String,
    pub password_hash: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

impl Account {
    /// # Errors
    ///
    /// `Constraint` when the user does not exist.
    pub async fn create(pool: &PgPool, data: CreateAccount) -> Result<Self, DbError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (user_id, provider_id, account_id, password_hash,
                                   access_token, refresh_token, scope)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(data.user_id)
        .bind(data.provider_id)
        .bind(data.account_id)
        .bind(data.password_hash)
        .bind(data.access_token)
        .bind(data.refresh_token)
        .bind(data.scope)
        .fetch_one(pool)
        .await?;

        Ok(account)
    }

    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, DbError> {
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(accounts)
    }

    /// Looks up the account a provider knows by `account_id`
    pub async fn find_by_provider(
        pool: &PgPool,
        provider_id: &str,
        account_id: &str,
    ) -> Result<Option<Self>, DbError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE provider_id = $1 AND account_id = $2"
        ))
        .bind(provider_id)
        .bind(account_id)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }
}

//! Database operations for the `users` and `api_tokens` tables.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{conflict_or_sqlx, DbError};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub mail: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Creates an account.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] if the username or mail is taken, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    mail: &str,
    password_hash: &str,
) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (username, mail, password_hash) \
         VALUES ($1, $2, $3) \
         RETURNING id, username, mail, password_hash, created_at",
    )
    .bind(username)
    .bind(mail)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_or_sqlx(e, "account"))
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_user_by_mail(pool: &PgPool, mail: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, mail, password_hash, created_at \
         FROM users \
         WHERE mail = $1",
    )
    .bind(mail)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Stores the hash of a freshly issued bearer token.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_api_token(
    pool: &PgPool,
    user_id: i64,
    token_hash: &str,
) -> Result<(), DbError> {
    sqlx::query("INSERT INTO api_tokens (user_id, token_hash) VALUES ($1, $2)")
        .bind(user_id)
        .bind(token_hash)
        .execute(pool)
        .await
        .map_err(|e| conflict_or_sqlx(e, "token"))?;
    Ok(())
}

/// Resolves a token hash to its owner and bumps the token's `last_used_at`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_user_by_token_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "WITH used AS ( \
             UPDATE api_tokens SET last_used_at = NOW() \
             WHERE token_hash = $1 \
             RETURNING user_id \
         ) \
         SELECT u.id, u.username, u.mail, u.password_hash, u.created_at \
         FROM users u \
         JOIN used ON used.user_id = u.id",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

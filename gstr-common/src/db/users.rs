//! Dashboard account operations

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::auth::{generate_salt, hash_password, verify_password};
use crate::models::User;
use crate::{Error, Result};

/// Count stored users
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Create a user with a freshly salted password hash
///
/// Returns `Error::InvalidInput` when the email is already registered.
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    password: &str,
    name: &str,
    role: &str,
    created_at: &str,
) -> Result<User> {
    if find_user(pool, email).await?.is_some() {
        return Err(Error::InvalidInput("Email already registered".to_string()));
    }

    let salt = generate_salt();
    let hash = hash_password(password, &salt);

    sqlx::query(
        r#"
        INSERT INTO users (guid, email, name, role, password_hash, password_salt, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(email)
    .bind(name)
    .bind(role)
    .bind(hash)
    .bind(salt)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(User {
        email: email.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        created_at: created_at.to_string(),
    })
}

/// Load user by email (no credentials)
pub async fn find_user(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT email, name, role, created_at FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| User {
        email: row.get("email"),
        name: row.get("name"),
        role: row.get("role"),
        created_at: row.get("created_at"),
    }))
}

/// Verify credentials, returning the user on success
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT email, name, role, created_at, password_hash, password_salt FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let hash: String = row.get("password_hash");
    let salt: String = row.get("password_salt");
    if !verify_password(password, &salt, &hash) {
        return Ok(None);
    }

    Ok(Some(User {
        email: row.get("email"),
        name: row.get("name"),
        role: row.get("role"),
        created_at: row.get("created_at"),
    }))
}

//! Authentication token persistence
//!
//! Each user has at most one token; it is created on first login and reused
//! afterwards.

use recipe_common::auth::generate_token_key;
use recipe_common::db::User;
use recipe_common::Result;
use sqlx::SqlitePool;

/// Return the user's token, creating one if needed
pub async fn get_or_create_token(pool: &SqlitePool, user_id: i64) -> Result<String> {
    // OR IGNORE: a concurrent login may have inserted the token first
    sqlx::query("INSERT OR IGNORE INTO auth_tokens (key, user_id) VALUES (?, ?)")
        .bind(generate_token_key())
        .bind(user_id)
        .execute(pool)
        .await?;

    let key: String = sqlx::query_scalar("SELECT key FROM auth_tokens WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(key)
}

/// User owning `key`, if the token exists
pub async fn user_for_token(pool: &SqlitePool, key: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.email, u.name, u.password_hash, u.password_salt,
               u.is_active, u.is_staff, u.is_superuser
        FROM auth_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

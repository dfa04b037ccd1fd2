//! User account persistence

use recipe_common::auth::{hash_password, normalize_email};
use recipe_common::db::User;
use recipe_common::{Error, FieldErrors, Result};
use sqlx::SqlitePool;
use tracing::info;

const USER_COLUMNS: &str =
    "id, email, name, password_hash, password_salt, is_active, is_staff, is_superuser";

/// Message for a duplicate email
pub const EMAIL_TAKEN: &str = "user with this email already exists.";

/// Changes applied by a profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Create a regular user
pub async fn create_user(pool: &SqlitePool, email: &str, password: &str, name: &str) -> Result<User> {
    insert_user(pool, email, password, name, false).await
}

/// Create a staff superuser
pub async fn create_superuser(pool: &SqlitePool, email: &str, password: &str) -> Result<User> {
    let user = insert_user(pool, email, password, "", true).await?;
    info!("Created superuser {}", user.email);
    Ok(user)
}

async fn insert_user(
    pool: &SqlitePool,
    email: &str,
    password: &str,
    name: &str,
    superuser: bool,
) -> Result<User> {
    if email.trim().is_empty() {
        return Err(Error::InvalidInput("Users must have an email address".to_string()));
    }

    let email = normalize_email(email);
    let stored = hash_password(password);

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, name, password_hash, password_salt, is_staff, is_superuser)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&email)
    .bind(name)
    .bind(&stored.hash)
    .bind(&stored.salt)
    .bind(superuser)
    .bind(superuser)
    .execute(pool)
    .await
    .map_err(map_unique_email)?;

    get_user(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| Error::Internal("inserted user vanished".to_string()))
}

/// Load user by id
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Load user by email (normalized before lookup)
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await?;
    Ok(user)
}

/// Active user matching the credentials, if any
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<Option<User>> {
    let user = find_by_email(pool, email).await?;
    Ok(user.filter(|u| u.is_active && u.check_password(password)))
}

/// Apply profile changes and return the updated user
pub async fn update_user(pool: &SqlitePool, id: i64, changes: &UserChanges) -> Result<User> {
    let mut tx = pool.begin().await?;

    if let Some(email) = &changes.email {
        sqlx::query("UPDATE users SET email = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(normalize_email(email))
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_unique_email)?;
    }

    if let Some(name) = &changes.name {
        sqlx::query("UPDATE users SET name = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    if let Some(password) = &changes.password {
        let stored = hash_password(password);
        sqlx::query(
            "UPDATE users SET password_hash = ?, password_salt = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(&stored.hash)
        .bind(&stored.salt)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    get_user(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {}", id)))
}

fn map_unique_email(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Validation(FieldErrors::single("email", EMAIL_TAKEN))
        }
        _ => Error::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_common::db::init_memory_database;

    #[tokio::test]
    async fn test_create_user_with_email_successful() {
        let pool = init_memory_database().await.unwrap();
        let user = create_user(&pool, "test@example.com", "testpass123", "Test")
            .await
            .unwrap();

        assert_eq!(user.email, "test@example.com");
        assert!(user.check_password("testpass123"));
        assert!(user.is_active);
        assert!(!user.is_staff);
        assert!(!user.is_superuser);
    }

    #[tokio::test]
    async fn test_new_user_email_normalized() {
        let pool = init_memory_database().await.unwrap();
        let samples = [
            ("test1@EXAMPLE.com", "test1@example.com"),
            ("Test2@Example.com", "Test2@example.com"),
            ("TEST3@EXAMPLE.COM", "TEST3@example.com"),
            ("test4@example.COM", "test4@example.com"),
        ];

        for (email, expected) in samples {
            let user = create_user(&pool, email, "sample123", "").await.unwrap();
            assert_eq!(user.email, expected);
        }
    }

    #[tokio::test]
    async fn test_new_user_without_email_raises_error() {
        let pool = init_memory_database().await.unwrap();
        let result = create_user(&pool, "", "test123", "").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_superuser() {
        let pool = init_memory_database().await.unwrap();
        let user = create_superuser(&pool, "test@example.com", "test123").await.unwrap();
        assert!(user.is_superuser);
        assert!(user.is_staff);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_validation_error() {
        let pool = init_memory_database().await.unwrap();
        create_user(&pool, "test@example.com", "test123", "a").await.unwrap();

        let err = create_user(&pool, "test@EXAMPLE.com", "test123", "b")
            .await
            .unwrap_err();
        match err {
            Error::Validation(errors) => {
                assert_eq!(errors.get("email"), Some(&[EMAIL_TAKEN.to_string()][..]))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_authenticate() {
        let pool = init_memory_database().await.unwrap();
        create_user(&pool, "test@example.com", "goodpass", "").await.unwrap();

        assert!(authenticate(&pool, "test@example.com", "goodpass").await.unwrap().is_some());
        assert!(authenticate(&pool, "test@example.com", "badpass").await.unwrap().is_none());
        assert!(authenticate(&pool, "nobody@example.com", "goodpass").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_authenticate() {
        let pool = init_memory_database().await.unwrap();
        let user = create_user(&pool, "test@example.com", "goodpass", "").await.unwrap();
        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(authenticate(&pool, "test@example.com", "goodpass").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_user_changes_only_given_fields() {
        let pool = init_memory_database().await.unwrap();
        let user = create_user(&pool, "test@example.com", "oldpass", "old name").await.unwrap();

        let changes = UserChanges {
            name: Some("new name".to_string()),
            password: Some("newpass123".to_string()),
            ..Default::default()
        };
        let updated = update_user(&pool, user.id, &changes).await.unwrap();

        assert_eq!(updated.name, "new name");
        assert_eq!(updated.email, "test@example.com");
        assert!(updated.check_password("newpass123"));
        assert!(!updated.check_password("oldpass"));
    }
}

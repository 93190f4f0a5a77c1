use sqlx::SqlitePool;

use crate::db::models::UserRow;

/// Find a user by email (the natural key for identity resolution).
pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, picture, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Get a user by id.
pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, picture, created_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Resolve an identity to a user row, creating one on first sight.
///
/// Insert-or-ignore plus re-select inside a single transaction, so two
/// concurrent logins for the same new email can never produce two rows.
/// An existing row is returned unchanged; profile fields are not synced back.
pub async fn resolve_or_create(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    picture: Option<&str>,
) -> Result<UserRow, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT OR IGNORE INTO users (name, email, picture) VALUES (?, ?, ?)")
        .bind(name)
        .bind(email)
        .bind(picture)
        .execute(&mut *tx)
        .await?;

    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, picture, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_pool, run_migrations};

    async fn setup_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_resolve_creates_on_first_sight() {
        let pool = setup_db().await;

        let user = resolve_or_create(&pool, "Alice", "alice@example.com", Some("http://pic"))
            .await
            .unwrap();
        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.picture, Some("http://pic".to_string()));

        let found = get_user_by_email(&pool, "alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_resolve_returns_existing_row_unchanged() {
        let pool = setup_db().await;

        let first = resolve_or_create(&pool, "Alice", "alice@example.com", None)
            .await
            .unwrap();
        // Second login with a changed display name must not update the row.
        let second = resolve_or_create(&pool, "Alice Renamed", "alice@example.com", None)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Alice");
    }

    #[tokio::test]
    async fn test_resolve_never_duplicates_an_email() {
        let pool = setup_db().await;

        for _ in 0..5 {
            resolve_or_create(&pool, "Bob", "bob@example.com", None)
                .await
                .unwrap();
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind("bob@example.com")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_resolution_single_row() {
        let pool = setup_db().await;

        // Duplicate-tab login: the same new identity resolved from two tasks.
        let a = resolve_or_create(&pool, "Carol", "carol@example.com", None);
        let b = resolve_or_create(&pool, "Carol", "carol@example.com", None);
        let (ra, rb) = tokio::join!(a, b);
        assert_eq!(ra.unwrap().id, rb.unwrap().id);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind("carol@example.com")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_get_user_missing() {
        let pool = setup_db().await;
        assert!(get_user(&pool, 999).await.unwrap().is_none());
        assert!(
            get_user_by_email(&pool, "nobody@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }
}

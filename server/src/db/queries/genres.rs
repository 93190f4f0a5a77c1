use sqlx::SqlitePool;

use crate::db::models::GenreRow;

/// A genre row joined with its owner's display name, for the JSON projection.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GenreWithOwner {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub poster: Option<String>,
    pub user_id: i64,
    pub owner: String,
}

/// List all genres in random order (the browse page shuffles on every load).
pub async fn list_random(pool: &SqlitePool) -> Result<Vec<GenreRow>, sqlx::Error> {
    sqlx::query_as::<_, GenreRow>(
        "SELECT id, name, description, poster, user_id, created_at \
         FROM genres ORDER BY RANDOM()",
    )
    .fetch_all(pool)
    .await
}

/// Get a genre by id.
pub async fn get_genre(pool: &SqlitePool, genre_id: i64) -> Result<Option<GenreRow>, sqlx::Error> {
    sqlx::query_as::<_, GenreRow>(
        "SELECT id, name, description, poster, user_id, created_at \
         FROM genres WHERE id = ?",
    )
    .bind(genre_id)
    .fetch_optional(pool)
    .await
}

/// Get a genre joined with its owner's name.
pub async fn get_genre_with_owner(
    pool: &SqlitePool,
    genre_id: i64,
) -> Result<Option<GenreWithOwner>, sqlx::Error> {
    sqlx::query_as::<_, GenreWithOwner>(
        "SELECT g.id, g.name, g.description, g.poster, g.user_id, u.name AS owner \
         FROM genres g JOIN users u ON g.user_id = u.id \
         WHERE g.id = ?",
    )
    .bind(genre_id)
    .fetch_optional(pool)
    .await
}

/// List all genres joined with owner names.
pub async fn list_with_owner(pool: &SqlitePool) -> Result<Vec<GenreWithOwner>, sqlx::Error> {
    sqlx::query_as::<_, GenreWithOwner>(
        "SELECT g.id, g.name, g.description, g.poster, g.user_id, u.name AS owner \
         FROM genres g JOIN users u ON g.user_id = u.id \
         ORDER BY g.id",
    )
    .fetch_all(pool)
    .await
}

/// Create a genre. Fails with a unique-constraint error on a duplicate name.
pub async fn create_genre(
    pool: &SqlitePool,
    name: &str,
    description: &str,
    poster: Option<&str>,
    user_id: i64,
) -> Result<GenreRow, sqlx::Error> {
    let result =
        sqlx::query("INSERT INTO genres (name, description, poster, user_id) VALUES (?, ?, ?, ?)")
            .bind(name)
            .bind(description)
            .bind(poster)
            .bind(user_id)
            .execute(pool)
            .await?;

    let row = get_genre(pool, result.last_insert_rowid()).await?;
    row.ok_or(sqlx::Error::RowNotFound)
}

/// Update a genre's name and description. Returns false if the row is gone.
pub async fn update_genre(
    pool: &SqlitePool,
    genre_id: i64,
    name: &str,
    description: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE genres SET name = ?, description = ? WHERE id = ?")
        .bind(name)
        .bind(description)
        .bind(genre_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Replace a genre's poster reference.
pub async fn set_poster(
    pool: &SqlitePool,
    genre_id: i64,
    poster: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE genres SET poster = ? WHERE id = ?")
        .bind(poster)
        .bind(genre_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a genre and every movie referencing it in one transaction.
///
/// Returns the poster filenames that were referenced by the deleted rows so
/// the caller can remove the files after the transaction commits. A failure
/// anywhere rolls the whole cascade back; movies are never orphaned.
pub async fn delete_cascade(pool: &SqlitePool, genre_id: i64) -> Result<Vec<String>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let mut posters: Vec<String> = sqlx::query_scalar(
        "SELECT poster FROM movies WHERE genre_id = ? AND poster IS NOT NULL",
    )
    .bind(genre_id)
    .fetch_all(&mut *tx)
    .await?;

    let genre_poster: Option<String> =
        sqlx::query_scalar("SELECT poster FROM genres WHERE id = ?")
            .bind(genre_id)
            .fetch_one(&mut *tx)
            .await?;
    posters.extend(genre_poster);

    sqlx::query("DELETE FROM movies WHERE genre_id = ?")
        .bind(genre_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM genres WHERE id = ?")
        .bind(genre_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(posters)
}

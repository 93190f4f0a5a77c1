use sqlx::SqlitePool;

use crate::db::models::MovieRow;

/// Fields for a new movie row.
pub struct NewMovie<'a> {
    pub name: &'a str,
    pub storyline: Option<&'a str>,
    pub poster: Option<&'a str>,
    pub trailer_url: Option<&'a str>,
    pub genre_id: i64,
    pub user_id: i64,
}

/// List a genre's movies in random order.
pub async fn list_by_genre_random(
    pool: &SqlitePool,
    genre_id: i64,
) -> Result<Vec<MovieRow>, sqlx::Error> {
    sqlx::query_as::<_, MovieRow>(
        "SELECT id, name, storyline, poster, trailer_url, genre_id, user_id, created_at \
         FROM movies WHERE genre_id = ? ORDER BY RANDOM()",
    )
    .bind(genre_id)
    .fetch_all(pool)
    .await
}

/// List a genre's movies in insertion order (stable, for the JSON projection).
pub async fn list_by_genre(
    pool: &SqlitePool,
    genre_id: i64,
) -> Result<Vec<MovieRow>, sqlx::Error> {
    sqlx::query_as::<_, MovieRow>(
        "SELECT id, name, storyline, poster, trailer_url, genre_id, user_id, created_at \
         FROM movies WHERE genre_id = ? ORDER BY id",
    )
    .bind(genre_id)
    .fetch_all(pool)
    .await
}

/// Get a movie by id.
pub async fn get_movie(pool: &SqlitePool, movie_id: i64) -> Result<Option<MovieRow>, sqlx::Error> {
    sqlx::query_as::<_, MovieRow>(
        "SELECT id, name, storyline, poster, trailer_url, genre_id, user_id, created_at \
         FROM movies WHERE id = ?",
    )
    .bind(movie_id)
    .fetch_optional(pool)
    .await
}

/// Create a movie in a genre.
pub async fn create_movie(
    pool: &SqlitePool,
    movie: &NewMovie<'_>,
) -> Result<MovieRow, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO movies (name, storyline, poster, trailer_url, genre_id, user_id) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(movie.name)
    .bind(movie.storyline)
    .bind(movie.poster)
    .bind(movie.trailer_url)
    .bind(movie.genre_id)
    .bind(movie.user_id)
    .execute(pool)
    .await?;

    let row = get_movie(pool, result.last_insert_rowid()).await?;
    row.ok_or(sqlx::Error::RowNotFound)
}

/// Update a movie's editable fields. Returns false if the row is gone.
pub async fn update_movie(
    pool: &SqlitePool,
    movie_id: i64,
    name: &str,
    storyline: Option<&str>,
    trailer_url: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE movies SET name = ?, storyline = ?, trailer_url = ? WHERE id = ?")
            .bind(name)
            .bind(storyline)
            .bind(trailer_url)
            .bind(movie_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Replace a movie's poster reference.
pub async fn set_poster(
    pool: &SqlitePool,
    movie_id: i64,
    poster: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE movies SET poster = ? WHERE id = ?")
        .bind(poster)
        .bind(movie_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a movie. Returns its poster filename, if any, for file cleanup.
pub async fn delete_movie(
    pool: &SqlitePool,
    movie_id: i64,
) -> Result<Option<String>, sqlx::Error> {
    let poster: Option<Option<String>> =
        sqlx::query_scalar("SELECT poster FROM movies WHERE id = ?")
            .bind(movie_id)
            .fetch_optional(pool)
            .await?;

    sqlx::query("DELETE FROM movies WHERE id = ?")
        .bind(movie_id)
        .execute(pool)
        .await?;

    Ok(poster.flatten())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_pool, run_migrations};
    use crate::db::queries::{genres, users};

    async fn setup_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    async fn setup_genre(pool: &SqlitePool) -> (i64, i64) {
        let uid = users::resolve_or_create(pool, "Test User", "t@example.com", None)
            .await
            .unwrap()
            .id;
        let genre = genres::create_genre(pool, "action", "desc", None, uid)
            .await
            .unwrap();
        (uid, genre.id)
    }

    #[tokio::test]
    async fn test_create_and_get_movie() {
        let pool = setup_db().await;
        let (uid, gid) = setup_genre(&pool).await;

        let movie = create_movie(
            &pool,
            &NewMovie {
                name: "Mad Max",
                storyline: Some("Roads, rage"),
                poster: None,
                trailer_url: Some("https://youtu.be/abc123"),
                genre_id: gid,
                user_id: uid,
            },
        )
        .await
        .unwrap();

        let fetched = get_movie(&pool, movie.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Mad Max");
        assert_eq!(fetched.genre_id, gid);
        assert_eq!(fetched.user_id, uid);
    }

    #[tokio::test]
    async fn test_update_movie() {
        let pool = setup_db().await;
        let (uid, gid) = setup_genre(&pool).await;
        let movie = create_movie(
            &pool,
            &NewMovie {
                name: "Old Name",
                storyline: None,
                poster: None,
                trailer_url: None,
                genre_id: gid,
                user_id: uid,
            },
        )
        .await
        .unwrap();

        assert!(
            update_movie(&pool, movie.id, "New Name", Some("plot"), None)
                .await
                .unwrap()
        );
        let fetched = get_movie(&pool, movie.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "New Name");
        assert_eq!(fetched.storyline, Some("plot".to_string()));

        assert!(!update_movie(&pool, 9999, "x", None, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_movie_returns_poster() {
        let pool = setup_db().await;
        let (uid, gid) = setup_genre(&pool).await;
        let movie = create_movie(
            &pool,
            &NewMovie {
                name: "With Poster",
                storyline: None,
                poster: Some("poster.png"),
                trailer_url: None,
                genre_id: gid,
                user_id: uid,
            },
        )
        .await
        .unwrap();

        let poster = delete_movie(&pool, movie.id).await.unwrap();
        assert_eq!(poster, Some("poster.png".to_string()));
        assert!(get_movie(&pool, movie.id).await.unwrap().is_none());

        // Deleting an already-gone movie is a no-op with no poster.
        assert!(delete_movie(&pool, movie.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_genre() {
        let pool = setup_db().await;
        let (uid, gid) = setup_genre(&pool).await;
        for i in 0..4 {
            create_movie(
                &pool,
                &NewMovie {
                    name: &format!("Movie {i}"),
                    storyline: None,
                    poster: None,
                    trailer_url: None,
                    genre_id: gid,
                    user_id: uid,
                },
            )
            .await
            .unwrap();
        }

        assert_eq!(list_by_genre(&pool, gid).await.unwrap().len(), 4);
        assert_eq!(list_by_genre_random(&pool, gid).await.unwrap().len(), 4);
        assert!(list_by_genre(&pool, 999).await.unwrap().is_empty());
    }
}

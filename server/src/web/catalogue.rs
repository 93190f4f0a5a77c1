use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::CookieJar;
use tracing::info;

use crate::db::queries::{genres, movies};

use super::app_state::AppState;
use super::auth_middleware::{AuthUser, session_id};
use super::error::ApiError;

/// The logged-in user's display block for page data, if any.
fn current_user(state: &AppState, jar: &CookieJar) -> Option<serde_json::Value> {
    let sid = session_id(jar)?;
    let view = state.sessions.current(&sid)?;
    Some(serde_json::json!({
        "id": view.user_id,
        "name": view.name,
        "email": view.email,
        "picture": view.picture,
    }))
}

// ── Browse (public) ─────────────────────────────────────────

/// GET /api/genres — all genres, shuffled on every load.
pub async fn show_genres(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let all = genres::list_random(&state.db).await?;
    Ok(Json(serde_json::json!({
        "genres": all,
        "user": current_user(&state, &jar),
    }))
    .into_response())
}

/// GET /api/genres/{id}/movies — a genre and its movies, shuffled.
pub async fn show_genre_movies(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(genre_id): Path<i64>,
) -> Result<Response, ApiError> {
    let genre = genres::get_genre(&state.db, genre_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let listing = movies::list_by_genre_random(&state.db, genre_id).await?;
    Ok(Json(serde_json::json!({
        "genre": genre,
        "movies": listing,
        "user": current_user(&state, &jar),
    }))
    .into_response())
}

/// GET /api/movies/{id} — movie details with the derived trailer embed URL.
pub async fn show_movie(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(movie_id): Path<i64>,
) -> Result<Response, ApiError> {
    let movie = movies::get_movie(&state.db, movie_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let embed_url = movie.trailer_url.as_deref().and_then(youtube_embed_url);
    Ok(Json(serde_json::json!({
        "movie": movie,
        "embed_url": embed_url,
        "user": current_user(&state, &jar),
    }))
    .into_response())
}

/// Turn a shared YouTube link into an embeddable player URL.
fn youtube_embed_url(trailer_url: &str) -> Option<String> {
    let video_id = trailer_url
        .strip_prefix("https://youtu.be/")
        .or_else(|| trailer_url.strip_prefix("https://www.youtube.com/watch?v="))?;
    Some(format!("https://www.youtube.com/embed/{video_id}"))
}

// ── Form parsing ────────────────────────────────────────────

struct PosterUpload {
    filename: String,
    bytes: Vec<u8>,
}

/// Collect text fields and the optional poster file from a multipart form.
async fn read_form(
    mut multipart: Multipart,
) -> Result<(HashMap<String, String>, Option<PosterUpload>), ApiError> {
    let mut fields = HashMap::new();
    let mut poster = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "poster" {
            let filename = field.file_name().unwrap_or("poster").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ApiError::BadRequest("Failed to read poster data".into()))?;
            // An empty file input is submitted as a zero-length part.
            if !bytes.is_empty() {
                poster = Some(PosterUpload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|_| ApiError::BadRequest(format!("Malformed field '{name}'")))?;
            fields.insert(name, value);
        }
    }

    Ok((fields, poster))
}

fn required<'a>(fields: &'a HashMap<String, String>, name: &str) -> Result<&'a str, ApiError> {
    match fields.get(name).map(String::as_str).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::BadRequest(format!("Field '{name}' is required"))),
    }
}

fn optional<'a>(fields: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .map(String::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

// ── Genre mutation (owner-gated) ────────────────────────────

/// POST /api/genres — create a genre owned by the acting user.
pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (fields, poster) = read_form(multipart).await?;
    let name = required(&fields, "name")?;
    let description = required(&fields, "description")?;

    let stored = match poster {
        Some(upload) => Some(state.posters.save(&upload.filename, &upload.bytes)?),
        None => None,
    };

    match genres::create_genre(
        &state.db,
        name,
        description,
        stored.as_deref(),
        auth.view.user_id,
    )
    .await
    {
        Ok(genre) => {
            info!(genre_id = genre.id, user_id = auth.view.user_id, "genre created");
            Ok((StatusCode::CREATED, Json(genre)).into_response())
        }
        Err(e) => {
            // The row never landed; don't leave the poster file behind.
            if let Some(filename) = &stored {
                state.posters.delete(filename);
            }
            Err(e.into())
        }
    }
}

/// POST /api/genres/{id} — edit a genre (owner only).
pub async fn edit_genre(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(genre_id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let genre = genres::get_genre(&state.db, genre_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    auth.require_owner(genre.user_id)?;

    let (fields, poster) = read_form(multipart).await?;
    let name = required(&fields, "name")?;
    let description = required(&fields, "description")?;

    genres::update_genre(&state.db, genre_id, name, description).await?;

    if let Some(upload) = poster {
        let stored = state.posters.save(&upload.filename, &upload.bytes)?;
        genres::set_poster(&state.db, genre_id, &stored).await?;
        if let Some(old) = &genre.poster {
            state.posters.delete(old);
        }
    }

    let updated = genres::get_genre(&state.db, genre_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated).into_response())
}

/// DELETE /api/genres/{id} — delete a genre and all of its movies (owner
/// only). The cascade is one transaction; poster files are removed only
/// after it commits.
pub async fn delete_genre(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(genre_id): Path<i64>,
) -> Result<Response, ApiError> {
    let genre = genres::get_genre(&state.db, genre_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    auth.require_owner(genre.user_id)?;

    let posters = genres::delete_cascade(&state.db, genre_id).await?;
    for filename in &posters {
        state.posters.delete(filename);
    }

    info!(genre_id, user_id = auth.view.user_id, "genre deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ── Movie mutation (owner-gated) ────────────────────────────

/// POST /api/genres/{id}/movies — add a movie to a genre (genre owner only).
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(genre_id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let genre = genres::get_genre(&state.db, genre_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    auth.require_owner(genre.user_id)?;

    let (fields, poster) = read_form(multipart).await?;
    let name = required(&fields, "name")?;

    let stored = match poster {
        Some(upload) => Some(state.posters.save(&upload.filename, &upload.bytes)?),
        None => None,
    };

    match movies::create_movie(
        &state.db,
        &movies::NewMovie {
            name,
            storyline: optional(&fields, "storyline"),
            poster: stored.as_deref(),
            trailer_url: optional(&fields, "trailer_url"),
            genre_id,
            user_id: auth.view.user_id,
        },
    )
    .await
    {
        Ok(movie) => {
            info!(movie_id = movie.id, genre_id, "movie added");
            Ok((StatusCode::CREATED, Json(movie)).into_response())
        }
        Err(e) => {
            if let Some(filename) = &stored {
                state.posters.delete(filename);
            }
            Err(e.into())
        }
    }
}

/// POST /api/movies/{id} — edit a movie (owner only).
pub async fn edit_movie(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(movie_id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let movie = movies::get_movie(&state.db, movie_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    auth.require_owner(movie.user_id)?;

    let (fields, poster) = read_form(multipart).await?;
    let name = required(&fields, "name")?;

    movies::update_movie(
        &state.db,
        movie_id,
        name,
        optional(&fields, "storyline"),
        optional(&fields, "trailer_url"),
    )
    .await?;

    if let Some(upload) = poster {
        let stored = state.posters.save(&upload.filename, &upload.bytes)?;
        movies::set_poster(&state.db, movie_id, &stored).await?;
        if let Some(old) = &movie.poster {
            state.posters.delete(old);
        }
    }

    let updated = movies::get_movie(&state.db, movie_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated).into_response())
}

/// DELETE /api/movies/{id} — remove a movie (owner only).
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(movie_id): Path<i64>,
) -> Result<Response, ApiError> {
    let movie = movies::get_movie(&state.db, movie_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    auth.require_owner(movie.user_id)?;

    let poster = movies::delete_movie(&state.db, movie_id).await?;
    if let Some(filename) = &poster {
        state.posters.delete(filename);
    }

    info!(movie_id, user_id = auth.view.user_id, "movie deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

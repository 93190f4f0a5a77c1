use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Serialize;

use crate::db::models::MovieRow;
use crate::db::queries::genres::{self, GenreWithOwner};
use crate::db::queries::movies;

use super::app_state::AppState;
use super::error::ApiError;

/// Public movie projection. Field names match the long-standing JSON feed.
#[derive(Serialize)]
pub struct MovieJson {
    pub name: String,
    pub storyline: Option<String>,
    pub poster: Option<String>,
    pub trailer_url: Option<String>,
    pub id: i64,
}

impl From<MovieRow> for MovieJson {
    fn from(row: MovieRow) -> Self {
        Self {
            name: row.name,
            storyline: row.storyline,
            poster: row.poster,
            trailer_url: row.trailer_url,
            id: row.id,
        }
    }
}

/// Public genre projection with its movies inlined.
#[derive(Serialize)]
pub struct GenreJson {
    pub name: String,
    pub description: String,
    pub poster: Option<String>,
    pub owner: String,
    pub owner_id: i64,
    pub id: i64,
    pub movies: Vec<MovieJson>,
}

impl GenreJson {
    fn new(genre: GenreWithOwner, listing: Vec<MovieRow>) -> Self {
        Self {
            name: genre.name,
            description: genre.description,
            poster: genre.poster,
            owner: genre.owner,
            owner_id: genre.user_id,
            id: genre.id,
            movies: listing.into_iter().map(MovieJson::from).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct CatalogueJson {
    #[serde(rename = "Lists")]
    pub lists: Vec<GenreJson>,
}

/// GET /json — every genre with its movies.
pub async fn index_json(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogueJson>, ApiError> {
    let mut lists = Vec::new();
    for genre in genres::list_with_owner(&state.db).await? {
        let listing = movies::list_by_genre(&state.db, genre.id).await?;
        lists.push(GenreJson::new(genre, listing));
    }
    Ok(Json(CatalogueJson { lists }))
}

#[derive(Serialize)]
pub struct MovieDetailJson {
    #[serde(rename = "Movie")]
    pub movie: MovieJson,
}

/// GET /json/movie/{id} — one movie.
pub async fn movie_json(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i64>,
) -> Result<Json<MovieDetailJson>, ApiError> {
    let movie = movies::get_movie(&state.db, movie_id)
        .await?
        .ok_or(ApiError::JsonNotFound)?;
    Ok(Json(MovieDetailJson {
        movie: movie.into(),
    }))
}

#[derive(Serialize)]
pub struct GenreDetailJson {
    #[serde(rename = "Movies")]
    pub movies: Vec<GenreJson>,
}

/// GET /json/genre/{id} — one genre with its movies.
pub async fn genre_json(
    State(state): State<Arc<AppState>>,
    Path(genre_id): Path<i64>,
) -> Result<Json<GenreDetailJson>, ApiError> {
    let genre = genres::get_genre_with_owner(&state.db, genre_id)
        .await?
        .ok_or(ApiError::JsonNotFound)?;
    let listing = movies::list_by_genre(&state.db, genre_id).await?;
    Ok(Json(GenreDetailJson {
        movies: vec![GenreJson::new(genre, listing)],
    }))
}

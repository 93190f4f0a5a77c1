use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use super::app_state::AppState;
use super::{catalogue, json_api, oauth};

/// Build the axum router with all HTTP routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Restrict CORS to the configured public_url origin (or allow any for localhost dev)
    let public_url = &state.auth_config.public_url;
    let cors = if public_url.contains("localhost") || public_url.contains("127.0.0.1") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origin = public_url
            .parse::<HeaderValue>()
            .unwrap_or_else(|_| HeaderValue::from_static("https://localhost"));
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Leave room for the form fields around a maximum-size poster, so the
    // storage layer is what rejects oversized uploads with its own error.
    let upload_limit = DefaultBodyLimit::max(state.posters.max_bytes() as usize + 64 * 1024);

    // Session lifecycle: login page data, provider callbacks, logout
    let auth_routes = Router::new()
        .route("/login", axum::routing::get(oauth::show_login))
        .route("/gconnect", axum::routing::post(oauth::gconnect))
        .route("/fbconnect", axum::routing::post(oauth::fbconnect))
        .route("/logout", axum::routing::get(oauth::logout));

    // Read-only JSON feed (public, no auth)
    let json_routes = Router::new()
        .route("/json", axum::routing::get(json_api::index_json))
        .route("/json/movie/{id}", axum::routing::get(json_api::movie_json))
        .route("/json/genre/{id}", axum::routing::get(json_api::genre_json));

    // Catalogue browse + ownership-gated mutation
    let api_routes = Router::new()
        .route(
            "/api/genres",
            axum::routing::get(catalogue::show_genres).post(catalogue::create_genre),
        )
        .route(
            "/api/genres/{id}",
            axum::routing::post(catalogue::edit_genre).delete(catalogue::delete_genre),
        )
        .route(
            "/api/genres/{id}/movies",
            axum::routing::get(catalogue::show_genre_movies).post(catalogue::create_movie),
        )
        .route(
            "/api/movies/{id}",
            axum::routing::get(catalogue::show_movie)
                .post(catalogue::edit_movie)
                .delete(catalogue::delete_movie),
        )
        .layer(upload_limit);

    Router::new()
        .merge(auth_routes)
        .merge(json_routes)
        .merge(api_routes)
        // Uploaded poster images
        .nest_service(
            "/posters",
            ServeDir::new(state.posters.root().to_path_buf()),
        )
        // Static files with SPA fallback — unmatched routes serve index.html
        .fallback_service(ServeDir::new("static").fallback(ServeFile::new("static/index.html")))
        .layer(cors)
        .with_state(state)
}

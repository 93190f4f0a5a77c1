use serde::{Deserialize, Serialize};

/// A registered user, created lazily on first OAuth sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
    pub created_at: String,
}

/// A genre collection owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GenreRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub poster: Option<String>,
    pub user_id: i64,
    pub created_at: String,
}

/// A movie entry within a genre.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MovieRow {
    pub id: i64,
    pub name: String,
    pub storyline: Option<String>,
    pub poster: Option<String>,
    pub trailer_url: Option<String>,
    pub genre_id: i64,
    pub user_id: i64,
    pub created_at: String,
}

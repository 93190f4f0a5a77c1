use std::time::Duration;

use sqlx::SqlitePool;

use crate::auth::config::AuthConfig;
use crate::auth::session::SessionStore;
use crate::storage::PosterStore;

/// Shared state for all web handlers.
pub struct AppState {
    pub db: SqlitePool,
    pub sessions: SessionStore,
    pub auth_config: AuthConfig,
    pub posters: PosterStore,
    /// HTTP client for identity-provider calls, with a bounded timeout so a
    /// stalled provider surfaces as an auth failure instead of a hung request.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        auth_config: AuthConfig,
        posters: PosterStore,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(auth_config.provider_timeout_secs))
            .build()?;
        Ok(Self {
            db,
            sessions: SessionStore::new(),
            auth_config,
            posters,
            http,
        })
    }
}

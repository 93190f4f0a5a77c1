use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use marquee_server::auth::config::AuthConfig;
use marquee_server::config::ServerConfig;
use marquee_server::db::pool::{create_pool, run_migrations};
use marquee_server::storage::PosterStore;
use marquee_server::web::app_state::AppState;
use marquee_server::web::router::build_router;

#[derive(Parser)]
#[command(name = "marquee-server", about = "Multi-user movie catalogue server")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "marquee.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(&args.config);
    let auth_config = AuthConfig::from_env();

    if auth_config.google.is_none() && auth_config.facebook.is_none() {
        tracing::warn!("no OAuth provider configured; sign-in will be unavailable");
    }

    // Initialize database
    let pool = create_pool(&config.database.url).await?;
    run_migrations(&pool).await?;

    let posters = PosterStore::new(&config.storage.upload_dir, config.max_poster_bytes())?;

    let app_state = Arc::new(AppState::new(pool, auth_config, posters)?);
    let app = build_router(app_state);

    info!("Marquee server starting — Web: {}", config.server.web_address);

    let listener = tokio::net::TcpListener::bind(&config.server.web_address).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

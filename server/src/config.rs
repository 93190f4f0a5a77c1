use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Top-level server configuration, loaded from marquee.toml.
/// OAuth provider credentials are environment-only (see auth::config).
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub storage: StorageSection,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub web_address: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            web_address: "0.0.0.0:8080".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite:marquee.db?mode=rwc".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory for uploaded poster images.
    pub upload_dir: String,
    pub max_poster_size_mb: u64,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            upload_dir: "uploads".into(),
            max_poster_size_mb: 4,
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file. Falls back to defaults if the file doesn't exist.
    /// Environment variables override TOML values.
    pub fn load(path: &str) -> Self {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("failed to read config file {}: {}", path, e));
            toml::from_str(&contents)
                .unwrap_or_else(|e| panic!("failed to parse config file {}: {}", path, e))
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("WEB_ADDRESS") {
            self.server.web_address = v;
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("UPLOAD_DIR") {
            self.storage.upload_dir = v;
        }
        if let Ok(v) = std::env::var("MAX_POSTER_SIZE_MB")
            && let Ok(mb) = v.parse()
        {
            self.storage.max_poster_size_mb = mb;
        }
    }

    pub fn max_poster_bytes(&self) -> u64 {
        self.storage.max_poster_size_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.web_address, "0.0.0.0:8080");
        assert_eq!(config.database.url, "sqlite:marquee.db?mode=rwc");
        assert_eq!(config.storage.upload_dir, "uploads");
        assert_eq!(config.max_poster_bytes(), 4 * 1024 * 1024);
    }

    #[test]
    fn test_partial_toml_keeps_section_defaults() {
        let config: ServerConfig = toml::from_str(
            "[server]\nweb_address = \"127.0.0.1:9000\"\n",
        )
        .unwrap();
        assert_eq!(config.server.web_address, "127.0.0.1:9000");
        assert_eq!(config.database.url, "sqlite:marquee.db?mode=rwc");
    }

    #[test]
    fn test_full_toml() {
        let config: ServerConfig = toml::from_str(
            "[server]\n\
             web_address = \"0.0.0.0:80\"\n\
             [database]\n\
             url = \"sqlite:/data/movies.db\"\n\
             [storage]\n\
             upload_dir = \"/data/posters\"\n\
             max_poster_size_mb = 8\n",
        )
        .unwrap();
        assert_eq!(config.database.url, "sqlite:/data/movies.db");
        assert_eq!(config.storage.upload_dir, "/data/posters");
        assert_eq!(config.max_poster_bytes(), 8 * 1024 * 1024);
    }
}

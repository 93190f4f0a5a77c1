/// Authentication configuration, loaded from environment variables.
/// Provider credentials never live in the TOML config file.
#[derive(Clone)]
pub struct AuthConfig {
    pub public_url: String,
    /// Timeout for all identity-provider HTTP calls, in seconds.
    pub provider_timeout_secs: u64,
    pub google: Option<OAuthProviderConfig>,
    pub facebook: Option<OAuthProviderConfig>,
}

#[derive(Clone)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl AuthConfig {
    /// Load auth config from environment variables.
    /// Only providers with both CLIENT_ID and CLIENT_SECRET set will be enabled.
    pub fn from_env() -> Self {
        let google = match (
            std::env::var("GOOGLE_CLIENT_ID"),
            std::env::var("GOOGLE_CLIENT_SECRET"),
        ) {
            (Ok(id), Ok(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some(OAuthProviderConfig {
                    client_id: id,
                    client_secret: secret,
                })
            }
            _ => None,
        };

        let facebook = match (
            std::env::var("FACEBOOK_CLIENT_ID"),
            std::env::var("FACEBOOK_CLIENT_SECRET"),
        ) {
            (Ok(id), Ok(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some(OAuthProviderConfig {
                    client_id: id,
                    client_secret: secret,
                })
            }
            _ => None,
        };

        Self {
            public_url: std::env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            provider_timeout_secs: std::env::var("PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            google,
            facebook,
        }
    }

    /// Names of the providers that are configured and usable.
    pub fn enabled_providers(&self) -> Vec<&'static str> {
        let mut providers = Vec::new();
        if self.google.is_some() {
            providers.push("google");
        }
        if self.facebook.is_some() {
            providers.push("facebook");
        }
        providers
    }
}

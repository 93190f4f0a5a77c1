use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::config::OAuthProviderConfig;

/// OAuth identity providers supported for sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Facebook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }
}

/// A verified identity returned by a provider exchange.
#[derive(Debug, Clone)]
pub struct Identity {
    pub provider: Provider,
    /// Provider-issued subject id.
    pub subject: String,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

/// A provider access token as plain data — token string plus expiry.
/// No provider-SDK objects are held in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub secret: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    fn from_expires_in(secret: String, expires_in: Option<i64>) -> Self {
        Self {
            secret,
            expires_at: expires_in.map(|s| Utc::now() + Duration::seconds(s)),
        }
    }
}

/// Provider-agnostic authentication failure.
#[derive(Debug)]
pub enum AuthFailure {
    /// The presented code/token was rejected or verification failed (client fault).
    Rejected(String),
    /// The provider returned an error or an unusable payload.
    Provider(String),
    /// The provider did not answer within the configured timeout.
    Timeout,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::Rejected(reason) => write!(f, "authentication rejected: {reason}"),
            AuthFailure::Provider(reason) => write!(f, "provider error: {reason}"),
            AuthFailure::Timeout => write!(f, "provider request timed out"),
        }
    }
}

impl From<reqwest::Error> for AuthFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AuthFailure::Timeout
        } else {
            AuthFailure::Provider(e.to_string())
        }
    }
}

// ── Google ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct GoogleTokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    id_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct IdTokenClaims {
    sub: String,
    aud: Option<String>,
}

/// Token metadata from Google's tokeninfo endpoint.
#[derive(Deserialize)]
pub struct GoogleTokenInfo {
    pub user_id: Option<String>,
    pub issued_to: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct GoogleUser {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

/// Exchange a Google authorization code for a verified identity.
///
/// The exchange is rejected unless the tokeninfo check passes: the token must
/// carry no error, its subject must match the id_token subject, and it must
/// have been issued to this application's client id.
pub async fn google_exchange(
    http: &reqwest::Client,
    config: &OAuthProviderConfig,
    code: &str,
) -> Result<(Identity, AccessToken), AuthFailure> {
    // Step 1: upgrade the authorization code into an access token.
    let token: GoogleTokenResponse = http
        .post("https://oauth2.googleapis.com/token")
        .form(&[
            ("code", code),
            ("client_id", &config.client_id),
            ("client_secret", &config.client_secret),
            // The login page uses the postmessage popup flow.
            ("redirect_uri", "postmessage"),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?
        .json()
        .await?;

    if let Some(error) = token.error {
        let detail = token.error_description.unwrap_or(error);
        return Err(AuthFailure::Rejected(format!(
            "failed to upgrade the authorization code: {detail}"
        )));
    }
    let access_token = token
        .access_token
        .ok_or_else(|| AuthFailure::Provider("token response missing access_token".into()))?;
    let id_token = token
        .id_token
        .ok_or_else(|| AuthFailure::Provider("token response missing id_token".into()))?;
    let claims = decode_id_token_claims(&id_token)?;
    if claims.aud.as_deref() != Some(config.client_id.as_str()) {
        return Err(AuthFailure::Rejected(
            "id_token audience does not match the app's client id".into(),
        ));
    }
    let subject = claims.sub;

    // Step 2: verify the access token against tokeninfo.
    let info: GoogleTokenInfo = http
        .get("https://www.googleapis.com/oauth2/v1/tokeninfo")
        .query(&[("access_token", access_token.as_str())])
        .send()
        .await?
        .json()
        .await?;
    verify_google_token_info(&info, &subject, &config.client_id)?;

    // Step 3: fetch the profile with the verified token.
    let user: GoogleUser = http
        .get("https://www.googleapis.com/oauth2/v3/userinfo")
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await?
        .json()
        .await?;

    if user.sub != subject {
        return Err(AuthFailure::Rejected(
            "userinfo subject does not match token subject".into(),
        ));
    }
    let email = user
        .email
        .ok_or_else(|| AuthFailure::Provider("userinfo returned no email".into()))?;
    let name = user.name.unwrap_or_else(|| email.clone());

    Ok((
        Identity {
            provider: Provider::Google,
            subject,
            name,
            email,
            picture: user.picture,
        },
        AccessToken::from_expires_in(access_token, token.expires_in),
    ))
}

/// Check tokeninfo against the expected subject and our registered client id.
fn verify_google_token_info(
    info: &GoogleTokenInfo,
    subject: &str,
    client_id: &str,
) -> Result<(), AuthFailure> {
    if let Some(error) = &info.error {
        return Err(AuthFailure::Provider(format!("tokeninfo error: {error}")));
    }
    if info.user_id.as_deref() != Some(subject) {
        return Err(AuthFailure::Rejected(
            "token's user id doesn't match the given user id".into(),
        ));
    }
    if info.issued_to.as_deref() != Some(client_id) {
        return Err(AuthFailure::Rejected(
            "token's client id does not match the app's".into(),
        ));
    }
    Ok(())
}

/// Decode the claims segment of an id_token without signature verification.
/// The token was received directly from the provider over TLS.
fn decode_id_token_claims(id_token: &str) -> Result<IdTokenClaims, AuthFailure> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthFailure::Provider("malformed id_token".into()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthFailure::Provider("id_token payload is not base64".into()))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| AuthFailure::Provider("id_token claims are not valid JSON".into()))
}

// ── Facebook ────────────────────────────────────────────────

#[derive(Deserialize)]
struct FacebookTokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<FacebookError>,
}

#[derive(Deserialize)]
struct FacebookError {
    message: String,
}

#[derive(Deserialize)]
struct FacebookUser {
    id: String,
    name: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct FacebookPicture {
    data: Option<FacebookPictureData>,
}

#[derive(Deserialize)]
struct FacebookPictureData {
    url: Option<String>,
}

/// Exchange a short-lived Facebook client token for a verified identity.
///
/// The short-lived token is upgraded to a long-lived server token, then the
/// profile is fetched explicitly. A profile without an email gets the
/// deterministic placeholder `{id}@facebook.com` so email-based user
/// resolution still works and stays unique per provider subject.
pub async fn facebook_exchange(
    http: &reqwest::Client,
    config: &OAuthProviderConfig,
    short_lived_token: &str,
) -> Result<(Identity, AccessToken), AuthFailure> {
    let token: FacebookTokenResponse = http
        .get("https://graph.facebook.com/v12.0/oauth/access_token")
        .query(&[
            ("grant_type", "fb_exchange_token"),
            ("client_id", &config.client_id),
            ("client_secret", &config.client_secret),
            ("fb_exchange_token", short_lived_token),
        ])
        .send()
        .await?
        .json()
        .await?;

    if let Some(error) = token.error {
        return Err(AuthFailure::Rejected(format!(
            "failed to exchange the client token: {}",
            error.message
        )));
    }
    let access_token = token
        .access_token
        .ok_or_else(|| AuthFailure::Provider("token response missing access_token".into()))?;

    let user: FacebookUser = http
        .get("https://graph.facebook.com/v12.0/me")
        .query(&[("fields", "id,name,email")])
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await?
        .json()
        .await?;

    // Picture lives behind a separate edge; absence is not a failure.
    let picture = http
        .get("https://graph.facebook.com/v12.0/me/picture")
        .query(&[("redirect", "0"), ("height", "200"), ("width", "200")])
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .ok();
    let picture = match picture {
        Some(resp) => resp
            .json::<FacebookPicture>()
            .await
            .ok()
            .and_then(|p| p.data)
            .and_then(|d| d.url),
        None => None,
    };

    let email = user
        .email
        .unwrap_or_else(|| facebook_fallback_email(&user.id));

    Ok((
        Identity {
            provider: Provider::Facebook,
            subject: user.id,
            name: user.name,
            email,
            picture,
        },
        AccessToken::from_expires_in(access_token, token.expires_in),
    ))
}

/// Deterministic placeholder email, unique per Facebook subject id.
fn facebook_fallback_email(subject: &str) -> String {
    format!("{subject}@facebook.com")
}

// ── Revocation ──────────────────────────────────────────────

/// Revoke a provider token on logout. Best-effort: a failure is reported to
/// the caller and logged, but never blocks local logout.
pub async fn revoke(
    http: &reqwest::Client,
    provider: Provider,
    subject: &str,
    token: &str,
) -> Result<(), String> {
    let result = match provider {
        Provider::Google => http
            .get("https://accounts.google.com/o/oauth2/revoke")
            .query(&[("token", token)])
            .send()
            .await,
        Provider::Facebook => http
            .delete(format!(
                "https://graph.facebook.com/v12.0/{subject}/permissions"
            ))
            .query(&[("access_token", token)])
            .send()
            .await,
    };

    match result {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            warn!(provider = provider.as_str(), status = %resp.status(), "token revocation refused");
            Err(format!("revocation returned {}", resp.status()))
        }
        Err(e) => {
            warn!(provider = provider.as_str(), error = %e, "token revocation failed");
            Err(e.to_string())
        }
    }
}

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::info;

use crate::auth::provider::{self, AccessToken, AuthFailure, Identity};
use crate::auth::session::SessionView;
use crate::auth::token::generate_session_id;
use crate::db::queries::users;

use super::app_state::AppState;
use super::auth_middleware::{SESSION_COOKIE, session_id};
use super::error::ApiError;

/// GET /login — ensure a visitor session, issue an anti-forgery state token,
/// and return the login view data consumed by the login page.
pub async fn show_login(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (sid, new_cookie) = match session_id(&jar) {
        Some(sid) => (sid, None),
        None => {
            let sid = generate_session_id();
            let secure = if state.auth_config.public_url.starts_with("https") {
                "; Secure"
            } else {
                ""
            };
            let cookie = format!(
                "{SESSION_COOKIE}={sid}; HttpOnly; Path=/; SameSite=Lax{secure}"
            );
            (sid, Some(cookie))
        }
    };

    let token = state.sessions.begin_login(&sid);
    let body = Json(serde_json::json!({
        "state": token,
        "providers": state.auth_config.enabled_providers(),
    }));

    // The state token must never come from a cached response.
    let no_store = (axum::http::header::CACHE_CONTROL, "no-store".to_string());
    match new_cookie {
        Some(cookie) => (
            [no_store, (axum::http::header::SET_COOKIE, cookie)],
            body,
        )
            .into_response(),
        None => ([no_store], body).into_response(),
    }
}

#[derive(Deserialize)]
pub struct ConnectParams {
    pub state: String,
}

/// POST /gconnect?state=S — body carries the Google authorization code.
pub async fn gconnect(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConnectParams>,
    jar: CookieJar,
    body: String,
) -> Result<Response, ApiError> {
    let config = state
        .auth_config
        .google
        .as_ref()
        .ok_or_else(|| AuthFailure::Rejected("google sign-in is not configured".into()))?;

    let sid = validate_connect_state(&state, &jar, &params.state)?;
    let (identity, token) = provider::google_exchange(&state.http, config, body.trim()).await?;
    connect_session(&state, &sid, identity, token).await
}

/// POST /fbconnect?state=S — body carries the short-lived Facebook token.
pub async fn fbconnect(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConnectParams>,
    jar: CookieJar,
    body: String,
) -> Result<Response, ApiError> {
    let config = state
        .auth_config
        .facebook
        .as_ref()
        .ok_or_else(|| AuthFailure::Rejected("facebook sign-in is not configured".into()))?;

    let sid = validate_connect_state(&state, &jar, &params.state)?;
    let (identity, token) = provider::facebook_exchange(&state.http, config, body.trim()).await?;
    connect_session(&state, &sid, identity, token).await
}

/// Anti-forgery gate for the OAuth callback: the presented state must match
/// the token issued to this visitor. Any mismatch is a hard 401.
fn validate_connect_state(
    state: &AppState,
    jar: &CookieJar,
    presented: &str,
) -> Result<String, ApiError> {
    let sid = session_id(jar)
        .ok_or_else(|| AuthFailure::Rejected("no visitor session".into()))?;
    if !state.sessions.validate_state(&sid, presented) {
        return Err(AuthFailure::Rejected("invalid state parameter".into()).into());
    }
    Ok(sid)
}

/// Resolve the verified identity to a user row and establish the session.
async fn connect_session(
    state: &AppState,
    sid: &str,
    identity: Identity,
    token: AccessToken,
) -> Result<Response, ApiError> {
    // Repeated connect for the same provider subject is a no-op success.
    if state.sessions.authenticated_subject(sid)
        == Some((identity.provider, identity.subject.clone()))
    {
        return Ok(Json(serde_json::json!({
            "message": "Current user is already connected.",
        }))
        .into_response());
    }

    let user = users::resolve_or_create(
        &state.db,
        &identity.name,
        &identity.email,
        identity.picture.as_deref(),
    )
    .await?;

    info!(
        user_id = user.id,
        provider = identity.provider.as_str(),
        "user signed in"
    );
    state
        .sessions
        .establish(sid, SessionView::new(&identity, user.id, token));

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": format!("You are now logged in as {}", user.name),
            "user": { "id": user.id, "name": user.name, "picture": user.picture },
        })),
    )
        .into_response())
}

/// GET /logout — revoke the provider token best-effort, tear the session
/// down, clear the cookie, and send the visitor home. Idempotent.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(sid) = session_id(&jar) {
        if let Some(view) = state.sessions.current(&sid) {
            // Revocation failures are logged inside revoke(); logout proceeds.
            let _ = provider::revoke(
                &state.http,
                view.provider,
                &view.subject,
                &view.access_token.secret,
            )
            .await;
        }
        state.sessions.teardown(&sid);
    }

    let secure = if state.auth_config.public_url.starts_with("https") {
        "; Secure"
    } else {
        ""
    };
    let cookie = format!(
        "{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax{secure}"
    );
    (
        [(axum::http::header::SET_COOKIE, cookie)],
        Redirect::temporary("/"),
    )
        .into_response()
}

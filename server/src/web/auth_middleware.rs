use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::auth::guard;
use crate::auth::session::SessionView;

use super::app_state::AppState;
use super::error::ApiError;

/// Name of the visitor session cookie. Its value is an opaque random id
/// keying the server-side session store — never identity data itself.
pub const SESSION_COOKIE: &str = "marquee_session";

/// Read the visitor's session id from the cookie jar, if present.
pub fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Extractor that resolves the session cookie to an authenticated session.
/// Use this in any handler that requires authentication; anonymous visitors
/// are redirected home.
pub struct AuthUser {
    pub session_id: String,
    pub view: SessionView,
}

impl AuthUser {
    /// Ownership gate: the acting user must be the resource's creator.
    pub fn require_owner(&self, resource_user_id: i64) -> Result<(), ApiError> {
        guard::require_owner(&self.view, resource_user_id)?;
        Ok(())
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .unwrap(); // CookieJar extraction is infallible

        let sid = session_id(&jar).ok_or(ApiError::Unauthenticated)?;
        let view = guard::require_session(state.sessions.current(&sid))?;

        Ok(AuthUser {
            session_id: sid,
            view,
        })
    }
}

use dashmap::DashMap;

use super::provider::{AccessToken, Identity, Provider};
use super::token::generate_state_token;

/// Snapshot of an authenticated session, handed to route handlers.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub provider: Provider,
    /// Provider-issued subject id.
    pub subject: String,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
    pub access_token: AccessToken,
}

impl SessionView {
    pub fn new(identity: &Identity, user_id: i64, access_token: AccessToken) -> Self {
        Self {
            provider: identity.provider,
            subject: identity.subject.clone(),
            user_id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            picture: identity.picture.clone(),
            access_token,
        }
    }
}

#[derive(Debug, Default)]
struct Session {
    /// Pending anti-forgery token, consumed by the first successful validation.
    state_token: Option<String>,
    auth: Option<SessionView>,
}

/// Server-side session state, keyed by the opaque visitor session id from the
/// session cookie. Entry-level locking makes every operation atomic with
/// respect to concurrent requests for the same visitor, and state is never
/// shared across visitor keys.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh anti-forgery state token for the visitor's login attempt,
    /// replacing any earlier unconsumed token.
    pub fn begin_login(&self, sid: &str) -> String {
        let token = generate_state_token();
        self.sessions.entry(sid.to_string()).or_default().state_token = Some(token.clone());
        token
    }

    /// Validate a presented state token against the stored one.
    ///
    /// Succeeds only on an exact match, and consumes the token so a replayed
    /// callback cannot validate twice. A mismatch leaves the stored token in
    /// place for a retry with the correct value. Fails closed when the
    /// visitor has no session or no pending token.
    pub fn validate_state(&self, sid: &str, presented: &str) -> bool {
        let Some(mut session) = self.sessions.get_mut(sid) else {
            return false;
        };
        let matches = session.state_token.as_deref() == Some(presented);
        if matches {
            session.state_token = None;
        }
        matches
    }

    /// Populate the authenticated fields in one atomic update.
    pub fn establish(&self, sid: &str, view: SessionView) {
        self.sessions.entry(sid.to_string()).or_default().auth = Some(view);
    }

    /// Read-only snapshot of the visitor's authenticated state.
    pub fn current(&self, sid: &str) -> Option<SessionView> {
        self.sessions.get(sid).and_then(|s| s.auth.clone())
    }

    /// The provider + subject of the authenticated session, if any. Used to
    /// make repeated connects for the same identity a no-op.
    pub fn authenticated_subject(&self, sid: &str) -> Option<(Provider, String)> {
        self.current(sid).map(|v| (v.provider, v.subject))
    }

    /// Clear all session state for the visitor. Idempotent.
    pub fn teardown(&self, sid: &str) {
        self.sessions.remove(sid);
    }
}

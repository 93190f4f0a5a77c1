use super::session::SessionView;

/// Why an authorization check refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    /// No authenticated session.
    Unauthenticated,
    /// Session present, but it does not own the resource.
    Forbidden,
}

/// Require an authenticated session. Every mutating route passes through
/// this before touching the catalogue.
pub fn require_session(view: Option<SessionView>) -> Result<SessionView, Denied> {
    view.ok_or(Denied::Unauthenticated)
}

/// Require that the acting session owns the resource. Equality of the
/// session's user id with the row's creator id is the sole authorization
/// rule in the system.
pub fn require_owner(view: &SessionView, resource_user_id: i64) -> Result<(), Denied> {
    if view.user_id == resource_user_id {
        Ok(())
    } else {
        Err(Denied::Forbidden)
    }
}

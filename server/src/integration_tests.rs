//! Integration tests for Marquee — cross-layer tests that verify end-to-end
//! login and authorization flows against a real (in-memory) database.
//!
//! Each test creates its own in-memory SQLite database so tests are fully isolated.

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use crate::auth::guard::{self, Denied};
    use crate::auth::provider::{AccessToken, Identity, Provider};
    use crate::auth::session::{SessionStore, SessionView};
    use crate::db::pool::{create_pool, run_migrations};
    use crate::db::queries::{genres, movies, users};

    // ── Helpers ──────────────────────────────────────────────────

    /// Create an in-memory SQLite pool with all migrations applied.
    async fn setup_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn google_identity(email: &str) -> Identity {
        Identity {
            provider: Provider::Google,
            subject: format!("sub-{email}"),
            name: "Visitor".into(),
            email: email.into(),
            picture: Some("https://example.com/p.jpg".into()),
        }
    }

    fn access_token() -> AccessToken {
        AccessToken {
            secret: "provider-token".into(),
            expires_at: None,
        }
    }

    /// Run the post-exchange half of a connect: resolve the user and
    /// establish the session.
    async fn complete_login(
        pool: &SqlitePool,
        sessions: &SessionStore,
        sid: &str,
        identity: &Identity,
    ) -> i64 {
        let user = users::resolve_or_create(
            pool,
            &identity.name,
            &identity.email,
            identity.picture.as_deref(),
        )
        .await
        .unwrap();
        sessions.establish(sid, SessionView::new(identity, user.id, access_token()));
        user.id
    }

    // ── Login lifecycle ──────────────────────────────────────────

    #[tokio::test]
    async fn test_stale_state_rejected_then_fresh_state_succeeds() {
        let pool = setup_db().await;
        let sessions = SessionStore::new();

        // Visitor A starts a login and receives token T1.
        let t1 = sessions.begin_login("visitor-a");

        // Connect presented with a different token is rejected and leaves
        // the session anonymous.
        assert!(!sessions.validate_state("visitor-a", "T2-NOT-THE-TOKEN"));
        assert!(sessions.current("visitor-a").is_none());

        // Retrying with T1 and a valid exchange authenticates the session.
        assert!(sessions.validate_state("visitor-a", &t1));
        let identity = google_identity("a@example.com");
        let user_id = complete_login(&pool, &sessions, "visitor-a", &identity).await;

        let view = sessions.current("visitor-a").unwrap();
        assert_eq!(view.user_id, user_id);
        assert_eq!(view.provider, Provider::Google);
    }

    #[tokio::test]
    async fn test_full_lifecycle_anonymous_to_authenticated_to_anonymous() {
        let pool = setup_db().await;
        let sessions = SessionStore::new();

        // Anonymous: no session passes the guard.
        assert_eq!(
            guard::require_session(sessions.current("v")).unwrap_err(),
            Denied::Unauthenticated
        );

        // Pending: a state token alone is still not authenticated.
        let token = sessions.begin_login("v");
        assert!(guard::require_session(sessions.current("v")).is_err());

        // Authenticated.
        assert!(sessions.validate_state("v", &token));
        complete_login(&pool, &sessions, "v", &google_identity("v@example.com")).await;
        assert!(guard::require_session(sessions.current("v")).is_ok());

        // Logout: back to anonymous, and authenticated user row survives.
        sessions.teardown("v");
        assert!(sessions.current("v").is_none());
        assert!(
            users::get_user_by_email(&pool, "v@example.com")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_repeated_login_reuses_the_user_row() {
        let pool = setup_db().await;
        let sessions = SessionStore::new();
        let identity = google_identity("repeat@example.com");

        let first = complete_login(&pool, &sessions, "v1", &identity).await;
        let second = complete_login(&pool, &sessions, "v2", &identity).await;
        assert_eq!(first, second);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_facebook_identity_without_email_still_resolves() {
        let pool = setup_db().await;
        let sessions = SessionStore::new();

        // The provider client synthesizes "{subject}@facebook.com" when the
        // profile carries no email; resolution must key off that placeholder.
        let identity = Identity {
            provider: Provider::Facebook,
            subject: "9001".into(),
            name: "No Email".into(),
            email: "9001@facebook.com".into(),
            picture: None,
        };
        complete_login(&pool, &sessions, "fb-visitor", &identity).await;

        let user = users::get_user_by_email(&pool, "9001@facebook.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.name, "No Email");
    }

    // ── Ownership gate ───────────────────────────────────────────

    #[tokio::test]
    async fn test_ownership_gate_blocks_and_admits() {
        let pool = setup_db().await;
        let sessions = SessionStore::new();

        let owner_id =
            complete_login(&pool, &sessions, "owner", &google_identity("owner@example.com")).await;
        let other_id =
            complete_login(&pool, &sessions, "other", &google_identity("other@example.com")).await;
        assert_ne!(owner_id, other_id);

        let genre = genres::create_genre(&pool, "thriller", "Edge of the seat", None, owner_id)
            .await
            .unwrap();

        // The other user is refused, and the row is untouched.
        let other_view = sessions.current("other").unwrap();
        assert_eq!(
            guard::require_owner(&other_view, genre.user_id).unwrap_err(),
            Denied::Forbidden
        );
        let after = genres::get_genre(&pool, genre.id).await.unwrap().unwrap();
        assert_eq!(after.description, "Edge of the seat");

        // The owner passes and the update lands.
        let owner_view = sessions.current("owner").unwrap();
        guard::require_owner(&owner_view, genre.user_id).unwrap();
        genres::update_genre(&pool, genre.id, "thriller", "Updated").await.unwrap();
        let after = genres::get_genre(&pool, genre.id).await.unwrap().unwrap();
        assert_eq!(after.description, "Updated");
    }

    // ── Cascade delete ───────────────────────────────────────────

    #[tokio::test]
    async fn test_genre_delete_cascades_atomically() {
        let pool = setup_db().await;
        let user = users::resolve_or_create(&pool, "U", "u@example.com", None)
            .await
            .unwrap();
        let genre = genres::create_genre(&pool, "war", "desc", None, user.id)
            .await
            .unwrap();
        let keeper = genres::create_genre(&pool, "peace", "desc", None, user.id)
            .await
            .unwrap();

        for i in 0..5 {
            movies::create_movie(
                &pool,
                &movies::NewMovie {
                    name: &format!("War Movie {i}"),
                    storyline: None,
                    poster: None,
                    trailer_url: None,
                    genre_id: genre.id,
                    user_id: user.id,
                },
            )
            .await
            .unwrap();
        }
        movies::create_movie(
            &pool,
            &movies::NewMovie {
                name: "Peace Movie",
                storyline: None,
                poster: None,
                trailer_url: None,
                genre_id: keeper.id,
                user_id: user.id,
            },
        )
        .await
        .unwrap();

        genres::delete_cascade(&pool, genre.id).await.unwrap();

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies WHERE genre_id = ?")
            .bind(genre.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);

        // The other genre and its movie are untouched.
        assert!(genres::get_genre(&pool, keeper.id).await.unwrap().is_some());
        let kept: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies WHERE genre_id = ?")
            .bind(keeper.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(kept, 1);
    }

    // ── Read API data path ───────────────────────────────────────

    #[tokio::test]
    async fn test_catalogue_projection_data() {
        let pool = setup_db().await;
        let user = users::resolve_or_create(&pool, "Curator", "c@example.com", None)
            .await
            .unwrap();
        let genre = genres::create_genre(&pool, "noir", "Shadows", None, user.id)
            .await
            .unwrap();
        movies::create_movie(
            &pool,
            &movies::NewMovie {
                name: "The Third Man",
                storyline: Some("Vienna, postwar."),
                poster: None,
                trailer_url: Some("https://youtu.be/xyz"),
                genre_id: genre.id,
                user_id: user.id,
            },
        )
        .await
        .unwrap();

        let joined = genres::get_genre_with_owner(&pool, genre.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(joined.owner, "Curator");

        let listing = movies::list_by_genre(&pool, genre.id).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "The Third Man");
    }
}

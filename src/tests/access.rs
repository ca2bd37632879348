use super::*;

use axum::http::StatusCode;
use tower::util::ServiceExt;

use crate::account::access;
use crate::account::session::Identity;
use crate::account::Role;
use crate::Global;

/// Test: the admin role overrides whatever the stored list says.
#[tokio::test]
async fn admin_role_grants_every_page() {
    let global = Global::new();
    let id = seed_user(&global, "admin@example.com", Role::Admin, &["bogus"]);

    let permissions = access::permissions_of(&global.directory, id);
    assert_eq!(
        permissions,
        access::KNOWN_PAGES
            .iter()
            .map(|page| page.to_string())
            .collect::<Vec<_>>()
    );
}

/// Test: a plain user gets the stored list verbatim.
#[tokio::test]
async fn stored_permissions_are_returned_verbatim() {
    let global = Global::new();
    let id = seed_user(&global, "erin@example.com", Role::User, &["home", "content"]);

    let permissions = access::permissions_of(&global.directory, id);
    assert_eq!(
        permissions,
        vec!["home".to_string(), "content".to_string()]
    );
    assert!(access::has_page_access(&permissions, "home"));
    assert!(!access::has_page_access(&permissions, "users"));
}

/// Test: one session's memoized permissions never bleed into another
/// identity.
#[tokio::test]
async fn cache_never_leaks_between_identities() {
    let global = Global::new();
    let a = seed_user(&global, "a@example.com", Role::User, &["home"]);
    let b = seed_user(&global, "b@example.com", Role::User, &["content"]);

    let (token_a, session_a) = global.sessions.sign_in(Identity {
        account_id: a,
        email: "a@example.com".to_string(),
    });
    assert_eq!(
        access::permissions_for_session(&global.directory, &session_a),
        vec!["home".to_string()]
    );
    assert!(session_a.cached_permissions().is_some());

    // an explicit lookup of another user bypasses the memo entirely
    assert_eq!(
        access::permissions_of(&global.directory, b),
        vec!["content".to_string()]
    );
    assert_eq!(
        session_a.cached_permissions().unwrap(),
        vec!["home".to_string()]
    );

    global.sessions.sign_out(&token_a);
    assert!(session_a.cached_permissions().is_none());

    let (_, session_b) = global.sessions.sign_in(Identity {
        account_id: b,
        email: "b@example.com".to_string(),
    });
    assert_eq!(
        access::permissions_for_session(&global.directory, &session_b),
        vec!["content".to_string()]
    );
}

/// Test: without a session every gated element is hidden and nothing
/// panics, over and over.
#[tokio::test]
async fn navigation_is_hidden_when_signed_out() {
    let global = Global::new();

    for _ in 0..2 {
        let view = access::filter_navigation(&global.directory, None);
        assert!(!view.authenticated);
        assert!(view.visible.is_empty());
    }

    let app = crate::router(global);
    let response = app
        .oneshot(req("/api/access/navigation", None, &serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["authenticated"], serde_json::json!(false));
    assert_eq!(body["visible"], serde_json::json!([]));
}

/// Test: granting a parent page shows its sub-pages too.
#[tokio::test]
async fn dashboard_inherits_parent_grants() {
    let global = Global::new();
    let id = seed_user(&global, "carol@example.com", Role::User, &["availability"]);
    let (_, session) = global.sessions.sign_in(Identity {
        account_id: id,
        email: "carol@example.com".to_string(),
    });

    let view = access::filter_dashboard(&global.directory, Some(&session));
    assert!(view.authenticated);
    assert!(view.visible.contains(&"availability".to_string()));
    assert!(view.visible.contains(&"availability-tracker".to_string()));
    assert!(!view.visible.contains(&"users".to_string()));
}

/// Test: the navigation endpoint honors the session's grants.
#[tokio::test]
async fn navigation_over_http_shows_granted_links() {
    let global = Global::new();
    let id = seed_user(&global, "frank@example.com", Role::User, &["home"]);
    let (token, _) = global.sessions.sign_in(Identity {
        account_id: id,
        email: "frank@example.com".to_string(),
    });
    let app = crate::router(global);

    let response = app
        .oneshot(req(
            "/api/access/navigation",
            Some(&token),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["authenticated"], serde_json::json!(true));
    assert_eq!(body["visible"], serde_json::json!(["home"]));
}

/// Test: a dead store resolves to no access, never to access.
#[tokio::test]
async fn resolver_fails_closed_when_store_is_down() {
    let global = Global::new();
    let id = seed_user(&global, "dave@example.com", Role::Admin, &[]);
    global.directory.set_unavailable(true);

    assert!(access::permissions_of(&global.directory, id).is_empty());
    assert!(!access::is_admin(&global.directory, id));
    assert!(access::role_of(&global.directory, id).is_none());
}

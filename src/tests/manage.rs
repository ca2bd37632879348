use super::*;

use axum::http::StatusCode;
use tower::util::ServiceExt;

use crate::account::session::Identity;
use crate::account::{access, InviteStatus, Role, UserStatus};
use crate::Global;
use grdlhub_shared::account::handle::manage::{
    AccountModifyVariant, AddInviteDescriptor, ModifyAccountDescriptor, ViewAccountDescriptor,
};

fn admin_token(global: &Global) -> String {
    let id = seed_user(global, "root@example.com", Role::Admin, &[]);
    let (token, _) = global.sessions.sign_in(Identity {
        account_id: id,
        email: "root@example.com".to_string(),
    });
    token
}

/// Test: administrators add and list invitations.
#[tokio::test]
async fn admin_manages_invites() {
    let global = Global::new();
    let token = admin_token(&global);
    let app = crate::router(global.clone());

    let descriptor = AddInviteDescriptor {
        email: "Grace@Example.com".parse().unwrap(),
        name: Some("Grace Obi".to_string()),
        notes: Some("congregation".to_string()),
    };
    let response = app
        .clone()
        .oneshot(req("/api/invite/add", Some(&token), &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // stored under the normalized address
    let invite = global
        .directory
        .invite("grace@example.com")
        .unwrap()
        .unwrap();
    assert_eq!(invite.status, InviteStatus::Pending);
    assert_eq!(invite.added_by.as_deref(), Some("root@example.com"));

    let response = app
        .clone()
        .oneshot(req("/api/invite/view", Some(&token), &serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // inviting an email that already owns an account is refused
    let descriptor = AddInviteDescriptor {
        email: "root@example.com".parse().unwrap(),
        name: None,
        notes: None,
    };
    let response = app
        .clone()
        .oneshot(req("/api/invite/add", Some(&token), &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Test: management endpoints require the admin role.
#[tokio::test]
async fn non_admin_cannot_manage() {
    let global = Global::new();
    let id = seed_user(&global, "henry@example.com", Role::User, &["home"]);
    let (token, _) = global.sessions.sign_in(Identity {
        account_id: id,
        email: "henry@example.com".to_string(),
    });
    let app = crate::router(global);

    let descriptor = AddInviteDescriptor {
        email: "friend@example.com".parse().unwrap(),
        name: None,
        notes: None,
    };
    let response = app
        .clone()
        .oneshot(req("/api/invite/add", Some(&token), &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(req("/api/invite/view", Some(&token), &serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let descriptor = ModifyAccountDescriptor {
        account_id: id,
        variants: vec![AccountModifyVariant::Role(Role::Admin)],
    };
    let response = app
        .clone()
        .oneshot(req(
            "/api/account/manage/modify",
            Some(&token),
            &descriptor,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Test: account modification variants apply, and the role change shows
/// in the resolved permission set.
#[tokio::test]
async fn modify_account_variants() {
    let global = Global::new();
    let token = admin_token(&global);
    let target = seed_user(&global, "ivy@example.com", Role::User, &["home"]);
    let app = crate::router(global.clone());

    let descriptor = ModifyAccountDescriptor {
        account_id: target,
        variants: vec![
            AccountModifyVariant::Name("Ivy Chen".to_string()),
            AccountModifyVariant::Role(Role::Admin),
            AccountModifyVariant::Permissions(vec!["content".to_string()]),
            AccountModifyVariant::Status(UserStatus::Inactive),
        ],
    };
    let response = app
        .clone()
        .oneshot(req(
            "/api/account/manage/modify",
            Some(&token),
            &descriptor,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = global.directory.user(target).unwrap().unwrap();
    assert_eq!(user.name, "Ivy Chen");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.permissions, vec!["content".to_string()]);
    assert_eq!(user.status, UserStatus::Inactive);

    // the stored list no longer matters once the role is admin
    let permissions = access::permissions_of(&global.directory, target);
    assert_eq!(permissions.len(), access::KNOWN_PAGES.len());

    let descriptor = ModifyAccountDescriptor {
        account_id: 42,
        variants: vec![AccountModifyVariant::Name("Nobody".to_string())],
    };
    let response = app
        .clone()
        .oneshot(req(
            "/api/account/manage/modify",
            Some(&token),
            &descriptor,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Test: the account view reports missing targets per entry.
#[tokio::test]
async fn view_accounts_reports_missing_targets() {
    let global = Global::new();
    let token = admin_token(&global);
    let target = seed_user(&global, "jack@example.com", Role::User, &["home"]);
    let app = crate::router(global);

    let descriptor = ViewAccountDescriptor {
        accounts: vec![target, 42],
    };
    let response = app
        .oneshot(req("/api/account/manage/view", Some(&token), &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].get("Ok").is_some());
    assert!(results[1].get("Err").is_some());
}

mod access;
mod manage;

use crate::account::{account_id_of, InviteStatus, PreApprovedEmail, Role, User, UserStatus};
use crate::Global;
use axum::http;

/// Build a JSON POST request, optionally authenticated.
pub fn req<T: serde::Serialize>(
    uri: &str,
    token: Option<&str>,
    body: &T,
) -> http::Request<hyper::Body> {
    let mut builder = http::Request::builder()
        .uri(uri)
        .method("POST")
        .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    if let Some(token) = token {
        builder = builder.header("Token", token);
    }
    builder
        .body(serde_json::to_vec(body).unwrap().into())
        .unwrap()
}

/// Parse a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&hyper::body::to_bytes(response.into_body()).await.unwrap()).unwrap()
}

/// Forget the last captured sign-in mail.
pub fn clear_last_link() {
    *crate::account::link::LAST_LINK.lock() = None;
}

/// Take the last captured sign-in mail.
pub fn take_last_link() -> Option<String> {
    crate::account::link::LAST_LINK.lock().take()
}

/// Store a user document directly.
pub fn seed_user(global: &Global, email: &str, role: Role, permissions: &[&str]) -> u64 {
    let id = account_id_of(email);
    global
        .directory
        .put_user(User {
            id,
            email: email.to_string(),
            name: "Test User".to_string(),
            role,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            status: UserStatus::Active,
            created_at: chrono::Utc::now(),
            last_sign_in: None,
        })
        .unwrap();
    id
}

/// Store a pending invitation directly.
pub fn seed_invite(global: &Global, email: &str, name: Option<&str>) {
    global
        .directory
        .put_invite(PreApprovedEmail {
            email: email.to_string(),
            status: InviteStatus::Pending,
            name: name.map(|name| name.to_string()),
            added_by: Some("admin@example.com".to_string()),
            notes: None,
            created_at: chrono::Utc::now(),
            registered_at: None,
        })
        .unwrap();
}

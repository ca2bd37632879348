use axum::{extract::State, Json};
use grdlhub_shared::account::handle::AccessView;

use crate::account::access;
use crate::{Auth, Global};

/// Project navigation visibility for the requesting context.
///
/// Requests without a live session get the unauthenticated view with
/// every gated link hidden.
pub async fn navigation(
    auth: Option<Auth>,
    State(Global { directory, .. }): State<Global>,
) -> Json<AccessView> {
    Json(access::filter_navigation(
        &directory,
        auth.as_ref().map(|auth| auth.session.as_ref()),
    ))
}

/// Project dashboard card visibility for the requesting context.
pub async fn dashboard(
    auth: Option<Auth>,
    State(Global { directory, .. }): State<Global>,
) -> Json<AccessView> {
    Json(access::filter_dashboard(
        &directory,
        auth.as_ref().map(|auth| auth.session.as_ref()),
    ))
}

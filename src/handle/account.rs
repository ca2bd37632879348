use axum::{extract::State, Json};
use grdlhub_shared::account::handle::{
    RedeemLinkDescriptor, RedeemLinkResult, RequestLinkDescriptor, RequestLinkResult,
    SelfInfoResult,
};
use tracing::info;

use crate::account::{access, link::Redeemed, session::Identity};
use crate::{Auth, Error, Global};

/// Check the invitation list and mail a sign-in link.
pub async fn request_link(
    State(Global {
        directory, links, ..
    }): State<Global>,
    Json(RequestLinkDescriptor { email }): Json<RequestLinkDescriptor>,
) -> Result<Json<RequestLinkResult>, Error> {
    let issued = links.issue(&directory, &email).await?;

    info!("Sign-in link issued for {}", email);
    Ok(Json(RequestLinkResult {
        account_exists: issued.account_exists,
    }))
}

/// Redeem a followed sign-in link and establish a session.
pub async fn redeem_link(
    State(Global {
        directory,
        links,
        sessions,
    }): State<Global>,
    Json(RedeemLinkDescriptor { link, email }): Json<RedeemLinkDescriptor>,
) -> Result<Json<RedeemLinkResult>, Error> {
    let redeemed = links.redeem(&directory, &link, email.as_ref())?;
    let created_account = matches!(redeemed, Redeemed::New(_));
    let user = redeemed.user();

    let (token, _) = sessions.sign_in(Identity {
        account_id: user.id,
        email: user.email.clone(),
    });

    info!("Account {} (id: {}) signed in", user.email, user.id);
    Ok(Json(RedeemLinkResult {
        account_id: user.id,
        token,
        created_account,
    }))
}

/// Revoke the requesting session.
pub async fn sign_out(
    auth: Auth,
    State(Global { sessions, .. }): State<Global>,
) -> Result<(), Error> {
    sessions.sign_out(&auth.token);

    info!(
        "Account {} (id: {}) signed out",
        auth.session.identity.email, auth.session.identity.account_id
    );
    Ok(())
}

/// View the requesting user's profile and resolved permissions.
pub async fn self_info(
    auth: Auth,
    State(Global { directory, .. }): State<Global>,
) -> Result<Json<SelfInfoResult>, Error> {
    let user = directory
        .user(auth.session.identity.account_id)?
        .ok_or(Error::TargetAccountNotFound)?;
    let permissions = access::permissions_for_session(&directory, &auth.session);

    Ok(Json(SelfInfoResult {
        id: user.id,
        metadata: user.metadata()?,
        permissions,
    }))
}

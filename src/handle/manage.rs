use axum::{extract::State, Json};
use chrono::Utc;
use grdlhub_shared::account::handle::manage::{
    AccountModifyVariant, AddInviteDescriptor, ModifyAccountDescriptor, ViewAccountDescriptor,
    ViewAccountResult,
};
use grdlhub_shared::account::handle::SelfInfoResult;
use grdlhub_shared::account::{InviteMetadata, InviteStatus};
use tracing::info;

use crate::account::{access, normalize_email, Directory, PreApprovedEmail};
use crate::{Auth, Error, Global};

fn require_admin(directory: &Directory, auth: &Auth) -> Result<(), Error> {
    if access::is_admin(directory, auth.session.identity.account_id) {
        Ok(())
    } else {
        Err(Error::PermissionDenied)
    }
}

/// Pre-approve an email for registration.
pub async fn add_invite(
    auth: Auth,
    State(Global { directory, .. }): State<Global>,
    Json(AddInviteDescriptor { email, name, notes }): Json<AddInviteDescriptor>,
) -> Result<(), Error> {
    require_admin(&directory, &auth)?;

    let email = normalize_email(&email);
    if directory.user_by_email(&email)?.is_some() {
        return Err(Error::AlreadyRegistered);
    }

    info!(
        "Email {} pre-approved by {}",
        email, auth.session.identity.email
    );
    directory.put_invite(PreApprovedEmail {
        email,
        status: InviteStatus::Pending,
        name,
        added_by: Some(auth.session.identity.email.clone()),
        notes,
        created_at: Utc::now(),
        registered_at: None,
    })?;
    Ok(())
}

/// View every invitation.
pub async fn view_invites(
    auth: Auth,
    State(Global { directory, .. }): State<Global>,
) -> Result<Json<Vec<InviteMetadata>>, Error> {
    require_admin(&directory, &auth)?;

    let mut invites = Vec::new();
    for invite in directory.invites()? {
        invites.push(invite.metadata()?);
    }
    Ok(Json(invites))
}

/// View target accounts with their resolved permissions.
pub async fn view_accounts(
    auth: Auth,
    State(Global { directory, .. }): State<Global>,
    Json(ViewAccountDescriptor { accounts }): Json<ViewAccountDescriptor>,
) -> Result<Json<Vec<ViewAccountResult>>, Error> {
    require_admin(&directory, &auth)?;

    let mut results = Vec::new();
    for id in accounts {
        results.push(match directory.user(id)? {
            Some(user) => match user.metadata() {
                Ok(metadata) => ViewAccountResult::Ok(SelfInfoResult {
                    id,
                    metadata,
                    permissions: access::permissions_of(&directory, id),
                }),
                Err(err) => ViewAccountResult::Err {
                    id,
                    error: err.to_string(),
                },
            },
            None => ViewAccountResult::Err {
                id,
                error: Error::TargetAccountNotFound.to_string(),
            },
        });
    }
    Ok(Json(results))
}

/// Edit a target account's profile, role, permissions or status.
pub async fn modify_account(
    auth: Auth,
    State(Global { directory, .. }): State<Global>,
    Json(ModifyAccountDescriptor {
        account_id,
        variants,
    }): Json<ModifyAccountDescriptor>,
) -> Result<(), Error> {
    require_admin(&directory, &auth)?;

    let modified = directory.update_user(account_id, |user| {
        for variant in variants {
            match variant {
                AccountModifyVariant::Name(name) => user.name = name,
                AccountModifyVariant::Role(role) => user.role = role,
                AccountModifyVariant::Permissions(permissions) => {
                    user.permissions = permissions
                }
                AccountModifyVariant::Status(status) => user.status = status,
            }
        }
    })?;

    if modified {
        info!(
            "Account {} modified by {}",
            account_id, auth.session.identity.email
        );
        Ok(())
    } else {
        Err(Error::TargetAccountNotFound)
    }
}

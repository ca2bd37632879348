use super::{normalize_email, Directory, PreApprovedEmail};
use crate::Error;

/// Outcome of checking an email against the invitation list.
pub enum Authorization {
    /// The email is pre-approved and has no account yet.
    Approved(PreApprovedEmail),
    /// An account already exists, so the caller should route to sign-in
    /// instead of registration.
    AlreadyRegistered(u64),
    /// Neither invited nor registered.
    Denied,
}

/// Check whether an email may request a sign-in link.
///
/// The lookup is case-insensitive. A storage failure is returned as an
/// error, never as access: an unreachable backend must read as "not
/// authorized" plus a user-facing failure, not as an open door.
pub fn authorize_email(
    directory: &Directory,
    email: &lettre::Address,
) -> Result<Authorization, Error> {
    let email = normalize_email(email);

    if let Some(user) = directory.user_by_email(&email)? {
        return Ok(Authorization::AlreadyRegistered(user.id));
    }

    match directory.invite(&email)? {
        Some(invite) => Ok(Authorization::Approved(invite)),
        None => Ok(Authorization::Denied),
    }
}

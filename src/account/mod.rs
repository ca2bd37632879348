pub mod access;
pub mod invite;
pub mod link;
pub mod session;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

pub use grdlhub_shared::account::*;

/// Page grants a freshly registered user starts with.
pub const DEFAULT_PERMISSIONS: &[&str] = &["home", "content"];

/// Normalize an email address for use as a document key.
pub fn normalize_email(email: &lettre::Address) -> String {
    email.to_string().to_lowercase()
}

/// Derive the identity key for a normalized email.
///
/// Keying user documents by this value is what makes racing creations
/// converge on a single document instead of duplicating it.
pub fn account_id_of(email: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    email.hash(&mut hasher);
    hasher.finish()
}

/// A user document, created on the first redemption of a sign-in link or
/// by an administrator.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    /// Identity key, derived from the normalized email.
    pub id: u64,
    /// Email address, normalized to lowercase.
    pub email: String,
    /// Display name of this user.
    pub name: String,
    pub role: Role,
    /// Explicit per-user page grants. Ignored for administrators, who
    /// implicitly hold every known page.
    pub permissions: Permissions,
    /// Informational lifecycle state, not checked at sign-in.
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub last_sign_in: Option<DateTime<Utc>>,
}

impl User {
    /// Get metadata of this user.
    pub fn metadata(&self) -> Result<UserMetadata, crate::Error> {
        Ok(UserMetadata {
            email: self.email.parse()?,
            name: self.name.clone(),
            role: self.role,
            permissions: self.permissions.clone(),
            status: self.status,
            created_at: self.created_at,
            last_sign_in: self.last_sign_in,
        })
    }

    /// Persist this document.
    fn save(&self) {
        #[cfg(not(test))]
        {
            let id = self.id;
            let data = toml::to_string(self).unwrap_or_default();

            tokio::spawn(async move {
                use tokio::io::AsyncWriteExt;

                let mut file = tokio::fs::File::create(format!("./data/users/{}.toml", id))
                    .await
                    .unwrap();
                file.write_all(data.as_bytes()).await.unwrap();
            });
        }
    }
}

/// An outstanding invitation, keyed by the normalized email.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PreApprovedEmail {
    /// Email address, normalized to lowercase. Also the document key.
    pub email: String,
    pub status: InviteStatus,
    /// Name of the invitee, used as the display name at registration.
    pub name: Option<String>,
    /// Email of the administrator who added this entry.
    pub added_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub registered_at: Option<DateTime<Utc>>,
}

impl PreApprovedEmail {
    /// Get metadata of this invitation.
    pub fn metadata(&self) -> Result<InviteMetadata, crate::Error> {
        Ok(InviteMetadata {
            email: self.email.parse()?,
            status: self.status,
            name: self.name.clone(),
            added_by: self.added_by.clone(),
            notes: self.notes.clone(),
            created_at: self.created_at,
            registered_at: self.registered_at,
        })
    }

    /// Persist this document.
    fn save(&self) {
        #[cfg(not(test))]
        {
            let key = account_id_of(&self.email);
            let data = toml::to_string(self).unwrap_or_default();

            tokio::spawn(async move {
                use tokio::io::AsyncWriteExt;

                let mut file = tokio::fs::File::create(format!("./data/invites/{}.toml", key))
                    .await
                    .unwrap();
                file.write_all(data.as_bytes()).await.unwrap();
            });
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("storage backend unavailable")]
    Unavailable,
}

/// The document store: keyed collections for `users` and
/// `pre_approved_emails`, with last-write-wins writes.
pub struct Directory {
    users: DashMap<u64, User>,
    /// An index for resolving an id from a normalized email.
    email_index: DashMap<String, u64>,
    invites: DashMap<String, PreApprovedEmail>,
    #[cfg(test)]
    unavailable: std::sync::atomic::AtomicBool,
}

impl Directory {
    /// Read and create a directory from `./data/users` and `./data/invites`.
    pub fn new() -> Self {
        #[cfg(not(test))]
        {
            use std::fs::{self, File};
            use std::io::Read;

            let users: DashMap<u64, User> = DashMap::new();
            let email_index = DashMap::new();
            let invites = DashMap::new();

            for dir in fs::read_dir("./data/users").unwrap() {
                if let Ok(user) = dir.map(|e| {
                    toml::from_str::<User>(&{
                        let mut string = String::new();
                        File::open(e.path())
                            .unwrap()
                            .read_to_string(&mut string)
                            .unwrap();
                        string
                    })
                    .unwrap()
                }) {
                    email_index.insert(user.email.clone(), user.id);
                    users.insert(user.id, user);
                } else {
                    continue;
                }
            }

            for dir in fs::read_dir("./data/invites").unwrap() {
                if let Ok(invite) = dir.map(|e| {
                    toml::from_str::<PreApprovedEmail>(&{
                        let mut string = String::new();
                        File::open(e.path())
                            .unwrap()
                            .read_to_string(&mut string)
                            .unwrap();
                        string
                    })
                    .unwrap()
                }) {
                    invites.insert(invite.email.clone(), invite);
                } else {
                    continue;
                }
            }

            Self {
                users,
                email_index,
                invites,
            }
        }

        #[cfg(test)]
        Self {
            users: DashMap::new(),
            email_index: DashMap::new(),
            invites: DashMap::new(),
            unavailable: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn guard(&self) -> Result<(), DirectoryError> {
        #[cfg(test)]
        if self.unavailable.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(DirectoryError::Unavailable);
        }
        Ok(())
    }

    /// Point lookup of a user document.
    pub fn user(&self, id: u64) -> Result<Option<User>, DirectoryError> {
        self.guard()?;
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    /// Equality query on the normalized email.
    pub fn user_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        self.guard()?;
        match self.email_index.get(email).map(|id| *id) {
            Some(id) => Ok(self.users.get(&id).map(|user| user.clone())),
            None => Ok(None),
        }
    }

    /// Keyed write of a user document, overwriting any previous value.
    pub fn put_user(&self, user: User) -> Result<(), DirectoryError> {
        self.guard()?;
        self.email_index.insert(user.email.clone(), user.id);
        user.save();
        self.users.insert(user.id, user);
        Ok(())
    }

    /// Keyed create of a user document. When the key is already occupied
    /// the stored document wins and is returned with `false`, which makes a
    /// racing double-creation an overwrite-free no-op.
    pub fn create_user(&self, user: User) -> Result<(User, bool), DirectoryError> {
        self.guard()?;
        match self.users.entry(user.id) {
            Entry::Occupied(occupied) => Ok((occupied.get().clone(), false)),
            Entry::Vacant(vacant) => {
                self.email_index.insert(user.email.clone(), user.id);
                user.save();
                Ok((vacant.insert(user).clone(), true))
            }
        }
    }

    /// Mutate a user document in place. Returns whether the document exists.
    pub fn update_user(
        &self,
        id: u64,
        f: impl FnOnce(&mut User),
    ) -> Result<bool, DirectoryError> {
        self.guard()?;
        match self.users.get_mut(&id) {
            Some(mut user) => {
                f(&mut user);
                user.save();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Point lookup of an invitation.
    pub fn invite(&self, email: &str) -> Result<Option<PreApprovedEmail>, DirectoryError> {
        self.guard()?;
        Ok(self.invites.get(email).map(|invite| invite.clone()))
    }

    /// Keyed write of an invitation.
    pub fn put_invite(&self, invite: PreApprovedEmail) -> Result<(), DirectoryError> {
        self.guard()?;
        invite.save();
        self.invites.insert(invite.email.clone(), invite);
        Ok(())
    }

    /// Mutate an invitation in place. Returns whether the entry exists.
    pub fn update_invite(
        &self,
        email: &str,
        f: impl FnOnce(&mut PreApprovedEmail),
    ) -> Result<bool, DirectoryError> {
        self.guard()?;
        match self.invites.get_mut(email) {
            Some(mut invite) => {
                f(&mut invite);
                invite.save();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// All invitations, for the management view.
    pub fn invites(&self) -> Result<Vec<PreApprovedEmail>, DirectoryError> {
        self.guard()?;
        Ok(self
            .invites
            .iter()
            .map(|invite| invite.clone())
            .collect())
    }

    /// Number of stored user documents.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Make every read and write fail, simulating an unreachable backend.
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable
            .store(unavailable, std::sync::atomic::Ordering::Relaxed);
    }
}

pub mod handle;

use serde::{Deserialize, Serialize};

/// Coarse classification of a user. An administrator is never restricted
/// by the stored permission list.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Lifecycle state of a user. Informational only, the sign-in path
/// does not reject inactive users.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// State of a pre-approved email entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    /// Invited, has never completed a sign-in.
    Pending,
    /// The invitee registered an account through a sign-in link.
    Registered,
}

/// Page identifiers a user may view. Entries that match no known page are
/// tolerated and simply never grant anything.
pub type Permissions = Vec<String>;

/// Represents a user's metadata.
#[derive(Serialize, Deserialize, Debug)]
pub struct UserMetadata {
    pub email: lettre::Address,
    pub name: String,
    pub role: Role,
    pub permissions: Permissions,
    pub status: UserStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_sign_in: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents an invitation's metadata.
#[derive(Serialize, Deserialize, Debug)]
pub struct InviteMetadata {
    pub email: lettre::Address,
    pub status: InviteStatus,
    pub name: Option<String>,
    pub added_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub registered_at: Option<chrono::DateTime<chrono::Utc>>,
}

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct RequestLinkDescriptor {
    pub email: lettre::Address,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RequestLinkResult {
    /// Whether an account already exists for this email, so the caller can
    /// present "signing you in" instead of "check your inbox to register".
    pub account_exists: bool,
}

#[derive(Serialize, Deserialize)]
pub struct RedeemLinkDescriptor {
    /// The full sign-in link the user followed.
    pub link: String,
    /// Required only when the link cannot be matched to a recorded
    /// issuance, e.g. when redeeming on a different device.
    #[serde(default)]
    pub email: Option<lettre::Address>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RedeemLinkResult {
    pub account_id: u64,
    pub token: String,
    /// `true` when this redemption created the account.
    pub created_account: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SelfInfoResult {
    pub id: u64,
    pub metadata: super::UserMetadata,
    /// The resolved permission set, with the role override already applied.
    pub permissions: super::Permissions,
}

/// Visibility projection for navigation links or dashboard cards.
#[derive(Serialize, Deserialize, Debug)]
pub struct AccessView {
    pub authenticated: bool,
    pub visible: Vec<String>,
}

pub mod manage {
    use crate::account;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    pub struct AddInviteDescriptor {
        pub email: lettre::Address,
        #[serde(default)]
        pub name: Option<String>,
        #[serde(default)]
        pub notes: Option<String>,
    }

    #[derive(Serialize, Deserialize)]
    pub struct ViewAccountDescriptor {
        pub accounts: Vec<u64>,
    }

    #[derive(Serialize, Deserialize, Debug)]
    pub enum ViewAccountResult {
        Err { id: u64, error: String },
        Ok(super::SelfInfoResult),
    }

    #[derive(Serialize, Deserialize)]
    pub struct ModifyAccountDescriptor {
        pub account_id: u64,
        pub variants: Vec<AccountModifyVariant>,
    }

    #[derive(Serialize, Deserialize, Clone)]
    pub enum AccountModifyVariant {
        Name(String),
        Role(account::Role),
        Permissions(account::Permissions),
        Status(account::UserStatus),
    }
}

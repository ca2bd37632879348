pub mod raw;

pub use grdlhub_shared::account::{InviteStatus, Role, UserStatus};

/// Connection settings for one backend.
pub struct Context {
    pub req_client: reqwest::Client,
    pub url_prefix: String,
}

/// A signed-in session as held by the UI.
pub struct SessionInfo {
    pub account_id: u64,
    pub token: String,
}

impl From<&SessionInfo> for reqwest::header::HeaderMap {
    fn from(info: &SessionInfo) -> Self {
        let mut map = reqwest::header::HeaderMap::new();

        map.insert("Token", info.token.parse().expect("token not ascii"));

        map
    }
}

mod account;
pub(crate) mod config;
mod handle;

#[cfg(test)]
mod tests;

use account::link::LinkService;
use account::session::{Session, SessionManager};
use account::Directory;
use axum::{async_trait, http::StatusCode, response::IntoResponse, routing::post};
use lettre::transport::smtp;
use serde::Serialize;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let global = Global::new();
    global.links.refresh();
    global.sessions.refresh();

    // use an external function here so this won't be in a proc macro,
    // also for tests
    let app = router(global);

    // socket in 127.0.0.1:8080
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], 8080));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}

/// Construct a router.
pub fn router(global: Global) -> axum::Router {
    axum::Router::new()
        // authentication
        .route(
            "/api/auth/request-link",
            post(handle::account::request_link),
        )
        .route("/api/auth/redeem", post(handle::account::redeem_link))
        .route("/api/auth/sign-out", post(handle::account::sign_out))
        .route("/api/auth/me", post(handle::account::self_info))
        // access projection
        .route("/api/access/navigation", post(handle::access::navigation))
        .route("/api/access/dashboard", post(handle::access::dashboard))
        // invitation and account management
        .route("/api/invite/add", post(handle::manage::add_invite))
        .route("/api/invite/view", post(handle::manage::view_invites))
        .route(
            "/api/account/manage/view",
            post(handle::manage::view_accounts),
        )
        .route(
            "/api/account/manage/modify",
            post(handle::manage::modify_account),
        )
        .with_state(global)
}

/// Shared state behind every handler.
#[derive(Clone)]
pub struct Global {
    pub directory: Arc<Directory>,
    pub links: Arc<LinkService>,
    pub sessions: Arc<SessionManager>,
}

impl Global {
    pub fn new() -> Self {
        Self {
            directory: Arc::new(Directory::new()),
            links: Arc::new(LinkService::new()),
            sessions: Arc::new(SessionManager::new()),
        }
    }
}

/// An authenticated request context, resolved from the `Token` header.
pub struct Auth {
    /// The session token of this context.
    pub token: String,
    /// The live session behind the token.
    pub session: Arc<Session>,
}

#[async_trait]
impl axum::extract::FromRequestParts<Global> for Auth {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &Global,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("Token")
            .ok_or(Error::NotLoggedIn)?
            .to_str()?
            .to_string();
        let session = state.sessions.attach(&token).ok_or(Error::NotLoggedIn)?;
        Ok(Self { token, session })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("email is not pre-approved for access")]
    EmailNotAuthorized,
    #[error("an account with this email already exists")]
    AlreadyRegistered,
    #[error("sign-in link is invalid, expired or already used")]
    LinkInvalid,
    #[error("email required to complete sign-in")]
    EmailRequired,
    #[error("email does not match this sign-in link")]
    EmailMismatch,
    #[error("permission denied")]
    PermissionDenied,
    #[error("target operation account not found")]
    TargetAccountNotFound,

    #[error("date out of range")]
    DateOutOfRange,

    #[error("address error: {0}")]
    EmailAddress(lettre::address::AddressError),
    #[error("email message error: {0}")]
    Lettre(lettre::error::Error),
    #[error("failed to send email")]
    Smtp(smtp::Error),

    #[error("not logged in")]
    NotLoggedIn,
    #[error("non-ascii header value: {0}")]
    HeaderNonAscii(axum::http::header::ToStrError),

    #[error("storage backend errored")]
    Directory(account::DirectoryError),
}

impl Error {
    pub fn to_status_code(&self) -> StatusCode {
        match self {
            Error::TargetAccountNotFound => StatusCode::NOT_FOUND,
            Error::AlreadyRegistered => StatusCode::CONFLICT,
            Error::LinkInvalid | Error::EmailMismatch | Error::NotLoggedIn => {
                StatusCode::UNAUTHORIZED
            }
            Error::EmailRequired | Error::HeaderNonAscii(_) | Error::EmailAddress(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Lettre(_) | Error::Smtp(_) | Error::DateOutOfRange => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::Directory(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for Error {
    #[inline]
    fn into_response(self) -> axum::response::Response {
        #[derive(Serialize)]
        struct ErrorInfo {
            error: String,
        }
        (
            self.to_status_code(),
            axum::Json(ErrorInfo {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Implements `From<T>` for [`Error`].
macro_rules! impl_from {
    ($($t:ty => $v:ident),* $(,)?) => {
        $(
            impl From<$t> for $crate::Error {
                #[inline]
                fn from(err: $t) -> Self {
                    Self::$v(err)
                }
            }
        )*
    };
}

impl_from! {
    lettre::address::AddressError => EmailAddress,
    lettre::error::Error => Lettre,
    smtp::Error => Smtp,
    axum::http::header::ToStrError => HeaderNonAscii,
    account::DirectoryError => Directory,
}

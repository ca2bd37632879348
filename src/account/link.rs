use super::invite::{self, Authorization};
use super::{
    account_id_of, normalize_email, Directory, InviteStatus, Role, User, UserStatus,
    DEFAULT_PERMISSIONS,
};
use crate::Error;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use rand::Rng;

#[cfg(not(test))]
static SENDER_INSTANCE: Lazy<LinkSender> = Lazy::new(LinkSender::new);

/// The most recently mailed sign-in link, captured instead of delivered.
#[cfg(test)]
pub static LAST_LINK: Lazy<parking_lot::Mutex<Option<String>>> =
    Lazy::new(|| parking_lot::Mutex::new(None));

/// A sign-in link awaiting redemption.
///
/// The recorded email is what lets a same-device redemption complete
/// without the user re-entering their address.
#[derive(Debug, Clone)]
pub struct PendingLink {
    /// Email address the link is bound to, normalized to lowercase.
    pub email: String,
    /// The single-use token embedded in the mailed URL.
    pub token: String,
    /// The expire time of this link.
    pub expire_time: chrono::NaiveDateTime,
}

impl PendingLink {
    /// Mail this link to its owner.
    pub async fn send_sign_in(&self) -> Result<(), Error> {
        tracing::info!("Sending sign-in link to {}", self.email);

        #[cfg(not(test))]
        {
            SENDER_INSTANCE.send_link(self).await?;
        }

        #[cfg(test)]
        {
            *LAST_LINK.lock() = Some(sign_in_url(&self.token));
        }

        tracing::info!("Sign-in link for {} sent", self.email);
        Ok(())
    }

    /// Whether this link was expired.
    pub fn is_expired(&self) -> bool {
        self.expire_time <= Utc::now().naive_utc()
    }
}

/// The URL a token is mailed as.
pub fn sign_in_url(token: &str) -> String {
    format!(
        "{}/auth/finish?token={}",
        crate::config::INSTANCE.sign_in.url_prefix,
        token
    )
}

/// Whether a URL has the shape of an issued sign-in link.
pub fn is_sign_in_link(url: &str) -> bool {
    url.contains("/auth/finish") && token_of(url).is_some()
}

/// Extract the token query parameter from a sign-in link.
fn token_of(url: &str) -> Option<&str> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == "token" && !value.is_empty()).then_some(value)
    })
}

/// Result of issuing a sign-in link.
pub struct IssuedLink {
    /// Whether an account already exists for the email, so callers can
    /// route to "signing you in" instead of "registering you".
    pub account_exists: bool,
}

/// Outcome of a successful redemption.
pub enum Redeemed {
    /// The link belonged to an existing account.
    Existing(User),
    /// This redemption created the account.
    New(User),
}

impl Redeemed {
    pub fn user(&self) -> &User {
        match self {
            Redeemed::Existing(user) | Redeemed::New(user) => user,
        }
    }
}

/// Issues single-use, time-boxed sign-in links and redeems them exactly
/// once.
pub struct LinkService {
    pending: DashMap<String, PendingLink>,
}

impl LinkService {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Issue a sign-in link for an email.
    ///
    /// Authorization is checked here, in the same call that records the
    /// link: callers are expected to have consulted the invitation gate
    /// already, but trusting that would leave a gap between check and use.
    pub async fn issue(
        &self,
        directory: &Directory,
        email: &lettre::Address,
    ) -> Result<IssuedLink, Error> {
        let account_exists = match invite::authorize_email(directory, email)? {
            Authorization::Denied => return Err(Error::EmailNotAuthorized),
            Authorization::AlreadyRegistered(_) => true,
            Authorization::Approved(_) => false,
        };

        let link = PendingLink {
            email: normalize_email(email),
            token: {
                let mut rng = rand::thread_rng();
                sha256::digest(format!("{}-{}", email, rng.gen::<u128>()))
            },
            expire_time: match Utc::now().naive_utc().checked_add_signed(Duration::hours(
                crate::config::INSTANCE.sign_in.link_expire_hours as i64,
            )) {
                Some(e) => e,
                _ => return Err(Error::DateOutOfRange),
            },
        };

        link.send_sign_in().await?;
        self.pending.insert(link.token.clone(), link);
        Ok(IssuedLink { account_exists })
    }

    /// Redeem a followed sign-in link, creating the user document on first
    /// sign-in.
    ///
    /// The pending entry is consumed whatever the outcome, so a replayed
    /// link can never pick up stale state. Creation is a keyed write at
    /// the identity id: when two redemptions race, the loser observes the
    /// winner's document instead of inserting a duplicate.
    pub fn redeem(
        &self,
        directory: &Directory,
        url: &str,
        email: Option<&lettre::Address>,
    ) -> Result<Redeemed, Error> {
        if !is_sign_in_link(url) {
            return Err(Error::LinkInvalid);
        }
        let token = token_of(url).ok_or(Error::LinkInvalid)?;

        let Some((_, pending)) = self.pending.remove(token) else {
            // No issuance recorded for this token. Without an email there
            // is nothing left to resolve the redemption against.
            return Err(match email {
                Some(_) => Error::LinkInvalid,
                None => Error::EmailRequired,
            });
        };

        if pending.is_expired() {
            return Err(Error::LinkInvalid);
        }
        if let Some(email) = email {
            if normalize_email(email) != pending.email {
                return Err(Error::EmailMismatch);
            }
        }

        let id = account_id_of(&pending.email);
        let now = Utc::now();

        if let Some(user) = directory.user(id)? {
            directory.update_user(id, |user| user.last_sign_in = Some(now))?;
            return Ok(Redeemed::Existing(User {
                last_sign_in: Some(now),
                ..user
            }));
        }

        let invite = directory.invite(&pending.email)?;
        let (user, created) = directory.create_user(User {
            id,
            email: pending.email.clone(),
            name: invite
                .as_ref()
                .and_then(|invite| invite.name.clone())
                .unwrap_or_else(|| "User".to_string()),
            role: Role::User,
            permissions: DEFAULT_PERMISSIONS.iter().map(|p| p.to_string()).collect(),
            status: UserStatus::Active,
            created_at: now,
            last_sign_in: Some(now),
        })?;

        if created {
            directory.update_invite(&pending.email, |invite| {
                invite.status = InviteStatus::Registered;
                invite.registered_at = Some(now);
            })?;
            tracing::info!("Account created: {} (id: {})", user.email, user.id);
            Ok(Redeemed::New(user))
        } else {
            Ok(Redeemed::Existing(user))
        }
    }

    /// Drop expired pending links.
    pub fn refresh(&self) {
        self.pending.retain(|_, link| !link.is_expired());
    }

    /// Record a pending link directly, only for testing.
    #[cfg(test)]
    pub fn push_pending(&self, link: PendingLink) {
        self.pending.insert(link.token.clone(), link);
    }

    /// Look up a pending link by token, only for testing.
    #[cfg(test)]
    pub fn pending_of(&self, token: &str) -> Option<PendingLink> {
        self.pending.get(token).map(|link| link.clone())
    }
}

#[cfg(not(test))]
struct LinkSender {
    config: &'static crate::config::MailSmtp,
}

#[cfg(not(test))]
impl LinkSender {
    fn new() -> Self {
        Self {
            config: &crate::config::INSTANCE.mail_smtp,
        }
    }

    fn mailer(&self) -> lettre::AsyncSmtpTransport<lettre::Tokio1Executor> {
        lettre::AsyncSmtpTransport::<lettre::Tokio1Executor>::relay(&self.config.server)
            .unwrap()
            .port(self.config.port)
            .credentials(lettre::transport::smtp::authentication::Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build()
    }

    async fn send_link(&self, link: &PendingLink) -> Result<(), Error> {
        use lettre::{
            message::{header::ContentType, Mailbox},
            AsyncTransport, Message,
        };

        let mailer = self.mailer();
        mailer
            .send(
                Message::builder()
                    .from(Mailbox::new(
                        Some("GrdlHub".to_string()),
                        self.config.address.clone(),
                    ))
                    .to(Mailbox::new(None, link.email.parse()?))
                    .subject("Your sign-in link")
                    .header(ContentType::TEXT_PLAIN)
                    .body(format!(
                        "Follow this link to sign in: {}\n\nThe link can be used once and expires in {} hours.",
                        sign_in_url(&link.token),
                        crate::config::INSTANCE.sign_in.link_expire_hours
                    ))?,
            )
            .await
            .map(|_| ())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_shape() {
        let url = sign_in_url("deadbeef");
        assert!(is_sign_in_link(&url));
        assert_eq!(token_of(&url), Some("deadbeef"));

        assert!(!is_sign_in_link("http://127.0.0.1:8080/auth/finish"));
        assert!(!is_sign_in_link("http://127.0.0.1:8080/?token=deadbeef"));
        assert!(!is_sign_in_link(
            "http://127.0.0.1:8080/auth/finish?token="
        ));
    }

    #[test]
    fn token_from_extra_params() {
        assert_eq!(
            token_of("https://hub.example/auth/finish?mode=signIn&token=abc123"),
            Some("abc123")
        );
    }
}

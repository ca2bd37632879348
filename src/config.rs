use once_cell::sync::Lazy;
use serde::Deserialize;

/// The static config instance.
#[allow(dead_code)]
pub static INSTANCE: Lazy<Config> = Lazy::new(|| {
    #[cfg(not(test))]
    {
        use std::{fs::File, io::Read};

        return toml::from_str(&{
            let mut string = String::new();
            File::open("./data/config.toml")
                .unwrap()
                .read_to_string(&mut string)
                .unwrap();
            string
        })
        .unwrap();
    }

    #[cfg(test)]
    Config::default()
});

/// Describing the server configuration.
#[derive(Deserialize, Default)]
pub struct Config {
    pub mail_smtp: MailSmtp,
    #[serde(default)]
    pub sign_in: SignIn,
}

/// Describing mailing configuration.
#[derive(Deserialize, Clone)]
pub struct MailSmtp {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub address: lettre::Address,
}

impl Default for MailSmtp {
    fn default() -> Self {
        Self {
            server: String::default(),
            port: 0,
            username: String::default(),
            password: String::default(),
            address: lettre::Address::new("user", "email.com").unwrap(),
        }
    }
}

/// Describing the sign-in link and session lifecycle configuration.
#[derive(Deserialize, Clone)]
pub struct SignIn {
    /// Public URL prefix the emailed links point back to.
    pub url_prefix: String,
    /// Validity window of an issued link, in hours.
    pub link_expire_hours: u16,
    /// The expiration time of a session in days.
    /// `0` means never expire.
    pub session_expire_days: u16,
}

impl Default for SignIn {
    fn default() -> Self {
        Self {
            url_prefix: "http://127.0.0.1:8080".to_string(),
            link_expire_hours: 24,
            session_expire_days: 30,
        }
    }
}

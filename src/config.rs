//! Configuration for token lifetimes and outbound links.
//!
//! # Example
//!
//! ```rust
//! use covenant::config::{CovenantConfig, TokenConfig, UrlConfig};
//! use chrono::Duration;
//!
//! let config = CovenantConfig {
//!     tokens: TokenConfig {
//!         team_email_verification_expiry: Duration::hours(12),
//!         ..Default::default()
//!     },
//!     urls: UrlConfig::new("https://sign.acme.test"),
//! };
//!
//! assert_eq!(
//!     config.urls.team_email_verification_link("abc"),
//!     "https://sign.acme.test/verify/team/email/abc"
//! );
//! ```

use chrono::Duration;

use crate::crypto::DEFAULT_TOKEN_LENGTH;

pub const ENV_BASE_URL: &str = "COVENANT_BASE_URL";
pub const ENV_TEAM_EMAIL_VERIFICATION_EXPIRY_HOURS: &str =
    "COVENANT_TEAM_EMAIL_VERIFICATION_EXPIRY_HOURS";
pub const ENV_TOKEN_LENGTH: &str = "COVENANT_TOKEN_LENGTH";

/// Shortest token length accepted from the environment.
const MIN_TOKEN_LENGTH: usize = 16;

/// Longest verification link lifetime accepted from the environment: one year.
const MAX_EXPIRY_HOURS: i64 = 8760;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} is not a valid value: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Top-level configuration.
///
/// `CovenantConfig::default()` is suitable for production once `urls.base_url`
/// points at the public origin.
#[derive(Debug, Clone, Default)]
pub struct CovenantConfig {
    pub tokens: TokenConfig,
    pub urls: UrlConfig,
}

impl CovenantConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Long-lived tokens and a localhost origin.
    pub fn development() -> Self {
        Self {
            tokens: TokenConfig {
                team_email_verification_expiry: Duration::days(7),
                token_length: DEFAULT_TOKEN_LENGTH,
            },
            urls: UrlConfig::new("http://localhost:3000"),
        }
    }

    /// Shorter token lifetimes and longer tokens.
    pub fn strict() -> Self {
        Self {
            tokens: TokenConfig {
                team_email_verification_expiry: Duration::hours(2),
                token_length: 48,
            },
            urls: UrlConfig::default(),
        }
    }

    /// Builds a configuration from process environment variables.
    ///
    /// Unset variables keep their default value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads a `.env` file if one exists, then reads the environment.
    pub fn from_dotenv() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!(
                    target: "covenant",
                    "msg=\"failed to load .env file\", error=\"{e}\""
                );
            }
        }

        Self::from_env()
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.urls = UrlConfig::new(base_url);
        }

        if let Some(raw) = lookup(ENV_TEAM_EMAIL_VERIFICATION_EXPIRY_HOURS) {
            let expiry = raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|h| (1..=MAX_EXPIRY_HOURS).contains(h))
                .and_then(Duration::try_hours)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: ENV_TEAM_EMAIL_VERIFICATION_EXPIRY_HOURS,
                    value: raw.clone(),
                })?;
            config.tokens.team_email_verification_expiry = expiry;
        }

        if let Some(raw) = lookup(ENV_TOKEN_LENGTH) {
            let length = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|l| *l >= MIN_TOKEN_LENGTH)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: ENV_TOKEN_LENGTH,
                    value: raw.clone(),
                })?;
            config.tokens.token_length = length;
        }

        Ok(config)
    }
}

/// Token lifetimes and length.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// How long a team email verification link stays valid.
    ///
    /// Default: 24 hours
    pub team_email_verification_expiry: Duration,

    /// Length of generated tokens in characters.
    ///
    /// Default: 32
    pub token_length: usize,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            team_email_verification_expiry: Duration::hours(24),
            token_length: DEFAULT_TOKEN_LENGTH,
        }
    }
}

/// Origin used to build links sent by email.
#[derive(Debug, Clone)]
pub struct UrlConfig {
    /// Public origin without a trailing slash.
    pub base_url: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}

impl UrlConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn team_email_verification_link(&self, token: &str) -> String {
        format!("{}/verify/team/email/{token}", self.base_url)
    }

    pub fn team_invitation_link(&self, token: &str) -> String {
        format!("{}/team/invite/{token}", self.base_url)
    }
}

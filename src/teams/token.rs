use chrono::{DateTime, Duration, Utc};

use crate::SecretString;
use crate::config::TokenConfig;
use crate::crypto::{generate_token, hash_token};

/// A freshly issued single-use token.
///
/// Only `token_hash` is persisted. The plain token goes into the emailed link.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: SecretString,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues URL-safe tokens with an expiry horizon. Never touches storage.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    length: usize,
    validity: Duration,
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::from_config(&TokenConfig::default())
    }
}

impl TokenIssuer {
    pub fn new(length: usize, validity: Duration) -> Self {
        Self { length, validity }
    }

    /// Issuer for team email verification tokens.
    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.token_length, config.team_email_verification_expiry)
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn issue(&self) -> IssuedToken {
        self.issue_at(Utc::now())
    }

    /// Issues a replacement whose expiry is strictly later than `previous_expires_at`.
    pub fn reissue(&self, previous_expires_at: DateTime<Utc>) -> IssuedToken {
        let mut issued = self.issue();
        if issued.expires_at <= previous_expires_at {
            issued.expires_at = previous_expires_at + Duration::milliseconds(1);
        }
        issued
    }

    fn issue_at(&self, now: DateTime<Utc>) -> IssuedToken {
        let token = generate_token(self.length);
        let token_hash = hash_token(&token);

        IssuedToken {
            token: SecretString::new(token),
            token_hash,
            expires_at: now + self.validity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_defaults() {
        let before = Utc::now();
        let issued = TokenIssuer::default().issue();

        assert_eq!(issued.token.len(), 32);
        assert_eq!(issued.token_hash, hash_token(issued.token.expose_secret()));
        assert!(issued.expires_at >= before + Duration::hours(24));
    }

    #[test]
    fn test_issue_is_unique() {
        let issuer = TokenIssuer::default();
        let a = issuer.issue();
        let b = issuer.issue();

        assert_ne!(a.token.expose_secret(), b.token.expose_secret());
        assert_ne!(a.token_hash, b.token_hash);
    }

    #[test]
    fn test_reissue_is_strictly_later() {
        let issuer = TokenIssuer::default();
        let first = issuer.issue();
        let second = issuer.reissue(first.expires_at);
        assert!(second.expires_at > first.expires_at);

        // previous expiry far in the future still yields a later one
        let far = Utc::now() + Duration::days(365);
        assert!(issuer.reissue(far).expires_at > far);
    }

    #[test]
    fn test_custom_length_and_validity() {
        let issuer = TokenIssuer::new(48, Duration::minutes(10));
        let now = Utc::now();
        let issued = issuer.issue_at(now);

        assert_eq!(issued.token.len(), 48);
        assert_eq!(issued.expires_at, now + Duration::minutes(10));
    }
}

//! Outbound team mail.
//!
//! Actions collect mail in a [`PendingMail`] while they work and dispatch it
//! only after the store call has committed. Delivery failures are logged and
//! never change the action's result.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::SecretString;
use crate::TeamError;
use crate::teams::TeamMemberRole;

#[derive(Debug, Clone)]
pub enum TeamMail {
    /// Asks the owner of `to` to confirm it as the team's email.
    TeamEmailVerification {
        to: String,
        name: String,
        team_name: String,
        team_url: String,
        link: SecretString,
        expires_at: DateTime<Utc>,
    },
    /// Invites `to` to join a team.
    TeamMemberInvite {
        to: String,
        team_name: String,
        team_url: String,
        role: TeamMemberRole,
        link: SecretString,
    },
}

impl TeamMail {
    pub fn recipient(&self) -> &str {
        match self {
            Self::TeamEmailVerification { to, .. } | Self::TeamMemberInvite { to, .. } => to,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TeamEmailVerification { .. } => "team_email_verification",
            Self::TeamMemberInvite { .. } => "team_member_invite",
        }
    }

    pub fn link(&self) -> &SecretString {
        match self {
            Self::TeamEmailVerification { link, .. } | Self::TeamMemberInvite { link, .. } => link,
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Self::TeamEmailVerification { team_name, .. } => {
                format!("A request to use your email has been initiated by {team_name}")
            }
            Self::TeamMemberInvite { team_name, .. } => {
                format!("You have been invited to join {team_name}")
            }
        }
    }
}

/// Delivers team mail. Implement this over your email provider.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: TeamMail) -> Result<(), TeamError>;
}

/// Mailer that only logs what it would send. Links are never logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: TeamMail) -> Result<(), TeamError> {
        log::info!(
            target: "covenant",
            "msg=\"mail sent\", kind={}, to=\"{}\", subject=\"{}\"",
            mail.kind(),
            mail.recipient(),
            mail.subject()
        );
        Ok(())
    }
}

/// Mail waiting for the surrounding store call to commit.
#[derive(Debug, Default)]
pub struct PendingMail(Vec<TeamMail>);

impl PendingMail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mail: TeamMail) {
        self.0.push(mail);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sends every queued mail. Returns how many were delivered.
    pub async fn dispatch<M: Mailer + ?Sized>(self, mailer: &M) -> usize {
        let mut delivered = 0;

        for mail in self.0 {
            let kind = mail.kind();
            let to = mail.recipient().to_owned();

            match mailer.send(mail).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    log::warn!(
                        target: "covenant",
                        "msg=\"mail dispatch failed\", kind={kind}, to=\"{to}\", error=\"{e}\""
                    );
                }
            }
        }

        delivered
    }
}

#[cfg(any(test, feature = "mocks"))]
mod mock {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{Mailer, TeamMail};
    use crate::TeamError;

    /// Records sent mail. Clones share the outbox.
    #[derive(Clone, Default)]
    pub struct MockMailer {
        sent: Arc<Mutex<Vec<TeamMail>>>,
        failing: Arc<AtomicBool>,
    }

    impl MockMailer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every following `send` fail until reset.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn sent(&self) -> Vec<TeamMail> {
            self.sent.lock().map(|s| s.clone()).unwrap_or_default()
        }

        /// Token embedded in the most recent mail's link.
        pub fn last_token(&self) -> Option<String> {
            self.sent().last().and_then(|mail| {
                mail.link()
                    .expose_secret()
                    .rsplit('/')
                    .next()
                    .map(str::to_owned)
            })
        }
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, mail: TeamMail) -> Result<(), TeamError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(TeamError::Notification("mock mailer is failing".into()));
            }
            self.sent
                .lock()
                .map_err(|_| TeamError::Internal("lock poisoned".into()))?
                .push(mail);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "mocks"))]
pub use mock::MockMailer;

#[cfg(test)]
mod tests {
    use super::*;

    fn invite_mail(to: &str) -> TeamMail {
        TeamMail::TeamMemberInvite {
            to: to.to_owned(),
            team_name: "Acme".to_owned(),
            team_url: "acme".to_owned(),
            role: TeamMemberRole::Member,
            link: SecretString::new(format!("http://localhost:3000/team/invite/tok-{to}")),
        }
    }

    #[tokio::test]
    async fn test_dispatch_delivers_all() {
        let mailer = MockMailer::new();
        let mut pending = PendingMail::new();
        pending.push(invite_mail("a@x.test"));
        pending.push(invite_mail("b@x.test"));

        assert_eq!(pending.dispatch(&mailer).await, 2);
        assert_eq!(mailer.sent().len(), 2);
        assert_eq!(mailer.last_token().as_deref(), Some("tok-b@x.test"));
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_swallowed() {
        let mailer = MockMailer::new();
        mailer.set_failing(true);

        let mut pending = PendingMail::new();
        pending.push(invite_mail("a@x.test"));

        assert_eq!(pending.dispatch(&mailer).await, 0);
        assert!(mailer.sent().is_empty());
    }

    #[test]
    fn test_mail_debug_redacts_link() {
        let debug = format!("{:?}", invite_mail("a@x.test"));
        assert!(!debug.contains("tok-"));
    }

    #[tokio::test]
    async fn test_log_mailer_succeeds() {
        assert!(LogMailer.send(invite_mail("a@x.test")).await.is_ok());
    }
}

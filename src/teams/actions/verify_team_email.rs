use chrono::Utc;

use crate::TeamError;
use crate::crypto::hash_token;
use crate::events::{self, TeamEvent};
use crate::teams::{Team, TeamEmail, TeamEmailRepository, TeamRepository};

#[cfg(feature = "tracing")]
use crate::TracingConfig;

/// What the verification link page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyTeamEmailOutcome {
    Verified { team: Team, team_email: TeamEmail },
    /// Unknown, superseded, already used, or expired token. Nothing changed.
    InvalidOrExpired,
    /// Another team confirmed the same address first. Retrying will not help.
    EmailTaken { team: Team },
    /// The store failed. The link can be retried.
    Failed { team: Option<Team> },
}

impl VerifyTeamEmailOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// Consumes a team email verification token.
///
/// Reports an outcome instead of an error: the caller is an unauthenticated
/// page that renders one of three states.
pub struct VerifyTeamEmailAction<S>
where
    S: TeamRepository + TeamEmailRepository,
{
    store: S,
    #[cfg(feature = "tracing")]
    tracing: Option<TracingConfig>,
}

impl<S> VerifyTeamEmailAction<S>
where
    S: TeamRepository + TeamEmailRepository,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            #[cfg(feature = "tracing")]
            tracing: None,
        }
    }

    #[cfg(feature = "tracing")]
    pub fn with_tracing(mut self) -> Self {
        self.tracing = Some(TracingConfig::new("verify_team_email"));
        self
    }

    #[cfg(feature = "tracing")]
    pub fn with_tracing_config(mut self, config: TracingConfig) -> Self {
        self.tracing = Some(config);
        self
    }

    pub async fn execute(&self, token: &str) -> VerifyTeamEmailOutcome {
        #[cfg(feature = "tracing")]
        {
            if let Some(ref config) = self.tracing {
                use tracing::Instrument;
                let span = tracing::info_span!("action", name = config.span_name);
                let outcome = self.execute_inner(token).instrument(span).await;
                match &outcome {
                    VerifyTeamEmailOutcome::Verified { team, .. } => {
                        tracing::info!(team_id = team.id, "team email verified");
                    }
                    VerifyTeamEmailOutcome::InvalidOrExpired => {
                        tracing::info!("team email token invalid or expired");
                    }
                    VerifyTeamEmailOutcome::EmailTaken { team } => {
                        tracing::info!(team_id = team.id, "team email already taken");
                    }
                    VerifyTeamEmailOutcome::Failed { .. } => {
                        tracing::warn!("team email verification failed");
                    }
                }
                return outcome;
            }
        }

        self.execute_inner(token).await
    }

    async fn execute_inner(&self, token: &str) -> VerifyTeamEmailOutcome {
        let token_hash = hash_token(token);
        let now = Utc::now();

        let verification = match self.store.find_verification_by_token_hash(&token_hash).await {
            Ok(Some(v)) if !v.is_expired_at(now) => v,
            Ok(_) => return VerifyTeamEmailOutcome::InvalidOrExpired,
            Err(e) => {
                log::error!(
                    target: "covenant",
                    "msg=\"team email verification lookup failed\", error=\"{e}\""
                );
                return VerifyTeamEmailOutcome::Failed { team: None };
            }
        };

        let team = match self.store.find_team_by_id(verification.team_id).await {
            Ok(Some(team)) => team,
            Ok(None) => return VerifyTeamEmailOutcome::InvalidOrExpired,
            Err(e) => {
                log::error!(
                    target: "covenant",
                    "msg=\"team lookup failed\", team_id={}, error=\"{e}\"",
                    verification.team_id
                );
                return VerifyTeamEmailOutcome::Failed { team: None };
            }
        };

        match self.store.consume_verification(&token_hash, now).await {
            Ok(team_email) => {
                log::info!(
                    target: "covenant",
                    "msg=\"team email verified\", team_id={}, email=\"{}\"",
                    team.id,
                    team_email.email
                );
                events::dispatch(TeamEvent::TeamEmailVerified {
                    team_id: team.id,
                    email: team_email.email.clone(),
                    at: now,
                })
                .await;

                VerifyTeamEmailOutcome::Verified { team, team_email }
            }
            // lost a race with another consumer or a resend
            Err(TeamError::TokenInvalid) => VerifyTeamEmailOutcome::InvalidOrExpired,
            Err(TeamError::Conflict(reason)) => {
                log::warn!(
                    target: "covenant",
                    "msg=\"team email verification conflicted\", team_id={}, reason=\"{reason}\"",
                    team.id
                );
                VerifyTeamEmailOutcome::EmailTaken { team }
            }
            Err(e) => {
                log::error!(
                    target: "covenant",
                    "msg=\"team email verification failed\", team_id={}, error=\"{e}\"",
                    team.id
                );
                VerifyTeamEmailOutcome::Failed { team: Some(team) }
            }
        }
    }
}

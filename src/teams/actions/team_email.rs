//! Adding, resending, renaming and removing a team's email address.
//!
//! A team email moves through `None -> Pending -> Confirmed`. Adding creates
//! the pending verification, consuming the emailed link confirms it (see
//! [`VerifyTeamEmailAction`](super::VerifyTeamEmailAction)), and deleting
//! returns the team to `None`.

use chrono::Utc;

use super::guard::{find_team_for_action, require_team_action};
use crate::config::{CovenantConfig, UrlConfig};
use crate::events::{self, TeamEvent};
use crate::notifications::{Mailer, PendingMail, TeamMail};
use crate::teams::{
    CreateTeamEmailVerification, IssuedToken, Team, TeamAction, TeamEmail, TeamEmailRepository,
    TeamEmailVerification, TeamMemberRepository, TokenIssuer,
};
use crate::validators::{ValidationErrors, normalize_email, validate_email, validate_name};
use crate::{SecretString, TeamError};

fn verification_mail(
    urls: &UrlConfig,
    team: &Team,
    verification: &TeamEmailVerification,
    issued: &IssuedToken,
) -> TeamMail {
    TeamMail::TeamEmailVerification {
        to: verification.email.clone(),
        name: verification.name.clone(),
        team_name: team.name.clone(),
        team_url: team.url.clone(),
        link: SecretString::new(
            urls.team_email_verification_link(issued.token.expose_secret()),
        ),
        expires_at: verification.expires_at,
    }
}

#[derive(Debug, Clone)]
pub struct AddTeamEmailVerificationInput {
    pub team_id: i64,
    pub actor_id: i64,
    /// Display name for the address.
    pub name: String,
    pub email: String,
}

/// Starts verification of an external email address for a team.
pub struct AddTeamEmailVerificationAction<S, M>
where
    S: TeamMemberRepository + TeamEmailRepository,
    M: Mailer,
{
    store: S,
    mailer: M,
    issuer: TokenIssuer,
    urls: UrlConfig,
}

impl<S, M> AddTeamEmailVerificationAction<S, M>
where
    S: TeamMemberRepository + TeamEmailRepository,
    M: Mailer,
{
    pub fn new(store: S, mailer: M) -> Self {
        Self::with_config(store, mailer, &CovenantConfig::default())
    }

    pub fn with_config(store: S, mailer: M, config: &CovenantConfig) -> Self {
        Self {
            store,
            mailer,
            issuer: TokenIssuer::from_config(&config.tokens),
            urls: config.urls.clone(),
        }
    }

    /// # Returns
    ///
    /// - `Ok(verification)` - pending verification stored, mail queued
    /// - `Err(TeamError::Validation)` - blank name or malformed email
    /// - `Err(TeamError::TeamNotFound)` / `Err(TeamError::Forbidden)` - actor may not manage the team
    /// - `Err(TeamError::Conflict)` - the team already has an email or a pending verification
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "add_team_email_verification",
            skip_all,
            fields(team_id = input.team_id),
            err
        )
    )]
    pub async fn execute(
        &self,
        input: AddTeamEmailVerificationInput,
    ) -> Result<TeamEmailVerification, TeamError> {
        let mut errors = ValidationErrors::new();
        errors.check("name", validate_name(&input.name));
        errors.check("email", validate_email(&input.email));
        errors.into_result()?;

        let context = require_team_action(
            &self.store,
            input.team_id,
            input.actor_id,
            TeamAction::ManageTeam,
        )
        .await?;

        let issued = self.issuer.issue();
        let verification = self
            .store
            .create_verification(CreateTeamEmailVerification {
                team_id: input.team_id,
                email: normalize_email(&input.email),
                name: input.name.trim().to_owned(),
                token_hash: issued.token_hash.clone(),
                expires_at: issued.expires_at,
            })
            .await?;

        log::info!(
            target: "covenant",
            "msg=\"team email verification created\", team_id={}, email=\"{}\"",
            verification.team_id,
            verification.email
        );

        let mut pending = PendingMail::new();
        pending.push(verification_mail(
            &self.urls,
            &context.team,
            &verification,
            &issued,
        ));
        pending.dispatch(&self.mailer).await;

        events::dispatch(TeamEvent::TeamEmailVerificationRequested {
            team_id: verification.team_id,
            email: verification.email.clone(),
            at: Utc::now(),
        })
        .await;

        Ok(verification)
    }
}

/// Replaces the token of a pending verification and mails the new link.
///
/// The old link stops working and the new expiry is strictly later than the
/// old one.
pub struct ResendTeamEmailVerificationAction<S, M>
where
    S: TeamMemberRepository + TeamEmailRepository,
    M: Mailer,
{
    store: S,
    mailer: M,
    issuer: TokenIssuer,
    urls: UrlConfig,
}

impl<S, M> ResendTeamEmailVerificationAction<S, M>
where
    S: TeamMemberRepository + TeamEmailRepository,
    M: Mailer,
{
    pub fn new(store: S, mailer: M) -> Self {
        Self::with_config(store, mailer, &CovenantConfig::default())
    }

    pub fn with_config(store: S, mailer: M, config: &CovenantConfig) -> Self {
        Self {
            store,
            mailer,
            issuer: TokenIssuer::from_config(&config.tokens),
            urls: config.urls.clone(),
        }
    }

    /// `TeamNotFound` when the actor cannot manage the team, whether or not it
    /// exists. `VerificationNotFound` when nothing is pending.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "resend_team_email_verification", skip(self), err)
    )]
    pub async fn execute(
        &self,
        actor_id: i64,
        team_id: i64,
    ) -> Result<TeamEmailVerification, TeamError> {
        let context =
            find_team_for_action(&self.store, team_id, actor_id, TeamAction::ManageTeam).await?;

        let current = self
            .store
            .find_verification_by_team(team_id)
            .await?
            .ok_or(TeamError::VerificationNotFound)?;

        let issued = self.issuer.reissue(current.expires_at);
        let verification = self
            .store
            .replace_verification(team_id, &issued.token_hash, issued.expires_at)
            .await?;

        log::info!(
            target: "covenant",
            "msg=\"team email verification resent\", team_id={team_id}"
        );

        let mut pending = PendingMail::new();
        pending.push(verification_mail(
            &self.urls,
            &context.team,
            &verification,
            &issued,
        ));
        pending.dispatch(&self.mailer).await;

        events::dispatch(TeamEvent::TeamEmailVerificationResent {
            team_id,
            email: verification.email.clone(),
            at: Utc::now(),
        })
        .await;

        Ok(verification)
    }
}

/// Renames a confirmed team email.
pub struct UpdateTeamEmailAction<S>
where
    S: TeamMemberRepository + TeamEmailRepository,
{
    store: S,
}

impl<S> UpdateTeamEmailAction<S>
where
    S: TeamMemberRepository + TeamEmailRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "update_team_email", skip(self, name), err)
    )]
    pub async fn execute(
        &self,
        actor_id: i64,
        team_id: i64,
        name: &str,
    ) -> Result<TeamEmail, TeamError> {
        validate_name(name)
            .map_err(|e| TeamError::Validation(ValidationErrors::single("name", e)))?;

        require_team_action(&self.store, team_id, actor_id, TeamAction::ManageTeam).await?;

        let team_email = self
            .store
            .update_team_email_name(team_id, name.trim())
            .await?;

        log::info!(
            target: "covenant",
            "msg=\"team email renamed\", team_id={team_id}"
        );

        Ok(team_email)
    }
}

/// Removes a team's confirmed email. Succeeds when there is none.
pub struct DeleteTeamEmailAction<S>
where
    S: TeamMemberRepository + TeamEmailRepository,
{
    store: S,
}

impl<S> DeleteTeamEmailAction<S>
where
    S: TeamMemberRepository + TeamEmailRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "delete_team_email", skip(self), err)
    )]
    pub async fn execute(&self, actor_id: i64, team_id: i64) -> Result<(), TeamError> {
        require_team_action(&self.store, team_id, actor_id, TeamAction::ManageTeam).await?;

        self.store.delete_team_email(team_id).await?;

        log::info!(
            target: "covenant",
            "msg=\"team email removed\", team_id={team_id}, actor_id={actor_id}"
        );
        events::dispatch(TeamEvent::TeamEmailRemoved {
            team_id,
            at: Utc::now(),
        })
        .await;

        Ok(())
    }
}

/// Cancels a pending verification. Succeeds when there is none.
pub struct DeleteTeamEmailVerificationAction<S>
where
    S: TeamMemberRepository + TeamEmailRepository,
{
    store: S,
}

impl<S> DeleteTeamEmailVerificationAction<S>
where
    S: TeamMemberRepository + TeamEmailRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "delete_team_email_verification", skip(self), err)
    )]
    pub async fn execute(&self, actor_id: i64, team_id: i64) -> Result<(), TeamError> {
        require_team_action(&self.store, team_id, actor_id, TeamAction::ManageTeam).await?;

        self.store.delete_verification(team_id).await?;

        log::info!(
            target: "covenant",
            "msg=\"team email verification deleted\", team_id={team_id}, actor_id={actor_id}"
        );
        events::dispatch(TeamEvent::TeamEmailVerificationDeleted {
            team_id,
            at: Utc::now(),
        })
        .await;

        Ok(())
    }
}

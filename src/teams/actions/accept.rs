use chrono::Utc;

use crate::crypto::hash_token;
use crate::events::{self, TeamEvent};
use crate::repository::UserRepository;
use crate::teams::{InviteStatus, TeamInviteRepository, TeamMember, TeamMemberInvite};
use crate::{SecretString, TeamError};

/// Result of accepting an invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptInvitationOutcome {
    /// The invitee has an account and is now a member.
    Joined(TeamMember),
    /// No account exists yet. Membership is created when the account is.
    AwaitingAccount(TeamMemberInvite),
}

/// Accepts a team invitation using the plain token from the invitation link.
pub struct AcceptTeamInvitationAction<S>
where
    S: TeamInviteRepository + UserRepository,
{
    store: S,
}

impl<S> AcceptTeamInvitationAction<S>
where
    S: TeamInviteRepository + UserRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// # Returns
    ///
    /// - `Ok(Joined)` - invite consumed, membership created or already present
    /// - `Ok(AwaitingAccount)` - invite marked accepted
    /// - `Err(TeamError::TokenInvalid)` - unknown token or invite not pending
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "accept_team_invitation", skip_all, err)
    )]
    pub async fn execute(
        &self,
        token: &SecretString,
    ) -> Result<AcceptInvitationOutcome, TeamError> {
        let invite = find_pending_invite(&self.store, token).await?;

        let user = self.store.find_user_by_email(&invite.email).await?;

        let outcome = match user {
            Some(user) => {
                let member = self
                    .store
                    .accept_invite_as_member(invite.id, user.id)
                    .await?;

                log::info!(
                    target: "covenant",
                    "msg=\"invitation accepted\", team_id={}, user_id={}, member_id={}",
                    member.team_id,
                    member.user_id,
                    member.id
                );
                AcceptInvitationOutcome::Joined(member)
            }
            None => {
                let invite = self
                    .store
                    .set_invite_status(invite.id, InviteStatus::Accepted)
                    .await?;

                log::info!(
                    target: "covenant",
                    "msg=\"invitation accepted, awaiting account\", team_id={}, invite_id={}",
                    invite.team_id,
                    invite.id
                );
                AcceptInvitationOutcome::AwaitingAccount(invite)
            }
        };

        let user_id = match &outcome {
            AcceptInvitationOutcome::Joined(member) => Some(member.user_id),
            AcceptInvitationOutcome::AwaitingAccount(_) => None,
        };
        events::dispatch(TeamEvent::InvitationAccepted {
            team_id: invite.team_id,
            email: invite.email,
            user_id,
            at: Utc::now(),
        })
        .await;

        Ok(outcome)
    }
}

/// Declines a team invitation. The invite is kept with status `Declined`.
pub struct DeclineTeamInvitationAction<S: TeamInviteRepository> {
    store: S,
}

impl<S: TeamInviteRepository> DeclineTeamInvitationAction<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "decline_team_invitation", skip_all, err)
    )]
    pub async fn execute(&self, token: &SecretString) -> Result<TeamMemberInvite, TeamError> {
        let invite = find_pending_invite(&self.store, token).await?;
        let invite = self
            .store
            .set_invite_status(invite.id, InviteStatus::Declined)
            .await?;

        log::info!(
            target: "covenant",
            "msg=\"invitation declined\", team_id={}, invite_id={}",
            invite.team_id,
            invite.id
        );

        events::dispatch(TeamEvent::InvitationDeclined {
            team_id: invite.team_id,
            email: invite.email.clone(),
            at: Utc::now(),
        })
        .await;

        Ok(invite)
    }
}

async fn find_pending_invite<S>(
    store: &S,
    token: &SecretString,
) -> Result<TeamMemberInvite, TeamError>
where
    S: TeamInviteRepository + ?Sized,
{
    let token_hash = hash_token(token.expose_secret());

    store
        .find_invite_by_token_hash(&token_hash)
        .await?
        .filter(TeamMemberInvite::is_pending)
        .ok_or(TeamError::TokenInvalid)
}

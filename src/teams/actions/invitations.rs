use chrono::Utc;

use super::guard::require_team_action;
use crate::config::{CovenantConfig, UrlConfig};
use crate::crypto::{generate_token, hash_token};
use crate::events::{self, TeamEvent};
use crate::notifications::{Mailer, PendingMail, TeamMail};
use crate::teams::{TeamAction, TeamInviteRepository, TeamMemberInvite, TeamMemberRepository};
use crate::{SecretString, TeamError};

/// Issues a fresh token for a pending invitation and mails it again.
///
/// The previous link stops working as soon as the new token is stored.
pub struct ResendTeamMemberInvitationAction<S, M>
where
    S: TeamMemberRepository + TeamInviteRepository,
    M: Mailer,
{
    store: S,
    mailer: M,
    urls: UrlConfig,
    token_length: usize,
}

impl<S, M> ResendTeamMemberInvitationAction<S, M>
where
    S: TeamMemberRepository + TeamInviteRepository,
    M: Mailer,
{
    pub fn new(store: S, mailer: M) -> Self {
        Self::with_config(store, mailer, &CovenantConfig::default())
    }

    pub fn with_config(store: S, mailer: M, config: &CovenantConfig) -> Self {
        Self {
            store,
            mailer,
            urls: config.urls.clone(),
            token_length: config.tokens.token_length,
        }
    }

    /// `NotFound` if the invitation is not a pending invite of `team_id`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "resend_team_member_invitation", skip(self), err)
    )]
    pub async fn execute(
        &self,
        actor_id: i64,
        team_id: i64,
        invitation_id: i64,
    ) -> Result<TeamMemberInvite, TeamError> {
        let context =
            require_team_action(&self.store, team_id, actor_id, TeamAction::ManageTeam).await?;

        let token = generate_token(self.token_length);
        let invite = self
            .store
            .replace_invite_token(team_id, invitation_id, &hash_token(&token))
            .await?;

        log::info!(
            target: "covenant",
            "msg=\"invitation resent\", team_id={team_id}, invite_id={invitation_id}"
        );

        let mut pending = PendingMail::new();
        pending.push(TeamMail::TeamMemberInvite {
            to: invite.email.clone(),
            team_name: context.team.name,
            team_url: context.team.url,
            role: invite.role,
            link: SecretString::new(self.urls.team_invitation_link(&token)),
        });
        pending.dispatch(&self.mailer).await;

        events::dispatch(TeamEvent::InvitationResent {
            team_id,
            invite_id: invite.id,
            at: Utc::now(),
        })
        .await;

        Ok(invite)
    }
}

/// Deletes invitations of a team. Ids belonging to other teams are ignored.
pub struct DeleteTeamMemberInvitationsAction<S>
where
    S: TeamMemberRepository + TeamInviteRepository,
{
    store: S,
}

impl<S> DeleteTeamMemberInvitationsAction<S>
where
    S: TeamMemberRepository + TeamInviteRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the number of invitations removed.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "delete_team_member_invitations", skip(self), err)
    )]
    pub async fn execute(
        &self,
        actor_id: i64,
        team_id: i64,
        invitation_ids: &[i64],
    ) -> Result<u64, TeamError> {
        require_team_action(
            &self.store,
            team_id,
            actor_id,
            TeamAction::DeleteInvitations,
        )
        .await?;

        let count = self.store.delete_invites(team_id, invitation_ids).await?;

        log::info!(
            target: "covenant",
            "msg=\"invitations deleted\", team_id={team_id}, actor_id={actor_id}, count={count}"
        );

        events::dispatch(TeamEvent::InvitationsDeleted {
            team_id,
            count,
            at: Utc::now(),
        })
        .await;

        Ok(count)
    }
}

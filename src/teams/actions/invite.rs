use std::collections::HashMap;

use chrono::Utc;

use super::guard::require_team_action;
use crate::config::{CovenantConfig, UrlConfig};
use crate::crypto::{generate_token, hash_token};
use crate::events::{self, TeamEvent};
use crate::notifications::{Mailer, PendingMail, TeamMail};
use crate::teams::{
    CreateTeamMemberInvite, TeamAction, TeamInviteRepository, TeamMemberInvite,
    TeamMemberRepository, TeamMemberRole, is_role_within_hierarchy,
};
use crate::validators::{normalize_email, validate_invitation_emails};
use crate::{SecretString, TeamError};

#[cfg(feature = "tracing")]
use crate::TracingConfig;

/// One requested invitation.
#[derive(Debug, Clone)]
pub struct InvitationRequest {
    pub email: String,
    pub role: TeamMemberRole,
}

#[derive(Debug, Clone)]
pub struct InviteTeamMembersInput {
    pub team_id: i64,
    pub actor_id: i64,
    pub invitations: Vec<InvitationRequest>,
}

/// Invites a batch of email addresses to a team.
///
/// 1. Validates the batch: non-empty, every email well-formed, no
///    case-insensitive duplicates. Nothing is persisted on failure.
/// 2. Requires `ManageTeam`, and every invited role must be at or below the
///    actor's own.
/// 3. Stores the invites in one transaction. Emails that already have an
///    invite or belong to a member are skipped.
/// 4. After the store commits, mails each new invitee an acceptance link.
///    Mail failures are logged and do not fail the action.
///
/// Returns only the invites created by this call.
pub struct InviteTeamMembersAction<S, M>
where
    S: TeamMemberRepository + TeamInviteRepository,
    M: Mailer,
{
    store: S,
    mailer: M,
    urls: UrlConfig,
    token_length: usize,
    #[cfg(feature = "tracing")]
    tracing: Option<TracingConfig>,
}

impl<S, M> InviteTeamMembersAction<S, M>
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
            #[cfg(feature = "tracing")]
            tracing: None,
        }
    }

    #[cfg(feature = "tracing")]
    pub fn with_tracing(mut self) -> Self {
        self.tracing = Some(TracingConfig::new("invite_team_members"));
        self
    }

    #[cfg(feature = "tracing")]
    pub fn with_tracing_config(mut self, config: TracingConfig) -> Self {
        self.tracing = Some(config);
        self
    }

    pub async fn execute(
        &self,
        input: InviteTeamMembersInput,
    ) -> Result<Vec<TeamMemberInvite>, TeamError> {
        #[cfg(feature = "tracing")]
        {
            if let Some(ref config) = self.tracing {
                use tracing::Instrument;
                let span = tracing::info_span!(
                    "action",
                    name = config.span_name,
                    team_id = input.team_id
                );
                let result = self.execute_inner(input).instrument(span).await;
                match &result {
                    Ok(created) => tracing::info!(count = created.len(), "members invited"),
                    Err(e) => tracing::warn!(error = %e, "invite failed"),
                }
                return result;
            }
        }

        self.execute_inner(input).await
    }

    async fn execute_inner(
        &self,
        input: InviteTeamMembersInput,
    ) -> Result<Vec<TeamMemberInvite>, TeamError> {
        validate_invitation_emails(input.invitations.iter().map(|i| i.email.as_str()))
            .into_result()?;

        let context = require_team_action(
            &self.store,
            input.team_id,
            input.actor_id,
            TeamAction::ManageTeam,
        )
        .await?;

        if input
            .invitations
            .iter()
            .any(|i| !is_role_within_hierarchy(context.member.role, i.role))
        {
            return Err(TeamError::Forbidden);
        }

        let mut tokens: HashMap<String, SecretString> = HashMap::new();
        let rows: Vec<CreateTeamMemberInvite> = input
            .invitations
            .into_iter()
            .map(|invitation| {
                let token = generate_token(self.token_length);
                let token_hash = hash_token(&token);
                tokens.insert(token_hash.clone(), SecretString::new(token));

                CreateTeamMemberInvite {
                    email: normalize_email(&invitation.email),
                    role: invitation.role,
                    token_hash,
                }
            })
            .collect();

        let created = self.store.create_invites(input.team_id, rows).await?;

        log::info!(
            target: "covenant",
            "msg=\"members invited\", team_id={}, actor_id={}, created={}",
            input.team_id,
            input.actor_id,
            created.len()
        );

        let mut pending = PendingMail::new();
        for invite in &created {
            let Some(token) = tokens.get(&invite.token_hash) else {
                continue;
            };
            pending.push(TeamMail::TeamMemberInvite {
                to: invite.email.clone(),
                team_name: context.team.name.clone(),
                team_url: context.team.url.clone(),
                role: invite.role,
                link: SecretString::new(self.urls.team_invitation_link(token.expose_secret())),
            });
        }
        pending.dispatch(&self.mailer).await;

        if !created.is_empty() {
            events::dispatch(TeamEvent::MembersInvited {
                team_id: input.team_id,
                actor_id: input.actor_id,
                emails: created.iter().map(|i| i.email.clone()).collect(),
                at: Utc::now(),
            })
            .await;
        }

        Ok(created)
    }
}

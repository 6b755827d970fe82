use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::TeamMemberRole;
use super::types::{
    InviteStatus, MemberContext, Team, TeamEmail, TeamEmailVerification, TeamMember,
    TeamMemberInvite,
};
use crate::TeamError;

#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub name: String,
    pub url: String,
    pub owner_user_id: i64,
}

#[derive(Debug, Clone)]
pub struct CreateTeamMember {
    pub team_id: i64,
    pub user_id: i64,
    pub role: TeamMemberRole,
}

#[derive(Debug, Clone)]
pub struct CreateTeamMemberInvite {
    /// Lowercase email.
    pub email: String,
    pub role: TeamMemberRole,
    pub token_hash: String,
}

#[derive(Debug, Clone)]
pub struct CreateTeamEmailVerification {
    pub team_id: i64,
    pub email: String,
    pub name: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Creates the team and the owner's `Admin` membership together.
    async fn create_team(&self, data: CreateTeam) -> Result<Team, TeamError>;
    async fn find_team_by_id(&self, id: i64) -> Result<Option<Team>, TeamError>;
}

#[async_trait]
pub trait TeamMemberRepository: Send + Sync {
    /// Fails with `Conflict` if the user is already a member.
    async fn create_member(&self, data: CreateTeamMember) -> Result<TeamMember, TeamError>;
    async fn find_member(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<TeamMember>, TeamError>;

    /// Team and membership in one lookup. `None` when either is missing.
    async fn find_member_context(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<MemberContext>, TeamError>;
    async fn list_members(&self, team_id: i64) -> Result<Vec<TeamMember>, TeamError>;
}

#[async_trait]
pub trait TeamInviteRepository: Send + Sync {
    /// Inserts invites in one transaction, skipping any email that already has
    /// an invite or belongs to a member of the team. Returns the inserted rows.
    async fn create_invites(
        &self,
        team_id: i64,
        invites: Vec<CreateTeamMemberInvite>,
    ) -> Result<Vec<TeamMemberInvite>, TeamError>;
    async fn find_invite_by_id(&self, id: i64) -> Result<Option<TeamMemberInvite>, TeamError>;
    async fn find_invite_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<TeamMemberInvite>, TeamError>;
    async fn list_invites(&self, team_id: i64) -> Result<Vec<TeamMemberInvite>, TeamError>;

    /// Swaps the token of a pending invite of `team_id`. `NotFound` otherwise.
    async fn replace_invite_token(
        &self,
        team_id: i64,
        invite_id: i64,
        token_hash: &str,
    ) -> Result<TeamMemberInvite, TeamError>;

    /// Moves a pending invite to `status`. `TokenInvalid` if it is no longer pending.
    async fn set_invite_status(
        &self,
        invite_id: i64,
        status: InviteStatus,
    ) -> Result<TeamMemberInvite, TeamError>;

    /// Deletes a pending invite and makes `user_id` a member in one
    /// transaction. An existing membership is returned unchanged.
    async fn accept_invite_as_member(
        &self,
        invite_id: i64,
        user_id: i64,
    ) -> Result<TeamMember, TeamError>;

    /// Deletes the listed invites that belong to `team_id`. Returns the count.
    async fn delete_invites(&self, team_id: i64, invite_ids: &[i64]) -> Result<u64, TeamError>;
}

/// Pending verifications and confirmed team emails.
///
/// A team has at most one of each. Multi-step operations run in a single
/// transaction.
#[async_trait]
pub trait TeamEmailRepository: Send + Sync {
    /// `Conflict` if the team already has a verification or a confirmed email.
    async fn create_verification(
        &self,
        data: CreateTeamEmailVerification,
    ) -> Result<TeamEmailVerification, TeamError>;

    /// Overwrites the token and expiry. `VerificationNotFound` if none exists.
    async fn replace_verification(
        &self,
        team_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<TeamEmailVerification, TeamError>;

    /// Deletes the verification and creates the team email atomically.
    ///
    /// `TokenInvalid` if no verification has this hash or it expired before
    /// `now`. An expired record is left in place.
    async fn consume_verification(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<TeamEmail, TeamError>;

    async fn find_verification_by_team(
        &self,
        team_id: i64,
    ) -> Result<Option<TeamEmailVerification>, TeamError>;
    async fn find_verification_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<TeamEmailVerification>, TeamError>;
    async fn find_team_email(&self, team_id: i64) -> Result<Option<TeamEmail>, TeamError>;

    /// `NotFound` if the team has no confirmed email.
    async fn update_team_email_name(&self, team_id: i64, name: &str)
    -> Result<TeamEmail, TeamError>;

    async fn delete_verification(&self, team_id: i64) -> Result<(), TeamError>;
    async fn delete_team_email(&self, team_id: i64) -> Result<(), TeamError>;
}

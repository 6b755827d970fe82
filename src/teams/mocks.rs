#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::repository::{
    CreateTeam, CreateTeamEmailVerification, CreateTeamMember, CreateTeamMemberInvite,
    TeamEmailRepository, TeamInviteRepository, TeamMemberRepository, TeamRepository,
};
use super::types::{
    InviteStatus, MemberContext, Team, TeamEmail, TeamEmailVerification, TeamMember,
    TeamMemberInvite,
};
use super::TeamMemberRole;
use crate::TeamError;
use crate::repository::{CreateUser, CreatedUser, User, UserRepository};

#[derive(Default)]
struct Tables {
    teams: HashMap<i64, Team>,
    members: Vec<TeamMember>,
    invites: Vec<TeamMemberInvite>,
    verifications: HashMap<i64, TeamEmailVerification>,
    team_emails: HashMap<i64, TeamEmail>,
    users: Vec<User>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn member_emails(&self, team_id: i64) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| m.team_id == team_id)
            .filter_map(|m| self.users.iter().find(|u| u.id == m.user_id))
            .map(|u| u.email.as_str())
            .collect()
    }

    fn insert_member(&mut self, team_id: i64, user_id: i64, role: TeamMemberRole) -> TeamMember {
        let member = TeamMember {
            id: self.next_id(),
            team_id,
            user_id,
            role,
            created_at: Utc::now(),
        };
        self.members.push(member.clone());
        member
    }

    fn find_member(&self, team_id: i64, user_id: i64) -> Option<&TeamMember> {
        self.members
            .iter()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
    }
}

/// In-memory store implementing every team and user repository.
///
/// All tables sit behind one mutex, so each trait method is atomic.
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct MockTeamStore {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Mutex<HashMap<&'static str, TeamError>>>,
}

impl MockTeamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call to the named trait method fail with `error`.
    pub fn fail_next(&self, operation: &'static str, error: TeamError) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert(operation, error);
        }
    }

    /// Inserts a user without reconciling invites.
    pub fn seed_user(&self, name: &str, email: &str) -> Result<User, TeamError> {
        let mut tables = self.lock()?;
        let user = User {
            id: tables.next_id(),
            name: name.to_owned(),
            email: email.to_lowercase(),
            password_hash: "mock-hash".to_owned(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    /// Creates a user and a team they own as `Admin`.
    pub fn seed_team(&self, url: &str, owner_email: &str) -> Result<(Team, User), TeamError> {
        let owner = self.seed_user("Owner", owner_email)?;
        let mut tables = self.lock()?;
        let team = Team {
            id: tables.next_id(),
            name: url.to_uppercase(),
            url: url.to_owned(),
            owner_user_id: owner.id,
            created_at: Utc::now(),
        };
        tables.teams.insert(team.id, team.clone());
        tables.insert_member(team.id, owner.id, TeamMemberRole::Admin);
        Ok((team, owner))
    }

    /// Creates a user and adds them to `team_id` with `role`.
    pub fn seed_member(
        &self,
        team_id: i64,
        email: &str,
        role: TeamMemberRole,
    ) -> Result<User, TeamError> {
        let user = self.seed_user("Member", email)?;
        self.lock()?.insert_member(team_id, user.id, role);
        Ok(user)
    }

    /// Overwrites the expiry of a team's pending verification.
    pub fn set_verification_expiry(
        &self,
        team_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), TeamError> {
        let mut tables = self.lock()?;
        let verification = tables
            .verifications
            .get_mut(&team_id)
            .ok_or(TeamError::VerificationNotFound)?;
        verification.expires_at = expires_at;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, TeamError> {
        self.tables
            .lock()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))
    }

    fn check_fault(&self, operation: &'static str) -> Result<(), TeamError> {
        let mut faults = self
            .faults
            .lock()
            .map_err(|_| TeamError::Internal("lock poisoned".into()))?;
        match faults.remove(operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TeamRepository for MockTeamStore {
    async fn create_team(&self, data: CreateTeam) -> Result<Team, TeamError> {
        self.check_fault("create_team")?;
        let mut tables = self.lock()?;

        if tables.teams.values().any(|t| t.url == data.url) {
            return Err(TeamError::Conflict("team url is already taken".into()));
        }

        let team = Team {
            id: tables.next_id(),
            name: data.name,
            url: data.url,
            owner_user_id: data.owner_user_id,
            created_at: Utc::now(),
        };
        tables.teams.insert(team.id, team.clone());
        tables.insert_member(team.id, data.owner_user_id, TeamMemberRole::Admin);

        Ok(team)
    }

    async fn find_team_by_id(&self, id: i64) -> Result<Option<Team>, TeamError> {
        Ok(self.lock()?.teams.get(&id).cloned())
    }
}

#[async_trait]
impl TeamMemberRepository for MockTeamStore {
    async fn create_member(&self, data: CreateTeamMember) -> Result<TeamMember, TeamError> {
        self.check_fault("create_member")?;
        let mut tables = self.lock()?;

        if !tables.teams.contains_key(&data.team_id) {
            return Err(TeamError::TeamNotFound);
        }
        if tables.find_member(data.team_id, data.user_id).is_some() {
            return Err(TeamError::Conflict("user is already a member".into()));
        }

        Ok(tables.insert_member(data.team_id, data.user_id, data.role))
    }

    async fn find_member(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<TeamMember>, TeamError> {
        Ok(self.lock()?.find_member(team_id, user_id).cloned())
    }

    async fn find_member_context(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<MemberContext>, TeamError> {
        self.check_fault("find_member_context")?;
        let tables = self.lock()?;

        let context = tables.teams.get(&team_id).and_then(|team| {
            tables.find_member(team_id, user_id).map(|member| MemberContext {
                team: team.clone(),
                member: member.clone(),
            })
        });

        Ok(context)
    }

    async fn list_members(&self, team_id: i64) -> Result<Vec<TeamMember>, TeamError> {
        Ok(self
            .lock()?
            .members
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TeamInviteRepository for MockTeamStore {
    async fn create_invites(
        &self,
        team_id: i64,
        invites: Vec<CreateTeamMemberInvite>,
    ) -> Result<Vec<TeamMemberInvite>, TeamError> {
        self.check_fault("create_invites")?;
        let mut tables = self.lock()?;

        if !tables.teams.contains_key(&team_id) {
            return Err(TeamError::TeamNotFound);
        }

        let member_emails: Vec<String> = tables
            .member_emails(team_id)
            .into_iter()
            .map(str::to_owned)
            .collect();

        let mut created = Vec::new();
        for invite in invites {
            let email = invite.email.to_lowercase();
            let already_invited = tables
                .invites
                .iter()
                .any(|i| i.team_id == team_id && i.email == email);

            if already_invited || member_emails.contains(&email) {
                continue;
            }

            let row = TeamMemberInvite {
                id: tables.next_id(),
                team_id,
                email,
                role: invite.role,
                token_hash: invite.token_hash,
                status: InviteStatus::Pending,
                created_at: Utc::now(),
            };
            tables.invites.push(row.clone());
            created.push(row);
        }

        Ok(created)
    }

    async fn find_invite_by_id(&self, id: i64) -> Result<Option<TeamMemberInvite>, TeamError> {
        Ok(self.lock()?.invites.iter().find(|i| i.id == id).cloned())
    }

    async fn find_invite_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<TeamMemberInvite>, TeamError> {
        Ok(self
            .lock()?
            .invites
            .iter()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn list_invites(&self, team_id: i64) -> Result<Vec<TeamMemberInvite>, TeamError> {
        Ok(self
            .lock()?
            .invites
            .iter()
            .filter(|i| i.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn replace_invite_token(
        &self,
        team_id: i64,
        invite_id: i64,
        token_hash: &str,
    ) -> Result<TeamMemberInvite, TeamError> {
        self.check_fault("replace_invite_token")?;
        let mut tables = self.lock()?;

        let invite = tables
            .invites
            .iter_mut()
            .find(|i| i.id == invite_id && i.team_id == team_id && i.is_pending())
            .ok_or(TeamError::NotFound)?;
        token_hash.clone_into(&mut invite.token_hash);

        Ok(invite.clone())
    }

    async fn set_invite_status(
        &self,
        invite_id: i64,
        status: InviteStatus,
    ) -> Result<TeamMemberInvite, TeamError> {
        self.check_fault("set_invite_status")?;
        let mut tables = self.lock()?;

        let invite = tables
            .invites
            .iter_mut()
            .find(|i| i.id == invite_id && i.is_pending())
            .ok_or(TeamError::TokenInvalid)?;
        invite.status = status;

        Ok(invite.clone())
    }

    async fn accept_invite_as_member(
        &self,
        invite_id: i64,
        user_id: i64,
    ) -> Result<TeamMember, TeamError> {
        self.check_fault("accept_invite_as_member")?;
        let mut tables = self.lock()?;

        let position = tables
            .invites
            .iter()
            .position(|i| i.id == invite_id && i.is_pending())
            .ok_or(TeamError::TokenInvalid)?;
        let invite = tables.invites.remove(position);

        let member = match tables.find_member(invite.team_id, user_id) {
            Some(existing) => existing.clone(),
            None => tables.insert_member(invite.team_id, user_id, invite.role),
        };

        Ok(member)
    }

    async fn delete_invites(&self, team_id: i64, invite_ids: &[i64]) -> Result<u64, TeamError> {
        self.check_fault("delete_invites")?;
        let mut tables = self.lock()?;

        let before = tables.invites.len();
        tables
            .invites
            .retain(|i| !(i.team_id == team_id && invite_ids.contains(&i.id)));

        Ok((before - tables.invites.len()) as u64)
    }
}

#[async_trait]
impl TeamEmailRepository for MockTeamStore {
    async fn create_verification(
        &self,
        data: CreateTeamEmailVerification,
    ) -> Result<TeamEmailVerification, TeamError> {
        self.check_fault("create_verification")?;
        let mut tables = self.lock()?;

        if !tables.teams.contains_key(&data.team_id) {
            return Err(TeamError::TeamNotFound);
        }
        if tables.team_emails.contains_key(&data.team_id) {
            return Err(TeamError::Conflict("team already has an email".into()));
        }
        if tables.verifications.contains_key(&data.team_id) {
            return Err(TeamError::Conflict(
                "team email verification already pending".into(),
            ));
        }
        if tables.team_emails.values().any(|e| e.email == data.email) {
            return Err(TeamError::Conflict(
                "email is already used by another team".into(),
            ));
        }

        let verification = TeamEmailVerification {
            team_id: data.team_id,
            email: data.email,
            name: data.name,
            token_hash: data.token_hash,
            expires_at: data.expires_at,
            created_at: Utc::now(),
        };
        tables
            .verifications
            .insert(verification.team_id, verification.clone());

        Ok(verification)
    }

    async fn replace_verification(
        &self,
        team_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<TeamEmailVerification, TeamError> {
        self.check_fault("replace_verification")?;
        let mut tables = self.lock()?;

        let verification = tables
            .verifications
            .get_mut(&team_id)
            .ok_or(TeamError::VerificationNotFound)?;
        token_hash.clone_into(&mut verification.token_hash);
        verification.expires_at = expires_at;

        Ok(verification.clone())
    }

    async fn consume_verification(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<TeamEmail, TeamError> {
        self.check_fault("consume_verification")?;
        let mut tables = self.lock()?;

        let team_id = tables
            .verifications
            .values()
            .find(|v| v.token_hash == token_hash && !v.is_expired_at(now))
            .map(|v| v.team_id)
            .ok_or(TeamError::TokenInvalid)?;

        if tables.team_emails.contains_key(&team_id) {
            return Err(TeamError::Conflict("team already has an email".into()));
        }

        let taken = tables
            .verifications
            .get(&team_id)
            .is_some_and(|v| tables.team_emails.values().any(|e| e.email == v.email));
        if taken {
            return Err(TeamError::Conflict(
                "email is already used by another team".into(),
            ));
        }

        let verification = tables
            .verifications
            .remove(&team_id)
            .ok_or(TeamError::TokenInvalid)?;
        let team_email = TeamEmail {
            team_id,
            email: verification.email,
            name: verification.name,
            created_at: now,
        };
        tables.team_emails.insert(team_id, team_email.clone());

        Ok(team_email)
    }

    async fn find_verification_by_team(
        &self,
        team_id: i64,
    ) -> Result<Option<TeamEmailVerification>, TeamError> {
        Ok(self.lock()?.verifications.get(&team_id).cloned())
    }

    async fn find_verification_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<TeamEmailVerification>, TeamError> {
        self.check_fault("find_verification_by_token_hash")?;
        Ok(self
            .lock()?
            .verifications
            .values()
            .find(|v| v.token_hash == token_hash)
            .cloned())
    }

    async fn find_team_email(&self, team_id: i64) -> Result<Option<TeamEmail>, TeamError> {
        Ok(self.lock()?.team_emails.get(&team_id).cloned())
    }

    async fn update_team_email_name(
        &self,
        team_id: i64,
        name: &str,
    ) -> Result<TeamEmail, TeamError> {
        self.check_fault("update_team_email_name")?;
        let mut tables = self.lock()?;

        let team_email = tables
            .team_emails
            .get_mut(&team_id)
            .ok_or(TeamError::NotFound)?;
        name.clone_into(&mut team_email.name);

        Ok(team_email.clone())
    }

    async fn delete_verification(&self, team_id: i64) -> Result<(), TeamError> {
        self.check_fault("delete_verification")?;
        self.lock()?.verifications.remove(&team_id);
        Ok(())
    }

    async fn delete_team_email(&self, team_id: i64) -> Result<(), TeamError> {
        self.check_fault("delete_team_email")?;
        self.lock()?.team_emails.remove(&team_id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MockTeamStore {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, TeamError> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, TeamError> {
        let email = email.to_lowercase();
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_user(&self, data: CreateUser) -> Result<CreatedUser, TeamError> {
        self.check_fault("create_user")?;
        let mut tables = self.lock()?;

        let email = data.email.to_lowercase();
        if tables.users.iter().any(|u| u.email == email) {
            return Err(TeamError::UserAlreadyExists);
        }

        let user = User {
            id: tables.next_id(),
            name: data.name,
            email,
            password_hash: data.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());

        let accepted: Vec<TeamMemberInvite> = tables
            .invites
            .iter()
            .filter(|i| i.status == InviteStatus::Accepted && i.email == user.email)
            .cloned()
            .collect();

        let mut memberships = Vec::with_capacity(accepted.len());
        for invite in &accepted {
            if tables.find_member(invite.team_id, user.id).is_none() {
                memberships.push(tables.insert_member(invite.team_id, user.id, invite.role));
            }
        }
        tables
            .invites
            .retain(|i| !accepted.iter().any(|a| a.id == i.id));

        Ok(CreatedUser { user, memberships })
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::team::{MEMBER_COLUMNS, MemberRecord, parse_role};
use super::{PostgresTeamStore, db_error, is_foreign_key_violation, unknown_value};
use crate::TeamError;
use crate::teams::{
    CreateTeamMemberInvite, InviteStatus, TeamInviteRepository, TeamMember, TeamMemberInvite,
};

const INVITE_COLUMNS: &str = "id, team_id, email, role, token_hash, status, created_at";

#[derive(FromRow)]
struct InviteRecord {
    id: i64,
    team_id: i64,
    email: String,
    role: String,
    token_hash: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<InviteRecord> for TeamMemberInvite {
    type Error = TeamError;

    fn try_from(row: InviteRecord) -> Result<Self, Self::Error> {
        let status =
            InviteStatus::parse(&row.status).ok_or_else(|| unknown_value("status", &row.status))?;

        Ok(TeamMemberInvite {
            id: row.id,
            team_id: row.team_id,
            email: row.email,
            role: parse_role(&row.role)?,
            token_hash: row.token_hash,
            status,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl TeamInviteRepository for PostgresTeamStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, invites), err))]
    async fn create_invites(
        &self,
        team_id: i64,
        invites: Vec<CreateTeamMemberInvite>,
    ) -> Result<Vec<TeamMemberInvite>, TeamError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin_create_invites"))?;

        let mut created = Vec::with_capacity(invites.len());
        for invite in invites {
            // existing invites and current members are skipped
            let row: Option<InviteRecord> = sqlx::query_as(&format!(
                r"
                INSERT INTO team_member_invites (team_id, email, role, token_hash)
                SELECT $1, $2, $3, $4
                WHERE NOT EXISTS (
                    SELECT 1 FROM team_members m
                    JOIN users u ON u.id = m.user_id
                    WHERE m.team_id = $1 AND u.email = $2
                )
                ON CONFLICT (team_id, email) DO NOTHING
                RETURNING {INVITE_COLUMNS}
                "
            ))
            .bind(team_id)
            .bind(invite.email.to_lowercase())
            .bind(invite.role.as_str())
            .bind(&invite.token_hash)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    TeamError::TeamNotFound
                } else {
                    db_error("create_invite")(e)
                }
            })?;

            if let Some(row) = row {
                created.push(TeamMemberInvite::try_from(row)?);
            }
        }

        tx.commit().await.map_err(db_error("commit_create_invites"))?;

        Ok(created)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_invite_by_id(&self, id: i64) -> Result<Option<TeamMemberInvite>, TeamError> {
        let row: Option<InviteRecord> = sqlx::query_as(&format!(
            "SELECT {INVITE_COLUMNS} FROM team_member_invites WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_invite_by_id"))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn find_invite_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<TeamMemberInvite>, TeamError> {
        let row: Option<InviteRecord> = sqlx::query_as(&format!(
            "SELECT {INVITE_COLUMNS} FROM team_member_invites WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_invite_by_token_hash"))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list_invites(&self, team_id: i64) -> Result<Vec<TeamMemberInvite>, TeamError> {
        let rows: Vec<InviteRecord> = sqlx::query_as(&format!(
            "SELECT {INVITE_COLUMNS} FROM team_member_invites WHERE team_id = $1 ORDER BY id"
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list_invites"))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token_hash), err))]
    async fn replace_invite_token(
        &self,
        team_id: i64,
        invite_id: i64,
        token_hash: &str,
    ) -> Result<TeamMemberInvite, TeamError> {
        let row: Option<InviteRecord> = sqlx::query_as(&format!(
            r"
            UPDATE team_member_invites SET token_hash = $3
            WHERE id = $2 AND team_id = $1 AND status = 'PENDING'
            RETURNING {INVITE_COLUMNS}
            "
        ))
        .bind(team_id)
        .bind(invite_id)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("replace_invite_token"))?;

        row.ok_or(TeamError::NotFound)?.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn set_invite_status(
        &self,
        invite_id: i64,
        status: InviteStatus,
    ) -> Result<TeamMemberInvite, TeamError> {
        let row: Option<InviteRecord> = sqlx::query_as(&format!(
            r"
            UPDATE team_member_invites SET status = $2
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {INVITE_COLUMNS}
            "
        ))
        .bind(invite_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("set_invite_status"))?;

        row.ok_or(TeamError::TokenInvalid)?.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn accept_invite_as_member(
        &self,
        invite_id: i64,
        user_id: i64,
    ) -> Result<TeamMember, TeamError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin_accept_invite"))?;

        let invite: InviteRecord = sqlx::query_as(&format!(
            "DELETE FROM team_member_invites WHERE id = $1 AND status = 'PENDING' RETURNING {INVITE_COLUMNS}"
        ))
        .bind(invite_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("delete_accepted_invite"))?
        .ok_or(TeamError::TokenInvalid)?;

        let inserted: Option<MemberRecord> = sqlx::query_as(&format!(
            r"
            INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, $3)
            ON CONFLICT (team_id, user_id) DO NOTHING
            RETURNING {MEMBER_COLUMNS}
            "
        ))
        .bind(invite.team_id)
        .bind(user_id)
        .bind(&invite.role)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("create_member_from_invite"))?;

        let member = match inserted {
            Some(row) => row,
            None => sqlx::query_as(&format!(
                "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = $1 AND user_id = $2"
            ))
            .bind(invite.team_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("find_existing_member"))?,
        };

        tx.commit().await.map_err(db_error("commit_accept_invite"))?;

        member.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_invites(&self, team_id: i64, invite_ids: &[i64]) -> Result<u64, TeamError> {
        let result = sqlx::query("DELETE FROM team_member_invites WHERE team_id = $1 AND id = ANY($2)")
            .bind(team_id)
            .bind(invite_ids)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete_invites"))?;

        Ok(result.rows_affected())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{
    PostgresTeamStore, db_error, is_foreign_key_violation, is_unique_violation, unknown_value,
};
use crate::TeamError;
use crate::teams::{
    CreateTeam, CreateTeamMember, MemberContext, Team, TeamMember, TeamMemberRepository,
    TeamMemberRole, TeamRepository,
};

#[derive(FromRow)]
struct TeamRecord {
    id: i64,
    name: String,
    url: String,
    owner_user_id: i64,
    created_at: DateTime<Utc>,
}

impl From<TeamRecord> for Team {
    fn from(row: TeamRecord) -> Self {
        Team {
            id: row.id,
            name: row.name,
            url: row.url,
            owner_user_id: row.owner_user_id,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
pub(super) struct MemberRecord {
    id: i64,
    team_id: i64,
    user_id: i64,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MemberRecord> for TeamMember {
    type Error = TeamError;

    fn try_from(row: MemberRecord) -> Result<Self, Self::Error> {
        Ok(TeamMember {
            id: row.id,
            team_id: row.team_id,
            user_id: row.user_id,
            role: parse_role(&row.role)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct MemberContextRecord {
    team_id: i64,
    team_name: String,
    team_url: String,
    owner_user_id: i64,
    team_created_at: DateTime<Utc>,
    member_id: i64,
    user_id: i64,
    role: String,
    member_created_at: DateTime<Utc>,
}

pub(super) fn parse_role(role: &str) -> Result<TeamMemberRole, TeamError> {
    role.parse().map_err(|_| unknown_value("role", role))
}

pub(super) const MEMBER_COLUMNS: &str = "id, team_id, user_id, role, created_at";

#[async_trait]
impl TeamRepository for PostgresTeamStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create_team(&self, data: CreateTeam) -> Result<Team, TeamError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin_create_team"))?;

        let team: TeamRecord = sqlx::query_as(
            r"
            INSERT INTO teams (name, url, owner_user_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, url, owner_user_id, created_at
            ",
        )
        .bind(&data.name)
        .bind(&data.url)
        .bind(data.owner_user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TeamError::Conflict("team url is already taken".into())
            } else {
                db_error("create_team")(e)
            }
        })?;

        sqlx::query("INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(team.id)
            .bind(data.owner_user_id)
            .bind(TeamMemberRole::Admin.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error("create_team_owner_member"))?;

        tx.commit().await.map_err(db_error("commit_create_team"))?;

        Ok(team.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_team_by_id(&self, id: i64) -> Result<Option<Team>, TeamError> {
        let row: Option<TeamRecord> = sqlx::query_as(
            "SELECT id, name, url, owner_user_id, created_at FROM teams WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_team_by_id"))?;

        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl TeamMemberRepository for PostgresTeamStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create_member(&self, data: CreateTeamMember) -> Result<TeamMember, TeamError> {
        let row: MemberRecord = sqlx::query_as(&format!(
            "INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, $3) RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(data.team_id)
        .bind(data.user_id)
        .bind(data.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TeamError::Conflict("user is already a member".into())
            } else if is_foreign_key_violation(&e) {
                TeamError::TeamNotFound
            } else {
                db_error("create_member")(e)
            }
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_member(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<TeamMember>, TeamError> {
        let row: Option<MemberRecord> = sqlx::query_as(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = $1 AND user_id = $2"
        ))
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_member"))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_member_context(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<MemberContext>, TeamError> {
        let row: Option<MemberContextRecord> = sqlx::query_as(
            r"
            SELECT t.id AS team_id, t.name AS team_name, t.url AS team_url,
                   t.owner_user_id, t.created_at AS team_created_at,
                   m.id AS member_id, m.user_id, m.role, m.created_at AS member_created_at
            FROM teams t
            JOIN team_members m ON m.team_id = t.id
            WHERE t.id = $1 AND m.user_id = $2
            ",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_member_context"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(MemberContext {
            member: TeamMember {
                id: row.member_id,
                team_id: row.team_id,
                user_id: row.user_id,
                role: parse_role(&row.role)?,
                created_at: row.member_created_at,
            },
            team: Team {
                id: row.team_id,
                name: row.team_name,
                url: row.team_url,
                owner_user_id: row.owner_user_id,
                created_at: row.team_created_at,
            },
        }))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list_members(&self, team_id: i64) -> Result<Vec<TeamMember>, TeamError> {
        let rows: Vec<MemberRecord> = sqlx::query_as(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = $1 ORDER BY id"
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list_members"))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

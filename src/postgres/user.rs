use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::team::{MEMBER_COLUMNS, MemberRecord};
use super::{PostgresTeamStore, db_error, is_unique_violation};
use crate::TeamError;
use crate::repository::{CreateUser, CreatedUser, User, UserRepository};
use crate::teams::TeamMember;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(row: UserRecord) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UserRepository for PostgresTeamStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, TeamError> {
        let row: Option<UserRecord> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("find_user_by_id"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, TeamError> {
        let row: Option<UserRecord> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email.to_lowercase())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("find_user_by_email"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn create_user(&self, data: CreateUser) -> Result<CreatedUser, TeamError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin_create_user"))?;

        let user: UserRecord = sqlx::query_as(&format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(&data.name)
        .bind(data.email.to_lowercase())
        .bind(&data.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TeamError::UserAlreadyExists
            } else {
                db_error("create_user")(e)
            }
        })?;

        let accepted: Vec<(i64, String)> = sqlx::query_as(
            r"
            DELETE FROM team_member_invites
            WHERE email = $1 AND status = 'ACCEPTED'
            RETURNING team_id, role
            ",
        )
        .bind(&user.email)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("delete_accepted_invites"))?;

        let mut memberships = Vec::with_capacity(accepted.len());
        for (team_id, role) in accepted {
            let row: Option<MemberRecord> = sqlx::query_as(&format!(
                r"
                INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, $3)
                ON CONFLICT (team_id, user_id) DO NOTHING
                RETURNING {MEMBER_COLUMNS}
                "
            ))
            .bind(team_id)
            .bind(user.id)
            .bind(&role)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("create_member_from_accepted_invite"))?;

            if let Some(row) = row {
                memberships.push(TeamMember::try_from(row)?);
            }
        }

        tx.commit().await.map_err(db_error("commit_create_user"))?;

        Ok(CreatedUser {
            user: user.into(),
            memberships,
        })
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{PostgresTeamStore, db_error, is_unique_violation};
use crate::TeamError;
use crate::teams::{
    CreateTeamEmailVerification, TeamEmail, TeamEmailRepository, TeamEmailVerification,
};

const VERIFICATION_COLUMNS: &str = "team_id, email, name, token_hash, expires_at, created_at";
const TEAM_EMAIL_COLUMNS: &str = "team_id, email, name, created_at";

#[derive(FromRow)]
struct VerificationRecord {
    team_id: i64,
    email: String,
    name: String,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<VerificationRecord> for TeamEmailVerification {
    fn from(row: VerificationRecord) -> Self {
        TeamEmailVerification {
            team_id: row.team_id,
            email: row.email,
            name: row.name,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct TeamEmailRecord {
    team_id: i64,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<TeamEmailRecord> for TeamEmail {
    fn from(row: TeamEmailRecord) -> Self {
        TeamEmail {
            team_id: row.team_id,
            email: row.email,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

fn email_conflict(e: sqlx::Error, operation: &'static str) -> TeamError {
    if is_unique_violation(&e) {
        TeamError::Conflict("team email already exists or is pending".into())
    } else {
        db_error(operation)(e)
    }
}

/// Locks the team row so concurrent adds and consumes for one team serialize.
async fn lock_team(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    team_id: i64,
) -> Result<bool, TeamError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM teams WHERE id = $1 FOR UPDATE")
        .bind(team_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("lock_team"))?;

    Ok(row.is_some())
}

#[async_trait]
impl TeamEmailRepository for PostgresTeamStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(team_id = data.team_id), err))]
    async fn create_verification(
        &self,
        data: CreateTeamEmailVerification,
    ) -> Result<TeamEmailVerification, TeamError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin_create_verification"))?;

        if !lock_team(&mut tx, data.team_id).await? {
            return Err(TeamError::TeamNotFound);
        }

        let (email_taken,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM team_emails WHERE team_id = $1 OR email = $2)",
        )
        .bind(data.team_id)
        .bind(&data.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("check_team_email"))?;

        if email_taken {
            return Err(TeamError::Conflict(
                "team already has an email or the email is in use".into(),
            ));
        }

        let row: VerificationRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO team_email_verifications (team_id, email, name, token_hash, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {VERIFICATION_COLUMNS}
            "
        ))
        .bind(data.team_id)
        .bind(&data.email)
        .bind(&data.name)
        .bind(&data.token_hash)
        .bind(data.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| email_conflict(e, "create_verification"))?;

        tx.commit()
            .await
            .map_err(db_error("commit_create_verification"))?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token_hash), err))]
    async fn replace_verification(
        &self,
        team_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<TeamEmailVerification, TeamError> {
        let row: Option<VerificationRecord> = sqlx::query_as(&format!(
            r"
            UPDATE team_email_verifications SET token_hash = $2, expires_at = $3
            WHERE team_id = $1
            RETURNING {VERIFICATION_COLUMNS}
            "
        ))
        .bind(team_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("replace_verification"))?;

        row.map(Into::into).ok_or(TeamError::VerificationNotFound)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token_hash), err))]
    async fn consume_verification(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<TeamEmail, TeamError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin_consume_verification"))?;

        let team_id: Option<(i64,)> =
            sqlx::query_as("SELECT team_id FROM team_email_verifications WHERE token_hash = $1")
                .bind(token_hash)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("find_verification_for_consume"))?;
        let Some((team_id,)) = team_id else {
            return Err(TeamError::TokenInvalid);
        };

        lock_team(&mut tx, team_id).await?;

        // expired rows do not match and stay in place
        let verification: VerificationRecord = sqlx::query_as(&format!(
            r"
            DELETE FROM team_email_verifications
            WHERE token_hash = $1 AND expires_at >= $2
            RETURNING {VERIFICATION_COLUMNS}
            "
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("delete_verification_for_consume"))?
        .ok_or(TeamError::TokenInvalid)?;

        let team_email: TeamEmailRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO team_emails (team_id, email, name, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {TEAM_EMAIL_COLUMNS}
            "
        ))
        .bind(verification.team_id)
        .bind(&verification.email)
        .bind(&verification.name)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| email_conflict(e, "create_team_email"))?;

        tx.commit()
            .await
            .map_err(db_error("commit_consume_verification"))?;

        Ok(team_email.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_verification_by_team(
        &self,
        team_id: i64,
    ) -> Result<Option<TeamEmailVerification>, TeamError> {
        let row: Option<VerificationRecord> = sqlx::query_as(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM team_email_verifications WHERE team_id = $1"
        ))
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_verification_by_team"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn find_verification_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<TeamEmailVerification>, TeamError> {
        let row: Option<VerificationRecord> = sqlx::query_as(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM team_email_verifications WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_verification_by_token_hash"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_team_email(&self, team_id: i64) -> Result<Option<TeamEmail>, TeamError> {
        let row: Option<TeamEmailRecord> = sqlx::query_as(&format!(
            "SELECT {TEAM_EMAIL_COLUMNS} FROM team_emails WHERE team_id = $1"
        ))
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_team_email"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_team_email_name(
        &self,
        team_id: i64,
        name: &str,
    ) -> Result<TeamEmail, TeamError> {
        let row: Option<TeamEmailRecord> = sqlx::query_as(&format!(
            "UPDATE team_emails SET name = $2 WHERE team_id = $1 RETURNING {TEAM_EMAIL_COLUMNS}"
        ))
        .bind(team_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update_team_email_name"))?;

        row.map(Into::into).ok_or(TeamError::NotFound)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_verification(&self, team_id: i64) -> Result<(), TeamError> {
        sqlx::query("DELETE FROM team_email_verifications WHERE team_id = $1")
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete_verification"))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_team_email(&self, team_id: i64) -> Result<(), TeamError> {
        sqlx::query("DELETE FROM team_emails WHERE team_id = $1")
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete_team_email"))?;

        Ok(())
    }
}

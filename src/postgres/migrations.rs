//! Embedded schema migrations.
//!
//! ```rust,ignore
//! use covenant::postgres::migrations;
//!
//! migrations::run(&pool).await?;
//! ```

use sqlx::PgPool;

/// Creates `users`, `teams`, `team_members`, `team_member_invites`,
/// `team_email_verifications` and `team_emails`.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

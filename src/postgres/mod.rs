//! `PostgreSQL` storage.
//!
//! [`PostgresTeamStore`] implements every team and user repository over one
//! pool. Operations that touch several tables open a transaction with
//! `pool.begin()`; returning early drops the transaction and rolls it back.

mod invitation;
pub mod migrations;
mod team;
mod team_email;
mod user;

use sqlx::PgPool;

use crate::TeamError;

#[derive(Clone)]
pub struct PostgresTeamStore {
    pool: PgPool,
}

impl PostgresTeamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Logs a failed statement and wraps it as a transient error.
fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> TeamError {
    move |e| {
        log::error!(
            target: "covenant",
            "msg=\"database error\", operation=\"{operation}\", error=\"{e}\""
        );
        TeamError::DatabaseError(e.to_string())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn unknown_value(column: &str, value: &str) -> TeamError {
    log::error!(
        target: "covenant",
        "msg=\"unexpected column value\", column={column}, value=\"{value}\""
    );
    TeamError::Internal(format!("unexpected {column}: {value}"))
}

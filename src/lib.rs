//! Team invitations and team email verification.
//!
//! `covenant` implements the lifecycle around a team's membership and its
//! external email address:
//!
//! - a closed role/action permission table ([`teams::can_execute_team_action`])
//! - single-use expiring tokens, stored only as SHA-256 hashes
//! - member invitations with acceptance, decline and reconciliation at sign-up
//! - adding, resending, confirming and removing a team email
//!
//! Storage is abstracted behind the repository traits in [`teams`] and
//! [`repository`]. Enable `sqlx_postgres` for [`postgres::PostgresTeamStore`],
//! `axum_api` for the HTTP routes and `mocks` for in-memory test doubles.

pub mod actions;
pub mod config;
pub mod crypto;
pub mod events;
pub mod notifications;
pub mod repository;
pub mod teams;
pub mod validators;

mod error;
mod secret;
mod tracing_config;

#[cfg(feature = "sqlx_postgres")]
pub mod postgres;

#[cfg(feature = "axum_api")]
pub mod api;

pub use config::CovenantConfig;
pub use error::TeamError;
pub use events::register_event_listeners;
pub use secret::SecretString;
pub use tracing_config::TracingConfig;

pub use repository::{CreateUser, CreatedUser, User, UserRepository};
pub use teams::{
    TeamEmailRepository, TeamInviteRepository, TeamMemberRepository, TeamRepository,
};

#[cfg(any(test, feature = "mocks"))]
pub use notifications::MockMailer;
#[cfg(any(test, feature = "mocks"))]
pub use teams::MockTeamStore;

use axum::Router;
use axum::routing::{get, post};

use super::handlers;
use super::middleware::SessionResolver;
use crate::CovenantConfig;
use crate::notifications::Mailer;
use crate::repository::UserRepository;
use crate::teams::{TeamEmailRepository, TeamInviteRepository, TeamMemberRepository, TeamRepository};

/// Every repository the team routes use, implemented by one store.
pub trait TeamStore:
    TeamRepository
    + TeamMemberRepository
    + TeamInviteRepository
    + TeamEmailRepository
    + UserRepository
    + Clone
    + 'static
{
}

impl<T> TeamStore for T where
    T: TeamRepository
        + TeamMemberRepository
        + TeamInviteRepository
        + TeamEmailRepository
        + UserRepository
        + Clone
        + 'static
{
}

#[derive(Clone)]
pub struct AppState<S, M, R> {
    pub store: S,
    pub mailer: M,
    pub sessions: R,
    pub config: CovenantConfig,
}

impl<S, M, R> AppState<S, M, R> {
    pub fn new(store: S, mailer: M, sessions: R, config: CovenantConfig) -> Self {
        Self {
            store,
            mailer,
            sessions,
            config,
        }
    }
}

/// Authenticated team management operations under `/team`.
pub fn team_routes<S, M, R>() -> Router<AppState<S, M, R>>
where
    S: TeamStore,
    M: Mailer + Clone + 'static,
    R: SessionResolver + Clone + 'static,
{
    Router::new()
        .route(
            "/team/inviteTeamMembers",
            post(handlers::invite_team_members::<S, M, R>),
        )
        .route(
            "/team/resendTeamMemberInvitation",
            post(handlers::resend_team_member_invitation::<S, M, R>),
        )
        .route(
            "/team/deleteTeamMemberInvitations",
            post(handlers::delete_team_member_invitations::<S, M, R>),
        )
        .route(
            "/team/addTeamEmailVerification",
            post(handlers::add_team_email_verification::<S, M, R>),
        )
        .route(
            "/team/resendTeamEmailVerification",
            post(handlers::resend_team_email_verification::<S, M, R>),
        )
        .route(
            "/team/updateTeamEmail",
            post(handlers::update_team_email::<S, M, R>),
        )
        .route(
            "/team/deleteTeamEmail",
            post(handlers::delete_team_email::<S, M, R>),
        )
        .route(
            "/team/deleteTeamEmailVerification",
            post(handlers::delete_team_email_verification::<S, M, R>),
        )
}

/// Token-authenticated invitation responses. No session required.
pub fn invitation_routes<S, M, R>() -> Router<AppState<S, M, R>>
where
    S: TeamStore,
    M: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/team/invite/accept",
            post(handlers::accept_invitation::<S, M, R>),
        )
        .route(
            "/team/invite/decline",
            post(handlers::decline_invitation::<S, M, R>),
        )
}

/// The page opened from a team email verification link.
pub fn verification_routes<S, M, R>() -> Router<AppState<S, M, R>>
where
    S: TeamStore,
    M: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/verify/team/email/{token}",
        get(handlers::verify_team_email::<S, M, R>),
    )
}

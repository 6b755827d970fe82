//! HTTP handlers for the team routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};

use super::error::AppError;
use super::middleware::{AuthenticatedActor, SessionResolver};
use super::routes::{AppState, TeamStore};
use crate::api::{
    AcceptInvitationResponse, AddTeamEmailVerificationRequest, DeleteTeamMemberInvitationsRequest,
    DeletedResponse, InvitationResponse, InvitationTokenRequest, InviteTeamMembersRequest,
    MessageResponse, ResendTeamMemberInvitationRequest, TeamEmailResponse,
    TeamEmailVerificationResponse, TeamIdRequest, UpdateTeamEmailRequest,
};
use crate::notifications::Mailer;
use crate::teams::{
    AcceptInvitationOutcome, AcceptTeamInvitationAction, AddTeamEmailVerificationAction,
    AddTeamEmailVerificationInput, DeclineTeamInvitationAction, DeleteTeamEmailAction,
    DeleteTeamEmailVerificationAction, DeleteTeamMemberInvitationsAction, InvitationRequest,
    InviteTeamMembersAction, InviteTeamMembersInput, ResendTeamEmailVerificationAction,
    ResendTeamMemberInvitationAction, UpdateTeamEmailAction, VerifyTeamEmailAction,
    VerifyTeamEmailOutcome,
};
use crate::SecretString;

/// Invite a batch of emails to a team.
///
/// POST /team/inviteTeamMembers
pub async fn invite_team_members<S, M, R>(
    State(state): State<AppState<S, M, R>>,
    actor: AuthenticatedActor,
    Json(body): Json<InviteTeamMembersRequest>,
) -> Result<impl IntoResponse, AppError>
where
    S: TeamStore,
    M: Mailer + Clone + 'static,
    R: SessionResolver + Clone + 'static,
{
    let action = InviteTeamMembersAction::with_config(state.store, state.mailer, &state.config);
    let input = InviteTeamMembersInput {
        team_id: body.team_id,
        actor_id: actor.id(),
        invitations: body
            .invitations
            .into_iter()
            .map(|item| InvitationRequest {
                email: item.email,
                role: item.role,
            })
            .collect(),
    };

    let invites = action.execute(input).await?;
    let invites: Vec<InvitationResponse> = invites.into_iter().map(Into::into).collect();

    Ok((StatusCode::CREATED, Json(invites)))
}

/// POST /team/resendTeamMemberInvitation
pub async fn resend_team_member_invitation<S, M, R>(
    State(state): State<AppState<S, M, R>>,
    actor: AuthenticatedActor,
    Json(body): Json<ResendTeamMemberInvitationRequest>,
) -> Result<Json<InvitationResponse>, AppError>
where
    S: TeamStore,
    M: Mailer + Clone + 'static,
    R: SessionResolver + Clone + 'static,
{
    let action =
        ResendTeamMemberInvitationAction::with_config(state.store, state.mailer, &state.config);
    let invite = action
        .execute(actor.id(), body.team_id, body.invitation_id)
        .await?;

    Ok(Json(invite.into()))
}

/// POST /team/deleteTeamMemberInvitations
pub async fn delete_team_member_invitations<S, M, R>(
    State(state): State<AppState<S, M, R>>,
    actor: AuthenticatedActor,
    Json(body): Json<DeleteTeamMemberInvitationsRequest>,
) -> Result<Json<DeletedResponse>, AppError>
where
    S: TeamStore,
    M: Clone + Send + Sync + 'static,
    R: SessionResolver + Clone + 'static,
{
    let action = DeleteTeamMemberInvitationsAction::new(state.store);
    let deleted = action
        .execute(actor.id(), body.team_id, &body.invitation_ids)
        .await?;

    Ok(Json(DeletedResponse { deleted }))
}

/// Start verification of a team email. Conflicts while one is pending.
///
/// POST /team/addTeamEmailVerification
pub async fn add_team_email_verification<S, M, R>(
    State(state): State<AppState<S, M, R>>,
    actor: AuthenticatedActor,
    Json(body): Json<AddTeamEmailVerificationRequest>,
) -> Result<impl IntoResponse, AppError>
where
    S: TeamStore,
    M: Mailer + Clone + 'static,
    R: SessionResolver + Clone + 'static,
{
    let action =
        AddTeamEmailVerificationAction::with_config(state.store, state.mailer, &state.config);
    let verification = action
        .execute(AddTeamEmailVerificationInput {
            team_id: body.team_id,
            actor_id: actor.id(),
            name: body.name,
            email: body.email,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TeamEmailVerificationResponse::from(verification)),
    ))
}

/// POST /team/resendTeamEmailVerification
pub async fn resend_team_email_verification<S, M, R>(
    State(state): State<AppState<S, M, R>>,
    actor: AuthenticatedActor,
    Json(body): Json<TeamIdRequest>,
) -> Result<Json<TeamEmailVerificationResponse>, AppError>
where
    S: TeamStore,
    M: Mailer + Clone + 'static,
    R: SessionResolver + Clone + 'static,
{
    let action =
        ResendTeamEmailVerificationAction::with_config(state.store, state.mailer, &state.config);
    let verification = action.execute(actor.id(), body.team_id).await?;

    Ok(Json(verification.into()))
}

/// Rename the confirmed team email.
///
/// POST /team/updateTeamEmail
pub async fn update_team_email<S, M, R>(
    State(state): State<AppState<S, M, R>>,
    actor: AuthenticatedActor,
    Json(body): Json<UpdateTeamEmailRequest>,
) -> Result<Json<TeamEmailResponse>, AppError>
where
    S: TeamStore,
    M: Clone + Send + Sync + 'static,
    R: SessionResolver + Clone + 'static,
{
    let action = UpdateTeamEmailAction::new(state.store);
    let email = action
        .execute(actor.id(), body.team_id, &body.data.name)
        .await?;

    Ok(Json(email.into()))
}

/// POST /team/deleteTeamEmail
pub async fn delete_team_email<S, M, R>(
    State(state): State<AppState<S, M, R>>,
    actor: AuthenticatedActor,
    Json(body): Json<TeamIdRequest>,
) -> Result<Json<MessageResponse>, AppError>
where
    S: TeamStore,
    M: Clone + Send + Sync + 'static,
    R: SessionResolver + Clone + 'static,
{
    DeleteTeamEmailAction::new(state.store)
        .execute(actor.id(), body.team_id)
        .await?;

    Ok(Json(MessageResponse {
        message: "team email removed".to_owned(),
    }))
}

/// POST /team/deleteTeamEmailVerification
pub async fn delete_team_email_verification<S, M, R>(
    State(state): State<AppState<S, M, R>>,
    actor: AuthenticatedActor,
    Json(body): Json<TeamIdRequest>,
) -> Result<Json<MessageResponse>, AppError>
where
    S: TeamStore,
    M: Clone + Send + Sync + 'static,
    R: SessionResolver + Clone + 'static,
{
    DeleteTeamEmailVerificationAction::new(state.store)
        .execute(actor.id(), body.team_id)
        .await?;

    Ok(Json(MessageResponse {
        message: "team email verification cancelled".to_owned(),
    }))
}

/// POST /team/invite/accept
pub async fn accept_invitation<S, M, R>(
    State(state): State<AppState<S, M, R>>,
    Json(body): Json<InvitationTokenRequest>,
) -> Result<Json<AcceptInvitationResponse>, AppError>
where
    S: TeamStore,
    M: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    let token = SecretString::new(body.token);
    let outcome = AcceptTeamInvitationAction::new(state.store)
        .execute(&token)
        .await?;

    let response = match outcome {
        AcceptInvitationOutcome::Joined(member) => AcceptInvitationResponse::Joined {
            member: member.into(),
        },
        AcceptInvitationOutcome::AwaitingAccount(invite) => {
            AcceptInvitationResponse::AwaitingAccount {
                invitation: invite.into(),
            }
        }
    };

    Ok(Json(response))
}

/// POST /team/invite/decline
pub async fn decline_invitation<S, M, R>(
    State(state): State<AppState<S, M, R>>,
    Json(body): Json<InvitationTokenRequest>,
) -> Result<Json<InvitationResponse>, AppError>
where
    S: TeamStore,
    M: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    let token = SecretString::new(body.token);
    let invite = DeclineTeamInvitationAction::new(state.store)
        .execute(&token)
        .await?;

    Ok(Json(invite.into()))
}

/// The page behind a team email verification link.
///
/// GET /verify/team/email/{token}
///
/// - 200: the email is now the team's email
/// - 409: another team already uses the address
/// - 410: unknown, used, superseded or expired link
/// - 503: the store failed; the same link can be retried
pub async fn verify_team_email<S, M, R>(
    State(state): State<AppState<S, M, R>>,
    Path(token): Path<String>,
) -> impl IntoResponse
where
    S: TeamStore,
    M: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    let outcome = VerifyTeamEmailAction::new(state.store)
        .execute(&token)
        .await;

    match outcome {
        VerifyTeamEmailOutcome::Verified { team, team_email } => (
            StatusCode::OK,
            Html(render_page(
                "Email verified",
                &format!(
                    "{} is now the email address of {}.",
                    escape_html(&team_email.email),
                    escape_html(&team.name)
                ),
            )),
        ),
        VerifyTeamEmailOutcome::InvalidOrExpired => (
            StatusCode::GONE,
            Html(render_page(
                "Link invalid or expired",
                "This verification link is no longer valid. Ask a team admin to send a new one.",
            )),
        ),
        VerifyTeamEmailOutcome::EmailTaken { team } => (
            StatusCode::CONFLICT,
            Html(render_page(
                "Email already in use",
                &format!(
                    "This address is already the email of another team, so it cannot be used for {}.",
                    escape_html(&team.name)
                ),
            )),
        ),
        VerifyTeamEmailOutcome::Failed { team } => {
            let body = match team {
                Some(team) => format!(
                    "We could not verify the email for {} right now. Please try the link again.",
                    escape_html(&team.name)
                ),
                None => "We could not verify this email right now. Please try the link again."
                    .to_owned(),
            };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Html(render_page("Verification failed", &body)),
            )
        }
    }
}

fn render_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body><h1>{title}</h1><p>{body}</p></body>\n</html>\n"
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

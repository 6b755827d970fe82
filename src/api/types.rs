use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TeamError;
use crate::teams::{
    InviteStatus, TeamEmail, TeamEmailVerification, TeamMember, TeamMemberInvite, TeamMemberRole,
};

// Request DTOs

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationItem {
    pub email: String,
    pub role: TeamMemberRole,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteTeamMembersRequest {
    pub team_id: i64,
    pub invitations: Vec<InvitationItem>,
}

/// Body of every operation that only names a team.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamIdRequest {
    pub team_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTeamEmailVerificationRequest {
    pub team_id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTeamEmailData {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamEmailRequest {
    pub team_id: i64,
    pub data: UpdateTeamEmailData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendTeamMemberInvitationRequest {
    pub team_id: i64,
    pub invitation_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTeamMemberInvitationsRequest {
    pub team_id: i64,
    pub invitation_ids: Vec<i64>,
}

#[derive(Deserialize)]
pub struct InvitationTokenRequest {
    pub token: String,
}

impl std::fmt::Debug for InvitationTokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvitationTokenRequest")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

// Response DTOs

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub id: i64,
    pub team_id: i64,
    pub email: String,
    pub role: TeamMemberRole,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberResponse {
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub role: TeamMemberRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamEmailVerificationResponse {
    pub team_id: i64,
    pub name: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamEmailResponse {
    pub team_id: i64,
    pub name: String,
    pub email: String,
}

/// Result of accepting an invitation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum AcceptInvitationResponse {
    /// The invitee is now a member.
    Joined { member: TeamMemberResponse },
    /// The membership is created once the invitee signs up.
    AwaitingAccount { invitation: InvitationResponse },
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FieldErrorResponse {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldErrorResponse>,
}

impl From<TeamMemberInvite> for InvitationResponse {
    fn from(invite: TeamMemberInvite) -> Self {
        InvitationResponse {
            id: invite.id,
            team_id: invite.team_id,
            email: invite.email,
            role: invite.role,
            status: invite.status,
            created_at: invite.created_at,
        }
    }
}

impl From<TeamMember> for TeamMemberResponse {
    fn from(member: TeamMember) -> Self {
        TeamMemberResponse {
            id: member.id,
            team_id: member.team_id,
            user_id: member.user_id,
            role: member.role,
            created_at: member.created_at,
        }
    }
}

impl From<TeamEmailVerification> for TeamEmailVerificationResponse {
    fn from(v: TeamEmailVerification) -> Self {
        TeamEmailVerificationResponse {
            team_id: v.team_id,
            name: v.name,
            email: v.email,
            expires_at: v.expires_at,
        }
    }
}

impl From<TeamEmail> for TeamEmailResponse {
    fn from(email: TeamEmail) -> Self {
        TeamEmailResponse {
            team_id: email.team_id,
            name: email.name,
            email: email.email,
        }
    }
}

impl From<TeamError> for ErrorResponse {
    fn from(err: TeamError) -> Self {
        let fields = match &err {
            TeamError::Validation(errors) => errors
                .errors()
                .iter()
                .map(|e| FieldErrorResponse {
                    field: e.field.clone(),
                    message: e.error.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        };

        // store details stay in the logs
        let error = match &err {
            TeamError::DatabaseError(_) | TeamError::Internal(_) | TeamError::Notification(_) => {
                "Service temporarily unavailable".to_owned()
            }
            other => other.to_string(),
        };

        ErrorResponse {
            error,
            code: err.code().to_owned(),
            fields,
        }
    }
}

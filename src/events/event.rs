use chrono::{DateTime, Utc};

/// Events emitted by team actions.
#[derive(Debug, Clone)]
pub enum TeamEvent {
    // invitations
    MembersInvited {
        team_id: i64,
        actor_id: i64,
        emails: Vec<String>,
        at: DateTime<Utc>,
    },
    InvitationResent {
        team_id: i64,
        invite_id: i64,
        at: DateTime<Utc>,
    },
    InvitationsDeleted {
        team_id: i64,
        count: u64,
        at: DateTime<Utc>,
    },
    InvitationAccepted {
        team_id: i64,
        email: String,
        user_id: Option<i64>,
        at: DateTime<Utc>,
    },
    InvitationDeclined {
        team_id: i64,
        email: String,
        at: DateTime<Utc>,
    },

    // team email
    TeamEmailVerificationRequested {
        team_id: i64,
        email: String,
        at: DateTime<Utc>,
    },
    TeamEmailVerificationResent {
        team_id: i64,
        email: String,
        at: DateTime<Utc>,
    },
    TeamEmailVerified {
        team_id: i64,
        email: String,
        at: DateTime<Utc>,
    },
    TeamEmailVerificationDeleted {
        team_id: i64,
        at: DateTime<Utc>,
    },
    TeamEmailRemoved {
        team_id: i64,
        at: DateTime<Utc>,
    },

    // accounts
    UserCreated {
        user_id: i64,
        email: String,
        joined_teams: Vec<i64>,
        at: DateTime<Utc>,
    },
}

impl TeamEvent {
    /// Dot-separated event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MembersInvited { .. } => "team.members.invited",
            Self::InvitationResent { .. } => "team.invitation.resent",
            Self::InvitationsDeleted { .. } => "team.invitation.deleted",
            Self::InvitationAccepted { .. } => "team.invitation.accepted",
            Self::InvitationDeclined { .. } => "team.invitation.declined",
            Self::TeamEmailVerificationRequested { .. } => "team.email.verification_requested",
            Self::TeamEmailVerificationResent { .. } => "team.email.verification_resent",
            Self::TeamEmailVerified { .. } => "team.email.verified",
            Self::TeamEmailVerificationDeleted { .. } => "team.email.verification_deleted",
            Self::TeamEmailRemoved { .. } => "team.email.removed",
            Self::UserCreated { .. } => "user.created",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MembersInvited { at, .. }
            | Self::InvitationResent { at, .. }
            | Self::InvitationsDeleted { at, .. }
            | Self::InvitationAccepted { at, .. }
            | Self::InvitationDeclined { at, .. }
            | Self::TeamEmailVerificationRequested { at, .. }
            | Self::TeamEmailVerificationResent { at, .. }
            | Self::TeamEmailVerified { at, .. }
            | Self::TeamEmailVerificationDeleted { at, .. }
            | Self::TeamEmailRemoved { at, .. }
            | Self::UserCreated { at, .. } => *at,
        }
    }

    /// Team the event belongs to, if any.
    pub fn team_id(&self) -> Option<i64> {
        match self {
            Self::MembersInvited { team_id, .. }
            | Self::InvitationResent { team_id, .. }
            | Self::InvitationsDeleted { team_id, .. }
            | Self::InvitationAccepted { team_id, .. }
            | Self::InvitationDeclined { team_id, .. }
            | Self::TeamEmailVerificationRequested { team_id, .. }
            | Self::TeamEmailVerificationResent { team_id, .. }
            | Self::TeamEmailVerified { team_id, .. }
            | Self::TeamEmailVerificationDeleted { team_id, .. }
            | Self::TeamEmailRemoved { team_id, .. } => Some(*team_id),
            Self::UserCreated { .. } => None,
        }
    }
}

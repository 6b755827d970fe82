//! Core records for teams, members, invitations and team emails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TeamMemberRole;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    /// Unique URL slug.
    pub url: String,
    pub owner_user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Links a user to a team with a role. Unique per `(team_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub role: TeamMemberRole,
    pub created_at: DateTime<Utc>,
}

/// A team together with the actor's membership in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberContext {
    pub team: Team,
    pub member: TeamMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Declined,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Declined => "DECLINED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "ACCEPTED" => Some(Self::Accepted),
            "DECLINED" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// An invitation for an email address to join a team.
///
/// Emails are stored lowercase and are unique per team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMemberInvite {
    pub id: i64,
    pub team_id: i64,
    pub email: String,
    pub role: TeamMemberRole,
    /// SHA-256 hash of the invitation token.
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
}

impl TeamMemberInvite {
    pub fn is_pending(&self) -> bool {
        self.status == InviteStatus::Pending
    }
}

/// A pending request to attach an external email address to a team.
///
/// At most one exists per team. Deleted on confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEmailVerification {
    pub team_id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TeamEmailVerification {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// A confirmed team email. At most one exists per team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEmail {
    pub team_id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Derived view of a team's email state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamEmailStatus {
    None,
    Pending,
    Confirmed,
}

impl TeamEmailStatus {
    pub fn derive(email: Option<&TeamEmail>, verification: Option<&TeamEmailVerification>) -> Self {
        match (email, verification) {
            (Some(_), _) => Self::Confirmed,
            (None, Some(_)) => Self::Pending,
            (None, None) => Self::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn verification(expires_at: DateTime<Utc>) -> TeamEmailVerification {
        TeamEmailVerification {
            team_id: 1,
            email: "billing@acme.test".to_owned(),
            name: "Billing".to_owned(),
            token_hash: "hash".to_owned(),
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_invite_status_round_trip() {
        for status in [
            InviteStatus::Pending,
            InviteStatus::Accepted,
            InviteStatus::Declined,
        ] {
            assert_eq!(InviteStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(InviteStatus::parse("pending"), None);
    }

    #[test]
    fn test_verification_expiry_boundary() {
        let now = Utc::now();
        assert!(!verification(now).is_expired_at(now));
        assert!(verification(now - Duration::seconds(1)).is_expired_at(now));
    }

    #[test]
    fn test_team_email_status() {
        let v = verification(Utc::now());
        let email = TeamEmail {
            team_id: 1,
            email: "billing@acme.test".to_owned(),
            name: "Billing".to_owned(),
            created_at: Utc::now(),
        };

        assert_eq!(TeamEmailStatus::derive(None, None), TeamEmailStatus::None);
        assert_eq!(
            TeamEmailStatus::derive(None, Some(&v)),
            TeamEmailStatus::Pending
        );
        assert_eq!(
            TeamEmailStatus::derive(Some(&email), None),
            TeamEmailStatus::Confirmed
        );
    }

    #[test]
    fn test_invite_hides_token_hash() {
        let invite = TeamMemberInvite {
            id: 1,
            team_id: 5,
            email: "a@x.test".to_owned(),
            role: TeamMemberRole::Member,
            token_hash: "secret-hash".to_owned(),
            status: InviteStatus::Pending,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&invite).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"PENDING\""));
    }
}

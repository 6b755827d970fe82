//! Role-based permission table for team actions.
//!
//! The table is closed: every action lists the roles allowed to perform it
//! and anything not listed is denied.
//!
//! ```rust
//! use covenant::teams::{TeamAction, TeamMemberRole, can_execute_team_action};
//!
//! assert!(can_execute_team_action(TeamAction::ManageTeam, TeamMemberRole::Manager));
//! assert!(!can_execute_team_action(TeamAction::ManageBilling, TeamMemberRole::Manager));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Team member role, ordered by privilege: `Admin > Manager > Member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamMemberRole {
    Admin,
    Manager,
    Member,
}

impl TeamMemberRole {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Member => "MEMBER",
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::Admin => 3,
            Self::Manager => 2,
            Self::Member => 1,
        }
    }
}

impl FromStr for TeamMemberRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "MANAGER" => Ok(Self::Manager),
            "MEMBER" => Ok(Self::Member),
            _ => Err(UnknownVariant(s.to_owned())),
        }
    }
}

impl fmt::Display for TeamMemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialOrd for TeamMemberRole {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TeamMemberRole {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamAction {
    ManageTeam,
    DeleteInvitations,
    ManageBilling,
    DeleteTeam,
    DeleteTeamTransferRequest,
}

impl TeamAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageTeam => "MANAGE_TEAM",
            Self::DeleteInvitations => "DELETE_INVITATIONS",
            Self::ManageBilling => "MANAGE_BILLING",
            Self::DeleteTeam => "DELETE_TEAM",
            Self::DeleteTeamTransferRequest => "DELETE_TEAM_TRANSFER_REQUEST",
        }
    }

    /// Roles allowed to perform this action.
    pub fn allowed_roles(&self) -> &'static [TeamMemberRole] {
        use TeamMemberRole::{Admin, Manager};

        match self {
            Self::ManageTeam | Self::DeleteInvitations => &[Admin, Manager],
            Self::ManageBilling | Self::DeleteTeam | Self::DeleteTeamTransferRequest => &[Admin],
        }
    }
}

impl FromStr for TeamAction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANAGE_TEAM" => Ok(Self::ManageTeam),
            "DELETE_INVITATIONS" => Ok(Self::DeleteInvitations),
            "MANAGE_BILLING" => Ok(Self::ManageBilling),
            "DELETE_TEAM" => Ok(Self::DeleteTeam),
            "DELETE_TEAM_TRANSFER_REQUEST" => Ok(Self::DeleteTeamTransferRequest),
            _ => Err(UnknownVariant(s.to_owned())),
        }
    }
}

impl fmt::Display for TeamAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

pub fn can_execute_team_action(action: TeamAction, role: TeamMemberRole) -> bool {
    action.allowed_roles().contains(&role)
}

/// String form of [`can_execute_team_action`]. Unknown actions or roles are denied.
pub fn can_execute_team_action_str(action: &str, role: &str) -> bool {
    match (action.parse::<TeamAction>(), role.parse::<TeamMemberRole>()) {
        (Ok(action), Ok(role)) => can_execute_team_action(action, role),
        _ => false,
    }
}

/// Whether `actor` may assign or manage `target`. Roles at or below the actor's own are allowed.
pub fn is_role_within_hierarchy(actor: TeamMemberRole, target: TeamMemberRole) -> bool {
    target <= actor
}

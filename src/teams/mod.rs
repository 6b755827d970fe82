//! Teams: members, invitations and the team email.

mod actions;
mod permissions;
mod repository;
mod token;
mod types;

pub use actions::{
    AcceptInvitationOutcome, AcceptTeamInvitationAction, AddTeamEmailVerificationAction,
    AddTeamEmailVerificationInput, DeclineTeamInvitationAction, DeleteTeamEmailAction,
    DeleteTeamEmailVerificationAction, DeleteTeamMemberInvitationsAction, InvitationRequest,
    InviteTeamMembersAction, InviteTeamMembersInput, ResendTeamEmailVerificationAction,
    ResendTeamMemberInvitationAction, UpdateTeamEmailAction, VerifyTeamEmailAction,
    VerifyTeamEmailOutcome,
};
pub use permissions::{
    TeamAction, TeamMemberRole, UnknownVariant, can_execute_team_action,
    can_execute_team_action_str, is_role_within_hierarchy,
};
pub use repository::{
    CreateTeam, CreateTeamEmailVerification, CreateTeamMember, CreateTeamMemberInvite,
    TeamEmailRepository, TeamInviteRepository, TeamMemberRepository, TeamRepository,
};
pub use token::{IssuedToken, TokenIssuer};
pub use types::{
    InviteStatus, MemberContext, Team, TeamEmail, TeamEmailStatus, TeamEmailVerification,
    TeamMember, TeamMemberInvite,
};

#[cfg(any(test, feature = "mocks"))]
mod mocks;

#[cfg(any(test, feature = "mocks"))]
pub use mocks::MockTeamStore;

mod accept;
mod guard;
mod invitations;
mod invite;
mod team_email;
mod verify_team_email;

pub use accept::{AcceptInvitationOutcome, AcceptTeamInvitationAction, DeclineTeamInvitationAction};
pub use invitations::{DeleteTeamMemberInvitationsAction, ResendTeamMemberInvitationAction};
pub use invite::{InvitationRequest, InviteTeamMembersAction, InviteTeamMembersInput};
pub use team_email::{
    AddTeamEmailVerificationAction, AddTeamEmailVerificationInput, DeleteTeamEmailAction,
    DeleteTeamEmailVerificationAction, ResendTeamEmailVerificationAction, UpdateTeamEmailAction,
};
pub use verify_team_email::{VerifyTeamEmailAction, VerifyTeamEmailOutcome};

//! End-to-end tests for team member invitations.
//!
//! These tests use the in-memory store - no database required.
//! Run with: `cargo test --features mocks --test e2e_invitations`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use covenant::actions::{CreateUserAction, CreateUserInput};
use covenant::crypto::Argon2Hasher;
use covenant::teams::{
    AcceptInvitationOutcome, AcceptTeamInvitationAction, DeclineTeamInvitationAction,
    DeleteTeamMemberInvitationsAction, InvitationRequest, InviteStatus, InviteTeamMembersAction,
    InviteTeamMembersInput, ResendTeamMemberInvitationAction, TeamMemberRole,
};
use covenant::validators::ValidationError;
use covenant::{
    MockMailer, MockTeamStore, SecretString, TeamError, TeamInviteRepository,
    TeamMemberRepository,
};

fn invite_input(
    team_id: i64,
    actor_id: i64,
    emails: &[(&str, TeamMemberRole)],
) -> InviteTeamMembersInput {
    InviteTeamMembersInput {
        team_id,
        actor_id,
        invitations: emails
            .iter()
            .map(|(email, role)| InvitationRequest {
                email: (*email).to_owned(),
                role: *role,
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_existing_user_accepts_invitation() {
    let store = MockTeamStore::new();
    let mailer = MockMailer::new();
    let (team, owner) = store.seed_team("acme", "owner@acme.test").unwrap();
    let invitee = store.seed_user("Dana", "dana@acme.test").unwrap();

    let invites = InviteTeamMembersAction::new(store.clone(), mailer.clone())
        .execute(invite_input(
            team.id,
            owner.id,
            &[("Dana@Acme.test", TeamMemberRole::Manager)],
        ))
        .await
        .unwrap();
    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0].email, "dana@acme.test");

    let token = SecretString::new(mailer.last_token().unwrap());
    let outcome = AcceptTeamInvitationAction::new(store.clone())
        .execute(&token)
        .await
        .unwrap();

    match outcome {
        AcceptInvitationOutcome::Joined(member) => {
            assert_eq!(member.user_id, invitee.id);
            assert_eq!(member.role, TeamMemberRole::Manager);
        }
        other => panic!("expected Joined, got {other:?}"),
    }
    assert!(store.list_invites(team.id).await.unwrap().is_empty());

    // the link is single use
    let err = AcceptTeamInvitationAction::new(store.clone())
        .execute(&token)
        .await
        .unwrap_err();
    assert_eq!(err, TeamError::TokenInvalid);
}

#[tokio::test]
async fn test_invitee_without_account_joins_on_sign_up() {
    let store = MockTeamStore::new();
    let mailer = MockMailer::new();
    let (team, owner) = store.seed_team("acme", "owner@acme.test").unwrap();

    InviteTeamMembersAction::new(store.clone(), mailer.clone())
        .execute(invite_input(
            team.id,
            owner.id,
            &[("new@acme.test", TeamMemberRole::Member)],
        ))
        .await
        .unwrap();

    let token = SecretString::new(mailer.last_token().unwrap());
    let outcome = AcceptTeamInvitationAction::new(store.clone())
        .execute(&token)
        .await
        .unwrap();
    match outcome {
        AcceptInvitationOutcome::AwaitingAccount(invite) => {
            assert_eq!(invite.status, InviteStatus::Accepted);
        }
        other => panic!("expected AwaitingAccount, got {other:?}"),
    }

    let created = CreateUserAction::with_hasher(store.clone(), Argon2Hasher::insecure_fast())
        .execute(CreateUserInput {
            name: "New Person".to_owned(),
            email: "New@acme.test".to_owned(),
            password: SecretString::new("correct horse battery"),
        })
        .await
        .unwrap();

    assert_eq!(created.memberships.len(), 1);
    assert_eq!(created.memberships[0].team_id, team.id);
    assert_eq!(created.memberships[0].role, TeamMemberRole::Member);

    let member = store.find_member(team.id, created.user.id).await.unwrap();
    assert!(member.is_some());
    assert!(store.list_invites(team.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_decline_keeps_invite_out_of_reconciliation() {
    let store = MockTeamStore::new();
    let mailer = MockMailer::new();
    let (team, owner) = store.seed_team("acme", "owner@acme.test").unwrap();

    InviteTeamMembersAction::new(store.clone(), mailer.clone())
        .execute(invite_input(
            team.id,
            owner.id,
            &[("late@acme.test", TeamMemberRole::Member)],
        ))
        .await
        .unwrap();

    let token = SecretString::new(mailer.last_token().unwrap());
    let declined = DeclineTeamInvitationAction::new(store.clone())
        .execute(&token)
        .await
        .unwrap();
    assert_eq!(declined.status, InviteStatus::Declined);

    let created = CreateUserAction::with_hasher(store.clone(), Argon2Hasher::insecure_fast())
        .execute(CreateUserInput {
            name: "Late".to_owned(),
            email: "late@acme.test".to_owned(),
            password: SecretString::new("correct horse battery"),
        })
        .await
        .unwrap();
    assert!(created.memberships.is_empty());

    let err = AcceptTeamInvitationAction::new(store.clone())
        .execute(&token)
        .await
        .unwrap_err();
    assert_eq!(err, TeamError::TokenInvalid);
}

#[tokio::test]
async fn test_resend_rotates_invitation_link() {
    let store = MockTeamStore::new();
    let mailer = MockMailer::new();
    let (team, owner) = store.seed_team("acme", "owner@acme.test").unwrap();

    let invites = InviteTeamMembersAction::new(store.clone(), mailer.clone())
        .execute(invite_input(
            team.id,
            owner.id,
            &[("dana@acme.test", TeamMemberRole::Member)],
        ))
        .await
        .unwrap();
    let old_token = SecretString::new(mailer.last_token().unwrap());

    ResendTeamMemberInvitationAction::new(store.clone(), mailer.clone())
        .execute(owner.id, team.id, invites[0].id)
        .await
        .unwrap();
    let new_token = SecretString::new(mailer.last_token().unwrap());
    assert_eq!(mailer.sent().len(), 2);

    let accept = AcceptTeamInvitationAction::new(store.clone());
    assert_eq!(
        accept.execute(&old_token).await.unwrap_err(),
        TeamError::TokenInvalid
    );
    assert!(matches!(
        accept.execute(&new_token).await.unwrap(),
        AcceptInvitationOutcome::AwaitingAccount(_)
    ));
}

#[tokio::test]
async fn test_delete_invitations_scoped_to_team() {
    let store = MockTeamStore::new();
    let mailer = MockMailer::new();
    let (acme, acme_owner) = store.seed_team("acme", "owner@acme.test").unwrap();
    let (globex, globex_owner) = store.seed_team("globex", "owner@globex.test").unwrap();

    let acme_invites = InviteTeamMembersAction::new(store.clone(), mailer.clone())
        .execute(invite_input(
            acme.id,
            acme_owner.id,
            &[
                ("a@acme.test", TeamMemberRole::Member),
                ("b@acme.test", TeamMemberRole::Member),
            ],
        ))
        .await
        .unwrap();
    let globex_invites = InviteTeamMembersAction::new(store.clone(), mailer.clone())
        .execute(invite_input(
            globex.id,
            globex_owner.id,
            &[("c@globex.test", TeamMemberRole::Member)],
        ))
        .await
        .unwrap();

    let ids = [acme_invites[0].id, globex_invites[0].id];
    let deleted = DeleteTeamMemberInvitationsAction::new(store.clone())
        .execute(acme_owner.id, acme.id, &ids)
        .await
        .unwrap();

    assert_eq!(deleted, 1);
    assert_eq!(store.list_invites(acme.id).await.unwrap().len(), 1);
    assert_eq!(store.list_invites(globex.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejected_batch_persists_nothing() {
    let store = MockTeamStore::new();
    let mailer = MockMailer::new();
    let (team, owner) = store.seed_team("acme", "owner@acme.test").unwrap();

    let err = InviteTeamMembersAction::new(store.clone(), mailer.clone())
        .execute(invite_input(
            team.id,
            owner.id,
            &[
                ("dana@acme.test", TeamMemberRole::Member),
                ("DANA@acme.test", TeamMemberRole::Manager),
            ],
        ))
        .await
        .unwrap_err();

    match err {
        TeamError::Validation(errors) => {
            assert_eq!(
                errors.for_field("invitations"),
                Some(&ValidationError::DuplicateEmails)
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(store.list_invites(team.id).await.unwrap().is_empty());
    assert!(mailer.sent().is_empty());
}

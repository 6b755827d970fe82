// these tests use #[serial] because setup_db() truncates every table first.
// run in parallel they would delete each other's rows.

//! End-to-end tests for the `PostgreSQL` store.
//!
//! Requires `DATABASE_URL`; every test returns early when it is unset.
//! Run with: `cargo test --features "sqlx_postgres mocks" --test e2e_postgres_teams`

#![cfg(all(feature = "sqlx_postgres", feature = "mocks"))]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use chrono::{Duration, Utc};
use covenant::actions::{CreateUserAction, CreateUserInput};
use covenant::crypto::Argon2Hasher;
use covenant::postgres::{PostgresTeamStore, migrations};
use covenant::teams::{
    AcceptInvitationOutcome, AcceptTeamInvitationAction, AddTeamEmailVerificationAction,
    AddTeamEmailVerificationInput, CreateTeam, CreateTeamEmailVerification,
    CreateTeamMemberInvite, InvitationRequest, InviteStatus, InviteTeamMembersAction,
    InviteTeamMembersInput, Team, TeamMemberRole, VerifyTeamEmailAction, VerifyTeamEmailOutcome,
};
use covenant::{
    CreateUser, MockMailer, SecretString, TeamEmailRepository, TeamError, TeamInviteRepository,
    TeamMemberRepository, TeamRepository, User, UserRepository,
};
use serial_test::serial;
use sqlx::postgres::PgPoolOptions;

async fn setup_db() -> Option<PostgresTeamStore> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    migrations::run(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query(
        "TRUNCATE users, teams, team_members, team_member_invites, team_email_verifications, team_emails RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to truncate tables");

    Some(PostgresTeamStore::new(pool))
}

async fn create_user(store: &PostgresTeamStore, email: &str) -> User {
    store
        .create_user(CreateUser {
            name: "Test User".to_owned(),
            email: email.to_owned(),
            password_hash: "hash".to_owned(),
        })
        .await
        .expect("Failed to create user")
        .user
}

async fn create_team(store: &PostgresTeamStore, url: &str) -> (Team, User) {
    let owner = create_user(store, &format!("owner@{url}.test")).await;
    let team = store
        .create_team(CreateTeam {
            name: url.to_uppercase(),
            url: url.to_owned(),
            owner_user_id: owner.id,
        })
        .await
        .expect("Failed to create team");
    (team, owner)
}

fn verification(team_id: i64, email: &str, hash: &str) -> CreateTeamEmailVerification {
    CreateTeamEmailVerification {
        team_id,
        email: email.to_owned(),
        name: "Billing".to_owned(),
        token_hash: hash.to_owned(),
        expires_at: Utc::now() + Duration::hours(24),
    }
}

#[tokio::test]
#[serial]
async fn test_team_owner_is_admin() {
    let Some(store) = setup_db().await else { return };
    let (team, owner) = create_team(&store, "acme").await;

    let context = store
        .find_member_context(team.id, owner.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(context.member.role, TeamMemberRole::Admin);
    assert_eq!(context.team.url, "acme");

    let found = store.find_team_by_id(team.id).await.unwrap();
    assert_eq!(found, Some(team));
}

#[tokio::test]
#[serial]
async fn test_create_invites_skips_existing() {
    let Some(store) = setup_db().await else { return };
    let (team, _) = create_team(&store, "acme").await;

    let first = store
        .create_invites(
            team.id,
            vec![
                CreateTeamMemberInvite {
                    email: "dana@acme.test".to_owned(),
                    role: TeamMemberRole::Member,
                    token_hash: "hash-1".to_owned(),
                },
                // already a member
                CreateTeamMemberInvite {
                    email: "owner@acme.test".to_owned(),
                    role: TeamMemberRole::Member,
                    token_hash: "hash-2".to_owned(),
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].status, InviteStatus::Pending);

    let second = store
        .create_invites(
            team.id,
            vec![CreateTeamMemberInvite {
                email: "dana@acme.test".to_owned(),
                role: TeamMemberRole::Manager,
                token_hash: "hash-3".to_owned(),
            }],
        )
        .await
        .unwrap();
    assert!(second.is_empty());

    let invites = store.list_invites(team.id).await.unwrap();
    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0].token_hash, "hash-1");
}

#[tokio::test]
#[serial]
async fn test_verification_is_consumed_once() {
    let Some(store) = setup_db().await else { return };
    let (team, _) = create_team(&store, "acme").await;

    store
        .create_verification(verification(team.id, "billing@acme.test", "hash-new"))
        .await
        .unwrap();

    let err = store
        .create_verification(verification(team.id, "other@acme.test", "hash-other"))
        .await
        .unwrap_err();
    assert!(matches!(err, TeamError::Conflict(_)));

    let now = Utc::now();
    let email = store.consume_verification("hash-new", now).await.unwrap();
    assert_eq!(email.email, "billing@acme.test");

    let err = store
        .consume_verification("hash-new", now)
        .await
        .unwrap_err();
    assert_eq!(err, TeamError::TokenInvalid);
    assert!(store.find_verification_by_team(team.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_expired_verification_is_not_consumed() {
    let Some(store) = setup_db().await else { return };
    let (team, _) = create_team(&store, "acme").await;

    let mut data = verification(team.id, "billing@acme.test", "hash-expired");
    data.expires_at = Utc::now() - Duration::minutes(5);
    store.create_verification(data).await.unwrap();

    let err = store
        .consume_verification("hash-expired", Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, TeamError::TokenInvalid);
    assert!(store.find_team_email(team.id).await.unwrap().is_none());
    assert!(store.find_verification_by_team(team.id).await.unwrap().is_some());
}

#[tokio::test]
#[serial]
async fn test_concurrent_consumption_succeeds_once() {
    let Some(store) = setup_db().await else { return };
    let (team, _) = create_team(&store, "acme").await;
    store
        .create_verification(verification(team.id, "billing@acme.test", "hash-race"))
        .await
        .unwrap();

    let now = Utc::now();
    let (a, b) = tokio::join!(
        store.consume_verification("hash-race", now),
        store.consume_verification("hash-race", now)
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert!(store.find_team_email(team.id).await.unwrap().is_some());
}

#[tokio::test]
#[serial]
async fn test_concurrent_adds_create_one_verification() {
    let Some(store) = setup_db().await else { return };
    let mailer = MockMailer::new();
    let (team, owner) = create_team(&store, "acme").await;

    let add = AddTeamEmailVerificationAction::new(store.clone(), mailer.clone());
    let input = |email: &str| AddTeamEmailVerificationInput {
        team_id: team.id,
        actor_id: owner.id,
        name: "Billing".to_owned(),
        email: email.to_owned(),
    };
    let (first, second) = tokio::join!(
        add.execute(input("billing@acme.test")),
        add.execute(input("finance@acme.test"))
    );

    let (winner, loser) = match (first, second) {
        (Ok(v), Err(e)) | (Err(e), Ok(v)) => (v, e),
        other => panic!("expected exactly one success, got {other:?}"),
    };
    assert!(matches!(loser, TeamError::Conflict(_)));

    let (rows,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM team_email_verifications WHERE team_id = $1")
            .bind(team.id)
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(rows, 1);

    let stored = store.find_verification_by_team(team.id).await.unwrap().unwrap();
    assert_eq!(stored.token_hash, winner.token_hash);
}

#[tokio::test]
#[serial]
async fn test_team_email_unique_across_teams() {
    let Some(store) = setup_db().await else { return };
    let (acme, _) = create_team(&store, "acme").await;
    let (globex, _) = create_team(&store, "globex").await;

    // both pending at once; only the first confirmation can claim the address
    store
        .create_verification(verification(acme.id, "shared@mail.test", "hash-a"))
        .await
        .unwrap();
    store
        .create_verification(verification(globex.id, "shared@mail.test", "hash-b"))
        .await
        .unwrap();

    store
        .consume_verification("hash-a", Utc::now())
        .await
        .unwrap();
    let err = store
        .consume_verification("hash-b", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, TeamError::Conflict(_)));

    // a new request for a claimed address is refused up front
    store.delete_verification(globex.id).await.unwrap();
    let err = store
        .create_verification(verification(globex.id, "shared@mail.test", "hash-c"))
        .await
        .unwrap_err();
    assert!(matches!(err, TeamError::Conflict(_)));
}

#[tokio::test]
#[serial]
async fn test_invitation_to_membership_through_sign_up() {
    let Some(store) = setup_db().await else { return };
    let mailer = MockMailer::new();
    let (team, owner) = create_team(&store, "acme").await;

    InviteTeamMembersAction::new(store.clone(), mailer.clone())
        .execute(InviteTeamMembersInput {
            team_id: team.id,
            actor_id: owner.id,
            invitations: vec![InvitationRequest {
                email: "dana@acme.test".to_owned(),
                role: TeamMemberRole::Manager,
            }],
        })
        .await
        .unwrap();

    let token = SecretString::new(mailer.last_token().unwrap());
    let outcome = AcceptTeamInvitationAction::new(store.clone())
        .execute(&token)
        .await
        .unwrap();
    assert!(matches!(outcome, AcceptInvitationOutcome::AwaitingAccount(_)));

    let created = CreateUserAction::with_hasher(store.clone(), Argon2Hasher::insecure_fast())
        .execute(CreateUserInput {
            name: "Dana".to_owned(),
            email: "dana@acme.test".to_owned(),
            password: SecretString::new("correct horse battery"),
        })
        .await
        .unwrap();

    assert_eq!(created.memberships.len(), 1);
    assert_eq!(created.memberships[0].role, TeamMemberRole::Manager);
    assert!(store.list_invites(team.id).await.unwrap().is_empty());
    assert_eq!(store.list_members(team.id).await.unwrap().len(), 2);
}

#[tokio::test]
#[serial]
async fn test_team_email_flow_through_actions() {
    let Some(store) = setup_db().await else { return };
    let mailer = MockMailer::new();
    let (team, owner) = create_team(&store, "acme").await;

    AddTeamEmailVerificationAction::new(store.clone(), mailer.clone())
        .execute(AddTeamEmailVerificationInput {
            team_id: team.id,
            actor_id: owner.id,
            name: "Billing".to_owned(),
            email: "billing@acme.test".to_owned(),
        })
        .await
        .unwrap();

    let token = mailer.last_token().unwrap();
    let outcome = VerifyTeamEmailAction::new(store.clone())
        .execute(&token)
        .await;
    assert!(outcome.is_verified());
    assert_eq!(
        VerifyTeamEmailAction::new(store.clone())
            .execute(&token)
            .await,
        VerifyTeamEmailOutcome::InvalidOrExpired
    );
}

//! Security-focused test suite.
//!
//! Tokens must never be stored, logged or serialized in plain text, and a
//! rejected request must not reveal whether a team exists.
//! Run with: `cargo test --features mocks --test security`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use chrono::Duration;
use covenant::crypto::{Argon2Hasher, PasswordHasher, generate_token, hash_token};
use covenant::teams::{
    AddTeamEmailVerificationAction, AddTeamEmailVerificationInput, InvitationRequest,
    InviteTeamMembersAction, InviteTeamMembersInput, ResendTeamEmailVerificationAction,
    TeamMemberRole, TokenIssuer,
};
use covenant::{
    MockMailer, MockTeamStore, SecretString, TeamEmailRepository, TeamError, TeamInviteRepository,
};

// =============================================================================
// Password hashing
// =============================================================================

#[test]
fn argon2_produces_different_hashes_for_same_password() {
    let hasher = Argon2Hasher::insecure_fast();

    let hash1 = hasher.hash("testpassword123").unwrap();
    let hash2 = hasher.hash("testpassword123").unwrap();

    assert_ne!(hash1, hash2);
    assert!(hasher.verify("testpassword123", &hash1).unwrap());
    assert!(hasher.verify("testpassword123", &hash2).unwrap());
    assert!(!hasher.verify("wrongpassword", &hash1).unwrap());
}

// =============================================================================
// Secrets
// =============================================================================

#[test]
fn secret_string_redacts_in_debug_and_display() {
    let secret = SecretString::new("my-secret-token");

    assert!(!format!("{secret:?}").contains("my-secret-token"));
    assert!(!format!("{secret}").contains("my-secret-token"));
    assert_eq!(secret.expose_secret(), "my-secret-token");
}

#[test]
fn issued_token_debug_hides_plain_token() {
    let issued = TokenIssuer::new(32, Duration::hours(1)).issue();
    let debug_output = format!("{issued:?}");

    assert!(!debug_output.contains(issued.token.expose_secret()));
    assert!(debug_output.contains(&issued.token_hash));
}

// =============================================================================
// Tokens
// =============================================================================

#[test]
fn generated_tokens_are_unique_and_url_safe() {
    let token1 = generate_token(32);
    let token2 = generate_token(32);

    assert_ne!(token1, token2);
    assert_eq!(token1.len(), 32);
    assert!(token1.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn token_hash_is_sha256_hex() {
    let hash = hash_token("abc");

    assert_eq!(hash.len(), 64);
    assert_eq!(
        hash,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[tokio::test]
async fn verification_token_is_stored_only_as_hash() {
    let store = MockTeamStore::new();
    let mailer = MockMailer::new();
    let (team, owner) = store.seed_team("acme", "owner@acme.test").unwrap();

    let verification = AddTeamEmailVerificationAction::new(store.clone(), mailer.clone())
        .execute(AddTeamEmailVerificationInput {
            team_id: team.id,
            actor_id: owner.id,
            name: "Billing".to_owned(),
            email: "billing@acme.test".to_owned(),
        })
        .await
        .unwrap();
    let token = mailer.last_token().unwrap();

    assert_ne!(verification.token_hash, token);
    assert_eq!(verification.token_hash, hash_token(&token));
    assert!(
        store
            .find_verification_by_token_hash(&token)
            .await
            .unwrap()
            .is_none()
    );

    let json = serde_json::to_string(&verification).unwrap();
    assert!(!json.contains(&verification.token_hash));
    assert!(!json.contains(&token));
}

#[tokio::test]
async fn invitation_token_is_stored_only_as_hash() {
    let store = MockTeamStore::new();
    let mailer = MockMailer::new();
    let (team, owner) = store.seed_team("acme", "owner@acme.test").unwrap();

    let invites = InviteTeamMembersAction::new(store.clone(), mailer.clone())
        .execute(InviteTeamMembersInput {
            team_id: team.id,
            actor_id: owner.id,
            invitations: vec![InvitationRequest {
                email: "dana@acme.test".to_owned(),
                role: TeamMemberRole::Member,
            }],
        })
        .await
        .unwrap();
    let token = mailer.last_token().unwrap();

    assert_eq!(invites[0].token_hash, hash_token(&token));
    assert!(store.find_invite_by_token_hash(&token).await.unwrap().is_none());

    let sent = mailer.sent();
    assert!(!format!("{:?}", sent[0]).contains(&token));
}

// =============================================================================
// Existence hiding
// =============================================================================

#[tokio::test]
async fn resend_does_not_reveal_foreign_teams() {
    let store = MockTeamStore::new();
    let mailer = MockMailer::new();
    let (team, owner) = store.seed_team("acme", "owner@acme.test").unwrap();
    let (_, outsider) = store.seed_team("globex", "owner@globex.test").unwrap();

    AddTeamEmailVerificationAction::new(store.clone(), mailer.clone())
        .execute(AddTeamEmailVerificationInput {
            team_id: team.id,
            actor_id: owner.id,
            name: "Billing".to_owned(),
            email: "billing@acme.test".to_owned(),
        })
        .await
        .unwrap();

    let resend = ResendTeamEmailVerificationAction::new(store.clone(), mailer.clone());
    let existing = resend.execute(outsider.id, team.id).await.unwrap_err();
    let missing = resend.execute(outsider.id, 9999).await.unwrap_err();

    assert_eq!(existing, TeamError::TeamNotFound);
    assert_eq!(existing, missing);
    assert_eq!(mailer.sent().len(), 1);
}

use chrono::Utc;

use crate::crypto::{Argon2Hasher, PasswordHasher};
use crate::events::{self, TeamEvent};
use crate::repository::{CreateUser, CreatedUser, UserRepository};
use crate::validators::{
    ValidationErrors, normalize_email, validate_email, validate_name, validate_password,
};
use crate::{SecretString, TeamError};

#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

/// Creates an account and joins every team whose invitation was accepted
/// before the account existed.
pub struct CreateUserAction<S: UserRepository, H: PasswordHasher = Argon2Hasher> {
    store: S,
    hasher: H,
}

impl<S: UserRepository> CreateUserAction<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            hasher: Argon2Hasher::default(),
        }
    }
}

impl<S: UserRepository, H: PasswordHasher> CreateUserAction<S, H> {
    pub fn with_hasher(store: S, hasher: H) -> Self {
        Self { store, hasher }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_user", skip_all, err)
    )]
    pub async fn execute(&self, input: CreateUserInput) -> Result<CreatedUser, TeamError> {
        let mut errors = ValidationErrors::new();
        errors.check("name", validate_name(&input.name));
        errors.check("email", validate_email(&input.email));
        errors.check("password", validate_password(input.password.expose_secret()));
        errors.into_result()?;

        let email = normalize_email(&input.email);

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(TeamError::UserAlreadyExists);
        }

        let password_hash = self.hasher.hash(input.password.expose_secret())?;

        let created = self
            .store
            .create_user(CreateUser {
                name: input.name.trim().to_owned(),
                email,
                password_hash,
            })
            .await?;

        log::info!(
            target: "covenant",
            "msg=\"user created\", user_id={}, joined_teams={}",
            created.user.id,
            created.memberships.len()
        );

        events::dispatch(TeamEvent::UserCreated {
            user_id: created.user.id,
            email: created.user.email.clone(),
            joined_teams: created.memberships.iter().map(|m| m.team_id).collect(),
            at: Utc::now(),
        })
        .await;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teams::{
        AcceptTeamInvitationAction, CreateTeamMemberInvite, MockTeamStore, TeamInviteRepository,
        TeamMemberRepository, TeamMemberRole,
    };
    use crate::crypto::hash_token;

    fn input(email: &str) -> CreateUserInput {
        CreateUserInput {
            name: "New User".to_owned(),
            email: email.to_owned(),
            password: SecretString::new("password123"),
        }
    }

    fn action(store: MockTeamStore) -> CreateUserAction<MockTeamStore> {
        CreateUserAction::with_hasher(store, Argon2Hasher::insecure_fast())
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let store = MockTeamStore::new();
        let created = action(store.clone())
            .execute(input("New@Example.test"))
            .await
            .unwrap();

        assert_eq!(created.user.email, "new@example.test");
        assert!(created.memberships.is_empty());
        assert!(created.user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_create_user_already_exists() {
        let store = MockTeamStore::new();
        store.seed_user("Existing", "taken@example.test").unwrap();

        let err = action(store)
            .execute(input("TAKEN@example.test"))
            .await
            .unwrap_err();
        assert_eq!(err, TeamError::UserAlreadyExists);
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let err = action(MockTeamStore::new())
            .execute(CreateUserInput {
                name: String::new(),
                email: "bad".to_owned(),
                password: SecretString::new("short"),
            })
            .await
            .unwrap_err();

        let TeamError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 3);
    }

    #[tokio::test]
    async fn test_create_user_joins_accepted_teams() {
        let store = MockTeamStore::new();
        let (team, _) = store.seed_team("acme", "owner@acme.test").unwrap();
        store
            .create_invites(
                team.id,
                vec![CreateTeamMemberInvite {
                    email: "new@example.test".to_owned(),
                    role: TeamMemberRole::Manager,
                    token_hash: hash_token("tok"),
                }],
            )
            .await
            .unwrap();
        AcceptTeamInvitationAction::new(store.clone())
            .execute(&SecretString::new("tok"))
            .await
            .unwrap();

        let created = action(store.clone())
            .execute(input("new@example.test"))
            .await
            .unwrap();

        assert_eq!(created.memberships.len(), 1);
        let member = store
            .find_member(team.id, created.user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(member.role, TeamMemberRole::Manager);
        assert!(store.list_invites(team.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_invites_are_not_reconciled() {
        let store = MockTeamStore::new();
        let (team, _) = store.seed_team("acme", "owner@acme.test").unwrap();
        store
            .create_invites(
                team.id,
                vec![CreateTeamMemberInvite {
                    email: "new@example.test".to_owned(),
                    role: TeamMemberRole::Member,
                    token_hash: hash_token("tok"),
                }],
            )
            .await
            .unwrap();

        let created = action(store.clone())
            .execute(input("new@example.test"))
            .await
            .unwrap();

        assert!(created.memberships.is_empty());
        assert_eq!(store.list_invites(team.id).await.unwrap().len(), 1);
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TeamError;
use crate::teams::TeamMember;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Lowercase, unique.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A new user together with the memberships created from accepted invites.
#[derive(Debug, Clone)]
pub struct CreatedUser {
    pub user: User,
    pub memberships: Vec<TeamMember>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, TeamError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, TeamError>;

    /// Creates the user and, in the same transaction, turns every accepted
    /// invite for its email into a membership and deletes those invites.
    ///
    /// `UserAlreadyExists` if the email is taken.
    async fn create_user(&self, data: CreateUser) -> Result<CreatedUser, TeamError>;
}

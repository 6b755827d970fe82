use crate::validators::ValidationErrors;

/// Errors returned by covenant actions and repositories.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TeamError {
    /// The actor is a member of the team but their role does not allow the action.
    #[error("You are not allowed to perform this action")]
    Forbidden,
    /// The team does not exist, or the actor is not a member with the required role.
    ///
    /// The two cases are deliberately indistinguishable.
    #[error("Team not found")]
    TeamNotFound,
    /// The team has no pending email verification.
    #[error("No team email verification exists for this team")]
    VerificationNotFound,
    #[error("Not found")]
    NotFound,
    /// The requested change is incompatible with the current state.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The token is unknown, already used, superseded, or expired.
    #[error("This link is invalid or has expired")]
    TokenInvalid,
    /// The request carried no valid session.
    #[error("Authentication required")]
    Unauthenticated,
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Failed to hash password")]
    PasswordHashError,
    /// The store is unavailable or a statement failed. Safe to retry.
    #[error("Database error: {0}")]
    DatabaseError(String),
    /// The notification capability failed. Never surfaced by actions.
    #[error("Notification error: {0}")]
    Notification(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TeamError {
    /// Returns true if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::Notification(_))
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Forbidden => "FORBIDDEN",
            Self::TeamNotFound => "TEAM_NOT_FOUND",
            Self::VerificationNotFound => "VERIFICATION_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::TokenInvalid => "INVALID_OR_EXPIRED",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PasswordHashError => "PASSWORD_HASH_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::Notification(_) => "NOTIFICATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

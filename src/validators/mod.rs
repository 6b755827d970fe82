//! Request validation.
//!
//! Validation runs before any repository call. Failures are collected as
//! [`FieldError`]s so callers can surface them next to the offending field,
//! or against a whole list for cross-item constraints such as unique emails.

pub mod email;
pub mod invitations;
pub mod name;
pub mod password;

pub use email::{normalize_email, validate_email};
pub use invitations::validate_invitation_emails;
pub use name::validate_name;
pub use password::validate_password;

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationError {
    #[error("Email cannot be empty")]
    EmailEmpty,
    #[error("Email is too long (max 254 characters)")]
    EmailTooLong,
    #[error("Please enter a valid email")]
    EmailInvalidFormat,
    #[error("Please enter a valid name")]
    NameEmpty,
    #[error("Name is too long (max 100 characters)")]
    NameTooLong,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Password is too long (max 72 characters)")]
    PasswordTooLong,
    #[error("At least one invitation is required")]
    InvitationsEmpty,
    #[error("Members must have unique emails")]
    DuplicateEmails,
}

/// A validation failure attributed to a request field.
///
/// `field` is a dotted path: `invitations.2.email` for one item of a list,
/// `invitations` for an error that belongs to the list as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error: ValidationError,
}

/// Every validation failure found in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection holding a single error.
    #[must_use]
    pub fn single(field: impl Into<String>, error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(field, error);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, error: ValidationError) {
        self.0.push(FieldError {
            field: field.into(),
            error,
        });
    }

    /// Record the outcome of a single-field validator.
    pub fn check(&mut self, field: &str, result: Result<(), ValidationError>) {
        if let Err(error) = result {
            self.add(field, error);
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns the error recorded for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field == field).map(|e| &e.error)
    }

    /// `Ok(())` when nothing was recorded, otherwise `TeamError::Validation`.
    pub fn into_result(self) -> Result<(), crate::TeamError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::TeamError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.error)?;
        }
        Ok(())
    }
}

use std::collections::HashSet;

use super::{ValidationError, ValidationErrors, normalize_email, validate_email};

/// Field path used for errors that apply to the invitation list as a whole.
pub const INVITATIONS_FIELD: &str = "invitations";

/// Validates the emails of an invitation batch.
///
/// Each malformed email is reported against `invitations.{index}.email`.
/// Duplicates (compared case-insensitively) are reported once against the
/// list itself, since no single entry is at fault.
pub fn validate_invitation_emails<'a, I>(emails: I) -> ValidationErrors
where
    I: IntoIterator<Item = &'a str>,
{
    let mut errors = ValidationErrors::new();
    let mut seen = HashSet::new();
    let mut has_duplicates = false;
    let mut count = 0usize;

    for (index, email) in emails.into_iter().enumerate() {
        count += 1;
        errors.check(&format!("{INVITATIONS_FIELD}.{index}.email"), validate_email(email));

        if !seen.insert(normalize_email(email)) {
            has_duplicates = true;
        }
    }

    if count == 0 {
        errors.add(INVITATIONS_FIELD, ValidationError::InvitationsEmpty);
    }

    if has_duplicates {
        errors.add(INVITATIONS_FIELD, ValidationError::DuplicateEmails);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_emails_pass() {
        let errors = validate_invitation_emails(["a@x.test", "b@x.test"]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_duplicates_are_case_insensitive_and_list_level() {
        let errors = validate_invitation_emails(["a@x.test", "A@X.test"]);

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.for_field(INVITATIONS_FIELD),
            Some(&ValidationError::DuplicateEmails)
        );
    }

    #[test]
    fn test_invalid_email_is_attributed_to_its_index() {
        let errors = validate_invitation_emails(["a@x.test", "nope"]);

        assert_eq!(
            errors.for_field("invitations.1.email"),
            Some(&ValidationError::EmailInvalidFormat)
        );
    }

    #[test]
    fn test_empty_list() {
        let errors = validate_invitation_emails(std::iter::empty());
        assert_eq!(
            errors.for_field(INVITATIONS_FIELD),
            Some(&ValidationError::InvitationsEmpty)
        );
    }
}

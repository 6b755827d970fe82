use super::ValidationError;

const MIN_LENGTH: usize = 8;
// argon2 accepts more, but bcrypt-era accounts were capped here
const MAX_LENGTH: usize = 72;

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();

    if len < MIN_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }

    if len > MAX_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }

    Ok(())
}

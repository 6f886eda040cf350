//! Rules a login or registration form applies before calling the session manager

use crate::error::CredentialError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// `local@domain.tld` with no whitespace anywhere
pub fn validate_email(email: &str) -> Result<(), CredentialError> {
    if email.chars().any(char::is_whitespace) {
        return Err(CredentialError::InvalidEmail);
    }

    let (local, domain) = email.split_once('@').ok_or(CredentialError::InvalidEmail)?;
    if local.is_empty() || domain.contains('@') {
        return Err(CredentialError::InvalidEmail);
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(CredentialError::InvalidEmail),
    }
}

pub fn validate_password(password: &str) -> Result<(), CredentialError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(CredentialError::PasswordLength {
            min: MIN_PASSWORD_LEN,
            max: MAX_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Input of a sign-up form
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Check the form locally; nothing is sent when this fails
    pub fn validate(&self) -> Result<(), CredentialError> {
        validate_email(self.email.trim())?;
        validate_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(CredentialError::PasswordMismatch);
        }
        Ok(())
    }
}

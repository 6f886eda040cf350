use std::fmt;
use thiserror::Error;

use crate::fetch::FetchError;

/// Errors produced by the session manager
#[derive(Error, Debug)]
pub enum AuthError {
    /// Login or registration was refused by the server
    #[error("Authentication rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The token store could not be read or written
    #[error("Token storage error: {0}")]
    Storage(String),
}

impl AuthError {
    pub fn storage<T: fmt::Display>(err: T) -> Self {
        AuthError::Storage(err.to_string())
    }
}

/// A login or registration form that should not be submitted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be between {min} and {max} characters")]
    PasswordLength { min: usize, max: usize },

    #[error("Passwords do not match")]
    PasswordMismatch,
}

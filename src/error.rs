//! Error handling for the Taskdeck Rust client

use std::fmt;
use thiserror::Error;

pub use taskdeck_auth::{AuthError, CredentialError, FetchError};
pub use taskdeck_tasks::{TaskError, ValidationError};

/// Unified error type for the Taskdeck Rust client
#[derive(Error, Debug)]
pub enum Error {
    /// Login, registration or token storage failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A login or registration form failed local checks
    #[error("Invalid credentials: {0}")]
    Credentials(#[from] CredentialError),

    /// A task operation failed
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Network client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// True for failures caught before anything was sent
    pub fn is_validation(&self) -> bool {
        match self {
            Error::Credentials(_) => true,
            Error::Task(e) => e.is_validation(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

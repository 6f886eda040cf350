//! Taskdeck authentication for Rust
//!
//! This crate owns the client side of authentication: obtaining a bearer
//! token by login or registration, persisting it between runs, verifying it
//! at startup, and publishing the resulting session to the rest of the
//! application.
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskdeck_auth::{MemoryTokenStore, SessionManager};
//!
//! # async fn run() -> Result<(), taskdeck_auth::AuthError> {
//! let session = SessionManager::new(
//!     "http://localhost:8000",
//!     reqwest::Client::new(),
//!     Arc::new(MemoryTokenStore::new()),
//! );
//! session.initialize().await;
//! let user = session.login("user@example.com", "password123").await?;
//! println!("signed in as {}", user.email);
//! # Ok(())
//! # }
//! ```

mod error;
pub mod fetch;
mod session;
pub mod store;
mod types;
pub mod validation;

pub use error::{AuthError, CredentialError};
pub use fetch::FetchError;
pub use session::SessionManager;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use types::{Credentials, Session, SessionStatus, TokenResponse, User};
pub use validation::RegistrationForm;

/// Sent as `X-Client-Info` on every request
pub const CLIENT_INFO: &str = concat!("taskdeck-rust/", env!("CARGO_PKG_VERSION"));

//! Taskdeck Rust Client Library
//!
//! A Rust client for the Taskdeck task service: sign in, keep the session
//! across restarts, and work with a locally mirrored task list.
//!
//! ```no_run
//! use taskdeck::prelude::*;
//!
//! # async fn run() -> taskdeck::error::Result<()> {
//! let client = Taskdeck::new("http://localhost:8000")?;
//! client.initialize().await;
//! if !client.session().is_authenticated() {
//!     client.login("user@example.com", "password123").await?;
//! }
//! client.tasks().list_tasks().await?;
//! for task in client.tasks().filtered(TaskFilter::Pending) {
//!     println!("{} {}", task.id, task.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;

use log::debug;
use reqwest::Client;
use std::sync::Arc;

pub use taskdeck_auth as auth;
pub use taskdeck_tasks as tasks;

use crate::auth::{
    FileTokenStore, MemoryTokenStore, RegistrationForm, Session, SessionManager, TokenStore, User,
};
use crate::config::TaskdeckConfig;
use crate::error::Result;
use crate::tasks::{TaskSync, TasksApi};

/// One client context: a session and the task mirror that depends on it.
///
/// Build it once, call [`Taskdeck::initialize`] at startup and
/// [`Taskdeck::logout`] to tear the session down.
pub struct Taskdeck {
    config: TaskdeckConfig,
    session: Arc<SessionManager>,
    tasks: TaskSync,
}

impl Taskdeck {
    /// Create a client for the API at `api_url` with default options
    pub fn new(api_url: &str) -> Result<Self> {
        Self::from_config(TaskdeckConfig::new(api_url)?)
    }

    /// Create a client from configuration.
    ///
    /// The token is persisted at `options.token_path` when set and kept in
    /// memory otherwise.
    pub fn from_config(config: TaskdeckConfig) -> Result<Self> {
        let store: Arc<dyn TokenStore> = match &config.options.token_path {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(MemoryTokenStore::new()),
        };
        Self::with_token_store(config, store)
    }

    /// Create a client with a caller-provided token store
    pub fn with_token_store(config: TaskdeckConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.options.user_agent.clone());
        if let Some(timeout) = config.options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let session = Arc::new(SessionManager::new(
            config.base_url(),
            http_client.clone(),
            store,
        ));
        let tasks = TaskSync::new(
            TasksApi::new(config.base_url(), http_client),
            session.clone(),
        );

        debug!("Taskdeck client initialized for {}", config.base_url());

        Ok(Self {
            config,
            session,
            tasks,
        })
    }

    pub fn config(&self) -> &TaskdeckConfig {
        &self.config
    }

    /// The session manager, shareable with other components
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn tasks(&self) -> &TaskSync {
        &self.tasks
    }

    /// Restore and verify a persisted session
    pub async fn initialize(&self) -> Session {
        let session = self.session.initialize().await;
        self.tasks.sync_session();
        session
    }

    /// Sign in. Tasks mirrored for a previous session are dropped.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let user = self.session.login(email.trim(), password).await?;
        self.tasks.sync_session();
        Ok(user)
    }

    /// Check the form locally, then register and sign in
    pub async fn register(&self, form: &RegistrationForm) -> Result<User> {
        form.validate()?;
        let user = self
            .session
            .register(form.email.trim(), &form.password)
            .await?;
        self.tasks.sync_session();
        Ok(user)
    }

    /// Sign out and forget the signed-in user's tasks
    pub async fn logout(&self) {
        self.session.logout().await;
        self.tasks.clear();
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{RegistrationForm, Session, SessionStatus, User};
    pub use crate::config::{ClientOptions, TaskdeckConfig};
    pub use crate::error::Error;
    pub use crate::tasks::{NewTask, Task, TaskFilter, TaskStats, TaskUpdate};
    pub use crate::Taskdeck;
}

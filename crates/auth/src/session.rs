//! The session manager: who is logged in, and with which token

use log::{debug, info, trace, warn};
use reqwest::Client;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::error::AuthError;
use crate::fetch::{endpoint, Fetch, FetchError};
use crate::store::TokenStore;
use crate::types::{Credentials, Session, SessionStatus, TokenResponse, User};
use crate::CLIENT_INFO;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const USER_PATH: &str = "/auth/user";

/// Owns the authentication state of one client.
///
/// Construct one per application, share it behind an `Arc`, and call
/// [`SessionManager::initialize`] once at startup. Every state change is
/// published to receivers obtained from [`SessionManager::subscribe`].
pub struct SessionManager {
    base_url: String,
    http_client: Client,
    store: Arc<dyn TokenStore>,
    state: RwLock<Session>,
    state_change: broadcast::Sender<Session>,
}

impl SessionManager {
    pub fn new(base_url: &str, http_client: Client, store: Arc<dyn TokenStore>) -> Self {
        let (state_change, _) = broadcast::channel(16);
        Self {
            base_url: base_url.to_string(),
            http_client,
            store,
            state: RwLock::new(Session::default()),
            state_change,
        }
    }

    /// Receive every session transition from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Session> {
        self.state_change.subscribe()
    }

    /// Current session snapshot
    pub fn session(&self) -> Session {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.read().unwrap_or_else(|e| e.into_inner()).status
    }

    pub fn token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .token
            .clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .user
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.status() == SessionStatus::Loading
    }

    fn set_session(&self, next: Session) {
        {
            let mut current = self.state.write().unwrap_or_else(|e| e.into_inner());
            if *current == next {
                trace!("Session already {:?}, not changing.", next.status);
                return;
            }
            info!(
                "Session changing from {:?} to {:?}",
                current.status, next.status
            );
            *current = next.clone();
        }

        // No receivers is fine
        let _ = self.state_change.send(next);
    }

    /// Restore a persisted session at startup.
    ///
    /// Runs at most once: later calls return the current session untouched.
    pub async fn initialize(&self) -> Session {
        if self.status() != SessionStatus::Uninitialized {
            debug!("Session already initialized");
            return self.session();
        }

        match self.store.load().await {
            Ok(Some(token)) => {
                self.set_session(Session::loading(token));
                self.verify_session().await
            }
            Ok(None) => {
                debug!("No persisted token");
                self.set_session(Session::unauthenticated());
                self.session()
            }
            Err(e) => {
                warn!("Could not read persisted token: {}", e);
                self.set_session(Session::unauthenticated());
                self.session()
            }
        }
    }

    /// Check the current (or persisted) token against `/auth/user`.
    ///
    /// Never fails: a rejected token or a network error leaves the session
    /// unauthenticated and removes the persisted token.
    pub async fn verify_session(&self) -> Session {
        let token = match self.token() {
            Some(token) => Some(token),
            None => self.store.load().await.unwrap_or_else(|e| {
                warn!("Could not read persisted token: {}", e);
                None
            }),
        };

        let Some(token) = token else {
            self.set_session(Session::unauthenticated());
            return self.session();
        };

        match self.fetch_user(&token).await {
            Ok(user) => {
                debug!("Verified session for user {}", user.id);
                self.set_session(Session::authenticated(token, user));
            }
            Err(e) => {
                warn!("Session verification failed: {}", e);
                self.clear_store().await;
                self.set_session(Session::unauthenticated());
            }
        }

        self.session()
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.authenticate(LOGIN_PATH, email, password).await
    }

    /// Create an account and sign in to it
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.authenticate(REGISTER_PATH, email, password).await
    }

    async fn authenticate(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        match self.obtain_session(path, email, password).await {
            Ok((token, user)) => {
                info!("Signed in as {}", user.email);
                self.set_session(Session::authenticated(token, user.clone()));
                Ok(user)
            }
            Err(e) => {
                warn!("Sign-in via {} failed: {}", path, e);
                if self.status() == SessionStatus::Uninitialized {
                    self.set_session(Session::unauthenticated());
                }
                Err(e)
            }
        }
    }

    async fn obtain_session(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<(String, User), AuthError> {
        let url = endpoint(&self.base_url, path);
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };

        let issued = Fetch::post(&self.http_client, &url)
            .header("X-Client-Info", CLIENT_INFO)
            .json(&body)?
            .execute::<TokenResponse>()
            .await
            .map_err(|e| match e {
                FetchError::Status { message, .. } => AuthError::Rejected(message),
                other => AuthError::Fetch(other),
            })?;

        if issued.access_token.is_empty() {
            return Err(AuthError::Rejected("Server returned no token".to_string()));
        }

        let user = self.fetch_user(&issued.access_token).await?;
        self.store.save(&issued.access_token).await?;

        Ok((issued.access_token, user))
    }

    /// End the session locally. There is no server call and nothing to fail.
    pub async fn logout(&self) {
        self.clear_store().await;
        self.set_session(Session::unauthenticated());
    }

    /// Drop the session because the server rejected `token`.
    ///
    /// Ignored when the session has since moved on to a different token.
    /// Returns whether the session was ended.
    pub async fn invalidate(&self, token: &str) -> bool {
        if self.token().as_deref() != Some(token) {
            debug!("Ignoring rejection of a stale token");
            return false;
        }
        warn!("Server rejected the session token, signing out");
        self.logout().await;
        true
    }

    async fn clear_store(&self) {
        if let Err(e) = self.store.clear().await {
            warn!("Could not remove persisted token: {}", e);
        }
    }

    async fn fetch_user(&self, token: &str) -> Result<User, FetchError> {
        let url = endpoint(&self.base_url, USER_PATH);
        Fetch::get(&self.http_client, &url)
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(token)
            .execute::<User>()
            .await
    }
}

//! Wire and state types for authentication

use serde::{Deserialize, Serialize};

/// The authenticated account as reported by `/auth/user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
}

/// Body of `/auth/login` and `/auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Token issued by `/auth/login` and `/auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Constructed, startup verification not run yet
    #[default]
    Uninitialized,
    /// A persisted token is being verified against the server
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Snapshot of the client's authentication state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub status: SessionStatus,
}

impl Session {
    pub(crate) fn loading(token: String) -> Self {
        Self {
            user: None,
            token: Some(token),
            status: SessionStatus::Loading,
        }
    }

    pub(crate) fn authenticated(token: String, user: User) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            status: SessionStatus::Authenticated,
        }
    }

    pub(crate) fn unauthenticated() -> Self {
        Self {
            user: None,
            token: None,
            status: SessionStatus::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// True only while a persisted token is being verified at startup
    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_defaults_type() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(parsed.access_token, "abc");
        assert_eq!(parsed.token_type, "bearer");
    }

    #[test]
    fn session_flags_follow_status() {
        let user = User {
            id: 1,
            email: "a@b.co".to_string(),
        };
        let session = Session::authenticated("t".to_string(), user);
        assert!(session.is_authenticated());
        assert!(!session.is_loading());

        let loading = Session::loading("t".to_string());
        assert!(loading.is_loading());
        assert!(!loading.is_authenticated());
        assert!(loading.user.is_none());

        let empty = Session::default();
        assert_eq!(empty.status, SessionStatus::Uninitialized);
        assert!(!empty.is_authenticated());
    }
}

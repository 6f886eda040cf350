//! Configuration options for the Taskdeck client

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::Error;

/// Used when `TASKDECK_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const API_URL_ENV: &str = "TASKDECK_API_URL";
pub const TOKEN_PATH_ENV: &str = "TASKDECK_TOKEN_PATH";

/// Configuration options for the Taskdeck client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout; `None` leaves it to the transport
    pub request_timeout: Option<Duration>,

    /// Where the session token is persisted; `None` keeps it in memory
    pub token_path: Option<PathBuf>,

    /// The `User-Agent` header sent with every request
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            token_path: None,
            user_agent: taskdeck_auth::CLIENT_INFO.to_string(),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Persist the session token at `path`
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, value: &str) -> Self {
        self.user_agent = value.to_string();
        self
    }
}

/// Where the API lives and how to talk to it
#[derive(Debug, Clone)]
pub struct TaskdeckConfig {
    pub api_url: Url,
    pub options: ClientOptions,
}

impl TaskdeckConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(api_url: &str) -> Result<Self, Error> {
        let api_url = Url::parse(api_url)?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "API URL must be http or https, got '{}'",
                api_url.scheme()
            )));
        }
        Ok(Self {
            api_url,
            options: ClientOptions::default(),
        })
    }

    /// Reads `TASKDECK_API_URL` and `TASKDECK_TOKEN_PATH`, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self, Error> {
        dotenvy::dotenv().ok();

        let api_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&api_url)?;

        if let Ok(path) = std::env::var(TOKEN_PATH_ENV) {
            if !path.trim().is_empty() {
                config.options = config.options.with_token_path(path);
            }
        }
        Ok(config)
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// The API URL without a trailing slash, ready for joining endpoint paths
    pub fn base_url(&self) -> &str {
        self.api_url.as_str().trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_new_valid() {
        let config = TaskdeckConfig::new("http://localhost:8000").unwrap();
        // Url::parse adds a trailing slash to an empty path
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(config.options.request_timeout, Some(Duration::from_secs(30)));
        assert!(config.options.token_path.is_none());
    }

    #[test]
    fn config_keeps_api_prefix() {
        let config = TaskdeckConfig::new("https://tasks.example.com/api/").unwrap();
        assert_eq!(config.base_url(), "https://tasks.example.com/api");
    }

    #[test]
    fn config_new_invalid_url() {
        match TaskdeckConfig::new("not a valid url") {
            Err(Error::Url(_)) => {}
            other => panic!("Expected Url error, got {:?}", other.map(|c| c.api_url)),
        }
    }

    #[test]
    fn config_rejects_other_schemes() {
        match TaskdeckConfig::new("ftp://example.com") {
            Err(Error::Config(msg)) => assert!(msg.contains("http or https")),
            other => panic!("Expected Config error, got {:?}", other.map(|c| c.api_url)),
        }
    }

    #[test]
    fn options_builder() {
        let options = ClientOptions::default()
            .with_request_timeout(None)
            .with_token_path("/tmp/taskdeck/session.json")
            .with_user_agent("custom/1.0");
        assert_eq!(options.request_timeout, None);
        assert_eq!(
            options.token_path,
            Some(PathBuf::from("/tmp/taskdeck/session.json"))
        );
        assert_eq!(options.user_agent, "custom/1.0");
    }
}

/*
[INPUT]:  Application credentials and optional overrides
[OUTPUT]: Validated immutable SDK configuration
[POS]:    Data layer - client configuration
[UPDATE]: When adding configuration fields or changing defaults
*/

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::{Result, ZaplinkError};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://app.zaplink.filano.dev";

/// Default session lifetime (4 hours)
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(4 * 60 * 60);

/// Target environment for API calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

/// Zaplink SDK configuration
///
/// `api_key`, `secret_key` and `app_id` are required; the client refuses to
/// construct without them. Everything else has a default. The configuration
/// is owned by one client instance and never mutated after construction.
#[derive(Debug, Clone)]
pub struct ZaplinkConfig {
    pub api_key: String,
    pub secret_key: String,
    pub app_id: String,
    pub base_url: String,
    pub callback_url: String,
    pub environment: Environment,
    pub debug: bool,
    pub session_timeout: Duration,
}

impl ZaplinkConfig {
    /// Create a configuration with the required fields and defaults for the rest
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            app_id: app_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            callback_url: String::new(),
            environment: Environment::default(),
            debug: false,
            session_timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the callback URL the identity provider redirects back to
    pub fn with_callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = callback_url.into();
        self
    }

    /// Select the target environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Enable verbose init-time logging
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Override the persisted session lifetime
    pub fn with_session_timeout(mut self, session_timeout: Duration) -> Self {
        self.session_timeout = session_timeout;
        self
    }

    /// Validate required fields; fatal at client construction
    pub(crate) fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ZaplinkError::Config("api_key is required".to_string()));
        }
        if self.secret_key.is_empty() {
            return Err(ZaplinkError::Config("secret_key is required".to_string()));
        }
        if self.app_id.is_empty() {
            return Err(ZaplinkError::Config("app_id is required".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "s1", "5", "api_key")]
    #[case("k1", "", "5", "secret_key")]
    #[case("k1", "s1", "", "app_id")]
    fn test_validate_rejects_missing_required_field(
        #[case] api_key: &str,
        #[case] secret_key: &str,
        #[case] app_id: &str,
        #[case] field: &str,
    ) {
        let config = ZaplinkConfig::new(api_key, secret_key, app_id);
        let err = config.validate().unwrap_err();
        match err {
            ZaplinkError::Config(message) => assert!(message.contains(field)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = ZaplinkConfig::new("k1", "s1", "5");
        assert!(config.validate().is_ok());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.debug);
        assert_eq!(config.session_timeout, DEFAULT_SESSION_TIMEOUT);
    }
}

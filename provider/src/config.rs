//! Provider configuration as supplied by the host.

use std::sync::Arc;

use archestra_client::{ApiError, ApiKeyAuth, ArchestraClient, Transport, UserAgent};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!("archestra-provider/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid provider configuration: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("base_url must be set")]
    MissingBaseUrl,

    #[error("base_url '{url}' is not a valid URL: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base_url '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("api_key must not be empty when set")]
    EmptyApiKey,

    #[error(transparent)]
    Client(#[from] ApiError),
}

#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ProviderConfig {
    pub fn from_json(config: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(config).map_err(ConfigError::Decode)
    }

    /// Check the base URL without building a client.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;
        let url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(raw.to_string()));
        }
        if self.api_key.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(url)
    }

    /// Build a client with the auth and user-agent editors installed.
    pub fn client(&self, transport: Arc<dyn Transport>) -> Result<ArchestraClient, ConfigError> {
        let url = self.validate()?;
        let user_agent = self.user_agent.clone().unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let mut client = ArchestraClient::new(url.as_str(), transport)?.with_editor(UserAgent(user_agent));
        if let Some(key) = &self.api_key {
            client = client.with_editor(ApiKeyAuth::new(key.clone()));
        }
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn requires_a_base_url() {
        let config = ProviderConfig::from_json(json!({ "api_key": "k" })).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingBaseUrl)));
    }

    #[test]
    fn rejects_relative_and_non_http_urls() {
        let relative = ProviderConfig::from_json(json!({ "base_url": "localhost:9000/api" })).unwrap();
        assert!(relative.validate().is_err());
        let ftp = ProviderConfig::from_json(json!({ "base_url": "ftp://example.com" })).unwrap();
        assert!(matches!(ftp.validate(), Err(ConfigError::UnsupportedScheme(_))));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            ProviderConfig::from_json(json!({ "base_url": "http://x", "token": "t" })),
            Err(ConfigError::Decode(_))
        ));
    }

    #[test]
    fn debug_redacts_the_key() {
        let config = ProviderConfig {
            base_url: Some("http://localhost:9000".into()),
            api_key: Some("secret".into()),
            user_agent: None,
        };
        assert!(!format!("{config:?}").contains("secret"));
    }
}

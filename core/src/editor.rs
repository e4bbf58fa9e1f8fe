//! Request editors: functions applied to a built request before dispatch.
//!
//! Editors run on every request, possibly concurrently on different request
//! values, so they must not hold mutable shared state.

use crate::error::ApiError;
use crate::http::HttpRequest;

pub trait RequestEditor: Send + Sync {
    fn edit(&self, request: &mut HttpRequest) -> Result<(), ApiError>;
}

impl<F> RequestEditor for F
where
    F: Fn(&mut HttpRequest) -> Result<(), ApiError> + Send + Sync,
{
    fn edit(&self, request: &mut HttpRequest) -> Result<(), ApiError> {
        self(request)
    }
}

/// Sends the API key verbatim in the `Authorization` header.
#[derive(Clone)]
pub struct ApiKeyAuth {
    key: String,
}

impl ApiKeyAuth {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth").field("key", &"<redacted>").finish()
    }
}

impl RequestEditor for ApiKeyAuth {
    fn edit(&self, request: &mut HttpRequest) -> Result<(), ApiError> {
        if self.key.is_empty() {
            return Err(ApiError::Editor("API key is empty".to_string()));
        }
        request.set_header("Authorization", self.key.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UserAgent(pub String);

impl RequestEditor for UserAgent {
    fn edit(&self, request: &mut HttpRequest) -> Result<(), ApiError> {
        request.set_header("User-Agent", self.0.clone());
        Ok(())
    }
}

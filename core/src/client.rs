//! Client facade for the Archestra REST API.
//!
//! # Design
//! `ArchestraClient` holds the base URL, a shared `Transport`, and the
//! default request editors. Every API operation comes in three layers:
//!
//! - `build_*`: pure, produces an `HttpRequest` (tested without I/O);
//! - [`ArchestraClient::execute`]: the raw form, applies editors and runs the
//!   transport under a cancellation scope, returning the `HttpResponse`;
//! - the typed method (e.g. `get_user`): build, execute, then dispatch into
//!   an `ApiResponse<T>`.
//!
//! The client is `Clone + Send + Sync` and holds no mutable state, so one
//! instance can serve concurrently running resource operations.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::codec::{encode_json, operation_url, parse_base_url, CONTENT_TYPE_JSON};
use crate::editor::RequestEditor;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::response::{dispatch, ApiResponse, SuccessStatuses};
use crate::transport::Transport;

#[derive(Clone)]
pub struct ArchestraClient {
    base_url: Url,
    transport: Arc<dyn Transport>,
    editors: Vec<Arc<dyn RequestEditor>>,
}

impl std::fmt::Debug for ArchestraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchestraClient")
            .field("base_url", &self.base_url.as_str())
            .field("editors", &self.editors.len())
            .finish_non_exhaustive()
    }
}

impl ArchestraClient {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            transport,
            editors: Vec::new(),
        })
    }

    /// Add a default editor, applied to every request before per-call editors.
    #[must_use]
    pub fn with_editor(mut self, editor: impl RequestEditor + 'static) -> Self {
        self.editors.push(Arc::new(editor));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn request(
        &self,
        method: HttpMethod,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<HttpRequest, ApiError> {
        let url = operation_url(&self.base_url, segments, query)?;
        Ok(HttpRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        })
    }

    pub(crate) fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        segments: &[&str],
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let mut request = self.request(method, segments, &[])?;
        request.body = Some(encode_json(body)?);
        request.set_header("Content-Type", CONTENT_TYPE_JSON);
        Ok(request)
    }

    /// Raw form: apply default then per-call editors, run the transport, and
    /// return the response untouched. Transport errors are returned verbatim.
    pub async fn execute(
        &self,
        scope: &CancellationToken,
        mut request: HttpRequest,
        editors: &[&dyn RequestEditor],
    ) -> Result<HttpResponse, ApiError> {
        if scope.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        for editor in &self.editors {
            editor.edit(&mut request)?;
        }
        for editor in editors {
            editor.edit(&mut request)?;
        }

        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, %url, "sending request");

        let response = tokio::select! {
            biased;
            () = scope.cancelled() => {
                tracing::debug!(%method, %url, "request cancelled");
                return Err(ApiError::Cancelled);
            }
            response = self.transport.execute(request) => response?,
        };

        tracing::debug!(%method, %url, status = response.status, "received response");
        Ok(response)
    }

    /// Typed form: execute and dispatch into the declared variant slots.
    pub(crate) async fn call<T, S>(
        &self,
        scope: &CancellationToken,
        request: HttpRequest,
        editors: &[&dyn RequestEditor],
        success: &S,
    ) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        S: SuccessStatuses + ?Sized,
    {
        let response = self.execute(scope, request, editors).await?;
        dispatch(response, success)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::editor::{ApiKeyAuth, UserAgent};

    /// Transport that records requests and answers with a fixed response.
    pub(crate) struct Recorder {
        pub requests: Mutex<Vec<HttpRequest>>,
        pub reply: HttpResponse,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }
    }

    pub(crate) fn recorder(status: u16, body: &str) -> Arc<Recorder> {
        Arc::new(Recorder {
            requests: Mutex::new(Vec::new()),
            reply: HttpResponse {
                status,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: body.as_bytes().to_vec(),
            },
        })
    }

    pub(crate) fn client() -> ArchestraClient {
        ArchestraClient::new("http://localhost:9000", recorder(200, "{}")).unwrap()
    }

    #[tokio::test]
    async fn default_editors_run_before_call_editors() {
        let transport = recorder(200, "{}");
        let client = ArchestraClient::new("http://localhost:9000", transport.clone())
            .unwrap()
            .with_editor(ApiKeyAuth::new("key-1"))
            .with_editor(UserAgent("test-agent".to_string()));
        let override_key = |req: &mut HttpRequest| -> Result<(), ApiError> {
            req.set_header("Authorization", "key-2");
            Ok(())
        };

        let req = client.request(HttpMethod::Get, &["v1", "users"], &[]).unwrap();
        client
            .execute(&CancellationToken::new(), req, &[&override_key])
            .await
            .unwrap();

        let sent = transport.requests.lock().unwrap();
        assert_eq!(sent[0].header("authorization"), Some("key-2"));
        assert_eq!(sent[0].header("user-agent"), Some("test-agent"));
    }

    #[tokio::test]
    async fn cancelled_scope_never_reaches_transport() {
        let transport = recorder(200, "{}");
        let client = ArchestraClient::new("http://localhost:9000", transport.clone()).unwrap();
        let scope = CancellationToken::new();
        scope.cancel();

        let req = client.request(HttpMethod::Get, &["v1", "users"], &[]).unwrap();
        let err = client.execute(&scope, req, &[]).await.unwrap_err();

        assert!(matches!(err, ApiError::Cancelled));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn editor_failure_aborts_request() {
        let transport = recorder(200, "{}");
        let client = ArchestraClient::new("http://localhost:9000", transport.clone())
            .unwrap()
            .with_editor(ApiKeyAuth::new(""));
        let req = client.request(HttpMethod::Get, &["v1", "users"], &[]).unwrap();
        let err = client.execute(&CancellationToken::new(), req, &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Editor(_)));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn json_request_sets_content_type() {
        let req = client()
            .json_request(HttpMethod::Post, &["v1", "roles"], &serde_json::json!({"name": "r"}))
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"r"}"#));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ArchestraClient::new("localhost:9000/api", recorder(200, "{}")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { .. }));
    }
}

//! Shared fixtures for provider integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use archestra_client::{ApiError, HttpRequest, HttpResponse, Transport};
use archestra_provider::ArchestraProvider;
use async_trait::async_trait;
use serde_json::{json, Value as Json};

pub const BASE_URL: &str = "http://archestra.test";

/// Replays canned responses in order and records every request it sees.
/// A request arriving after the script is exhausted gets a 599.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, status: u16, body: Json) -> &Self {
        self.replies.lock().unwrap().push_back(HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string().into_bytes(),
        });
        self
    }

    pub fn reply_empty(&self, status: u16) -> &Self {
        self.replies.lock().unwrap().push_back(HttpResponse {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `METHOD /path?query` for each request, in order.
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| {
                let path = r.url.strip_prefix(BASE_URL).unwrap_or(&r.url);
                format!("{} {}", r.method, path)
            })
            .collect()
    }

    pub fn body(&self, index: usize) -> Json {
        let requests = self.requests();
        let raw = requests[index].body.as_deref().expect("request has a body");
        serde_json::from_str(raw).unwrap()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();
        Ok(reply.unwrap_or(HttpResponse {
            status: 599,
            headers: Vec::new(),
            body: b"script exhausted".to_vec(),
        }))
    }
}

/// Never answers; only cancellation ends a call.
pub struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
        std::future::pending().await
    }
}

pub fn configured(transport: Arc<dyn Transport>) -> ArchestraProvider {
    let mut provider = ArchestraProvider::with_transport(transport);
    let diags = provider.configure(json!({ "base_url": BASE_URL, "api_key": "test-key" }));
    assert!(diags.is_empty(), "{diags:?}");
    provider
}

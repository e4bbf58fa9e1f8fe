//! Diagnostics returned to the host.
//!
//! Adapter failures are data: every handler appends to a `Diagnostics`
//! collection and the host decides what to show. Only errors block an
//! apply; warnings are informational.

use std::fmt;

use archestra_client::{ApiError, ApiResponse, Outcome};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Path to an attribute, e.g. `members[1].user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttributePath(String);

impl AttributePath {
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.0.push_str(&format!("[{index}]"));
        self
    }

    #[must_use]
    pub fn key(mut self, name: &str) -> Self {
        self.0.push('.');
        self.0.push_str(name);
        self
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary, detail)
        }
    }

    #[must_use]
    pub fn at(mut self, attribute: AttributePath) -> Self {
        self.attribute = Some(attribute);
        self
    }

    /// A request that never produced a usable response.
    pub fn client_error(operation: &str, err: &ApiError) -> Self {
        Self::error("Client Error", format!("Unable to {operation}, got error: {err}"))
    }

    /// A response outside the statuses the operation accepts.
    pub fn unexpected_response<T>(operation: &str, response: &ApiResponse<T>) -> Self {
        let detail = match &response.outcome {
            Outcome::Empty { status } => {
                format!("Unable to {operation}: HTTP {status} response carried no JSON body")
            }
            _ => format!(
                "Unable to {operation}, got HTTP {}: {}",
                response.status(),
                response.body_excerpt()
            ),
        };
        Self::error("API Error", detail)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(path) => write!(f, "{}: {} ({})", self.summary, self.detail, path),
            None => write!(f, "{}: {}", self.summary, self.detail),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::warn!(summary = %diagnostic.summary, detail = %diagnostic.detail, "error diagnostic"),
            Severity::Warning => tracing::debug!(summary = %diagnostic.summary, "warning diagnostic"),
        }
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Error)
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use archestra_client::HttpResponse;

    use super::*;

    #[test]
    fn attribute_paths_compose() {
        let path = AttributePath::root("members").index(1).key("user_id");
        assert_eq!(path.to_string(), "members[1].user_id");
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("Heads up", "nothing broke"));
        assert!(!diags.has_errors());
        diags.push(Diagnostic::error("Broken", "it broke"));
        assert!(diags.has_errors());
        assert_eq!(diags.errors().count(), 1);
    }

    #[test]
    fn unexpected_response_includes_status_and_excerpt() {
        let response = ApiResponse::<()> {
            raw: HttpResponse {
                status: 500,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: br#"{"error":{"message":"boom"}}"#.to_vec(),
            },
            outcome: Outcome::Failure {
                status: 500,
                error: Some(archestra_client::ErrorBody(serde_json::json!({"error": {"message": "boom"}}))),
            },
        };
        let diag = Diagnostic::unexpected_response("create user", &response);
        assert_eq!(diag.detail, "Unable to create user, got HTTP 500: boom");
    }

    #[test]
    fn cancellation_becomes_client_error() {
        let diag = Diagnostic::client_error("read team", &ApiError::Cancelled);
        assert_eq!(diag.detail, "Unable to read team, got error: request cancelled");
    }
}

//! Response dispatcher.
//!
//! A typed response is a discriminated union over the status code and the
//! content type. A body is decoded only when the status is one the operation
//! declares and the `Content-Type` header contains `json` (substring match,
//! so charset parameters are tolerated).

use std::ops::Range;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::codec::decode_json;
use crate::error::ApiError;
use crate::http::HttpResponse;

/// Success statuses accepted by existence-only endpoints.
pub const ANY_2XX: Range<u16> = 200..300;

/// The set of statuses an operation declares as success.
pub trait SuccessStatuses {
    fn declares(&self, status: u16) -> bool;
}

impl SuccessStatuses for [u16] {
    fn declares(&self, status: u16) -> bool {
        self.contains(&status)
    }
}

impl<const N: usize> SuccessStatuses for [u16; N] {
    fn declares(&self, status: u16) -> bool {
        self.contains(&status)
    }
}

impl SuccessStatuses for Range<u16> {
    fn declares(&self, status: u16) -> bool {
        self.contains(&status)
    }
}

const EXCERPT_LIMIT: usize = 512;

/// Error payload returned by the API. The shape varies between endpoints, so
/// it is kept as raw JSON and inspected on demand.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ErrorBody(pub serde_json::Value);

impl ErrorBody {
    /// Best-effort human-readable message: `error.message`, `error`, or
    /// `message`, in that order.
    pub fn message(&self) -> Option<String> {
        let value = &self.0;
        if let Some(msg) = value.pointer("/error/message").and_then(|v| v.as_str()) {
            return Some(msg.to_string());
        }
        if let Some(msg) = value.get("error").and_then(|v| v.as_str()) {
            return Some(msg.to_string());
        }
        value.get("message").and_then(|v| v.as_str()).map(str::to_string)
    }
}

/// Which variant slot a response landed in.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// A declared success status with a JSON body.
    Success { status: u16, body: T },
    /// A declared success status without a JSON body (204, or a non-JSON
    /// content type). Callers that need a body must treat this as an error.
    Empty { status: u16 },
    /// 404. The object is absent on the server.
    NotFound(Option<ErrorBody>),
    /// Any other status.
    Failure { status: u16, error: Option<ErrorBody> },
}

/// Typed response: the raw response plus the decoded variant.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub raw: HttpResponse,
    pub outcome: Outcome<T>,
}

impl<T> ApiResponse<T> {
    pub fn status(&self) -> u16 {
        self.raw.status
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.outcome, Outcome::NotFound(_))
    }

    /// The decoded success body, if any.
    pub fn success(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self.outcome {
            Outcome::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True for any declared success, with or without a body.
    pub fn is_declared_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. } | Outcome::Empty { .. })
    }

    /// Error message from the body if the server sent one, otherwise a
    /// truncated copy of the raw body.
    pub fn body_excerpt(&self) -> String {
        let from_error = match &self.outcome {
            Outcome::NotFound(Some(e)) | Outcome::Failure { error: Some(e), .. } => e.message(),
            _ => None,
        };
        from_error.unwrap_or_else(|| excerpt(&self.raw.body_text()))
    }

    /// Convert a non-success outcome into `ApiError::UnexpectedStatus`.
    pub fn require_success(self) -> Result<Self, ApiError> {
        if self.is_declared_success() {
            Ok(self)
        } else {
            Err(ApiError::UnexpectedStatus {
                status: self.status(),
                body: self.body_excerpt(),
            })
        }
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_LIMIT {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(EXCERPT_LIMIT).collect();
    cut.push('…');
    cut
}

fn is_json(response: &HttpResponse) -> bool {
    response.content_type().is_some_and(|ct| ct.contains("json"))
}

/// Select the variant slot for `response`.
///
/// Fails only when a declared success carries a JSON body that does not
/// decode into `T`; error bodies are decoded leniently.
pub fn dispatch<T, S>(response: HttpResponse, success: &S) -> Result<ApiResponse<T>, ApiError>
where
    T: DeserializeOwned,
    S: SuccessStatuses + ?Sized,
{
    let status = response.status;
    let json = is_json(&response) && !response.body.is_empty();

    let outcome = if success.declares(status) {
        if json {
            Outcome::Success {
                status,
                body: decode_json(status, &response.body)?,
            }
        } else {
            Outcome::Empty { status }
        }
    } else {
        let error = if json {
            serde_json::from_slice::<ErrorBody>(&response.body).ok()
        } else {
            None
        };
        if status == 404 {
            Outcome::NotFound(error)
        } else {
            Outcome::Failure { status, error }
        }
    };

    Ok(ApiResponse { raw: response, outcome })
}

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Error reply in the API's `{ "error": { "message": ... } }` shape.
#[derive(Debug)]
pub enum ApiFailure {
    NotFound(&'static str),
    Conflict(String),
    BadRequest(String),
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::Conflict(msg) | Self::BadRequest(msg) => f.write_str(msg),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        tracing::debug!(%status, error = %self, "request rejected");
        (status, Json(json!({ "error": { "message": self.to_string() } }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiFailure>;

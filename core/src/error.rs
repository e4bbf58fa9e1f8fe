//! Error types for the Archestra API client.
//!
//! # Design
//! HTTP status codes are not errors at this layer: every status the server
//! returns is surfaced through `ApiResponse` so callers can decide what a 404
//! means for them. `ApiError` covers everything that prevents a response from
//! being produced or understood.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL cannot host operation paths.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A JSON body matched a declared status but did not fit the expected
    /// shape. The raw body is kept for diagnostics.
    #[error("deserialization failed for HTTP {status}: {source}")]
    Decode {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// A request editor refused the request.
    #[error("request editor failed: {0}")]
    Editor(String),

    /// DNS, TCP, TLS, or any other failure below HTTP.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The cancellation scope fired before the response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The server answered with a status the caller does not accept.
    #[error("HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

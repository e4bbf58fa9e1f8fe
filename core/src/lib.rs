//! Async API client core for the Archestra REST API.
//!
//! # Overview
//! Every operation is split into a pure `build_*` step that produces an
//! `HttpRequest` and a typed step that runs it through a pluggable
//! [`Transport`] and dispatches the response into an [`ApiResponse`].
//! Request construction stays deterministic and testable without I/O.
//!
//! # Design
//! - `ArchestraClient` holds only the base URL, the transport, and the default
//!   request editors; it is cheap to clone and safe to share.
//! - HTTP status codes are data, not errors. The dispatcher places each
//!   response into one `Outcome` variant and the caller decides what a 404
//!   means.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

mod api;
pub mod client;
pub mod codec;
pub mod editor;
pub mod error;
pub mod http;
pub mod response;
pub mod transport;
pub mod types;

pub use client::ArchestraClient;
pub use editor::{ApiKeyAuth, RequestEditor, UserAgent};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use response::{ApiResponse, ErrorBody, Outcome};
pub use tokio_util::sync::CancellationToken;
pub use transport::{ReqwestTransport, Transport};
pub use types::*;

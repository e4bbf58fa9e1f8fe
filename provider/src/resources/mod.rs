//! Resource adapters, one module per resource type.
//!
//! The helpers below fold the three failure kinds (validation, transport,
//! API status) into diagnostics so each adapter reads as a straight line.

use archestra_client::{ApiError, ApiResponse, Outcome};

use crate::diag::{Diagnostic, Diagnostics};
use crate::value::Value;

pub mod agent_tool;
pub mod mcp_server_team_access;
pub mod role;
pub mod team;
pub mod trusted_data_policy;
pub mod user;
pub mod user_role_assignment;

/// What a read-style call found.
pub(crate) enum Fetched<T> {
    Found(T),
    /// 404: the object is gone.
    Missing,
    /// A diagnostic has already been recorded.
    Failed,
}

/// Unwrap a call whose success must carry a body.
pub(crate) fn expect_body<T>(
    operation: &str,
    result: Result<ApiResponse<T>, ApiError>,
    diags: &mut Diagnostics,
) -> Option<T> {
    match result {
        Ok(ApiResponse {
            outcome: Outcome::Success { body, .. },
            ..
        }) => Some(body),
        Ok(response) => {
            diags.push(Diagnostic::unexpected_response(operation, &response));
            None
        }
        Err(e) => {
            diags.push(Diagnostic::client_error(operation, &e));
            None
        }
    }
}

/// Like [`expect_body`] but separates 404 from other failures.
pub(crate) fn fetch<T>(operation: &str, result: Result<ApiResponse<T>, ApiError>, diags: &mut Diagnostics) -> Fetched<T> {
    match result {
        Ok(response) if response.is_not_found() => Fetched::Missing,
        other => match expect_body(operation, other, diags) {
            Some(body) => Fetched::Found(body),
            None => Fetched::Failed,
        },
    }
}

/// Accept any declared success, with or without a body.
pub(crate) fn expect_success<T>(
    operation: &str,
    result: Result<ApiResponse<T>, ApiError>,
    diags: &mut Diagnostics,
) -> bool {
    match result {
        Ok(response) if response.is_declared_success() => true,
        Ok(response) => {
            diags.push(Diagnostic::unexpected_response(operation, &response));
            false
        }
        Err(e) => {
            diags.push(Diagnostic::client_error(operation, &e));
            false
        }
    }
}

/// Deletes are idempotent: success and 404 both count as done.
pub(crate) fn expect_deleted<T>(operation: &str, result: Result<ApiResponse<T>, ApiError>, diags: &mut Diagnostics) {
    if let Ok(response) = &result {
        if response.is_not_found() {
            tracing::debug!(operation, "already deleted");
            return;
        }
    }
    expect_success(operation, result, diags);
}

/// Record a validation failure and report whether the value was usable.
pub(crate) fn check<T>(result: Result<T, Diagnostic>, diags: &mut Diagnostics) -> Option<T> {
    result.map_err(|d| diags.push(d)).ok()
}

/// Write-back after create/update: the server's value wins, and a value the
/// server omitted keeps what was planned.
pub(crate) fn echoed<T>(server: Option<T>, planned: Value<T>) -> Value<T> {
    match server {
        Some(value) => Value::Known(value),
        None if planned.is_known() => planned,
        None => Value::Null,
    }
}

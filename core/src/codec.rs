//! Wire codec: JSON bodies and URL construction.
//!
//! Path parameters follow the OpenAPI "simple" style for scalars: each is
//! percent-escaped as a single path segment. The operation path is appended to the base URL exactly once, so a
//! base such as `https://host/prefix/` yields `https://host/prefix/v1/users`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::ApiError;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Parse and validate a base URL.
pub fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
    let url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason: "URL cannot carry a path".to_string(),
        });
    }
    Ok(url)
}

/// Join path segments (already in simple style) and query pairs onto `base`.
///
/// Segments are escaped individually, so a `/` inside a parameter never
/// introduces a new path level.
pub fn operation_url(base: &Url, segments: &[&str], query: &[(&str, String)]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut path = url.path_segments_mut().map_err(|()| ApiError::InvalidUrl {
            url: base.to_string(),
            reason: "URL cannot carry a path".to_string(),
        })?;
        path.pop_if_empty();
        path.extend(segments);
    }
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

pub fn encode_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(ApiError::Serialization)
}

pub fn decode_json<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|source| ApiError::Decode {
        status,
        body: String::from_utf8_lossy(body).into_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        parse_base_url(s).unwrap()
    }

    #[test]
    fn path_is_appended_to_bare_host() {
        let url = operation_url(&base("http://localhost:9000"), &["v1", "users"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/v1/users");
    }

    #[test]
    fn path_is_appended_once_under_prefix() {
        let url = operation_url(&base("https://api.example.com/archestra/"), &["v1", "roles"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/archestra/v1/roles");

        let url = operation_url(&base("https://api.example.com/archestra"), &["v1", "roles"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/archestra/v1/roles");
    }

    #[test]
    fn scalar_segments_are_escaped() {
        let url = operation_url(&base("http://h"), &["api", "teams", "a/b c"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://h/api/teams/a%2Fb%20c");
    }

    #[test]
    fn query_pairs_are_encoded() {
        let url = operation_url(
            &base("http://h"),
            &["api", "agent-tools"],
            &[("agentId", "x y".to_string()), ("limit", "100".to_string())],
        )
        .unwrap();
        assert_eq!(url.as_str(), "http://h/api/agent-tools?agentId=x+y&limit=100");
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(matches!(parse_base_url("ftp://h"), Err(ApiError::InvalidUrl { .. })));
        assert!(matches!(parse_base_url("not a url"), Err(ApiError::InvalidUrl { .. })));
    }

    #[test]
    fn decode_error_keeps_raw_body() {
        let err = decode_json::<serde_json::Value>(200, b"not json").unwrap_err();
        match err {
            ApiError::Decode { status, body, .. } => {
                assert_eq!(status, 200);
                assert_eq!(body, "not json");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! Shared HTTP plumbing for the REST adapters.
//!
//! Every remote adapter funnels requests through [`execute`] so that
//! cancellation, transport failures and HTTP status codes are classified the
//! same way: timeouts, connect failures, 408, 429 and 5xx are retriable;
//! everything else is not.

use repo_indexer_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Identifies a remote service in error codes and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remote {
    /// Human-readable name used in messages (`"Gemini"`).
    pub name: &'static str,
    /// Error code namespace (`"embedding"`).
    pub namespace: &'static str,
    /// Prefix for adapter-specific error codes (`"gemini"`).
    pub slug: &'static str,
}

impl Remote {
    fn code(self, suffix: &str) -> ErrorCode {
        ErrorCode::new(self.namespace, format!("{}_{suffix}", self.slug))
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug)]
pub struct HttpReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Decode a successful body, or classify a failed one.
    pub fn into_json<T: DeserializeOwned>(self, remote: Remote) -> Result<T> {
        if !self.status.is_success() {
            return Err(map_http_error(remote, self.status, &self.body));
        }
        decode_json(remote, &self.body)
    }
}

/// Build a client with a request timeout and default headers.
pub fn build_client(remote: Remote, timeout_ms: u64, headers: HeaderMap) -> Result<reqwest::Client> {
    if timeout_ms == 0 {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "timeout must be greater than zero",
        ));
    }
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .default_headers(headers)
        .build()
        .map_err(|error| {
            ErrorEnvelope::unexpected(
                remote.code("client_init_failed"),
                format!("failed to build {} client: {error}", remote.name),
                ErrorClass::NonRetriable,
            )
        })
}

/// Insert a header whose value must never show up in logs.
pub fn insert_sensitive(
    headers: &mut HeaderMap,
    name: &'static str,
    value: &str,
    label: &str,
) -> Result<()> {
    let mut header = HeaderValue::from_str(value).map_err(|_| {
        ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("{label} contains invalid header characters"),
        )
    })?;
    header.set_sensitive(true);
    headers.insert(HeaderName::from_static(name), header);
    Ok(())
}

/// Trim a required string setting, rejecting blanks.
pub fn normalize_required(label: &str, value: &str) -> Result<Box<str>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("{label} must be set"),
        ));
    }
    Ok(trimmed.into())
}

/// Strip trailing slashes from a base URL.
pub fn normalize_base_url(label: &str, value: &str) -> Result<Box<str>> {
    let trimmed = normalize_required(label, value)?;
    let stripped = trimmed.trim_end_matches('/');
    if stripped.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("{label} must be non-empty"),
        ));
    }
    Ok(stripped.into())
}

/// Send a request and read the full body, aborting on cancellation.
pub async fn execute(
    ctx: &RequestContext,
    remote: Remote,
    request: RequestBuilder,
    operation: &'static str,
) -> Result<HttpReply> {
    ctx.ensure_not_cancelled(operation)?;

    let response = tokio::select! {
        () = ctx.cancelled() => return Err(cancelled_error(operation)),
        result = request.send() => result.map_err(|error| map_reqwest_error(remote, &error))?,
    };

    let status = response.status();
    let headers = response.headers().clone();
    let body = tokio::select! {
        () = ctx.cancelled() => return Err(cancelled_error(operation)),
        result = response.bytes() => result.map_err(|error| map_reqwest_error(remote, &error))?,
    };

    Ok(HttpReply {
        status,
        headers,
        body: body.to_vec(),
    })
}

/// Decode a JSON body into `T`.
pub fn decode_json<T: DeserializeOwned>(remote: Remote, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|error| {
        ErrorEnvelope::unexpected(
            remote.code("invalid_response"),
            format!("failed to decode {} response: {error}", remote.name),
            ErrorClass::NonRetriable,
        )
    })
}

pub fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}

pub fn map_reqwest_error(remote: Remote, error: &reqwest::Error) -> ErrorEnvelope {
    if error.is_timeout() {
        return ErrorEnvelope::unexpected(
            ErrorCode::timeout(),
            format!("{} request timed out", remote.name),
            ErrorClass::Retriable,
        );
    }
    if error.is_connect() {
        return ErrorEnvelope::unexpected(
            ErrorCode::io(),
            format!("{} connection failed: {error}", remote.name),
            ErrorClass::Retriable,
        );
    }
    ErrorEnvelope::unexpected(
        remote.code("request_failed"),
        format!("{} request failed: {error}", remote.name),
        ErrorClass::NonRetriable,
    )
}

/// Classify a non-success status, using the provider message when the body is JSON.
pub fn map_http_error(remote: Remote, status: StatusCode, payload: &[u8]) -> ErrorEnvelope {
    let message = extract_error_message(payload).unwrap_or_else(|| {
        format!(
            "{} request failed with status {}",
            remote.name,
            status.as_u16()
        )
    });

    let envelope = match status.as_u16() {
        400 | 404 | 422 => ErrorEnvelope::expected(ErrorCode::invalid_input(), message),
        401 | 403 => ErrorEnvelope::expected(ErrorCode::permission_denied(), message),
        408 => ErrorEnvelope::unexpected(ErrorCode::timeout(), message, ErrorClass::Retriable),
        429 => ErrorEnvelope::unexpected(ErrorCode::rate_limited(), message, ErrorClass::Retriable),
        _ if status.is_server_error() => ErrorEnvelope::unexpected(
            ErrorCode::dependency_unavailable(),
            message,
            ErrorClass::Retriable,
        ),
        _ => ErrorEnvelope::unexpected(remote.code("http_error"), message, ErrorClass::NonRetriable),
    };

    envelope
        .with_metadata("status", status.as_u16().to_string())
        .with_metadata("provider", remote.slug)
}

// Providers disagree on shape: `{ "error": { "message" } }`, `{ "error": "..." }`
// or a top-level `{ "message" }`.
fn extract_error_message(payload: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(payload).ok()?;
    let error = value.get("error");
    error
        .and_then(|error| error.get("message"))
        .or_else(|| error.filter(|error| error.is_string()))
        .or_else(|| value.get("message"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REMOTE: Remote = Remote {
        name: "Example",
        namespace: "embedding",
        slug: "example",
    };

    #[test]
    fn retriable_statuses() {
        for status in [408, 429, 500, 502, 503] {
            let status = StatusCode::from_u16(status).expect("status");
            assert!(map_http_error(REMOTE, status, b"").is_retriable(), "{status}");
        }
        for status in [400, 401, 403, 404, 409, 422] {
            let status = StatusCode::from_u16(status).expect("status");
            assert!(!map_http_error(REMOTE, status, b"").is_retriable(), "{status}");
        }
    }

    #[test]
    fn provider_message_is_used_when_json() {
        let error = map_http_error(
            REMOTE,
            StatusCode::UNAUTHORIZED,
            br#"{ "error": { "message": "bad key" } }"#,
        );
        assert_eq!(error.code, ErrorCode::permission_denied());
        assert_eq!(error.message, "bad key");
        assert_eq!(error.metadata.get("status").map(String::as_str), Some("401"));

        let error = map_http_error(REMOTE, StatusCode::NOT_FOUND, br#"{ "message": "Not Found" }"#);
        assert_eq!(error.message, "Not Found");
    }

    #[test]
    fn non_json_body_gets_generic_message() {
        let error = map_http_error(REMOTE, StatusCode::BAD_GATEWAY, b"<html>upstream</html>");
        assert_eq!(error.code, ErrorCode::dependency_unavailable());
        assert_eq!(error.message, "Example request failed with status 502");
    }

    #[test]
    fn unmapped_status_uses_adapter_code() {
        let error = map_http_error(REMOTE, StatusCode::CONFLICT, b"{}");
        assert_eq!(error.code, ErrorCode::new("embedding", "example_http_error"));
    }

    #[test]
    fn base_url_loses_trailing_slashes() {
        assert_eq!(
            normalize_base_url("base url", " https://api.example.com/v1// ").expect("url").as_ref(),
            "https://api.example.com/v1"
        );
        assert!(normalize_base_url("base url", "  ").is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(build_client(REMOTE, 0, HeaderMap::new()).is_err());
    }
}

//! Failure taxonomy and classification for the request pipeline.
//!
//! Transport failures and HTTP error statuses are normalized here into a
//! small set of stable, user-facing messages. Anything outside that set
//! passes through with the server's own status and message so the calling
//! screen can decide what to show.

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// User-facing messages
// ============================================================================

/// Shown when the server could not be reached at all.
pub const OFFLINE_MESSAGE: &str =
    "Cannot reach the server. Please check your internet connection.";

/// Shown when the server answers 429.
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please slow down and try again.";

/// Shown for any 5xx that survives the retry budget.
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

/// Shown when the server invalidates the session.
pub const SESSION_ENDED_MESSAGE: &str = "Your session has ended. Please log in again.";

/// Fallback for errors with no user-facing mapping.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug)]
pub enum ApiError {
    /// No usable response: DNS, connect, timeout, or a dropped body.
    /// Retried before surfacing, except for timeouts.
    #[error("{}", OFFLINE_MESSAGE)]
    Offline(#[source] reqwest::Error),

    /// 429 from the server. Never retried.
    #[error("{}", RATE_LIMITED_MESSAGE)]
    RateLimited,

    /// 5xx after any retries.
    #[error("{}", SERVER_ERROR_MESSAGE)]
    Server {
        status: reqwest::StatusCode,
        message: Option<String>,
    },

    /// The server declared the session over: a 401, or an error body whose
    /// message names the token.
    #[error("{}", SESSION_ENDED_MESSAGE)]
    SessionInvalid {
        status: reqwest::StatusCode,
        message: Option<String>,
    },

    /// Any other non-success status, passed through for the caller.
    #[error("Request failed with status {status}")]
    RequestFailed {
        status: reqwest::StatusCode,
        message: Option<String>,
    },

    /// 2xx whose envelope carried `status: false`.
    #[error("{}", .message.as_deref().unwrap_or("Request rejected by the server"))]
    Rejected { message: Option<String> },
}

/// Message shown to the user for any error coming out of the client.
///
/// Normalized failures keep their stable messages, passthrough failures
/// prefer the server's own wording, and everything else collapses to a
/// generic fallback so internal details never reach the UI.
pub fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::SessionInvalid {
            message: Some(message),
            ..
        }) => message.clone(),
        Some(ApiError::RequestFailed {
            message: Some(message),
            ..
        }) => message.clone(),
        Some(api) => api.to_string(),
        None => GENERIC_ERROR_MESSAGE.to_string(),
    }
}

/// Case-insensitive check for the server's token-error marker.
///
/// The backend reports expired or invalid bearer tokens with free-text
/// messages like "Token expired" or "invalid token" rather than a
/// structured code, so this predicate is the single place that decides
/// what counts as a token error.
pub(crate) fn mentions_token(message: &str) -> bool {
    message.to_lowercase().contains("token")
}

/// Pull the `message` field out of a JSON error body, if there is one.
pub(crate) fn body_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

/// Check a success body for the soft-failure envelope that signals a dead
/// session: `{"status": false, "message": ...}` where the message names
/// the token.
pub(crate) fn body_signals_invalid_session(body: &str) -> bool {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            let rejected = value.get("status").and_then(|v| v.as_bool()) == Some(false);
            let token_error = value
                .get("message")
                .and_then(|v| v.as_str())
                .map(mentions_token)
                .unwrap_or(false);
            rejected && token_error
        }
        Err(_) => false,
    }
}

/// Map a non-success HTTP response to an `ApiError`.
///
/// Session invalidation wins over every other classification, matching the
/// server's habit of wrapping token errors in arbitrary statuses.
pub(crate) fn classify_http_failure(status: reqwest::StatusCode, body: &str) -> ApiError {
    let message = body_message(body);
    let token_error = message
        .as_deref()
        .map(mentions_token)
        .unwrap_or(false);

    if status == reqwest::StatusCode::UNAUTHORIZED || token_error {
        return ApiError::SessionInvalid { status, message };
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return ApiError::RateLimited;
    }
    if status.is_server_error() {
        return ApiError::Server { status, message };
    }
    ApiError::RequestFailed { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_mentions_token_is_case_insensitive() {
        assert!(mentions_token("Token expired"));
        assert!(mentions_token("invalid token supplied"));
        assert!(mentions_token("TOKEN BLACKLISTED"));
        assert!(!mentions_token("Wallpaper not found"));
        assert!(!mentions_token(""));
    }

    #[test]
    fn test_body_message_extraction() {
        assert_eq!(
            body_message(r#"{"status": false, "message": "Token expired"}"#).as_deref(),
            Some("Token expired")
        );
        assert_eq!(body_message(r#"{"status": false}"#), None);
        assert_eq!(body_message("<html>bad gateway</html>"), None);
        assert_eq!(body_message(r#"{"message": 42}"#), None);
    }

    #[test]
    fn test_success_body_invalid_session_check() {
        assert!(body_signals_invalid_session(
            r#"{"status": false, "message": "Token expired"}"#
        ));
        assert!(body_signals_invalid_session(
            r#"{"status": false, "message": "invalid token"}"#
        ));
        // status=true never signals invalidation, whatever the message says
        assert!(!body_signals_invalid_session(
            r#"{"status": true, "message": "Token refreshed"}"#
        ));
        assert!(!body_signals_invalid_session(
            r#"{"status": false, "message": "Wallpaper not found"}"#
        ));
        assert!(!body_signals_invalid_session("not json"));
    }

    #[test]
    fn test_classify_unauthorized() {
        let err = classify_http_failure(StatusCode::UNAUTHORIZED, r#"{"message": "expired"}"#);
        assert!(matches!(err, ApiError::SessionInvalid { .. }));
        assert_eq!(err.to_string(), SESSION_ENDED_MESSAGE);
    }

    #[test]
    fn test_classify_token_message_on_other_status() {
        // Token errors can hide behind any status, even 5xx
        let err = classify_http_failure(
            StatusCode::FORBIDDEN,
            r#"{"status": false, "message": "Token revoked"}"#,
        );
        assert!(matches!(err, ApiError::SessionInvalid { .. }));

        let err = classify_http_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"status": false, "message": "token verify failed"}"#,
        );
        assert!(matches!(err, ApiError::SessionInvalid { .. }));
    }

    #[test]
    fn test_classify_rate_limit_and_server_errors() {
        let err = classify_http_failure(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, ApiError::RateLimited));
        assert_eq!(err.to_string(), RATE_LIMITED_MESSAGE);

        let err = classify_http_failure(StatusCode::BAD_GATEWAY, "upstream died");
        assert!(matches!(err, ApiError::Server { .. }));
        assert_eq!(err.to_string(), SERVER_ERROR_MESSAGE);
    }

    #[test]
    fn test_classify_passthrough() {
        let err = classify_http_failure(
            StatusCode::NOT_FOUND,
            r#"{"status": false, "message": "No such wallpaper"}"#,
        );
        match &err {
            ApiError::RequestFailed { status, message } => {
                assert_eq!(status.as_u16(), 404);
                assert_eq!(message.as_deref(), Some("No such wallpaper"));
            }
            other => panic!("expected RequestFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_user_message_mapping() {
        let err: anyhow::Error = classify_http_failure(StatusCode::BAD_GATEWAY, "").into();
        assert_eq!(user_message(&err), SERVER_ERROR_MESSAGE);

        // Passthrough failures prefer the server's wording
        let err: anyhow::Error =
            classify_http_failure(StatusCode::NOT_FOUND, r#"{"message": "No such wallpaper"}"#)
                .into();
        assert_eq!(user_message(&err), "No such wallpaper");

        // Session invalidation with a server message keeps it
        let err: anyhow::Error =
            classify_http_failure(StatusCode::UNAUTHORIZED, r#"{"message": "Token expired"}"#)
                .into();
        assert_eq!(user_message(&err), "Token expired");

        // ...and falls back to the stable message without one
        let err: anyhow::Error = classify_http_failure(StatusCode::UNAUTHORIZED, "").into();
        assert_eq!(user_message(&err), SESSION_ENDED_MESSAGE);

        // Unclassified errors never leak internals
        let err = anyhow::anyhow!("serde choked on column 12");
        assert_eq!(user_message(&err), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_rejected_display_prefers_server_message() {
        let err = ApiError::Rejected {
            message: Some("Favorite already exists".to_string()),
        };
        assert_eq!(err.to_string(), "Favorite already exists");

        let err = ApiError::Rejected { message: None };
        assert_eq!(err.to_string(), "Request rejected by the server");
    }
}

//! Errors raised by API calls.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling the site API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered 401 and the caller asked to see it.
    #[error("not signed in")]
    Unauthorized,

    /// Any other non-2xx answer.
    #[error("{status}: {message}")]
    Status {
        status: StatusCode,
        /// Server-provided message, or the status reason when none was sent.
        message: String,
    },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A 2xx answer without the payload the call needs.
    #[error("response had no body")]
    MissingBody,

    /// A path or pre-signed URL could not be turned into a URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status carried by this error, if it came from a response.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The message to show a user: the server's text for status errors,
    /// nothing for failures the user cannot act on.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Build a status error from a non-2xx response body.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        Self::Status {
            status,
            message: error_message(status, body),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Best-effort message from an error body: JSON `message`, then JSON
/// `error`, then the raw text, then the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty());

    from_json
        .or_else(|| {
            let text = body.trim();
            (!text.is_empty() && !text.starts_with('{')).then(|| text.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_message_field() {
        let msg = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Username is required","error":"bad_request"}"#,
        );
        assert_eq!(msg, "Username is required");
    }

    #[test]
    fn test_falls_back_to_error_field() {
        let msg = error_message(StatusCode::PAYLOAD_TOO_LARGE, r#"{"error":"File too large"}"#);
        assert_eq!(msg, "File too large");
    }

    #[test]
    fn test_plain_text_body() {
        let msg = error_message(StatusCode::FORBIDDEN, "Staff cannot access the admin area");
        assert_eq!(msg, "Staff cannot access the admin area");
    }

    #[test]
    fn test_falls_back_to_status_text() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, ""),
            "Bad Gateway"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail":"x"}"#),
            "Internal Server Error"
        );
    }

    #[test]
    fn test_status_accessor() {
        let err = ApiError::from_status(StatusCode::CONFLICT, "");
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(ApiError::Unauthorized.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(ApiError::MissingBody.status(), None);
    }
}

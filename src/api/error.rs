//! Backend API error types

use serde::Deserialize;
use thiserror::Error;

/// Backend error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    /// HTTP status, when the server answered
    pub status: Option<u16>,
    /// Application error code from the response body (e.g. `AUTH_001`)
    pub code: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            code: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message).with_code("NETWORK_ERROR")
    }

    pub fn unauthorized() -> Self {
        Self::new(
            ApiErrorKind::Unauthorized,
            "Sesión expirada. Por favor, inicia sesión nuevamente.",
        )
        .with_status(401)
        .with_code("AUTH_001")
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }

    /// Build an error from a non-2xx response.
    ///
    /// JSON bodies of the form `{"message", "errorCode"}` override the
    /// defaults; any other non-empty body becomes the message.
    pub fn from_response(status: u16, content_type: Option<&str>, body: &str) -> Self {
        if status == 401 {
            return Self::unauthorized();
        }

        let kind = if status >= 500 {
            ApiErrorKind::ServerError
        } else {
            ApiErrorKind::Rejected
        };
        let mut message = format!("HTTP error! status: {status}");
        let mut code = format!("HTTP_{status}");

        if content_type.is_some_and(|ct| ct.contains("application/json")) {
            if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
                if let Some(m) = parsed.message {
                    message = m;
                }
                if let Some(c) = parsed.error_code {
                    code = c;
                }
            }
        } else if !body.trim().is_empty() {
            message = body.trim().to_string();
        }

        Self::new(kind, message).with_status(status).with_code(code)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: Option<String>,
    error_code: Option<String>,
}

/// Error classification for retry and user messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection failures, timeouts - retryable
    Network,
    /// Session expired (401) - not retryable
    Unauthorized,
    /// Request refused (4xx), including illegal status transitions
    Rejected,
    /// Server error (5xx) - retryable
    ServerError,
    /// Response body did not match the expected shape
    Decode,
}

impl ApiErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::ServerError)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ApiError::decode(err.to_string());
        }
        match err.status() {
            Some(status) => ApiError::from_response(status.as_u16(), None, ""),
            None => ApiError::network(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_body_is_used() {
        let err = ApiError::from_response(
            409,
            Some("application/json; charset=utf-8"),
            r#"{"message":"Transition not allowed","errorCode":"CONV_012"}"#,
        );
        assert_eq!(err.kind, ApiErrorKind::Rejected);
        assert_eq!(err.message, "Transition not allowed");
        assert_eq!(err.code.as_deref(), Some("CONV_012"));
        assert_eq!(err.status, Some(409));
        assert!(!err.kind.is_retryable());
    }

    #[test]
    fn malformed_json_falls_back_to_defaults() {
        let err = ApiError::from_response(500, Some("application/json"), "{oops");
        assert_eq!(err.kind, ApiErrorKind::ServerError);
        assert_eq!(err.message, "HTTP error! status: 500");
        assert_eq!(err.code.as_deref(), Some("HTTP_500"));
        assert!(err.kind.is_retryable());
    }

    #[test]
    fn text_body_becomes_message() {
        let err = ApiError::from_response(502, Some("text/plain"), "Bad gateway\n");
        assert_eq!(err.message, "Bad gateway");
    }

    #[test]
    fn unauthorized_is_special_cased() {
        let err = ApiError::from_response(401, Some("application/json"), "{}");
        assert_eq!(err.kind, ApiErrorKind::Unauthorized);
        assert_eq!(err.code.as_deref(), Some("AUTH_001"));
    }
}

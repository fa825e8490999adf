//! Controller API error types

use thiserror::Error;

/// Failure talking to a Clash controller.
///
/// `Api` carries the controller's own message when the error body is JSON,
/// otherwise the HTTP status text.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("{0}")]
    Network(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("invalid controller response: {0}")]
    Decode(String),

    #[error("invalid controller address: {0}")]
    InvalidUri(String),
}

impl ControllerError {
    /// Error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ControllerError::Network(_) => "network",
            ControllerError::Timeout(_) => "timeout",
            ControllerError::Api { .. } => "api",
            ControllerError::Decode(_) => "decode",
            ControllerError::InvalidUri(_) => "config",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ControllerError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Build the `Api` error from a non-2xx response body.
pub(crate) fn api_error(status: hyper::StatusCode, body: &[u8]) -> ControllerError {
    let from_body = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .filter(|m| !m.is_empty());
    let message = from_body
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("API error: {}", status.as_u16()));
    ControllerError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;

    #[test]
    fn test_api_error_prefers_json_message() {
        let err = api_error(StatusCode::BAD_REQUEST, br#"{"message":"Body invalid"}"#);
        assert_eq!(err.to_string(), "Body invalid");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.category(), "api");
    }

    #[test]
    fn test_api_error_falls_back_to_status_text() {
        let err = api_error(StatusCode::INTERNAL_SERVER_ERROR, b"oops");
        assert_eq!(err.to_string(), "Internal Server Error");

        let err = api_error(StatusCode::UNAUTHORIZED, br#"{"message":""}"#);
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[test]
    fn test_api_error_unknown_status() {
        let status = StatusCode::from_u16(599).unwrap();
        let err = api_error(status, b"");
        assert_eq!(err.to_string(), "API error: 599");
    }
}

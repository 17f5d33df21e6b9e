//! API error envelope.
//!
//! Every error response carries the same JSON shape:
//!
//! ```json
//! {
//!   "error": {
//!     "code": "FILE_TOO_LARGE",
//!     "message": "File too large (12.3MB) - maximum size is 10MB. ...",
//!     "timestamp": "2026-08-29T12:00:00Z",
//!     "requestId": "0198c0de-..."
//!   }
//! }
//! ```
//!
//! Server-side faults collapse to a generic message; the raw error goes to
//! the logs keyed by the request id.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::error;

use docmill_core::Error;

const GENERIC_SERVER_MESSAGE: &str = "Internal server error - please try again later.";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub request_id: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            request_id: None,
        }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            GENERIC_SERVER_MESSAGE,
        )
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let code = err.code();
        match &err {
            Error::NotFound(_) | Error::DocumentNotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, code, err.to_string())
            }
            Error::FileTooLarge { .. }
            | Error::UnsupportedFormat { .. }
            | Error::InvalidInput(_)
            | Error::InvalidState(_) => Self::new(StatusCode::BAD_REQUEST, code, err.to_string()),
            // Infrastructure faults never leak detail to clients
            _ => {
                error!(error = %err, code, "request failed with server error");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "requestId": self.request_id,
            }
        }));
        (self.status, body).into_response()
    }
}

/// Per-request metadata pulled from headers the request-id middleware set.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub request_id: Option<String>,
}

impl RequestMeta {
    /// Attach this request's id to an error on its way out.
    pub fn fail(&self, err: impl Into<ApiError>) -> ApiError {
        err.into().with_request_id(self.request_id.clone())
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        Ok(Self { request_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ApiError::from(Error::DocumentNotFound(uuid::Uuid::nil()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NOT_FOUND");
    }

    #[test]
    fn test_validation_errors_map_to_400() {
        for err in [
            Error::file_too_large(12 * 1024 * 1024, 10 * 1024 * 1024),
            Error::UnsupportedFormat {
                detected: ".txt".to_string(),
            },
            Error::InvalidInput("bad ocr_enabled".to_string()),
            Error::InvalidState("document is processing".to_string()),
        ] {
            let api = ApiError::from(err);
            assert_eq!(api.status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_server_faults_are_generic() {
        let api = ApiError::from(Error::Storage("disk path /var/lib leaked".to_string()));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, GENERIC_SERVER_MESSAGE);
        assert!(!api.message.contains("/var/lib"));
    }

    #[test]
    fn test_envelope_shape() {
        let api = ApiError::from(Error::NotFound("document".to_string()))
            .with_request_id(Some("req-123".to_string()));
        let response = api.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

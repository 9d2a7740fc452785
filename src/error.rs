//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used by every handler and by
//! the identity middleware. Each variant maps onto one HTTP status and renders as a
//! JSON body of the shape `{"error": "<message>"}`.
//!
//! Failures reported by the external auth/data service arrive as `BackendError` and
//! are converted here: rejections keep the service's message text, while transport
//! failures are logged and replaced by a generic message so internals never reach
//! the client.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;

use crate::backend::BackendError;

/// Public message for unexpected failures inside resource handlers.
pub const INTERNAL_SERVER_ERROR: &str = "internal server error";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Caller input, or a store-side policy rejection (HTTP 400).
    BadRequest(String),
    /// Missing, malformed or invalid bearer token; bad credentials (HTTP 401).
    Unauthorized(String),
    /// An unexpected failure (HTTP 500).
    /// The message is sent to the client as-is, so it must never carry internals.
    InternalServerError(String),
}

impl AppError {
    /// Logs `cause` and returns the generic internal error.
    pub fn internal(cause: impl fmt::Display) -> Self {
        log::error!("{}", cause);
        AppError::InternalServerError(INTERNAL_SERVER_ERROR.into())
    }

    /// The text placed into the `error` field of the response body.
    pub fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::InternalServerError(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.message()
        }))
    }
}

/// Converts a `BackendError` into `AppError`.
///
/// A rejection by the service is relayed as `BadRequest` with the service's own
/// message. Anything else is logged and becomes a generic `InternalServerError`.
impl From<BackendError> for AppError {
    fn from(error: BackendError) -> AppError {
        match error {
            BackendError::Rejected { message, .. } => AppError::BadRequest(message),
            BackendError::Unavailable(_) => AppError::internal(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthorized("invalid token".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::BadRequest("title is required".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::InternalServerError(INTERNAL_SERVER_ERROR.into());
        assert_eq!(error.error_response().status(), 500);
    }

    #[actix_rt::test]
    async fn test_error_body_shape() {
        let response = AppError::Unauthorized("token required".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "error": "token required" }));
    }

    #[test]
    fn test_backend_rejection_keeps_message() {
        let error = AppError::from(BackendError::Rejected {
            status: 403,
            message: "new row violates row-level security policy".into(),
        });
        match error {
            AppError::BadRequest(msg) => {
                assert_eq!(msg, "new row violates row-level security policy")
            }
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_backend_outage_hides_details() {
        let error = AppError::from(BackendError::Unavailable(
            "connection refused (os error 111) at 10.0.0.4:5432".into(),
        ));
        assert_eq!(error.error_response().status(), 500);
        assert_eq!(error.message(), INTERNAL_SERVER_ERROR);
    }
}

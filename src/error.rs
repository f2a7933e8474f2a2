//! Error types for the render server

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::access_log::Outcome;
use crate::render::{OptionError, RenderError};

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Contents must not be empty")]
    EmptyContents,

    #[error("Invalid upload_url: {0}")]
    InvalidUploadUrl(String),

    #[error("Invalid option: {0}")]
    Option(#[from] OptionError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Upload error: {0}")]
    Upload(#[source] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, outcome, message) = match &self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "404 not found",
                self.to_string(),
            ),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                "405 not allowed",
                self.to_string(),
            ),
            AppError::BodyTooLarge(_) | AppError::InvalidJson(_) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                "400 bad request (invalid JSON)",
                self.to_string(),
            ),
            AppError::EmptyContents => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                "400 bad request (empty contents)",
                self.to_string(),
            ),
            AppError::InvalidUploadUrl(_) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                "400 bad request (invalid upload_url)",
                self.to_string(),
            ),
            AppError::Option(e) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                "400 bad request (invalid option)",
                e.to_string(),
            ),
            AppError::Render(e) => {
                tracing::error!("Process error: {}", e);
                let outcome = match e {
                    RenderError::Timeout(_) => "500 render timed out",
                    RenderError::Decode(_) => "500 invalid contents",
                    _ => "500 render failed",
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "render_error",
                    outcome,
                    "Rendering failed".to_string(),
                )
            }
            AppError::Upload(e) => {
                tracing::error!("Upload error: {}", e);
                if e.is_builder() {
                    (
                        StatusCode::BAD_REQUEST,
                        "bad_request",
                        "400 bad request (invalid upload_url)",
                        "Invalid upload_url".to_string(),
                    )
                } else if e.is_timeout() {
                    (
                        StatusCode::GATEWAY_TIMEOUT,
                        "upload_timeout",
                        "504 upload timed out",
                        "Upload target timed out".to_string(),
                    )
                } else {
                    (
                        StatusCode::BAD_GATEWAY,
                        "upload_failed",
                        "502 upload failed",
                        "Upload target unreachable".to_string(),
                    )
                }
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "500 internal error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type,
            message,
        });

        let mut response = (status, body).into_response();
        if matches!(self, AppError::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, header::HeaderValue::from_static("POST"));
        }
        response.extensions_mut().insert(Outcome(outcome));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::EmptyContents.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::BodyTooLarge(10).into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidUploadUrl("ftp://x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Option(OptionError::Unsupported("foo".into()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Render(RenderError::Timeout(Duration::from_secs(1)))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let response = AppError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");
        assert_eq!(
            response.extensions().get::<Outcome>(),
            Some(&Outcome("405 not allowed"))
        );
    }

    #[tokio::test]
    async fn test_server_errors_hide_detail() {
        let err = AppError::Render(RenderError::Io(std::io::Error::other("/tmp/secret.html")));
        let response = err.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("secret"));
        assert!(text.contains("render_error"));
    }
}

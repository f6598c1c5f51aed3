use lambda_http::{Body, Response};
use thiserror::Error;

use fleetbridge_backend::shared::error::{error_codes, ErrorResponse};
use fleetbridge_backend::store::StoreError;

/// Main error type for the FleetBridge API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Rate limit exceeded, retry in {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: i64 },

    #[error("Remote store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Authentication and credential-resolution errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No API key or credential triple supplied")]
    MissingCredentials,

    #[error("API key format is invalid")]
    InvalidKeyFormat,

    #[error("API key resolves no stored credentials")]
    UnknownKey,

    #[error("Secret-store credential resolution is disabled")]
    SecretStoreDisabled,
}

/// Request validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {0}")]
    MissingField(String),

    #[error("Invalid format for field: {0}")]
    InvalidFormat(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    /// Convert error to HTTP response with appropriate status code and error payload
    pub fn to_http_response(&self, request_id: &str) -> Response<Body> {
        let (status, error_code, message): (u16, &str, String) = match self {
            ApiError::Auth(AuthError::MissingCredentials) => (
                401,
                error_codes::MISSING_CREDENTIALS,
                "An apiKey or a database/username/password triple is required".to_string(),
            ),
            // Same generic message for bad format and unknown key: responses
            // must not reveal whether a key exists.
            ApiError::Auth(AuthError::InvalidKeyFormat)
            | ApiError::Auth(AuthError::UnknownKey) => (
                401,
                error_codes::INVALID_API_KEY,
                "API key is invalid".to_string(),
            ),
            ApiError::Auth(AuthError::SecretStoreDisabled) => (
                401,
                error_codes::UNAUTHORIZED,
                "API key authentication is not enabled for this deployment".to_string(),
            ),
            ApiError::Validation(ValidationError::MissingField(field)) => (
                400,
                error_codes::MISSING_FIELD,
                format!("Required field missing: {}", field),
            ),
            ApiError::Validation(ValidationError::InvalidFormat(field)) => (
                400,
                error_codes::INVALID_FORMAT,
                format!("Invalid format for field: {}", field),
            ),
            ApiError::Validation(ValidationError::InvalidBody(msg)) => {
                (400, error_codes::INVALID_FORMAT, msg.clone())
            }
            ApiError::RateLimited {
                retry_after_seconds,
            } => (
                429,
                error_codes::RATE_LIMITED,
                format!(
                    "Rate limit exceeded. Try again in {} seconds.",
                    retry_after_seconds
                ),
            ),
            ApiError::Store(StoreError::NotFound(identifier)) => (
                404,
                error_codes::DEVICE_NOT_FOUND,
                format!("Device not found by id/serial/name: {}", identifier),
            ),
            ApiError::Store(StoreError::Auth(msg)) => (
                502,
                error_codes::UPSTREAM_AUTH,
                format!("Remote authentication failed: {}", msg),
            ),
            ApiError::Store(e) => (502, error_codes::UPSTREAM_ERROR, e.to_string()),
            ApiError::Internal(_) => (
                500,
                error_codes::INTERNAL_ERROR,
                "Internal server error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse::new(error_code, &message, request_id);

        let body = error_response
            .to_json()
            .unwrap_or_else(|_| r#"{"error":"INTERNAL_ERROR","message":"Failed to serialize error response","request_id":""}"#.to_string());

        Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap_or_else(|_| {
                Response::builder()
                    .status(500)
                    .body(Body::from(
                        r#"{"error":"INTERNAL_ERROR","message":"Failed to build response"}"#,
                    ))
                    .unwrap()
            })
    }
}

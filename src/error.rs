// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::JwtError;
use crate::database::repository::RepositoryError;
use crate::validation::ValidationError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 422 Unprocessable Entity
    UnprocessableEntity {
        message: String,
        field_errors: HashMap<String, String>,
    },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::UnprocessableEntity { .. } => 422,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::UnprocessableEntity { message, .. } => message,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::UnprocessableEntity { message, field_errors } => {
                json!({
                    "error": true,
                    "message": message,
                    "code": "UNPROCESSABLE_ENTITY",
                    "field_errors": field_errors
                })
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::UnprocessableEntity { .. } => "UNPROCESSABLE_ENTITY",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        ApiError::UnprocessableEntity {
            message: message.into(),
            field_errors,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let field_errors = err.field_errors();
        ApiError::unprocessable_entity(err.to_string(), field_errors)
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        tracing::warn!("Rejected access token: {}", err);
        ApiError::unauthorized("Invalid or expired token")
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ConstraintViolation { .. } => ApiError::bad_request(err.to_string()),
            RepositoryError::Decode { .. } | RepositoryError::Store(_) => {
                // Don't expose store internals to clients
                tracing::error!("Repository error: {}", err);
                ApiError::bad_request("Unable to process request")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manager::DatabaseError;

    #[test]
    fn constraint_violation_is_bad_request() {
        let err: ApiError = RepositoryError::ConstraintViolation {
            kind: "contact",
            field: "email".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "A contact with this email already exists");
    }

    #[test]
    fn store_failures_hide_internals() {
        let err: ApiError = RepositoryError::Store(DatabaseError::QueryError("relation does not exist".into())).into();
        assert_eq!(err.status_code(), 400);
        assert!(!err.to_json().to_string().contains("relation"));
    }

    #[test]
    fn token_errors_are_unauthorized_without_detail() {
        let err: ApiError = JwtError::InvalidToken("InvalidSignature".into()).into();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.message(), "Invalid or expired token");

        let err: ApiError = JwtError::InvalidSecret.into();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn validation_errors_carry_field_errors() {
        let mut field_errors = std::collections::BTreeMap::new();
        field_errors.insert("email".to_string(), "This field is required".to_string());
        let err: ApiError = ValidationError::InvalidFields { kind: "contact", field_errors }.into();

        assert_eq!(err.status_code(), 422);
        let body = err.to_json();
        assert_eq!(body["code"], "UNPROCESSABLE_ENTITY");
        assert_eq!(body["field_errors"]["email"], "This field is required");
    }
}

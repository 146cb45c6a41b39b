use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

/// One offending form field, surfaced inline next to the field by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn required(field: &'static str, label: &str) -> Self {
        FieldError {
            field,
            message: format!("{label} is required"),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str, String),
    #[allow(dead_code)]
    Forbidden(&'static str, String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    /// Mandatory fields missing or malformed; blocks the store call entirely.
    Validation(Vec<FieldError>),
    Internal(String),
}

impl ApiError {
    pub fn invalid_passkey() -> Self {
        ApiError::Unauthorized("INVALID_PASSKEY", "Passkey is incorrect".into())
    }

    pub fn session_expired() -> Self {
        ApiError::Unauthorized("SESSION_EXPIRED", "Session expired".into())
    }

    fn to_error_response(code: &str, message: &str) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            error: ErrorObject {
                code: code.to_string(),
                message: message.to_string(),
                fields: None,
            },
        })
    }

    fn to_validation_response(fields: Vec<FieldError>) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            error: ErrorObject {
                code: "VALIDATION_ERROR".to_string(),
                message: format!("{} field(s) failed validation", fields.len()),
                fields: Some(fields),
            },
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(code, msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Forbidden(code, msg) => {
                (StatusCode::FORBIDDEN, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::BadRequest(code, msg) => {
                (StatusCode::BAD_REQUEST, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::NotFound(code, msg) => {
                (StatusCode::NOT_FOUND, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Conflict(code, msg) => {
                (StatusCode::CONFLICT, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                ApiError::to_validation_response(fields),
            )
                .into_response(),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::to_error_response("INTERNAL", &msg),
            )
                .into_response(),
        }
    }
}

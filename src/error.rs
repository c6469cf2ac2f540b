// src/error.rs

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Field name -> messages, rendered under `errors` in a 422 body.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (unparseable body or multipart stream)
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 422 Unprocessable Entity
    Validation { message: String, errors: FieldErrors },
}

impl AppError {
    /// A validation failure on a single field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.clone()]);
        AppError::Validation { message, errors }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a `{message, errors?}` JSON body with the matching status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Internal Server Error" }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "message": msg })),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, json!({ "message": msg })),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "message": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "message": msg })),
            AppError::Validation { message, errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "message": message, "errors": errors }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Flattens `validator` output into the per-field map.
/// The first field message becomes the top-level `message`.
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors = FieldErrors::new();
        for (field, field_errors) in err.field_errors() {
            let messages = field_errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("The {} field is invalid ({}).", field, e.code),
                })
                .collect();
            errors.insert(field.to_string(), messages);
        }

        let message = errors
            .values()
            .flat_map(|messages| messages.first())
            .next()
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".to_string());

        AppError::Validation { message, errors }
    }
}

/// A body that is not JSON is a 400. JSON of the wrong shape (missing
/// fields, wrong types) is a 422 like any other invalid input.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => AppError::Validation {
                message: err.body_text(),
                errors: FieldErrors::new(),
            },
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Converts `StoreError` so `?` works on store calls.
/// Unique-key violations surface as field validation errors.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } => {
                AppError::invalid_field(field, format!("The {} has already been taken.", field))
            }
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    auth::{AuthError, HashingError},
    db::StoreError,
    utils::validation::{self, FieldViolation},
};

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned for every authentication failure
pub const ACCESS_DENIED: &str = "Access denied";

/// Challenge sent with every 401
pub const BASIC_CHALLENGE: &str = "Basic realm=\"course-catalog\"";

/// Client-facing error. The variant decides the status code and body shape;
/// internal detail is logged, never serialized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("authentication failed")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),
    #[error("request payload too large")]
    PayloadTooLarge,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn authentication_error() -> Self {
        Self::Unauthorized
    }

    pub fn authorization_error(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found_error(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    pub fn payload_too_large() -> Self {
        Self::PayloadTooLarge
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            Self::Unauthorized => {
                let mut response = (status, Json(json!({ "message": ACCESS_DENIED }))).into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(BASIC_CHALLENGE),
                );
                response
            }
            Self::Validation(errors) => (status, Json(json!({ "errors": errors }))).into_response(),
            Self::Forbidden(message) | Self::NotFound(message) => {
                (status, Json(json!({ "message": message }))).into_response()
            }
            Self::PayloadTooLarge => {
                (status, Json(json!({ "message": "Request payload too large" }))).into_response()
            }
            Self::Internal(detail) => {
                tracing::error!(%detail, "Unhandled fault");
                (status, Json(json!({ "message": "Internal server error" }))).into_response()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match validation::normalize(err) {
            Ok(messages) => Self::Validation(messages),
            Err(other) => Self::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials | AuthError::UserNotFound | AuthError::BadSecret => {
                Self::authentication_error()
            }
            AuthError::Store(store) => Self::Internal(store.to_string()),
            AuthError::Hashing(hashing) => Self::Internal(hashing.to_string()),
        }
    }
}

impl From<Vec<FieldViolation>> for ApiError {
    fn from(violations: Vec<FieldViolation>) -> Self {
        Self::Validation(validation::messages(&violations))
    }
}

impl From<HashingError> for ApiError {
    fn from(err: HashingError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        Self::validation_error(rejection.body_text())
    }
}

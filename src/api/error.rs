use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::errors::SecretDropError;

/// Message returned for every failure whose cause must stay server-side
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    NotFound(String),
    Unauthorized(String),
    RateLimited { message: String, retry_after_secs: u32 },
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn rate_limited(retry_after_secs: u32) -> Self {
        ApiError::RateLimited {
            message: "Too many requests, try again later".to_string(),
            retry_after_secs,
        }
    }
}

/// Error body. `error` is shown to the Mini App user as is.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();

        let (message, retry_after) = match self {
            ApiError::RateLimited { message, retry_after_secs } => (message, Some(retry_after_secs)),
            ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Internal(msg) => (msg, None),
        };

        let mut response = (status, Json(ErrorBody { error: message, code })).into_response();
        if let Some(secs) = retry_after {
            response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<SecretDropError> for ApiError {
    fn from(err: SecretDropError) -> Self {
        match err {
            SecretDropError::Validation { message, .. } => ApiError::BadRequest(message),
            SecretDropError::Auth { message, .. } => ApiError::Unauthorized(message),
            // Keys are capabilities and are never echoed
            SecretDropError::NotFound { resource_type, .. } => {
                ApiError::NotFound(format!("{} not found", resource_type))
            }
            SecretDropError::Conflict { message, .. } => ApiError::Conflict(message),
            err @ (SecretDropError::Config { .. }
            | SecretDropError::Database { .. }
            | SecretDropError::Io { .. }
            | SecretDropError::Internal { .. }) => {
                tracing::error!(error = %err, source = ?std::error::Error::source(&err), "Request failed with internal error");
                ApiError::Internal(INTERNAL_ERROR_MESSAGE.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

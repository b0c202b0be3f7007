//! HTTP のエラーレスポンス
//!
//! 全ての失敗は `{ "error": true, "code": <status>, "msg": <message> }` の形で返す。

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reservation::service::{ServiceError, NOT_FOUND_MESSAGE};
use serde::Serialize;

pub const ROUTE_NOT_FOUND_MESSAGE: &str = "The requested URL was not found on the server.";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "The method is not allowed for the requested URL.";

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn route_not_found() -> Self {
        Self::not_found(ROUTE_NOT_FOUND_MESSAGE)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: bool,
    code: u16,
    msg: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::debug!(status = %self.status, message = %self.message, "サーバーエラー");
        }
        let body = ErrorEnvelope {
            error: true,
            code: self.status.as_u16(),
            msg: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidRequest(e) => Self::bad_request(e.to_string()),
            ServiceError::NotFound => Self::not_found(NOT_FOUND_MESSAGE),
            ServiceError::StoreUnavailable { message, .. } => Self::internal(message),
        }
    }
}

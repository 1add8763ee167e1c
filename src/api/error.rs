//! Error responses for HTTP handlers.
//!
//! Domain and store errors are mapped onto a status code and a JSON body of
//! the form `{"detail": ..., "code": ...}`. Store failures are logged here
//! and reach the client only as a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{ErrorKind, SaleError, StoreError};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self { status, message: message.into(), code }
    }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST") }
    pub fn not_found(message: impl Into<String>) -> Self { Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND") }
    pub fn conflict(message: impl Into<String>) -> Self { Self::new(StatusCode::CONFLICT, message, "CONFLICT") }
    pub fn validation(message: impl Into<String>) -> Self { Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "VALIDATION_ERROR") }
    pub fn internal() -> Self { Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", "INTERNAL_SERVER_ERROR") }

    pub fn status(&self) -> StatusCode { self.status }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.message, "code": self.code }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!(error = %e, "store failure");
        Self::internal()
    }
}

impl From<SaleError> for ApiError {
    fn from(e: SaleError) -> Self {
        match e.kind() {
            ErrorKind::NotFound => Self::not_found(e.to_string()),
            ErrorKind::InvalidRequest => Self::bad_request(e.to_string()),
            ErrorKind::Conflict => Self::conflict(e.to_string()),
            ErrorKind::Internal => match e {
                SaleError::Store(store) => store.into(),
                other => {
                    tracing::error!(error = %other, "sale failure");
                    Self::internal()
                }
            },
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self { Self::validation(e.to_string()) }
}

// Shared HTTP response types for consistent API error payloads.

use axum::{Json, http::StatusCode};

// Validation failures carry `message`; store failures carry `error`.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn validation_error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            success: false,
            message: Some(message.to_string()),
            error: None,
        }),
    )
}

pub fn store_error(error: String) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            success: false,
            message: None,
            error: Some(error),
        }),
    )
}

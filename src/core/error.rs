//! 核心错误处理模块

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// 核心错误类型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

/// 错误响应结构
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
    pub timestamp: String,
}

impl CoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            CoreError::BadRequest(_) | CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_message, user_message) = match self {
            CoreError::BadRequest(msg) => ("BAD_REQUEST", msg),
            CoreError::Validation(msg) => ("VALIDATION_ERROR", msg),
            CoreError::NotFound(msg) => ("NOT_FOUND", msg),
            CoreError::Conflict(msg) => ("CONFLICT", msg),
            CoreError::InternalServerError(msg) => {
                // 内部细节只写日志，不返回给调用方
                error!("Internal error: {}", msg);
                ("INTERNAL_SERVER_ERROR", "Internal server error".to_string())
            }
        };

        let error_response = ErrorResponse {
            error: error_message.to_string(),
            message: user_message,
            code: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, axum::Json(error_response)).into_response()
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    error
                        .message
                        .as_ref()
                        .map(|msg| format!("{}: {}", field, msg))
                        .unwrap_or_else(|| format!("{}: invalid value", field))
                })
            })
            .collect();
        // field_errors 返回 HashMap，排序保证消息稳定
        messages.sort();

        CoreError::Validation(messages.join(", "))
    }
}

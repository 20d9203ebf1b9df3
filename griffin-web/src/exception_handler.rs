//! 请求期的错误处理
//!
//! [`WebError`] 是处理器、提取器和中间件共用的错误类型，转换为统一格式的
//! JSON 错误响应。业务错误由用户自行定义，实现 `Into<WebError>` 或直接
//! 实现 `IntoResponse` 即可。

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// 对外隐藏细节的 500 响应消息
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong on the server!";

/// 字段名 -> 该字段的错误消息
pub type FieldErrors = HashMap<String, Vec<String>>;

/// Web 层错误类型
#[derive(Error, Debug)]
pub enum WebError {
    // ========== 请求解析 ==========
    /// JSON 解析错误 - 400
    #[error("JSON parse error: {message}")]
    JsonParse { message: String },

    /// 参数验证错误 - 400
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field_errors: Option<FieldErrors>,
    },

    /// 路径参数解析错误 - 400
    #[error("Invalid path parameter: {message}")]
    PathParse { message: String },

    // ========== 业务 ==========
    /// 资源不存在 - 404
    #[error("{0}")]
    NotFound(String),

    /// 资源冲突 - 409
    #[error("{0}")]
    Conflict(String),

    // ========== 框架底层 ==========
    /// 内部错误 - 500，消息只记录日志，不返回给客户端
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl WebError {
    pub fn validation(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        WebError::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// 错误对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::JsonParse { .. } => StatusCode::BAD_REQUEST,
            WebError::Validation { .. } => StatusCode::BAD_REQUEST,
            WebError::PathParse { .. } => StatusCode::BAD_REQUEST,
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Conflict(_) => StatusCode::CONFLICT,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回给客户端的消息
    pub fn public_message(&self) -> String {
        match self {
            WebError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for WebError {
    fn from(error: anyhow::Error) -> Self {
        WebError::Internal(format!("{:#}", error))
    }
}

/// 标准错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "💥 Unhandled error");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let mut body = ErrorResponse::new(status, self.public_message());
        if let WebError::Validation {
            field_errors: Some(errors),
            ..
        } = self
        {
            body = body.with_errors(errors);
        }
        body.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = WebError::Internal("database exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["status"], 500);
        assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let mut errors = FieldErrors::new();
        errors.insert("email".into(), vec!["Invalid email".into()]);

        let response = WebError::validation("Request body is invalid", errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["error"], "Bad Request");
        assert_eq!(body["errors"]["email"][0], "Invalid email");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WebError::NotFound("Customer 1 not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebError::Conflict("taken".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            WebError::PathParse {
                message: "bad id".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}

//! 请求体校验
//!
//! [`ValidateBody`] 是处理器之前的校验中间件：读取 JSON 请求体并运行
//! `validator` 规则，失败时直接返回 400，成功时把解析结果放进请求扩展，
//! 处理器再用 [`Validated`](crate::extractors::Validated) 取出。

use std::marker::PhantomData;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::exception_handler::{FieldErrors, WebError};
use crate::middleware::{Middleware, Next};

/// 默认的请求体大小上限（2 MiB）
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// 把 `validator` 的错误展开为 `字段 -> 消息列表`
///
/// 规则上没有配置消息时使用规则代码，例如 `email`。
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// 解析并校验 JSON
pub fn validate_json<T>(bytes: &[u8]) -> Result<T, WebError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_slice(bytes).map_err(|e| WebError::JsonParse {
        message: e.to_string(),
    })?;

    value.validate().map_err(|errors| {
        tracing::debug!(error = %errors, "Validation error");
        WebError::validation("Request body is invalid", field_errors(&errors))
    })?;

    Ok(value)
}

/// 请求体校验中间件
pub struct ValidateBody<T> {
    limit: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ValidateBody<T> {
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_BODY_LIMIT,
            _marker: PhantomData,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl<T> Default for ValidateBody<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Middleware for ValidateBody<T>
where
    T: DeserializeOwned + Validate + Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "ValidateBody"
    }

    async fn handle(&self, req: Request, next: Next) -> Response {
        let (mut parts, body) = req.into_parts();

        let bytes = match axum::body::to_bytes(body, self.limit).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return WebError::JsonParse {
                    message: e.to_string(),
                }
                .into_response()
            }
        };

        match validate_json::<T>(&bytes) {
            Ok(value) => {
                parts.extensions.insert(value);
                next.run(Request::from_parts(parts, Body::from(bytes))).await
            }
            Err(e) => e.into_response(),
        }
    }
}

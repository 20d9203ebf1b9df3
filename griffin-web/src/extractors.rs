//! 自定义提取器
//!
//! 对 axum 提取器的语义化封装，拒绝时统一返回 [`WebError`]。

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::exception_handler::WebError;
use crate::validation::field_errors;

/// 路径参数
///
/// ```ignore
/// #[get_mapping("/:id")]
/// async fn find(&self, PathVariable(id): PathVariable<u64>) -> impl IntoResponse {
///     ResponseEntity::ok(id)
/// }
/// ```
pub struct PathVariable<T>(pub T);

impl<T> PathVariable<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for PathVariable<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| WebError::PathParse {
                message: e.body_text(),
            })?;

        Ok(PathVariable(value))
    }
}

/// JSON 请求体（不校验）
pub struct RequestBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for RequestBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await.map_err(|e| {
            let message = e.body_text();
            tracing::debug!(error = %message, "JSON parse error");
            WebError::JsonParse { message }
        })?;

        Ok(RequestBody(data))
    }
}

/// JSON 请求体，解析后立即运行 `validator` 规则
pub struct ValidatedRequestBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedRequestBody<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let RequestBody(data) = RequestBody::<T>::from_request(req, state).await?;

        data.validate().map_err(|errors| {
            tracing::debug!(error = %errors, "Validation error");
            WebError::validation("Request body is invalid", field_errors(&errors))
        })?;

        Ok(ValidatedRequestBody(data))
    }
}

/// 由 [`ValidateBody`](crate::validation::ValidateBody) 中间件校验并存入请求扩展的值
///
/// 路由上没有挂对应的中间件时返回 500：这是装配错误而不是客户端错误。
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for Validated<T>
where
    T: Clone + Send + Sync + 'static,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<T>()
            .cloned()
            .map(Validated)
            .ok_or_else(|| {
                WebError::Internal(format!(
                    "no validated `{}` in request extensions, is ValidateBody missing on this route?",
                    std::any::type_name::<T>()
                ))
            })
    }
}

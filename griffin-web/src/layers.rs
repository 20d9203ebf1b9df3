//! 全局 axum 层
//!
//! 作用于整个路由器（而非单条路由）的中间件函数，配合
//! `axum::middleware::from_fn` 使用。单条路由上的中间件见 [`crate::middleware`]。

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use std::time::Instant;

use crate::exception_handler::WebError;

/// 请求 ID 头
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// 请求日志
pub async fn request_logging(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed = ?start.elapsed(),
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed = ?start.elapsed(),
            "Request completed"
        );
    }

    response
}

/// 请求 ID：沿用客户端传入的值，否则生成一个 UUID，并回写到响应头
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let request_id = match req.headers().get(&X_REQUEST_ID) {
        Some(value) => value.clone(),
        None => {
            // UUID 的文本形式总是合法的头部值
            let generated = uuid::Uuid::new_v4().to_string();
            match HeaderValue::from_str(&generated) {
                Ok(value) => value,
                Err(_) => return next.run(req).await,
            }
        }
    };

    req.headers_mut()
        .insert(X_REQUEST_ID.clone(), request_id.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert(X_REQUEST_ID.clone(), request_id);
    response
}

/// 捕获处理器中的 panic，转换为 500 响应
pub async fn catch_panic(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    match std::panic::AssertUnwindSafe(next.run(req))
        .catch_unwind()
        .await
    {
        Ok(response) => response,
        Err(panic) => {
            let message = if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic occurred".to_string()
            };

            tracing::error!(path = %path, error = %message, "Handler panicked");
            WebError::Internal(message).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{self, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route(
                "/boom",
                get(|| async {
                    if true {
                        panic!("boom");
                    }
                    "unreachable"
                }),
            )
            .layer(axum::middleware::from_fn(catch_panic))
            .layer(axum::middleware::from_fn(request_id))
            .layer(axum::middleware::from_fn(request_logging))
    }

    #[tokio::test]
    async fn test_request_id_generated_and_echoed() {
        let response = app()
            .oneshot(http::Request::get("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers().get(&X_REQUEST_ID).unwrap();
        assert_eq!(id.to_str().unwrap().len(), 36);

        let response = app()
            .oneshot(
                http::Request::get("/ok")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[&X_REQUEST_ID], "abc-123");
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let response = app()
            .oneshot(http::Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

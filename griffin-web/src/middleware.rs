//! 路由级中间件链
//!
//! 每条路由的处理链是 `中间件... -> 处理器`。中间件调用 `next.run(req)` 把
//! 控制权交给下一环，不调用则直接短路返回自己的响应。
//!
//! # 示例
//!
//! ```ignore
//! use griffin_web::prelude::*;
//!
//! struct RequireJson;
//!
//! #[async_trait]
//! impl Middleware for RequireJson {
//!     async fn handle(&self, req: Request, next: Next) -> Response {
//!         if req.headers().get(CONTENT_TYPE).is_none() {
//!             return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
//!         }
//!         next.run(req).await
//!     }
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::Request, response::Response};
use futures_util::future::BoxFuture;

/// 路由级中间件
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// 用于日志与路由自省
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn handle(&self, req: Request, next: Next) -> Response;
}

/// 共享的中间件引用
pub type MiddlewareRef = Arc<dyn Middleware>;

/// 绑定到具体控制器实例的处理器
#[derive(Clone)]
pub struct BoundHandler {
    name: String,
    inner: Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>,
}

impl BoundHandler {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Request) -> BoxFuture<'static, Response> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inner: Arc::new(handler),
        }
    }

    /// `Controller.method` 形式的名字
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        (self.inner)(req)
    }
}

impl fmt::Debug for BoundHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundHandler").field(&self.name).finish()
    }
}

/// 一条路由的完整处理链
#[derive(Clone)]
pub struct HandlerChain {
    middlewares: Vec<MiddlewareRef>,
    handler: BoundHandler,
}

impl HandlerChain {
    pub fn new(middlewares: Vec<MiddlewareRef>, handler: BoundHandler) -> Self {
        Self {
            middlewares,
            handler,
        }
    }

    pub fn middlewares(&self) -> &[MiddlewareRef] {
        &self.middlewares
    }

    pub fn handler(&self) -> &BoundHandler {
        &self.handler
    }

    /// 链上各环节的名字，处理器在最后
    pub fn step_names(&self) -> Vec<String> {
        self.middlewares
            .iter()
            .map(|m| m.name().to_string())
            .chain(std::iter::once(self.handler.name().to_string()))
            .collect()
    }

    /// 从第一个中间件开始执行
    pub async fn run(self: Arc<Self>, req: Request) -> Response {
        Next {
            chain: self,
            position: 0,
        }
        .run(req)
        .await
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("steps", &self.step_names())
            .finish()
    }
}

/// 链上剩余的部分
pub struct Next {
    chain: Arc<HandlerChain>,
    position: usize,
}

impl Next {
    pub async fn run(self, req: Request) -> Response {
        match self.chain.middlewares.get(self.position) {
            Some(middleware) => {
                let middleware = Arc::clone(middleware);
                let next = Next {
                    chain: Arc::clone(&self.chain),
                    position: self.position + 1,
                };
                middleware.handle(req, next).await
            }
            None => self.chain.handler.call(req).await,
        }
    }
}

/// 闭包中间件，见 [`from_fn`]
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F> FnMiddleware<F> {
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// 把 `async fn(Request, Next) -> Response` 形式的闭包包装为中间件
pub fn from_fn<F, Fut>(f: F) -> FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FnMiddleware {
        name: "fn_middleware".to_string(),
        f,
    }
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, req: Request, next: Next) -> Response {
        (self.f)(req, next).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, response::IntoResponse};
    use futures_util::FutureExt;
    use parking_lot::Mutex;

    type Trace = Arc<Mutex<Vec<&'static str>>>;

    fn recording(trace: &Trace, step: &'static str) -> MiddlewareRef {
        let trace = trace.clone();
        Arc::new(
            from_fn(move |req: Request, next: Next| {
                let trace = trace.clone();
                async move {
                    trace.lock().push(step);
                    next.run(req).await
                }
            })
            .named(step),
        )
    }

    fn recording_handler(trace: &Trace) -> BoundHandler {
        let trace = trace.clone();
        BoundHandler::new("Test.handler", move |_req| {
            let trace = trace.clone();
            async move {
                trace.lock().push("handler");
                StatusCode::OK.into_response()
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let trace: Trace = Arc::default();
        let chain = Arc::new(HandlerChain::new(
            vec![recording(&trace, "A"), recording(&trace, "B")],
            recording_handler(&trace),
        ));

        assert_eq!(chain.step_names(), vec!["A", "B", "Test.handler"]);

        let response = chain.run(Request::new(Body::empty())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*trace.lock(), vec!["A", "B", "handler"]);
    }

    #[tokio::test]
    async fn test_middleware_can_short_circuit() {
        let trace: Trace = Arc::default();
        let reject: MiddlewareRef = Arc::new(from_fn(|_req: Request, _next: Next| async {
            StatusCode::FORBIDDEN.into_response()
        }));
        let chain = Arc::new(HandlerChain::new(
            vec![recording(&trace, "A"), reject, recording(&trace, "C")],
            recording_handler(&trace),
        ));

        let response = chain.run(Request::new(Body::empty())).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(*trace.lock(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_chain_without_middlewares_calls_handler() {
        let trace: Trace = Arc::default();
        let chain = Arc::new(HandlerChain::new(Vec::new(), recording_handler(&trace)));

        chain.run(Request::new(Body::empty())).await;
        assert_eq!(*trace.lock(), vec!["handler"]);
    }
}

//! 路由器抽象
//!
//! 加载器只通过 [`RouteRegistrar`] 注册路由，生产环境使用基于 axum 的
//! [`AxumRouter`]，测试里可以换成记录调用的替身。

use std::fmt;
use std::sync::Arc;

use axum::{extract::Request, response::Response, routing::on, Router};
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

use crate::annotation::Verb;
use crate::middleware::HandlerChain;

/// 路由注册接口
pub trait RouteRegistrar {
    /// 注册一条路由，`(verb, path)` 的唯一性由调用方保证
    fn register(&mut self, verb: Verb, path: &str, chain: HandlerChain);
}

/// 已注册路由的自省信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub verb: Verb,
    pub path: String,
    pub handler: String,
    pub middlewares: Vec<String>,
}

/// 加载完成的路由器
///
/// 只读：加载之后不能再增加路由。
pub struct RouterHandle<R> {
    router: R,
    routes: Vec<RouteInfo>,
}

impl<R> fmt::Debug for RouterHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterHandle")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl<R> RouterHandle<R> {
    pub(crate) fn new(router: R, routes: Vec<RouteInfo>) -> Self {
        Self { router, routes }
    }

    /// 按注册顺序排列的路由
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn into_inner(self) -> R {
        self.router
    }
}

/// 基于 axum 的路由器
///
/// 注册时去掉路径末尾的 `/`，请求路径由 [`NormalizePath`] 做同样处理，
/// 因此 `/customers` 与 `/customers/` 匹配同一条路由。
#[derive(Debug, Clone, Default)]
pub struct AxumRouter {
    router: Router,
}

impl AxumRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    /// 对外提供服务的 service
    pub fn into_service(self) -> NormalizePath<Router> {
        NormalizePath::trim_trailing_slash(self.router)
    }
}

/// 去掉末尾的 `/`，根路径保持不变
pub(crate) fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

impl RouteRegistrar for AxumRouter {
    fn register(&mut self, verb: Verb, path: &str, chain: HandlerChain) {
        let chain = Arc::new(chain);
        let handler = move |req: Request| {
            let chain = Arc::clone(&chain);
            async move { chain.run(req).await }
        };

        let router = std::mem::take(&mut self.router);
        self.router = router.route(
            trim_trailing_slash(path),
            on(verb.method_filter(), handler),
        );
    }
}

impl RouterHandle<AxumRouter> {
    /// 让一个请求穿过完整的路由表
    pub async fn dispatch(&self, req: Request) -> Response {
        let service = self.router.clone().into_service();
        match service.oneshot(req).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    pub fn into_service(self) -> NormalizePath<Router> {
        self.router.into_service()
    }

    pub fn into_router(self) -> Router {
        self.router.into_router()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::BoundHandler;
    use axum::{
        body::Body,
        http::{self, StatusCode},
        response::IntoResponse,
    };
    use futures_util::FutureExt;

    fn text_chain(name: &'static str) -> HandlerChain {
        HandlerChain::new(
            Vec::new(),
            BoundHandler::new(name, move |_req| async move { name.into_response() }.boxed()),
        )
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn handle(router: AxumRouter) -> RouterHandle<AxumRouter> {
        RouterHandle::new(router, Vec::new())
    }

    #[test]
    fn test_trim_trailing_slash() {
        assert_eq!(trim_trailing_slash("/customers/"), "/customers");
        assert_eq!(trim_trailing_slash("/customers"), "/customers");
        assert_eq!(trim_trailing_slash("/"), "/");
        assert_eq!(trim_trailing_slash("//"), "/");
    }

    #[tokio::test]
    async fn test_axum_router_matches_verb_and_path() {
        let mut router = AxumRouter::new();
        router.register(Verb::Get, "/customers/", text_chain("list"));
        router.register(Verb::Post, "/customers/", text_chain("create"));
        router.register(Verb::Get, "/customers/:id", text_chain("find"));
        let handle = handle(router);

        let response = handle
            .dispatch(http::Request::get("/customers").body(Body::empty()).unwrap())
            .await;
        assert_eq!(body_text(response).await, "list");

        let response = handle
            .dispatch(http::Request::get("/customers/").body(Body::empty()).unwrap())
            .await;
        assert_eq!(body_text(response).await, "list");

        let response = handle
            .dispatch(http::Request::post("/customers").body(Body::empty()).unwrap())
            .await;
        assert_eq!(body_text(response).await, "create");

        let response = handle
            .dispatch(http::Request::get("/customers/7").body(Body::empty()).unwrap())
            .await;
        assert_eq!(body_text(response).await, "find");
    }

    #[tokio::test]
    async fn test_axum_router_unknown_route() {
        let mut router = AxumRouter::new();
        router.register(Verb::Get, "/customers", text_chain("list"));
        let handle = handle(router);

        let response = handle
            .dispatch(http::Request::get("/orders").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = handle
            .dispatch(http::Request::delete("/customers").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

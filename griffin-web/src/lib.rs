//! # Griffin Web
//!
//! 声明式的控制器路由，基于 Axum 构建
//!
//! ## 核心特性
//!
//! - **注解驱动** - `#[controller]`、`#[get_mapping]` 等宏把路由写进元数据注册表
//! - **显式装配** - 控制器实例通过 [`griffin_core::Resolver`] 解析，没有全局注册表
//! - **原子加载** - 路由全部校验通过后才注册，失败时不留下半张路由表
//! - **中间件链** - 每条路由可以挂任意个中间件，按声明顺序执行
//! - **类型安全** - 处理器参数就是 Axum 提取器

pub mod annotation;
pub mod constants;
pub mod controller;
pub mod error;
pub mod exception_handler;
pub mod extractors;
pub mod layers;
pub mod loader;
pub mod metadata;
pub mod middleware;
pub mod router;
pub mod server;
pub mod validation;

pub use griffin_web_macros::{
    controller, delete_mapping, get_mapping, patch_mapping, post_mapping, put_mapping,
    use_middleware,
};

pub use annotation::{ControllerMetadata, RouteDefinition, Verb};
pub use controller::{Controller, ControllerType, HandlerFn, ResponseEntity};
pub use error::{ConfigurationError, LoadError};
pub use exception_handler::{ErrorResponse, WebError};
pub use loader::{load, RouteLoader};
pub use metadata::{MetadataKey, MetadataRegistry};
pub use middleware::{from_fn, BoundHandler, HandlerChain, Middleware, MiddlewareRef, Next};
pub use router::{AxumRouter, RouteInfo, RouteRegistrar, RouterHandle};
pub use server::{GriffinWebServer, ServerProperties};
pub use validation::ValidateBody;

pub mod prelude {
    //! 预导入模块

    pub use crate::annotation::Verb;
    pub use crate::controller::{Controller, ControllerType, ResponseEntity};
    pub use crate::error::{ConfigurationError, LoadError};
    pub use crate::exception_handler::WebError;
    pub use crate::extractors::*;
    pub use crate::loader::{load, RouteLoader};
    pub use crate::metadata::MetadataRegistry;
    pub use crate::middleware::{from_fn, Middleware, MiddlewareRef, Next};
    pub use crate::router::{AxumRouter, RouteRegistrar, RouterHandle};
    pub use crate::server::{GriffinWebServer, ServerProperties};
    pub use crate::validation::ValidateBody;
    pub use griffin_web_macros::{
        controller, delete_mapping, get_mapping, patch_mapping, post_mapping, put_mapping,
        use_middleware,
    };

    pub use async_trait::async_trait;
    pub use axum;
    pub use axum::extract::{Json, Path, Query, Request};
    pub use axum::http::StatusCode;
    pub use axum::response::{IntoResponse, Response};
}

/// 宏展开代码使用的路径，不属于公开 API
#[doc(hidden)]
pub mod __private {
    pub use crate::annotation::Verb;
    pub use crate::controller::{Controller, HandlerFn};
    pub use crate::metadata::MetadataRegistry;
    pub use crate::middleware::MiddlewareRef;
    pub use axum::extract::Request;
    pub use axum::response::{IntoResponse, Response};
    pub use futures_util::future::BoxFuture;
    pub use std::sync::Arc;

    /// 用 axum 的提取器机制调用一个处理器
    pub fn call_handler<H, T>(handler: H, req: Request) -> BoxFuture<'static, Response>
    where
        H: axum::handler::Handler<T, ()>,
        T: 'static,
    {
        Box::pin(axum::handler::Handler::call(handler, req, ()))
    }
}

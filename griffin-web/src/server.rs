//! Web 服务器模块
//!
//! 把加载好的路由挂到上下文路径下，套上全局层后用 axum 提供服务。

use axum::{extract::Request, middleware::from_fn, Router, ServiceExt};
use griffin_core::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, normalize_path::NormalizePath, trace::TraceLayer};

use crate::constants::*;
use crate::layers::{catch_panic, request_id, request_logging};

/// Web 服务器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerProperties {
    /// 服务器监听地址
    pub host: String,

    /// 服务器监听端口
    pub port: u16,

    /// 路由挂载的上下文路径，`/` 表示挂在根上
    pub context_path: String,

    /// 是否启用 CORS
    pub enable_cors: bool,

    /// 是否启用请求日志
    pub enable_request_logging: bool,
}

impl Default for ServerProperties {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            context_path: DEFAULT_CONTEXT_PATH.to_string(),
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

impl ServerProperties {
    /// 从 Environment 加载配置
    pub fn from_environment(env: &Environment) -> Self {
        let defaults = Self::default();

        let port = match env.get_i64(SERVER_PORT) {
            Some(port) => u16::try_from(port).unwrap_or_else(|_| {
                tracing::warn!(port, "Invalid {}, using {}", SERVER_PORT, defaults.port);
                defaults.port
            }),
            None => defaults.port,
        };

        Self {
            host: env.get_string_or(SERVER_HOST, &defaults.host),
            port,
            context_path: env.get_string_or(SERVER_CONTEXT_PATH, &defaults.context_path),
            enable_cors: env.get_bool_or(SERVER_ENABLE_CORS, defaults.enable_cors),
            enable_request_logging: env
                .get_bool_or(SERVER_ENABLE_REQUEST_LOGGING, defaults.enable_request_logging),
        }
    }

    /// 获取服务器地址
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 规范化后的上下文路径；挂在根上时为 None
    pub fn mount_path(&self) -> Option<String> {
        let trimmed = self.context_path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(trimmed.to_string())
        } else {
            Some(format!("/{}", trimmed))
        }
    }
}

/// Griffin Web 服务器
pub struct GriffinWebServer {
    properties: ServerProperties,
    routes: Router,
}

impl GriffinWebServer {
    pub fn new(properties: ServerProperties, routes: Router) -> Self {
        Self { properties, routes }
    }

    pub fn from_environment(env: &Environment, routes: Router) -> Self {
        Self::new(ServerProperties::from_environment(env), routes)
    }

    pub fn properties(&self) -> &ServerProperties {
        &self.properties
    }

    /// 组装最终的应用：上下文路径、全局层、末尾 `/` 规范化
    pub fn into_service(self) -> NormalizePath<Router> {
        let properties = self.properties;

        let mut app = match properties.mount_path() {
            Some(path) => Router::new().nest(&path, self.routes),
            None => self.routes,
        };

        app = app
            .layer(from_fn(catch_panic))
            .layer(from_fn(request_id));

        if properties.enable_request_logging {
            app = app
                .layer(from_fn(request_logging))
                .layer(TraceLayer::new_for_http());
        }

        if properties.enable_cors {
            app = app.layer(CorsLayer::permissive());
        }

        NormalizePath::trim_trailing_slash(app)
    }

    /// 启动服务器，收到 Ctrl+C 后优雅退出
    pub async fn run(self) -> ApplicationResult<()> {
        let addr = self.properties.address();
        let context_path = self.properties.mount_path().unwrap_or_else(|| "/".into());
        let app = self.into_service();

        tracing::info!("🚀 Starting Griffin Web Server on {}", addr);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApplicationError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        tracing::info!(
            "✅ Server listening on http://{} (context path: {})",
            addr,
            context_path
        );

        axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApplicationError::Server(format!("Server error: {}", e)))?;

        tracing::info!("Web server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

//! 统一的错误类型
//!
//! 库内部的错误使用 `thiserror` 定义的枚举，provider 工厂与启动代码使用
//! `anyhow::Result` 并通过 `.context()` 添加上下文信息。

use thiserror::Error;

pub use anyhow::Result;

/// 依赖解析错误
///
/// 由 [`Resolver`](crate::provider::Resolver) 在无法构造实例时返回。
/// 启动阶段遇到此错误必须中止，不允许带着未装配完整的组件对外服务。
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// 没有为该类型注册 provider
    #[error("no provider registered for `{type_name}`")]
    MissingProvider { type_name: &'static str },

    /// 循环依赖，`chain` 为从第一次进入到重复进入的完整链路
    #[error("circular dependency detected: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<&'static str> },

    /// provider 工厂自身返回了错误
    #[error("provider for `{type_name}` failed: {source}")]
    ProviderFailed {
        type_name: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// provider 产出的实例类型与注册的类型不一致
    #[error("provider for `{expected}` produced a value of a different type")]
    TypeMismatch { expected: &'static str },
}

pub type ResolutionResult<T> = std::result::Result<T, ResolutionError>;

/// 应用启动错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),
}

pub type ApplicationResult<T> = std::result::Result<T, ApplicationError>;

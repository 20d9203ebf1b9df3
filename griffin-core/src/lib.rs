// griffin-core: Griffin 框架的基础设施
//
// 提供：
// - 显式的 provider 映射（按类型解析实例，支持单例和原型作用域）
// - 多配置源的 Environment
// - 基于 tracing 的日志初始化
// - 应用启动引导

pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod provider;
pub mod scope;
pub mod utils;

pub use app::GriffinApplication;
pub use config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
    TomlPropertySource,
};
pub use constants::*;
pub use error::{ApplicationError, ApplicationResult, ResolutionError, ResolutionResult, Result};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use provider::{Instance, ProviderMap, Resolver, ResolverExt, TypeKey};
pub use scope::Scope;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::app::GriffinApplication;
    pub use crate::config::{
        ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
        TomlPropertySource,
    };
    pub use crate::error::{
        ApplicationError, ApplicationResult, ResolutionError, ResolutionResult, Result,
    };
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::provider::{ProviderMap, Resolver, ResolverExt, TypeKey};
    pub use crate::scope::Scope;
    pub use anyhow::{anyhow, Context};
}

//! 路由加载错误
//!
//! 均在启动阶段产生，任何一个都意味着路由表没有被构建，应用应当终止。

use griffin_core::ResolutionError;
use thiserror::Error;

use crate::annotation::Verb;

/// 注解与控制器声明不一致
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// 控制器没有声明基础路径
    #[error("controller `{controller}` has no base path; mark it with #[controller(\"/path\")] or mark_base_path")]
    NotAnnotated { controller: &'static str },

    /// 路由指向的方法在控制器上不存在
    #[error("route handler `{controller}.{handler}` does not exist")]
    HandlerMissing {
        controller: &'static str,
        handler: String,
    },

    /// 同一 (动词, 路径) 被声明了两次
    #[error("duplicate route {verb} {path}: declared by `{first}` and `{second}`")]
    DuplicateRoute {
        verb: Verb,
        path: String,
        first: String,
        second: String,
    },

    /// 拼接后的路径不合法
    #[error("invalid path `{path}` for `{handler}`: {reason}")]
    InvalidPath {
        path: String,
        handler: String,
        reason: String,
    },
}

/// 路由加载失败
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// 控制器实例无法解析
    #[error("failed to resolve controller `{controller}`: {source}")]
    Resolution {
        controller: &'static str,
        #[source]
        source: ResolutionError,
    },
}

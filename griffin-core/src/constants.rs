//! 核心配置键常量
//!
//! 宏、启动代码与配置文件使用同一组键名，避免硬编码不一致

// ==================== Application 配置 ====================

/// 激活的 profile（逗号分隔）
pub const APP_PROFILES_ACTIVE: &str = "app.profiles.active";

// ==================== Logging 配置 ====================

/// 日志级别
pub const LOGGING_LEVEL: &str = "logging.level";

/// 日志格式（compact / full / json / pretty）
pub const LOGGING_FORMAT: &str = "logging.format";

/// 自定义过滤器，语法同 RUST_LOG
pub const LOGGING_FILTER: &str = "logging.filter";

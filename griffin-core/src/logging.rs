//! 日志初始化
//!
//! 级别、格式和过滤器可以在代码里设置，也可以来自 `logging.*` 配置项或
//! `RUST_LOG` / `LOG_LEVEL` / `LOG_FORMAT` 环境变量。

use std::fmt;
use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{prelude::*, EnvFilter, Layer, Registry};

use crate::config::Environment;
use crate::constants::{LOGGING_FILTER, LOGGING_FORMAT, LOGGING_LEVEL};
use crate::error::{ApplicationError, ApplicationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "warning" {
            return Ok(LogLevel::Warn);
        }
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| format!("Invalid log level: {}", s))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 单行紧凑输出（默认）
    Compact,
    /// tracing-subscriber 的默认格式
    Full,
    /// 每行一个 JSON 对象
    Json,
    /// 多行输出，适合本地开发
    Pretty,
}

impl LogFormat {
    const ALL: [LogFormat; 4] = [
        LogFormat::Compact,
        LogFormat::Full,
        LogFormat::Json,
        LogFormat::Pretty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Full => "full",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| format!("Invalid log format: {}", s))
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,

    /// 是否输出事件的 target（模块路径）
    pub show_target: bool,

    /// EnvFilter 指令，设置后优先于 `level`，例如 `griffin_web=debug,tower_http=warn`
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            show_target: false,
            filter: None,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 只读取进程环境变量
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();

        Self {
            level: var("LOG_LEVEL")
                .and_then(|s| s.parse().ok())
                .unwrap_or(LogLevel::Info),
            format: var("LOG_FORMAT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(LogFormat::Compact),
            show_target: false,
            filter: var("RUST_LOG"),
        }
    }

    /// `logging.*` 配置项覆盖 [`LoggingConfig::from_env`] 的结果
    pub fn from_environment(env: &Environment) -> Self {
        let mut config = Self::from_env();

        if let Some(level) = env.get_string(LOGGING_LEVEL) {
            match level.parse() {
                Ok(level) => config.level = level,
                Err(e) => eprintln!("{}, keeping {}", e, config.level),
            }
        }
        if let Some(format) = env.get_string(LOGGING_FORMAT) {
            match format.parse() {
                Ok(format) => config.format = format,
                Err(e) => eprintln!("{}, keeping {}", e, config.format),
            }
        }
        if let Some(filter) = env.get_string(LOGGING_FILTER) {
            config.filter = Some(filter);
        }

        config
    }

    fn env_filter(&self) -> EnvFilter {
        let by_level = || {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from(self.level).into())
                .parse_lossy("")
        };
        match &self.filter {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| by_level()),
            None => by_level(),
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = tracing_subscriber::fmt::layer().with_target(self.show_target);
        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
        }
    }

    /// 安装全局 subscriber
    ///
    /// 全局 subscriber 只能安装一次，重复调用返回 `LoggingInitFailed`。
    pub fn init(self) -> ApplicationResult<()> {
        tracing_subscriber::registry()
            .with(self.fmt_layer())
            .with(self.env_filter())
            .try_init()
            .map_err(|e| ApplicationError::LoggingInitFailed(e.to_string()))
    }
}

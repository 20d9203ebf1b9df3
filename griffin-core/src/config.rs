//! 分层配置
//!
//! [`Environment`] 持有若干 [`PropertySource`]，按优先级从高到低查找，
//! 第一个命中的值生效。所有配置源都使用展平后的点分键，例如 `server.context-path`。

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use parking_lot::RwLock;

use crate::error::{ApplicationError, ApplicationResult};

/// 配置值
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<ConfigValue>),
    Object(HashMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// 整数；文本形式的数字也接受，环境变量总是文本
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            ConfigValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            ConfigValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// 标量的文本形式；数组和表返回 None
    pub fn to_text(&self) -> Option<String> {
        match self {
            ConfigValue::String(s) => Some(s.clone()),
            ConfigValue::Int(i) => Some(i.to_string()),
            ConfigValue::Float(f) => Some(f.to_string()),
            ConfigValue::Bool(b) => Some(b.to_string()),
            ConfigValue::Array(_) | ConfigValue::Object(_) => None,
        }
    }
}

impl From<toml::Value> for ConfigValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => ConfigValue::String(s),
            toml::Value::Integer(i) => ConfigValue::Int(i),
            toml::Value::Float(f) => ConfigValue::Float(f),
            toml::Value::Boolean(b) => ConfigValue::Bool(b),
            toml::Value::Datetime(dt) => ConfigValue::String(dt.to_string()),
            toml::Value::Array(items) => {
                ConfigValue::Array(items.into_iter().map(ConfigValue::from).collect())
            }
            toml::Value::Table(table) => ConfigValue::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, ConfigValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// 配置源
pub trait PropertySource: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// 数字越大越优先
    fn priority(&self) -> i32 {
        0
    }
}

/// 配置环境
#[derive(Default)]
pub struct Environment {
    /// 按优先级降序排列
    sources: RwLock<Vec<Box<dyn PropertySource>>>,
    active_profiles: RwLock<Vec<String>>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources = self.sources.read();
        f.debug_struct("Environment")
            .field(
                "sources",
                &sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("active_profiles", &*self.active_profiles.read())
            .finish()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加配置源；优先级相同的源，先添加的先查找
    pub fn add_property_source(&self, source: Box<dyn PropertySource>) {
        tracing::debug!(
            source = source.name(),
            priority = source.priority(),
            "Adding property source"
        );
        let mut sources = self.sources.write();
        let index = sources.partition_point(|s| s.priority() >= source.priority());
        sources.insert(index, source);
    }

    pub fn with_property_source(self, source: Box<dyn PropertySource>) -> Self {
        self.add_property_source(source);
        self
    }

    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        self.sources.read().iter().find_map(|source| {
            let value = source.get(key)?;
            tracing::trace!(key, source = source.name(), "Config value resolved");
            Some(value)
        })
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.to_text())
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_i64())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// 字符串列表，接受 TOML 数组或逗号分隔的文本
    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            ConfigValue::Array(items) => Some(items.iter().filter_map(|v| v.to_text()).collect()),
            ConfigValue::String(s) => Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn set_active_profiles(&self, profiles: Vec<String>) {
        *self.active_profiles.write() = profiles;
    }

    pub fn active_profiles(&self) -> Vec<String> {
        self.active_profiles.read().clone()
    }
}

/// 进程环境变量
///
/// 键 `server.context-path` 对应 `{prefix}SERVER_CONTEXT_PATH`。
pub struct EnvironmentPropertySource {
    prefix: String,
    priority: i32,
}

impl EnvironmentPropertySource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            priority: 100,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn variable_name(&self, key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| match c {
                '.' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{}", self.prefix, suffix)
    }
}

impl PropertySource for EnvironmentPropertySource {
    fn name(&self) -> &str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        std::env::var(self.variable_name(key))
            .ok()
            .map(ConfigValue::String)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 内存中的展平配置，也用于测试
pub struct MapPropertySource {
    name: String,
    properties: HashMap<String, ConfigValue>,
    priority: i32,
}

impl MapPropertySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
            priority: 50,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.properties.get(key).cloned()
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// TOML 文件，表被展平为点分键：`[server] port = 3000` 成为 `server.port`
pub struct TomlPropertySource {
    inner: MapPropertySource,
}

impl TomlPropertySource {
    pub fn from_file(path: impl AsRef<Path>) -> ApplicationResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApplicationError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content, path.display().to_string())
    }

    pub fn parse(content: &str, name: impl Into<String>) -> ApplicationResult<Self> {
        let name = name.into();
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| ApplicationError::Config(format!("Failed to parse {}: {}", name, e)))?;

        let mut inner = MapPropertySource::new(name).with_priority(0);
        flatten_into(&mut inner.properties, None, table);
        Ok(Self { inner })
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.inner.priority = priority;
        self
    }

    pub fn len(&self) -> usize {
        self.inner.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.properties.is_empty()
    }
}

fn flatten_into(out: &mut HashMap<String, ConfigValue>, prefix: Option<&str>, table: toml::Table) {
    for (key, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };
        match value {
            toml::Value::Table(nested) => flatten_into(out, Some(&key), nested),
            other => {
                out.insert(key, ConfigValue::from(other));
            }
        }
    }
}

impl PropertySource for TomlPropertySource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.inner.get(key)
    }

    fn priority(&self) -> i32 {
        self.inner.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_is_flattened() {
        let source = TomlPropertySource::parse(
            r#"
            [server]
            port = 3000
            context-path = "/api"

            [logging]
            level = "debug"
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(source.get("server.port"), Some(ConfigValue::Int(3000)));
        assert_eq!(
            source.get("server.context-path"),
            Some(ConfigValue::String("/api".into()))
        );
        assert_eq!(source.len(), 3);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = TomlPropertySource::parse("server = [", "broken");
        assert!(matches!(result, Err(ApplicationError::Config(_))));
    }

    #[test]
    fn test_higher_priority_source_wins() {
        let env = Environment::new()
            .with_property_source(Box::new(
                MapPropertySource::new("defaults")
                    .with_property("server.port", ConfigValue::Int(3000))
                    .with_property("server.host", ConfigValue::String("0.0.0.0".into()))
                    .with_priority(0),
            ))
            .with_property_source(Box::new(
                MapPropertySource::new("overrides")
                    .with_property("server.port", ConfigValue::String("8080".into()))
                    .with_priority(10),
            ));

        assert_eq!(env.get_i64("server.port"), Some(8080));
        assert_eq!(env.get_string("server.host").as_deref(), Some("0.0.0.0"));
        assert_eq!(env.get_i64("server.workers"), None);
    }

    #[test]
    fn test_equal_priority_keeps_insertion_order() {
        let env = Environment::new()
            .with_property_source(Box::new(
                MapPropertySource::new("first").with_property("k", ConfigValue::Int(1)),
            ))
            .with_property_source(Box::new(
                MapPropertySource::new("second").with_property("k", ConfigValue::Int(2)),
            ));

        assert_eq!(env.get_i64("k"), Some(1));
    }

    #[test]
    fn test_typed_getters_accept_text() {
        let env = Environment::new().with_property_source(Box::new(
            MapPropertySource::new("text")
                .with_property("server.enable-cors", ConfigValue::String("yes".into()))
                .with_property("server.port", ConfigValue::Int(3000))
                .with_property("app.origins", ConfigValue::String("a.com, b.com,".into())),
        ));

        assert_eq!(env.get_bool("server.enable-cors"), Some(true));
        assert_eq!(env.get_string("server.port").as_deref(), Some("3000"));
        assert_eq!(
            env.get_string_array("app.origins"),
            Some(vec!["a.com".to_string(), "b.com".to_string()])
        );
    }

    #[test]
    fn test_environment_variable_names() {
        let source = EnvironmentPropertySource::new("APP_");
        assert_eq!(
            source.variable_name("server.context-path"),
            "APP_SERVER_CONTEXT_PATH"
        );
        assert_eq!(source.variable_name("server.port"), "APP_SERVER_PORT");
    }
}

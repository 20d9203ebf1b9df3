//! 元数据注册表
//!
//! 以 `(元数据名, 目标类型[, 成员名])` 为键的类型化存储。注解在构建阶段写入，
//! 路由加载器读取；注册表按值移交给加载器，加载之后不再可变。

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use griffin_core::TypeKey;

use crate::controller::ControllerType;

/// 元数据键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataKey {
    name: &'static str,
    target: TypeKey,
    member: Option<String>,
}

impl MetadataKey {
    /// 类型级元数据键
    pub fn for_type(name: &'static str, target: TypeKey) -> Self {
        Self {
            name,
            target,
            member: None,
        }
    }

    /// 成员级元数据键
    pub fn for_member(name: &'static str, target: TypeKey, member: impl Into<String>) -> Self {
        Self {
            name,
            target,
            member: Some(member.into()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}@{}::{}", self.name, self.target.short_name(), member),
            None => write!(f, "{}@{}", self.name, self.target.short_name()),
        }
    }
}

/// 元数据注册表
#[derive(Default)]
pub struct MetadataRegistry {
    entries: HashMap<MetadataKey, Box<dyn Any + Send + Sync>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次执行每个控制器的 `annotate`，得到填充好的注册表
    pub fn from_controllers(controllers: &[ControllerType]) -> Self {
        let mut registry = Self::new();
        for controller in controllers {
            controller.annotate(&mut registry);
        }
        registry
    }

    /// 写入元数据，已存在的值被覆盖
    pub fn set<V: Any + Send + Sync>(&mut self, key: MetadataKey, value: V) {
        tracing::trace!(key = %key, "Defining metadata");
        self.entries.insert(key, Box::new(value));
    }

    /// 读取元数据；键不存在或类型不符时返回 None
    pub fn get<V: Any + Send + Sync>(&self, key: &MetadataKey) -> Option<&V> {
        self.entries.get(key).and_then(|value| value.downcast_ref::<V>())
    }

    pub fn get_mut<V: Any + Send + Sync>(&mut self, key: &MetadataKey) -> Option<&mut V> {
        self.entries
            .get_mut(key)
            .and_then(|value| value.downcast_mut::<V>())
    }

    pub fn has(&self, key: &MetadataKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.entries.keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("MetadataRegistry").field("keys", &keys).finish()
    }
}

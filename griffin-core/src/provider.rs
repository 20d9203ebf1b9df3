//! 显式的 provider 映射
//!
//! 以 `TypeId -> 工厂` 的形式描述"如何得到一个 T 的实例"，取代按构造参数类型
//! 自动装配的容器。路由加载器只依赖 [`Resolver`] 这一个接口，不关心依赖如何连接。

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ResolutionError, ResolutionResult};
use crate::utils::dependency::CreationTracker;
use crate::Scope;

/// 共享实例的类型擦除形式
pub type Instance = Arc<dyn Any + Send + Sync>;

type Factory = Box<dyn Fn(&dyn Resolver) -> anyhow::Result<Instance> + Send + Sync>;

/// 类型标识：`TypeId` 加上可读的类型名，用作 provider 与元数据的键
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型路径，例如 `customer_api::controller::CustomerController`
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 去掉模块路径后的类型名
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 解析器 - 把一个类型变成一个可用的实例
pub trait Resolver: Send + Sync {
    /// 解析指定类型的实例
    fn resolve_any(&self, key: TypeKey) -> ResolutionResult<Instance>;

    /// 是否能够提供指定类型
    fn can_resolve(&self, key: TypeKey) -> bool;
}

/// [`Resolver`] 的泛型便捷方法
pub trait ResolverExt: Resolver {
    /// 按类型解析实例
    fn resolve<T: Any + Send + Sync>(&self) -> ResolutionResult<Arc<T>> {
        let key = TypeKey::of::<T>();
        self.resolve_any(key)?
            .downcast::<T>()
            .map_err(|_| ResolutionError::TypeMismatch {
                expected: key.name(),
            })
    }
}

impl<R: Resolver + ?Sized> ResolverExt for R {}

struct Provider {
    scope: Scope,
    factory: Factory,
}

/// Provider 映射 - [`Resolver`] 的默认实现
///
/// # 示例
///
/// ```
/// use griffin_core::prelude::*;
///
/// struct Repository;
/// struct Service {
///     repository: std::sync::Arc<Repository>,
/// }
///
/// let mut providers = ProviderMap::new();
/// providers
///     .register_singleton(|_| Ok(Repository))
///     .register_singleton(|r| {
///         Ok(Service {
///             repository: r.resolve::<Repository>()?,
///         })
///     });
///
/// let service = providers.resolve::<Service>().unwrap();
/// let repository = providers.resolve::<Repository>().unwrap();
/// assert!(std::sync::Arc::ptr_eq(&service.repository, &repository));
/// ```
#[derive(Default)]
pub struct ProviderMap {
    providers: HashMap<TypeKey, Provider>,

    /// 单例缓存
    singletons: Mutex<HashMap<TypeKey, Instance>>,

    /// 循环依赖检测
    creation_tracker: CreationTracker,
}

impl ProviderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册单例 provider，工厂只会被调用一次
    pub fn register_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.insert::<T, F>(Scope::Singleton, factory)
    }

    /// 注册原型 provider，每次解析都调用工厂
    pub fn register_prototype<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.insert::<T, F>(Scope::Prototype, factory)
    }

    /// 注册一个已经构造好的实例
    pub fn register_instance<T: Any + Send + Sync>(&mut self, instance: Arc<T>) -> &mut Self {
        let key = TypeKey::of::<T>();
        self.insert_provider(
            key,
            Provider {
                scope: Scope::Singleton,
                factory: Box::new(move |_| Ok(Arc::clone(&instance) as Instance)),
            },
        )
    }

    fn insert<T, F>(&mut self, scope: Scope, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        self.insert_provider(
            key,
            Provider {
                scope,
                factory: Box::new(move |resolver| {
                    factory(resolver).map(|value| Arc::new(value) as Instance)
                }),
            },
        )
    }

    fn insert_provider(&mut self, key: TypeKey, provider: Provider) -> &mut Self {
        if self.providers.insert(key, provider).is_some() {
            tracing::warn!(type_name = key.name(), "Overriding existing provider");
            self.singletons.get_mut().remove(&key);
        }
        self
    }

    /// 是否注册了指定类型
    pub fn contains<T: Any>(&self) -> bool {
        self.providers.contains_key(&TypeKey::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Resolver for ProviderMap {
    fn resolve_any(&self, key: TypeKey) -> ResolutionResult<Instance> {
        let provider = self
            .providers
            .get(&key)
            .ok_or(ResolutionError::MissingProvider {
                type_name: key.name(),
            })?;

        if provider.scope == Scope::Singleton {
            if let Some(instance) = self.singletons.lock().get(&key) {
                return Ok(Arc::clone(instance));
            }
        }

        self.creation_tracker
            .start_creating(key.name())
            .map_err(|chain| ResolutionError::CircularDependency { chain })?;
        let created = (provider.factory)(self);
        self.creation_tracker.finish_creating(key.name());

        // 依赖链上更深处的解析错误原样向上传递
        let instance = created.map_err(|error| match error.downcast::<ResolutionError>() {
            Ok(inner) => inner,
            Err(error) => ResolutionError::ProviderFailed {
                type_name: key.name(),
                source: error.into(),
            },
        })?;

        tracing::debug!(type_name = key.name(), scope = ?provider.scope, "Created instance");

        if provider.scope == Scope::Singleton {
            let mut singletons = self.singletons.lock();
            let cached = singletons.entry(key).or_insert(instance);
            return Ok(Arc::clone(cached));
        }

        Ok(instance)
    }

    fn can_resolve(&self, key: TypeKey) -> bool {
        self.providers.contains_key(&key)
    }
}

impl fmt::Debug for ProviderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderMap")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("singletons", &self.singletons.lock().len())
            .finish()
    }
}

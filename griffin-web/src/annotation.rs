//! 路由注解
//!
//! 类级的基础路径标记、方法级的 HTTP 动词标记与中间件标记，全部写入
//! [`MetadataRegistry`]。`#[controller]` 等宏展开后调用的就是这里的函数，
//! 手写的控制器也可以直接调用它们。

use std::fmt;
use std::str::FromStr;

use axum::routing::MethodFilter;
use griffin_core::TypeKey;

use crate::metadata::{MetadataKey, MetadataRegistry};
use crate::middleware::MiddlewareRef;

/// 类级元数据：基础路径
pub const BASE_PATH_METADATA: &str = "basePath";

/// 类级元数据：路由列表
pub const ROUTES_METADATA: &str = "routes";

/// 成员级元数据：中间件列表
pub const MIDDLEWARES_METADATA: &str = "middlewares";

/// HTTP 动词
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
            Verb::Patch => "PATCH",
        }
    }

    /// 对应的 axum 方法过滤器
    pub fn method_filter(&self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Put => MethodFilter::PUT,
            Verb::Delete => MethodFilter::DELETE,
            Verb::Patch => MethodFilter::PATCH,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "DELETE" => Ok(Verb::Delete),
            "PATCH" => Ok(Verb::Patch),
            _ => Err(format!("Unsupported HTTP verb: {}", s)),
        }
    }
}

/// 路由定义：某个控制器方法上声明的 (动词, 路径模板, 处理器名)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    verb: Verb,
    path_template: String,
    handler_name: String,
}

impl RouteDefinition {
    pub fn new(verb: Verb, path_template: impl Into<String>, handler_name: impl Into<String>) -> Self {
        Self {
            verb,
            path_template: path_template.into(),
            handler_name: handler_name.into(),
        }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }
}

/// 控制器元数据：基础路径与按声明顺序排列的路由
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerMetadata {
    pub base_path: String,
    pub routes: Vec<RouteDefinition>,
}

impl MetadataRegistry {
    /// 标记控制器的基础路径
    ///
    /// 重复调用时后写入者生效；若尚无路由列表则初始化为空列表。
    pub fn mark_base_path<C: 'static>(&mut self, path: impl Into<String>) {
        self.mark_base_path_for(TypeKey::of::<C>(), path);
    }

    pub fn mark_base_path_for(&mut self, target: TypeKey, path: impl Into<String>) {
        let path = path.into();
        let key = MetadataKey::for_type(BASE_PATH_METADATA, target);
        if let Some(previous) = self.get::<String>(&key) {
            tracing::warn!(
                controller = target.short_name(),
                previous = %previous,
                path = %path,
                "Base path declared twice, last declaration wins"
            );
        }
        self.set(key, path);

        let routes_key = MetadataKey::for_type(ROUTES_METADATA, target);
        if !self.has(&routes_key) {
            self.set(routes_key, Vec::<RouteDefinition>::new());
        }
    }

    /// 追加一条路由定义，与基础路径的声明顺序无关
    pub fn mark_route<C: 'static>(
        &mut self,
        member: impl Into<String>,
        verb: Verb,
        path: impl Into<String>,
    ) {
        self.mark_route_for(TypeKey::of::<C>(), member, verb, path);
    }

    pub fn mark_route_for(
        &mut self,
        target: TypeKey,
        member: impl Into<String>,
        verb: Verb,
        path: impl Into<String>,
    ) {
        let route = RouteDefinition::new(verb, path, member);
        let key = MetadataKey::for_type(ROUTES_METADATA, target);
        match self.get_mut::<Vec<RouteDefinition>>(&key) {
            Some(routes) => routes.push(route),
            None => self.set(key, vec![route]),
        }
    }

    /// 为 `(C, member)` 追加中间件；多次调用按顺序拼接
    pub fn mark_middlewares<C: 'static>(
        &mut self,
        member: impl Into<String>,
        middlewares: Vec<MiddlewareRef>,
    ) {
        self.mark_middlewares_for(TypeKey::of::<C>(), member, middlewares);
    }

    pub fn mark_middlewares_for(
        &mut self,
        target: TypeKey,
        member: impl Into<String>,
        middlewares: Vec<MiddlewareRef>,
    ) {
        let key = MetadataKey::for_member(MIDDLEWARES_METADATA, target, member);
        match self.get_mut::<Vec<MiddlewareRef>>(&key) {
            Some(existing) => existing.extend(middlewares),
            None => self.set(key, middlewares),
        }
    }

    /// 组装控制器元数据；没有声明基础路径时返回 None
    pub fn controller_metadata(&self, target: TypeKey) -> Option<ControllerMetadata> {
        let base_path = self
            .get::<String>(&MetadataKey::for_type(BASE_PATH_METADATA, target))?
            .clone();
        let routes = self
            .get::<Vec<RouteDefinition>>(&MetadataKey::for_type(ROUTES_METADATA, target))
            .cloned()
            .unwrap_or_default();
        Some(ControllerMetadata { base_path, routes })
    }

    /// `(target, member)` 上绑定的中间件，未绑定时为空
    pub fn middlewares_for(&self, target: TypeKey, member: &str) -> Vec<MiddlewareRef> {
        self.get::<Vec<MiddlewareRef>>(&MetadataKey::for_member(
            MIDDLEWARES_METADATA,
            target,
            member,
        ))
        .cloned()
        .unwrap_or_default()
    }
}

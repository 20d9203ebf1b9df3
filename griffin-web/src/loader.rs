//! 路由加载器
//!
//! 启动时把注册表里的注解元数据变成路由表：按传入顺序解析每个控制器实例，
//! 为每条路由拼接完整路径、绑定处理器并组装中间件链。所有路由先暂存，
//! 全部校验通过后才依次注册到路由器，任何错误都不会留下部分注册的路由。
//!
//! ```ignore
//! let controllers = [ControllerType::of::<CustomerController>()];
//! let registry = MetadataRegistry::from_controllers(&controllers);
//! let router = load(registry, &controllers, &providers, AxumRouter::new())?;
//! ```

use std::collections::HashMap;
use std::time::Instant;

use griffin_core::Resolver;

use crate::annotation::Verb;
use crate::controller::{Controller, ControllerType};
use crate::error::{ConfigurationError, LoadError};
use crate::metadata::MetadataRegistry;
use crate::middleware::HandlerChain;
use crate::router::{trim_trailing_slash, RouteInfo, RouteRegistrar, RouterHandle};

/// 暂存的一条路由
struct DispatchEntry {
    verb: Verb,
    path: String,
    chain: HandlerChain,
}

/// 拼接基础路径与路由模板
///
/// 连接处重复的 `/` 合并为一个，刻意保留的单个 `/` 不动；两侧都没有 `/`
/// 时补一个；结果为空时为 `/`。
///
/// ```
/// use griffin_web::loader::join_path;
///
/// assert_eq!(join_path("/customers", "/"), "/customers/");
/// assert_eq!(join_path("/customers", "/:id"), "/customers/:id");
/// assert_eq!(join_path("/customers/", "/:id"), "/customers/:id");
/// assert_eq!(join_path("/customers", ":id"), "/customers/:id");
/// assert_eq!(join_path("", ""), "/");
/// ```
pub fn join_path(base_path: &str, template: &str) -> String {
    let joined = match (base_path.ends_with('/'), template.starts_with('/')) {
        (true, true) => format!("{}{}", base_path, &template[1..]),
        (false, false) if !base_path.is_empty() && !template.is_empty() => {
            format!("{}/{}", base_path, template)
        }
        _ => format!("{}{}", base_path, template),
    };

    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// 去掉末尾 `/` 并抹掉参数名后的路径，用于判定两条路由能否被区分
///
/// `/customers/:id/` 与 `/customers/:key` 得到同一个结果 `/customers/:`。
pub fn canonical_path(path: &str) -> String {
    let trimmed = trim_trailing_slash(path);
    if trimmed == "/" {
        return trimmed.to_string();
    }

    trimmed
        .split('/')
        .map(|segment| {
            if segment.starts_with(':') {
                ":"
            } else if segment.starts_with('*') {
                "*"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn validate_path(path: &str, handler: &str) -> Result<(), ConfigurationError> {
    let invalid = |reason: &str| ConfigurationError::InvalidPath {
        path: path.to_string(),
        handler: handler.to_string(),
        reason: reason.to_string(),
    };

    if !path.starts_with('/') {
        return Err(invalid("path must start with '/'"));
    }
    if path.chars().any(char::is_whitespace) {
        return Err(invalid("path must not contain whitespace"));
    }

    let segments: Vec<&str> = trim_trailing_slash(path).split('/').skip(1).collect();
    for (index, segment) in segments.iter().enumerate() {
        if *segment == ":" || *segment == "*" {
            return Err(invalid("parameter name must not be empty"));
        }
        if segment.starts_with('*') && index + 1 != segments.len() {
            return Err(invalid("wildcard must be the last segment"));
        }
    }

    Ok(())
}

/// 两条路径在共同前缀之后的同一位置上，一边是通配段而另一边不是同一个通配段
///
/// 普通参数段被视为同一节点，参数名不同不影响继续比较。
fn wildcard_conflict(a: &str, b: &str) -> bool {
    for (left, right) in a.split('/').zip(b.split('/')) {
        let left_wild = left.starts_with('*');
        let right_wild = right.starts_with('*');
        if left_wild || right_wild {
            return left != right;
        }
        let same_node = left == right || (left.starts_with(':') && right.starts_with(':'));
        if !same_node {
            return false;
        }
    }
    false
}

/// 已经出现过的路由，用于冲突检测
#[derive(Default)]
struct SeenRoutes {
    /// (动词, 规范路径) -> 处理器
    routes: HashMap<(Verb, String), String>,
    /// 规范路径 -> (第一次出现时的写法, 处理器)
    spellings: HashMap<String, (String, String)>,
}

impl SeenRoutes {
    fn check(&mut self, verb: Verb, path: &str, handler: &str) -> Result<(), ConfigurationError> {
        let canonical = canonical_path(path);
        let spelled = trim_trailing_slash(path).to_string();

        if let Some(first) = self.routes.get(&(verb, canonical.clone())) {
            return Err(ConfigurationError::DuplicateRoute {
                verb,
                path: path.to_string(),
                first: first.clone(),
                second: handler.to_string(),
            });
        }

        // 同一位置上的参数名不同，按路径分发时无法区分
        match self.spellings.get(&canonical) {
            Some((first_spelling, first_handler)) if *first_spelling != spelled => {
                return Err(ConfigurationError::InvalidPath {
                    path: path.to_string(),
                    handler: handler.to_string(),
                    reason: format!(
                        "parameter names conflict with `{}` declared by `{}`",
                        first_spelling, first_handler
                    ),
                });
            }
            Some(_) => {}
            None => {
                // 通配段只能独占所在位置，axum 遇到这类冲突会直接 panic
                if let Some((other, other_handler)) = self
                    .spellings
                    .values()
                    .find(|(other, _)| wildcard_conflict(other, &spelled))
                {
                    return Err(ConfigurationError::InvalidPath {
                        path: path.to_string(),
                        handler: handler.to_string(),
                        reason: format!(
                            "wildcard segment conflicts with `{}` declared by `{}`",
                            other, other_handler
                        ),
                    });
                }
                self.spellings
                    .insert(canonical.clone(), (spelled, handler.to_string()));
            }
        }

        self.routes.insert((verb, canonical), handler.to_string());
        Ok(())
    }
}

fn stage_controller(
    registry: &MetadataRegistry,
    controller: &ControllerType,
    resolver: &dyn Resolver,
    seen: &mut SeenRoutes,
    staged: &mut Vec<DispatchEntry>,
) -> Result<(), LoadError> {
    let key = controller.key();

    let instance = resolver
        .resolve_any(key)
        .map_err(|source| LoadError::Resolution {
            controller: controller.name(),
            source,
        })?;

    let metadata = registry
        .controller_metadata(key)
        .ok_or(ConfigurationError::NotAnnotated {
            controller: controller.name(),
        })?;

    tracing::debug!(
        controller = controller.name(),
        base_path = %metadata.base_path,
        routes = metadata.routes.len(),
        "Loading controller"
    );

    for route in &metadata.routes {
        let handler = controller
            .bind(&instance, route.handler_name())
            .map_err(|source| LoadError::Resolution {
                controller: controller.name(),
                source,
            })?
            .ok_or_else(|| ConfigurationError::HandlerMissing {
                controller: controller.name(),
                handler: route.handler_name().to_string(),
            })?;

        let path = join_path(&metadata.base_path, route.path_template());
        validate_path(&path, handler.name())?;
        seen.check(route.verb(), &path, handler.name())?;

        let middlewares = registry.middlewares_for(key, route.handler_name());
        staged.push(DispatchEntry {
            verb: route.verb(),
            path,
            chain: HandlerChain::new(middlewares, handler),
        });
    }

    Ok(())
}

/// 加载控制器并把它们的路由注册到 `router`
///
/// 注册表按值传入，加载之后即被丢弃。
pub fn load<R: RouteRegistrar>(
    registry: MetadataRegistry,
    controllers: &[ControllerType],
    resolver: &dyn Resolver,
    mut router: R,
) -> Result<RouterHandle<R>, LoadError> {
    let start = Instant::now();
    let mut seen = SeenRoutes::default();
    let mut staged = Vec::new();

    for controller in controllers {
        if let Err(e) = stage_controller(&registry, controller, resolver, &mut seen, &mut staged) {
            tracing::error!(
                controller = controller.name(),
                error = %e,
                "❌ Route loading failed, no routes were registered"
            );
            return Err(e);
        }
    }

    let mut routes = Vec::with_capacity(staged.len());
    for entry in staged {
        let info = RouteInfo {
            verb: entry.verb,
            path: entry.path.clone(),
            handler: entry.chain.handler().name().to_string(),
            middlewares: entry
                .chain
                .middlewares()
                .iter()
                .map(|m| m.name().to_string())
                .collect(),
        };

        tracing::info!(
            verb = %info.verb,
            path = %info.path,
            handler = %info.handler,
            middlewares = info.middlewares.len(),
            "Mapped {} {} -> {}",
            info.verb,
            info.path,
            info.handler
        );

        router.register(entry.verb, &entry.path, entry.chain);
        routes.push(info);
    }

    tracing::info!(
        "✅ Loaded {} route(s) from {} controller(s) in {}ms",
        routes.len(),
        controllers.len(),
        start.elapsed().as_millis()
    );

    Ok(RouterHandle::new(router, routes))
}

/// [`load`] 的链式写法
///
/// ```ignore
/// let router = RouteLoader::new(registry)
///     .controller::<RootController>()
///     .controller::<CustomerController>()
///     .load(&providers, AxumRouter::new())?;
/// ```
pub struct RouteLoader {
    registry: MetadataRegistry,
    controllers: Vec<ControllerType>,
}

impl RouteLoader {
    pub fn new(registry: MetadataRegistry) -> Self {
        Self {
            registry,
            controllers: Vec::new(),
        }
    }

    /// 先运行每个控制器的 `annotate` 构建注册表，再按相同顺序加载
    pub fn from_controllers(controllers: &[ControllerType]) -> Self {
        Self {
            registry: MetadataRegistry::from_controllers(controllers),
            controllers: controllers.to_vec(),
        }
    }

    /// 追加一个待加载的控制器
    pub fn controller<C: Controller>(self) -> Self {
        self.controller_type(ControllerType::of::<C>())
    }

    pub fn controller_type(mut self, controller: ControllerType) -> Self {
        self.controllers.push(controller);
        self
    }

    pub fn load<R: RouteRegistrar>(
        self,
        resolver: &dyn Resolver,
        router: R,
    ) -> Result<RouterHandle<R>, LoadError> {
        load(self.registry, &self.controllers, resolver, router)
    }
}

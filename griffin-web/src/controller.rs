//! 控制器支持
//!
//! [`Controller`] 描述一个控制器类型如何注解自己、如何按方法名找到处理函数；
//! [`ControllerType`] 是它的类型擦除描述符，交给路由加载器使用。

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::future::BoxFuture;
use griffin_core::{Instance, ResolutionError, TypeKey};
use serde::Serialize;

use crate::metadata::MetadataRegistry;
use crate::middleware::BoundHandler;

/// 控制器方法的统一形态：共享的控制器实例 + 请求 -> 响应
pub type HandlerFn<C> = fn(Arc<C>, Request) -> BoxFuture<'static, Response>;

/// 控制器
///
/// 一般由 `#[controller]` 宏实现；手写时在 `annotate` 中调用
/// `mark_base_path` / `mark_route` / `mark_middlewares`，在 `handler` 中
/// 按方法名返回处理函数。
pub trait Controller: Sized + Send + Sync + 'static {
    /// 向注册表写入本控制器的元数据
    fn annotate(_registry: &mut MetadataRegistry) {}

    /// 按方法名查找处理函数
    fn handler(name: &str) -> Option<HandlerFn<Self>>;
}

type BindFn = fn(&Instance, &str) -> Result<Option<BoundHandler>, ResolutionError>;

/// 控制器类型描述符
#[derive(Clone, Copy)]
pub struct ControllerType {
    key: TypeKey,
    annotate: fn(&mut MetadataRegistry),
    bind: BindFn,
}

impl ControllerType {
    pub fn of<C: Controller>() -> Self {
        Self {
            key: TypeKey::of::<C>(),
            annotate: C::annotate,
            bind: bind_handler::<C>,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.short_name()
    }

    pub fn annotate(&self, registry: &mut MetadataRegistry) {
        (self.annotate)(registry)
    }

    /// 把解析得到的实例与方法名绑定成处理器
    ///
    /// 实例类型不符时返回 `TypeMismatch`，方法不存在时返回 `Ok(None)`。
    pub fn bind(
        &self,
        instance: &Instance,
        handler: &str,
    ) -> Result<Option<BoundHandler>, ResolutionError> {
        (self.bind)(instance, handler)
    }
}

impl std::fmt::Debug for ControllerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ControllerType").field(&self.key).finish()
    }
}

fn bind_handler<C: Controller>(
    instance: &Instance,
    name: &str,
) -> Result<Option<BoundHandler>, ResolutionError> {
    let controller = instance
        .clone()
        .downcast::<C>()
        .map_err(|_| ResolutionError::TypeMismatch {
            expected: std::any::type_name::<C>(),
        })?;

    let Some(handler) = C::handler(name) else {
        return Ok(None);
    };

    let qualified = format!("{}.{}", TypeKey::of::<C>().short_name(), name);
    Ok(Some(BoundHandler::new(qualified, move |req| {
        handler(controller.clone(), req)
    })))
}

/// HTTP 响应实体
///
/// 允许完全控制状态码、响应头和响应体
#[derive(Debug)]
pub struct ResponseEntity<T> {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<T>,
}

impl<T> ResponseEntity<T> {
    pub fn new(status: StatusCode, body: T) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }

    /// 200 OK
    pub fn ok(body: T) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// 201 Created
    pub fn created(body: T) -> Self {
        Self::new(StatusCode::CREATED, body)
    }

    /// 只有状态码、没有响应体
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// 添加响应头
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl ResponseEntity<()> {
    /// 204 No Content
    pub fn no_content() -> Self {
        Self::empty(StatusCode::NO_CONTENT)
    }
}

impl<T> IntoResponse for ResponseEntity<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        };

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            if let Some(name) = name {
                headers.insert(name, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Verb;
    use axum::body::Body;
    use axum::http::header::LOCATION;

    struct GreetingController {
        greeting: String,
    }

    impl GreetingController {
        fn greet(this: Arc<Self>, _req: Request) -> BoxFuture<'static, Response> {
            Box::pin(async move { this.greeting.clone().into_response() })
        }
    }

    impl Controller for GreetingController {
        fn annotate(registry: &mut MetadataRegistry) {
            registry.mark_base_path::<Self>("/greetings");
            registry.mark_route::<Self>("greet", Verb::Get, "/");
        }

        fn handler(name: &str) -> Option<HandlerFn<Self>> {
            match name {
                "greet" => Some(Self::greet as HandlerFn<Self>),
                _ => None,
            }
        }
    }

    #[test]
    fn test_controller_type_annotates_registry() {
        let controllers = [ControllerType::of::<GreetingController>()];
        let registry = MetadataRegistry::from_controllers(&controllers);

        let metadata = registry
            .controller_metadata(controllers[0].key())
            .unwrap();
        assert_eq!(metadata.base_path, "/greetings");
        assert_eq!(metadata.routes.len(), 1);
        assert_eq!(controllers[0].name(), "GreetingController");
    }

    #[tokio::test]
    async fn test_bind_uses_resolved_instance() {
        let controller_type = ControllerType::of::<GreetingController>();
        let instance: Instance = Arc::new(GreetingController {
            greeting: "hello".to_string(),
        });

        let handler = controller_type.bind(&instance, "greet").unwrap().unwrap();
        assert_eq!(handler.name(), "GreetingController.greet");

        let response = handler.call(Request::new(Body::empty())).await;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[test]
    fn test_bind_unknown_handler_and_wrong_instance() {
        let controller_type = ControllerType::of::<GreetingController>();
        let instance: Instance = Arc::new(GreetingController {
            greeting: String::new(),
        });
        assert!(controller_type.bind(&instance, "missing").unwrap().is_none());

        let wrong: Instance = Arc::new(42u32);
        assert!(matches!(
            controller_type.bind(&wrong, "greet"),
            Err(ResolutionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_response_entity() {
        let response = ResponseEntity::created(serde_json::json!({"id": 1}))
            .header(LOCATION, HeaderValue::from_static("/customers/1"))
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[LOCATION], "/customers/1");

        let response = ResponseEntity::no_content().into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}

//! `#[controller]` 宏的端到端测试

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{self, StatusCode},
    response::Response,
    Json,
};
use griffin_core::ProviderMap;
use griffin_web::prelude::*;
use griffin_web::RouteInfo;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use validator::Validate;

type Trace = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone, Deserialize, Validate)]
struct Rename {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Pet {
    id: u64,
    name: String,
}

struct PetController {
    trace: Trace,
}

fn tracing_middleware(trace: &Trace, label: &'static str) -> impl Middleware {
    let trace = Arc::clone(trace);
    from_fn(move |req: Request, next: Next| {
        let trace = Arc::clone(&trace);
        async move {
            trace.lock().push(label.to_string());
            next.run(req).await
        }
    })
    .named(label)
}

fn marker(label: &'static str) -> impl Middleware {
    from_fn(move |req: Request, next: Next| async move {
        let mut response = next.run(req).await;
        response
            .headers_mut()
            .append("x-step", http::HeaderValue::from_static(label));
        response
    })
    .named(label)
}

#[controller("/pets")]
impl PetController {
    #[get_mapping("/")]
    async fn list(&self) -> Json<Vec<Pet>> {
        self.trace.lock().push("list".to_string());
        Json(vec![Pet {
            id: 1,
            name: "Rex".to_string(),
        }])
    }

    #[get_mapping("/:id")]
    fn find(&self, PathVariable(id): PathVariable<u64>) -> Result<Json<Pet>, WebError> {
        if id == 1 {
            Ok(Json(Pet {
                id,
                name: "Rex".to_string(),
            }))
        } else {
            Err(WebError::NotFound(format!("Pet {} not found", id)))
        }
    }

    #[put_mapping("/:id")]
    #[patch_mapping("/:id")]
    #[use_middleware(marker("first"), marker("second"))]
    #[use_middleware(ValidateBody::<Rename>::new())]
    async fn rename(
        &self,
        PathVariable(id): PathVariable<u64>,
        Validated(body): Validated<Rename>,
    ) -> Json<Pet> {
        Json(Pet {
            id,
            name: body.name,
        })
    }

    #[delete_mapping("/:id")]
    async fn remove(&self, PathVariable(_id): PathVariable<u64>) -> StatusCode {
        StatusCode::NO_CONTENT
    }

    /// 普通方法不会变成路由
    fn describe(&self) -> &'static str {
        "pets"
    }
}

struct HealthController;

#[controller]
impl HealthController {
    #[get_mapping]
    fn health(&self) -> &'static str {
        "ok"
    }
}

struct AuditController {
    trace: Trace,
}

#[controller("/audit")]
impl AuditController {
    #[post_mapping("/")]
    #[use_middleware(tracing_middleware(&audit_trace(), "A"), tracing_middleware(&audit_trace(), "B"))]
    async fn record(&self, Json(entry): Json<serde_json::Value>) -> StatusCode {
        self.trace.lock().push(format!("handler:{}", entry["event"]));
        StatusCode::ACCEPTED
    }
}

fn audit_trace() -> Trace {
    static TRACE: std::sync::OnceLock<Trace> = std::sync::OnceLock::new();
    Arc::clone(TRACE.get_or_init(|| Arc::new(Mutex::new(Vec::new()))))
}

fn providers(trace: &Trace) -> ProviderMap {
    let trace = Arc::clone(trace);
    let mut providers = ProviderMap::new();
    providers
        .register_singleton(move |_| {
            Ok(PetController {
                trace: Arc::clone(&trace),
            })
        })
        .register_singleton(|_| Ok(HealthController))
        .register_singleton(|_| Ok(AuditController { trace: audit_trace() }));
    providers
}

fn load_pets(trace: &Trace) -> RouterHandle<AxumRouter> {
    RouteLoader::from_controllers(&[ControllerType::of::<PetController>()])
        .load(&providers(trace), AxumRouter::new())
        .unwrap()
}

fn request(method: http::Method, uri: &str, body: Body) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn test_annotate_records_routes_in_declaration_order() {
    let registry = MetadataRegistry::from_controllers(&[ControllerType::of::<PetController>()]);
    let metadata = registry
        .controller_metadata(griffin_core::TypeKey::of::<PetController>())
        .unwrap();

    assert_eq!(metadata.base_path, "/pets");
    let routes: Vec<(Verb, &str, &str)> = metadata
        .routes
        .iter()
        .map(|r| (r.verb(), r.path_template(), r.handler_name()))
        .collect();
    assert_eq!(
        routes,
        vec![
            (Verb::Get, "/", "list"),
            (Verb::Get, "/:id", "find"),
            (Verb::Put, "/:id", "rename"),
            (Verb::Patch, "/:id", "rename"),
            (Verb::Delete, "/:id", "remove"),
        ]
    );
    assert!(PetController::handler("describe").is_none());
    assert_eq!(
        PetController {
            trace: Trace::default()
        }
        .describe(),
        "pets"
    );
}

#[test]
fn test_middlewares_are_attached_in_written_order() {
    let trace = Trace::default();
    let handle = load_pets(&trace);

    let rename: Vec<&RouteInfo> = handle
        .routes()
        .iter()
        .filter(|r| r.handler == "PetController.rename")
        .collect();
    assert_eq!(rename.len(), 2);
    for route in rename {
        assert_eq!(route.path, "/pets/:id");
        assert_eq!(route.middlewares, vec!["first", "second", "ValidateBody"]);
    }
}

#[tokio::test]
async fn test_async_and_sync_handlers_dispatch() {
    let trace = Trace::default();
    let handle = load_pets(&trace);

    let response = handle
        .dispatch(request(http::Method::GET, "/pets/", Body::empty()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let pets: Vec<Pet> = json_body(response).await;
    assert_eq!(pets.len(), 1);
    assert_eq!(trace.lock().as_slice(), ["list"]);

    let response = handle
        .dispatch(request(http::Method::GET, "/pets/1", Body::empty()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body::<Pet>(response).await,
        Pet {
            id: 1,
            name: "Rex".to_string()
        }
    );

    let response = handle
        .dispatch(request(http::Method::GET, "/pets/7", Body::empty()))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = handle
        .dispatch(request(http::Method::DELETE, "/pets/1", Body::empty()))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_extractor_rejection_is_returned() {
    let handle = load_pets(&Trace::default());

    let response = handle
        .dispatch(request(http::Method::GET, "/pets/abc", Body::empty()))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validation_middleware_runs_before_handler() {
    let handle = load_pets(&Trace::default());

    let response = handle
        .dispatch(request(
            http::Method::PUT,
            "/pets/1",
            Body::from(r#"{"name":"Max"}"#),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let steps: Vec<_> = response
        .headers()
        .get_all("x-step")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    // 响应按相反顺序经过中间件
    assert_eq!(steps, vec!["second", "first"]);
    assert_eq!(
        json_body::<Pet>(response).await,
        Pet {
            id: 1,
            name: "Max".to_string()
        }
    );

    let response = handle
        .dispatch(request(
            http::Method::PATCH,
            "/pets/1",
            Body::from(r#"{"name":""}"#),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = json_body(response).await;
    assert_eq!(body["errors"]["name"][0], "Name is required");
}

#[tokio::test]
async fn test_controller_without_base_path_needs_explicit_mark() {
    let controllers = [ControllerType::of::<HealthController>()];
    let trace = Trace::default();

    let registry = MetadataRegistry::from_controllers(&controllers);
    let err = load(registry, &controllers, &providers(&trace), AxumRouter::new()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Configuration(ConfigurationError::NotAnnotated { .. })
    ));

    let mut registry = MetadataRegistry::from_controllers(&controllers);
    registry.mark_base_path::<HealthController>("/health");
    let handle = load(registry, &controllers, &providers(&trace), AxumRouter::new()).unwrap();

    let response = handle
        .dispatch(request(http::Method::GET, "/health", Body::empty()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_middleware_chain_runs_before_handler() {
    let controllers = [ControllerType::of::<AuditController>()];
    let handle = RouteLoader::from_controllers(&controllers)
        .load(&providers(&Trace::default()), AxumRouter::new())
        .unwrap();

    let response = handle
        .dispatch(request(
            http::Method::POST,
            "/audit",
            Body::from(r#"{"event":"login"}"#),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        audit_trace().lock().as_slice(),
        ["A", "B", "handler:\"login\""]
    );
}

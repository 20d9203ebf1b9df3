//! Griffin Web Macros
//!
//! 控制器与路由注解的过程宏

mod controller;
mod route;
mod utils;

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;

/// 把一个 inherent impl 块声明为控制器
///
/// 为类型实现 `griffin_web::Controller`：`annotate` 依次标记基础路径、
/// 块内每个带动词属性的方法以及它们的中间件；`handler` 按方法名返回处理函数。
///
/// 路由方法必须以 `&self` 为接收者，其余参数都是 axum 提取器，返回值实现
/// `IntoResponse`，同步和异步方法都可以。
///
/// # 示例
///
/// ```ignore
/// #[controller("/customers")]
/// impl CustomerController {
///     #[get_mapping("/")]
///     async fn list(&self) -> Json<Vec<Customer>> { ... }
///
///     #[get_mapping("/:id")]
///     async fn find(&self, PathVariable(id): PathVariable<u64>) -> Result<Json<Customer>, WebError> { ... }
///
///     #[post_mapping("/")]
///     #[use_middleware(ValidateBody::<CreateCustomer>::new())]
///     async fn create(&self, Validated(body): Validated<CreateCustomer>) -> impl IntoResponse { ... }
/// }
/// ```
///
/// 不带参数的 `#[controller]` 只标记路由，基础路径需要另行调用 `mark_base_path`。
#[proc_macro_attribute]
#[proc_macro_error]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    controller::controller_impl(attr, item)
}

/// GET 路由，只能用在 `#[controller]` 块内
#[proc_macro_attribute]
#[proc_macro_error]
pub fn get_mapping(attr: TokenStream, item: TokenStream) -> TokenStream {
    route::outside_controller("get_mapping", attr, item)
}

/// POST 路由，只能用在 `#[controller]` 块内
#[proc_macro_attribute]
#[proc_macro_error]
pub fn post_mapping(attr: TokenStream, item: TokenStream) -> TokenStream {
    route::outside_controller("post_mapping", attr, item)
}

/// PUT 路由，只能用在 `#[controller]` 块内
#[proc_macro_attribute]
#[proc_macro_error]
pub fn put_mapping(attr: TokenStream, item: TokenStream) -> TokenStream {
    route::outside_controller("put_mapping", attr, item)
}

/// DELETE 路由，只能用在 `#[controller]` 块内
#[proc_macro_attribute]
#[proc_macro_error]
pub fn delete_mapping(attr: TokenStream, item: TokenStream) -> TokenStream {
    route::outside_controller("delete_mapping", attr, item)
}

/// PATCH 路由，只能用在 `#[controller]` 块内
#[proc_macro_attribute]
#[proc_macro_error]
pub fn patch_mapping(attr: TokenStream, item: TokenStream) -> TokenStream {
    route::outside_controller("patch_mapping", attr, item)
}

/// 为路由方法挂载中间件，按书写顺序执行；同一方法上的多个属性依次追加
#[proc_macro_attribute]
#[proc_macro_error]
pub fn use_middleware(attr: TokenStream, item: TokenStream) -> TokenStream {
    route::outside_controller("use_middleware", attr, item)
}

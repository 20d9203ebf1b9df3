//! 方法级路由属性的解析

use proc_macro::TokenStream;
use proc_macro2::Span;
use proc_macro_error::{abort, abort_call_site};
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ImplItemFn, LitStr, Meta, Token};

/// 路由属性名与 `Verb` 变体
const VERB_ATTRIBUTES: &[(&str, &str)] = &[
    ("get_mapping", "Get"),
    ("post_mapping", "Post"),
    ("put_mapping", "Put"),
    ("delete_mapping", "Delete"),
    ("patch_mapping", "Patch"),
];

const MIDDLEWARE_ATTRIBUTE: &str = "use_middleware";

/// 方法上声明的一条路由
pub struct RouteAttr {
    pub verb: syn::Ident,
    pub path: LitStr,
}

/// 从方法上解析出的全部路由信息
#[derive(Default)]
pub struct MethodRoutes {
    pub routes: Vec<RouteAttr>,
    pub middlewares: Vec<Expr>,
    /// 第一个路由或中间件属性的位置，用于报错
    pub span: Option<Span>,
}

impl MethodRoutes {
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.middlewares.is_empty()
    }
}

fn verb_of(attr: &Attribute) -> Option<&'static str> {
    let ident = attr.path().get_ident()?.to_string();
    VERB_ATTRIBUTES
        .iter()
        .find(|(name, _)| *name == ident)
        .map(|(_, verb)| *verb)
}

fn is_middleware(attr: &Attribute) -> bool {
    attr.path().is_ident(MIDDLEWARE_ATTRIBUTE)
}

/// `#[get_mapping]` 视为 `#[get_mapping("/")]`
fn parse_path(attr: &Attribute) -> LitStr {
    match &attr.meta {
        Meta::Path(path) => LitStr::new("/", path_span(path)),
        _ => match attr.parse_args::<LitStr>() {
            Ok(path) => path,
            Err(e) => abort!(e.span(), "expected a route path string, e.g. \"/:id\""),
        },
    }
}

fn path_span(path: &syn::Path) -> Span {
    path.segments
        .first()
        .map(|segment| segment.ident.span())
        .unwrap_or_else(Span::call_site)
}

fn parse_middlewares(attr: &Attribute) -> Vec<Expr> {
    match attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated) {
        Ok(list) => list.into_iter().collect(),
        Err(e) => abort!(e.span(), "expected a comma separated list of middleware expressions"),
    }
}

/// 取出方法上的路由与中间件属性，并把它们从方法上移除
pub fn take_route_attrs(method: &mut ImplItemFn) -> MethodRoutes {
    let mut found = MethodRoutes::default();

    method.attrs.retain(|attr| {
        if let Some(verb) = verb_of(attr) {
            found.span.get_or_insert_with(|| path_span(attr.path()));
            found.routes.push(RouteAttr {
                verb: syn::Ident::new(verb, path_span(attr.path())),
                path: parse_path(attr),
            });
            false
        } else if is_middleware(attr) {
            found.span.get_or_insert_with(|| path_span(attr.path()));
            found.middlewares.extend(parse_middlewares(attr));
            false
        } else {
            true
        }
    });

    found
}

/// 路由属性脱离 `#[controller]` 单独使用时报错
pub fn outside_controller(name: &str, _attr: TokenStream, _item: TokenStream) -> TokenStream {
    abort_call_site!(
        "#[{}] can only be used on methods inside a #[controller] impl block",
        name
    );
}

//! 宏辅助工具函数

use proc_macro2::TokenStream as TokenStream2;
use proc_macro_error::abort;
use quote::format_ident;
use syn::{FnArg, Ident, ImplItemFn, LitStr, Type};

/// 解析 `#[controller(...)]` 的参数：空或一个路径字符串
pub fn parse_base_path(attr: TokenStream2) -> Option<LitStr> {
    if attr.is_empty() {
        return None;
    }
    match syn::parse2::<LitStr>(attr) {
        Ok(path) => Some(path),
        Err(e) => abort!(
            e.span(),
            "expected a base path string";
            help = "use #[controller(\"/customers\")] or #[controller]"
        ),
    }
}

/// 路由方法的形参类型与生成的实参名
pub struct HandlerArgs {
    pub names: Vec<Ident>,
    pub types: Vec<Type>,
}

/// 检查路由方法的签名并收集提取器参数
///
/// 第一个参数必须是 `&self`，方法不能带泛型参数。
pub fn handler_args(method: &ImplItemFn) -> HandlerArgs {
    let sig = &method.sig;
    let method_name = &sig.ident;

    if !sig.generics.params.is_empty() {
        abort!(
            method_name.span(),
            "route method `{}` cannot be generic",
            method_name
        );
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => abort!(
            method_name.span(),
            "route method `{}` must take `&self` as its first parameter",
            method_name;
            help = "controllers are shared between requests, keep mutable state behind a lock"
        ),
    }

    let mut names = Vec::new();
    let mut types = Vec::new();
    for (index, input) in inputs.enumerate() {
        match input {
            FnArg::Typed(pat_type) => {
                names.push(format_ident!("__arg{}", index));
                types.push((*pat_type.ty).clone());
            }
            FnArg::Receiver(receiver) => {
                abort!(receiver.self_token.span, "unexpected second receiver")
            }
        }
    }

    HandlerArgs { names, types }
}

/// 生成的路由入口名
pub fn shim_name(method: &Ident) -> Ident {
    format_ident!("__griffin_route_{}", method)
}

//! Controller 宏实现

use proc_macro::TokenStream;
use proc_macro_error::abort;
use quote::quote;
use syn::{parse_macro_input, ImplItem, ItemImpl};

use crate::route::take_route_attrs;
use crate::utils;

/// 展开 `#[controller]`
///
/// 保留原 impl 块（去掉路由属性），额外生成：
/// - 每个路由方法一个 `__griffin_route_*` 入口，负责提取参数并转换响应
/// - `Controller` 实现，`annotate` 写入元数据，`handler` 按名字查找入口
pub fn controller_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let base_path = utils::parse_base_path(attr.into());
    let mut item_impl = parse_macro_input!(item as ItemImpl);

    if item_impl.trait_.is_some() {
        abort!(
            item_impl.impl_token.span,
            "#[controller] must be placed on an inherent impl block";
            help = "move the route methods into `impl YourController {{ ... }}`"
        );
    }

    let mut shims = Vec::new();
    let mut marks = Vec::new();
    let mut lookups = Vec::new();

    for impl_item in item_impl.items.iter_mut() {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };

        let routes = take_route_attrs(method);
        if routes.is_empty() {
            continue;
        }

        let method_name = method.sig.ident.clone();
        let name_str = method_name.to_string();

        if routes.routes.is_empty() {
            let span = routes.span.unwrap_or_else(|| method_name.span());
            abort!(
                span,
                "#[use_middleware] on `{}` has no route to attach to",
                name_str;
                help = "add #[get_mapping(...)] or another verb attribute to the method"
            );
        }

        let args = utils::handler_args(method);
        let arg_names = &args.names;
        let arg_types = &args.types;
        let shim = utils::shim_name(&method_name);
        let await_call = method.sig.asyncness.map(|_| quote!(.await));

        shims.push(quote! {
            #[doc(hidden)]
            #[allow(non_snake_case)]
            fn #shim(
                this: ::griffin_web::__private::Arc<Self>,
                req: ::griffin_web::__private::Request,
            ) -> ::griffin_web::__private::BoxFuture<'static, ::griffin_web::__private::Response> {
                let handler = move |#(#arg_names: #arg_types),*| async move {
                    ::griffin_web::__private::IntoResponse::into_response(
                        this.#method_name(#(#arg_names),*)#await_call,
                    )
                };
                ::griffin_web::__private::call_handler(handler, req)
            }
        });

        for route in &routes.routes {
            let verb = &route.verb;
            let path = &route.path;
            marks.push(quote! {
                registry.mark_route::<Self>(#name_str, ::griffin_web::__private::Verb::#verb, #path);
            });
        }

        if !routes.middlewares.is_empty() {
            let middlewares = &routes.middlewares;
            marks.push(quote! {
                registry.mark_middlewares::<Self>(
                    #name_str,
                    ::std::vec![
                        #(::griffin_web::__private::Arc::new(#middlewares) as ::griffin_web::__private::MiddlewareRef),*
                    ],
                );
            });
        }

        lookups.push(quote! {
            #name_str => ::std::option::Option::Some(
                Self::#shim as ::griffin_web::__private::HandlerFn<Self>
            ),
        });
    }

    let base_mark = base_path.map(|path| {
        quote! {
            registry.mark_base_path::<Self>(#path);
        }
    });

    let self_ty = &item_impl.self_ty;
    let (impl_generics, _, where_clause) = item_impl.generics.split_for_impl();

    let expanded = quote! {
        #item_impl

        impl #impl_generics #self_ty #where_clause {
            #(#shims)*
        }

        impl #impl_generics ::griffin_web::__private::Controller for #self_ty #where_clause {
            #[allow(unused_variables)]
            fn annotate(registry: &mut ::griffin_web::__private::MetadataRegistry) {
                #base_mark
                #(#marks)*
            }

            fn handler(name: &str) -> ::std::option::Option<::griffin_web::__private::HandlerFn<Self>> {
                match name {
                    #(#lookups)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    };

    TokenStream::from(expanded)
}

// 最小实例化：构造函数选择规则显式实现，不依赖宿主语言的重载决议。
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::{
    graph::Accessibility,
    metadata::{ConstructorRecord, ParameterRecord},
};

/// Pick the constructor used to instantiate an option.
///
/// Convention, resolved at generation time:
/// 1. the constructor flagged primary;
/// 2. otherwise the sole public constructor;
/// 3. otherwise the public constructor with the fewest parameters, the first
///    declared one on ties.
///
/// `None` when the option has no public constructor.
pub fn select_constructor(ctors: &[ConstructorRecord]) -> Option<&ConstructorRecord> {
    let public: Vec<&ConstructorRecord> = ctors
        .iter()
        .filter(|c| c.accessibility == Accessibility::Public)
        .collect();
    if let Some(primary) = public.iter().copied().find(|c| c.is_primary) {
        return Some(primary);
    }
    match public.as_slice() {
        [] => None,
        [only] => Some(*only),
        many => many.iter().copied().min_by_key(|c| c.params.len()),
    }
}

fn argument(param: &ParameterRecord) -> syn::Result<TokenStream> {
    match &param.default_literal {
        Some(lit) => {
            let expr: syn::Expr = syn::parse_str(lit)?;
            Ok(quote! { #expr })
        }
        None => Ok(quote! { ::core::default::Default::default() }),
    }
}

/// Expression constructing one instance of `path` via `ctor`; falls back to
/// `Default` when no public constructor exists.
pub fn instantiate(path: &syn::Path, ctor: Option<&ConstructorRecord>) -> syn::Result<TokenStream> {
    let Some(ctor) = ctor else {
        return Ok(quote! { <#path as ::core::default::Default>::default() });
    };
    let func = format_ident!("{}", ctor.name);
    let args = ctor
        .params
        .iter()
        .map(argument)
        .collect::<syn::Result<Vec<_>>>()?;
    Ok(quote! { #path::#func(#(#args),*) })
}

//! 生成阶段：把一个 [`RegistryModel`] 渲染为一个 Rust 源文件单元。
//!
//! 生成的注册表：
//! - `all()` 每次调用返回新的 `Vec`，顺序与模型一致；
//! - `by_name` / `by_id` 以 `None` 表示未命中，从不 panic；
//! - 零选项时仍是合法、恒为空的注册表。
pub mod instantiate;

use heck::{ToSnakeCase, ToUpperCamelCase};
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use std::collections::HashSet;

use crate::{
    config::GeneratorConfig,
    error::{RegistryError, Result},
    graph::{SymbolGraph, TypeKind, TypeRef},
    model::RegistryModel,
};

use instantiate::{instantiate, select_constructor};

/// One generated source unit, ready for the host build pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// Deterministic file name, derived from the declaring type.
    pub name: String,
    pub declaration: String,
    pub collection: String,
    pub contents: String,
}

pub const GENERATED_HEADER: &str = "// @generated by mmg-typereg. Do not edit.\n";

pub fn unit_name(declaring: &TypeRef) -> String {
    format!("{}.g.rs", declaring.name.replace("::", "."))
}

// 元素类型形态：能力（trait）→ trait 对象；其余 → 生成的包装枚举
enum ItemShape {
    TraitObject(syn::Type),
    Enum(syn::Ident),
}

impl ItemShape {
    fn tokens(&self) -> TokenStream {
        match self {
            ItemShape::TraitObject(ty) => quote! { ::std::boxed::Box<dyn #ty> },
            ItemShape::Enum(ident) => quote! { #ident },
        }
    }

    fn wrap(&self, variant: &syn::Ident, expr: &TokenStream) -> TokenStream {
        match self {
            ItemShape::TraitObject(ty) => {
                quote! { ::std::boxed::Box::new(#expr) as ::std::boxed::Box<dyn #ty> }
            }
            ItemShape::Enum(ident) => quote! { #ident::#variant(#expr) },
        }
    }
}

fn item_shape<G: SymbolGraph + ?Sized>(
    graph: &G,
    model: &RegistryModel,
    item: &syn::Ident,
) -> Result<ItemShape> {
    let ret = &model.return_type;
    let capability = graph
        .lookup(ret)
        .map_or(true, |site| site.decl.kind == TypeKind::Capability);
    // 带类型实参的能力：选项可能经由其它实例化匹配，只能逐个包装
    if capability && ret.arity() == 0 {
        Ok(ItemShape::TraitObject(parse_type(model, ret)?))
    } else {
        Ok(ItemShape::Enum(item.clone()))
    }
}

fn emit_err(model: &RegistryModel, message: impl Into<String>) -> RegistryError {
    RegistryError::Emit {
        declaration: model.definition.declaring.name.clone(),
        message: message.into(),
    }
}

fn parse_type(model: &RegistryModel, ty: &TypeRef) -> Result<syn::Type> {
    syn::parse_str(&ty.to_string()).map_err(|e| emit_err(model, format!("type '{ty}': {e}")))
}

fn parse_path(model: &RegistryModel, path: &str) -> Result<syn::Path> {
    syn::parse_str(path).map_err(|e| emit_err(model, format!("path '{path}': {e}")))
}

/// 把任意名称转为合法标识符：关键字与数字开头的名称加下划线
fn safe_ident(raw: &str) -> syn::Ident {
    let candidate = if raw.is_empty() || raw.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{raw}")
    } else {
        raw.to_string()
    };
    syn::parse_str::<syn::Ident>(&candidate).unwrap_or_else(|_| format_ident!("{}_", candidate))
}

/// 同一注册表内标识符去重：重名追加序号
fn unique_ident(raw: &str, used: &mut HashSet<String>) -> syn::Ident {
    let base = safe_ident(raw);
    let mut ident = base.clone();
    let mut n: u32 = 2;
    while !used.insert(ident.to_string()) {
        ident = format_ident!("{}{}", base, n);
        n += 1;
    }
    ident
}

const RESERVED_ACCESSORS: &[&str] = &["all", "by_name", "by_id", "names", "registry"];

struct OptionTokens {
    lookup_name: String,
    id: u32,
    path: syn::Path,
    variant: syn::Ident,
    accessor: syn::Ident,
    construct: TokenStream,
}

/// Render one model into one source unit.
pub fn emit<G: SymbolGraph + ?Sized>(
    graph: &G,
    model: &RegistryModel,
    cfg: &GeneratorConfig,
) -> Result<GeneratedUnit> {
    let def = &model.definition;
    let stem = def.name.to_upper_camel_case();
    let registry = syn::parse_str::<syn::Ident>(&format!("{stem}Registry"))
        .map_err(|_| emit_err(model, format!("collection name '{}' is not an identifier", def.name)))?;
    let runtime = parse_path(model, &cfg.runtime_path)?;
    let shape = item_shape(graph, model, &format_ident!("{}Item", stem))?;
    let item_ty = shape.tokens();

    let mut variants = HashSet::new();
    // 访问器与注册表自身的关联项共用一个命名空间
    let mut accessors: HashSet<String> = RESERVED_ACCESSORS.iter().map(|s| s.to_string()).collect();
    let mut options = Vec::with_capacity(model.options.len());
    for (position, option) in model.options.iter().enumerate() {
        let path = parse_path(model, &option.qualified)?;
        let ctor = select_constructor(&option.constructors);
        let construct = instantiate(&path, ctor)
            .map_err(|e| emit_err(model, format!("option '{}': {e}", option.qualified)))?;
        let lookup_name = option.lookup_name().to_string();
        options.push(OptionTokens {
            variant: unique_ident(&lookup_name.to_upper_camel_case(), &mut variants),
            accessor: unique_ident(&lookup_name.to_snake_case(), &mut accessors),
            id: option
                .explicit_id
                .unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX)),
            lookup_name,
            path,
            construct,
        });
    }

    let names: Vec<&str> = options.iter().map(|o| o.lookup_name.as_str()).collect();
    let all_items: Vec<TokenStream> = options
        .iter()
        .map(|o| shape.wrap(&o.variant, &o.construct))
        .collect();

    // 重名 / 重复 id：先出现者生效，其余分支不生成
    let mut seen_names = HashSet::new();
    let mut by_name_arms = Vec::new();
    for o in &options {
        if !seen_names.insert(o.lookup_name.as_str()) {
            tracing::warn!(collection = %def.name, option = %o.lookup_name, "duplicate option name; first one wins");
            continue;
        }
        let key = &o.lookup_name;
        let item = shape.wrap(&o.variant, &o.construct);
        by_name_arms.push(quote! { #key => ::core::option::Option::Some(#item) });
    }

    let emit_by_id = def.flags.by_id || model.options.iter().any(|o| o.explicit_id.is_some());
    let mut seen_ids = HashSet::new();
    let mut by_id_arms = Vec::new();
    for o in &options {
        if !seen_ids.insert(o.id) {
            tracing::warn!(collection = %def.name, option = %o.lookup_name, id = o.id, "duplicate option id; first one wins");
            continue;
        }
        let id = Literal::u32_unsuffixed(o.id);
        let item = shape.wrap(&o.variant, &o.construct);
        by_id_arms.push(quote! { #id => ::core::option::Option::Some(#item) });
    }

    let enum_def = match &shape {
        ItemShape::Enum(ident) => {
            let variants = options.iter().map(|o| {
                let v = &o.variant;
                let p = &o.path;
                quote! { #v(#p) }
            });
            let doc = format!("One option of the `{}` registry.", def.name);
            quote! {
                #[doc = #doc]
                pub enum #ident { #(#variants),* }
            }
        }
        ItemShape::TraitObject(_) => TokenStream::new(),
    };

    let by_id_fn = if emit_by_id {
        quote! {
            pub fn by_id(id: u32) -> ::core::option::Option<#item_ty> {
                match id {
                    #(#by_id_arms,)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    } else {
        TokenStream::new()
    };
    let by_id_impl = if emit_by_id {
        quote! {
            fn by_id(id: u32) -> ::core::option::Option<Self::Item> {
                #registry::by_id(id)
            }
        }
    } else {
        TokenStream::new()
    };

    let accessor_fns = if def.flags.accessors {
        options
            .iter()
            .map(|o| {
                let acc = &o.accessor;
                let p = &o.path;
                let c = &o.construct;
                quote! {
                    pub fn #acc() -> #p { #c }
                }
            })
            .collect::<Vec<_>>()
    } else {
        Vec::new()
    };

    let base_impl = if def.inherits_collection_base && def.declaring.arity() == 0 {
        let declaring = parse_path(model, &def.declaring.name)?;
        quote! {
            impl #declaring {
                pub fn registry() -> #registry { #registry }
            }
        }
    } else {
        TokenStream::new()
    };

    let name = &def.name;
    let struct_doc = format!(
        "Registry `{}` over options of `{}` (declared on `{}`).",
        def.name, def.marker, def.declaring
    );
    let tokens = quote! {
        #enum_def

        #[doc = #struct_doc]
        #[#runtime::generated]
        pub struct #registry;

        impl #registry {
            pub const NAMES: &'static [&'static str] = &[#(#names),*];

            pub fn all() -> ::std::vec::Vec<#item_ty> {
                ::std::vec![#(#all_items),*]
            }

            pub fn by_name(name: &str) -> ::core::option::Option<#item_ty> {
                match name {
                    #(#by_name_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            #by_id_fn

            #(#accessor_fns)*
        }

        impl #runtime::TypeRegistry for #registry {
            type Item = #item_ty;
            const NAME: &'static str = #name;

            fn names() -> &'static [&'static str] {
                #registry::NAMES
            }

            fn all() -> ::std::vec::Vec<Self::Item> {
                #registry::all()
            }

            fn by_name(name: &str) -> ::core::option::Option<Self::Item> {
                #registry::by_name(name)
            }

            #by_id_impl
        }

        #runtime::inventory::submit! {
            #runtime::RegistryEntry { name: #name, options: #registry::NAMES }
        }

        #base_impl
    };

    let file: syn::File = syn::parse2(tokens).map_err(|e| emit_err(model, e.to_string()))?;
    let contents = format!("{GENERATED_HEADER}{}", prettyplease::unparse(&file));
    let unit = GeneratedUnit {
        name: unit_name(&def.declaring),
        declaration: def.declaring.name.clone(),
        collection: def.name.clone(),
        contents,
    };
    tracing::info!(collection = %def.name, unit = %unit.name, options = model.options.len(), "registry emitted");
    Ok(unit)
}

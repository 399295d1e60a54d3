#![allow(dead_code)]

use mmg_typereg::graph::{
    Annotation, ConstructorDecl, Module, Namespace, ParamDecl, ProgramGraph, TypeDecl, TypeRef,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn ty(text: &str) -> TypeRef {
    text.parse().expect("type reference")
}

pub fn collection(name: &str) -> Annotation {
    Annotation::new("collection").named("name", name)
}

pub fn transitive(name: &str) -> Annotation {
    Annotation::new("mmg_typereg::transitive_collection").named("name", name)
}

pub fn collection_base(marker: &str) -> TypeRef {
    TypeRef::generic("mmg_typereg::CollectionBase", [ty(marker)])
}

/// `shapes::{IShape, Circle, Square, Polygon, Shapes}` in module `app`.
pub fn shapes_module() -> Module {
    Module::new("app").with_namespace(
        Namespace::new("shapes")
            .with_type(TypeDecl::capability("IShape"))
            .with_type(
                TypeDecl::class("Circle")
                    .implements(ty("shapes::IShape"))
                    .with_constructor(
                        ConstructorDecl::new()
                            .with_param(ParamDecl::new("radius", ty("f64")).with_default("1.0")),
                    ),
            )
            .with_type(
                TypeDecl::class("Square")
                    .implements(ty("shapes::IShape"))
                    .with_constructor(ConstructorDecl::new()),
            )
            .with_type(TypeDecl::abstract_class("Polygon").implements(ty("shapes::IShape")))
            .with_type(
                TypeDecl::class("Shapes")
                    .implements(collection_base("shapes::IShape"))
                    .annotated(collection("shapes")),
            ),
    )
}

pub fn shapes_graph() -> ProgramGraph {
    ProgramGraph::new("app", vec![shapes_module()]).expect("graph")
}

/// `app` depends on `core`, `plugin_x`, `plugin_y`; both plugins depend on `core`.
pub fn plugins_graph() -> ProgramGraph {
    let core = Module::new("core")
        .with_namespace(Namespace::new("core").with_type(TypeDecl::capability("IPlugin")));
    let plugin_x = Module::new("plugin_x").depends_on("core").with_namespace(
        Namespace::new("plugin_x").with_type(TypeDecl::class("PluginX").implements(ty("core::IPlugin"))),
    );
    let plugin_y = Module::new("plugin_y").depends_on("core").with_namespace(
        Namespace::new("plugin_y")
            .with_type(TypeDecl::class("PluginY").implements(ty("core::IPlugin")))
            .with_type(
                TypeDecl::class("HiddenPlugin")
                    .implements(ty("core::IPlugin"))
                    .with_accessibility(mmg_typereg::graph::Accessibility::Internal),
            ),
    );
    let app = Module::new("app")
        .depends_on("core")
        .depends_on("plugin_x")
        .depends_on("plugin_y")
        .with_namespace(
            Namespace::new("app")
                .with_type(
                    TypeDecl::class("AllPlugins")
                        .implements(collection_base("core::IPlugin"))
                        .annotated(transitive("plugins")),
                )
                .with_type(
                    TypeDecl::class("LocalPlugins")
                        .implements(collection_base("core::IPlugin"))
                        .annotated(collection("local_plugins")),
                ),
        );
    ProgramGraph::new("app", vec![app, core, plugin_x, plugin_y]).expect("graph")
}

fn registry_impl<'f>(file: &'f syn::File, registry: &str) -> &'f syn::ItemImpl {
    file.items
        .iter()
        .find_map(|item| match item {
            syn::Item::Impl(imp) if imp.trait_.is_none() => match &*imp.self_ty {
                syn::Type::Path(p) if p.path.is_ident(registry) => Some(imp),
                _ => None,
            },
            _ => None,
        })
        .expect("inherent impl of the registry")
}

/// Lookup names as written in the generated `NAMES` constant.
pub fn names(file: &syn::File, registry: &str) -> Vec<String> {
    let imp = registry_impl(file, registry);
    let expr = imp
        .items
        .iter()
        .find_map(|item| match item {
            syn::ImplItem::Const(c) if c.ident == "NAMES" => Some(&c.expr),
            _ => None,
        })
        .expect("NAMES constant");
    let syn::Expr::Reference(r) = expr else {
        panic!("NAMES is not a reference");
    };
    let syn::Expr::Array(arr) = &*r.expr else {
        panic!("NAMES is not an array");
    };
    arr.elems
        .iter()
        .map(|e| match e {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(s),
                ..
            }) => s.value(),
            _ => panic!("NAMES element is not a string literal"),
        })
        .collect()
}

/// Literal patterns of the `match` inside `registry::<func>`, in arm order.
/// `None` when the function is not generated.
pub fn match_keys(file: &syn::File, registry: &str, func: &str) -> Option<Vec<String>> {
    let imp = registry_impl(file, registry);
    let f = imp.items.iter().find_map(|item| match item {
        syn::ImplItem::Fn(f) if f.sig.ident == func => Some(f),
        _ => None,
    })?;
    let m = f.block.stmts.iter().find_map(|s| match s {
        syn::Stmt::Expr(syn::Expr::Match(m), _) => Some(m),
        _ => None,
    })?;
    Some(
        m.arms
            .iter()
            .filter_map(|arm| match &arm.pat {
                syn::Pat::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value()),
                syn::Pat::Lit(syn::ExprLit {
                    lit: syn::Lit::Int(i),
                    ..
                }) => Some(i.base10_digits().to_string()),
                _ => None,
            })
            .collect(),
    )
}

pub fn parse_unit(contents: &str) -> syn::File {
    syn::parse_file(contents).unwrap_or_else(|e| panic!("generated unit does not parse: {e}\n{contents}"))
}

/// Function names of the registry's inherent impl, in declared order.
pub fn fn_names(file: &syn::File, registry: &str) -> Vec<String> {
    registry_impl(file, registry)
        .items
        .iter()
        .filter_map(|item| match item {
            syn::ImplItem::Fn(f) => Some(f.sig.ident.to_string()),
            _ => None,
        })
        .collect()
}

use proc_macro::TokenStream;

mod codegen;

use codegen::{entrypoint, AttrKind};

// 注解即声明：宏只校验参数，条目原样保留；注册表由生成器在构建期产出。

/// Declare a collection whose options come from the current module only.
///
/// ```ignore
/// #[mmg_typereg::collection(name = "shapes", by_id)]
/// pub struct Shapes;
/// impl mmg_typereg::CollectionBase<dyn IShape> for Shapes {}
/// ```
///
/// Arguments: `name` (required, or a leading string literal), `return_type`,
/// `by_id`, `accessors`. A missing or empty name is a compile error.
#[proc_macro_attribute]
pub fn collection(args: TokenStream, input: TokenStream) -> TokenStream {
    entrypoint(AttrKind::Collection, args, input)
}

/// Like [`macro@collection`], but options are also gathered from every
/// dependency-reachable module.
#[proc_macro_attribute]
pub fn transitive_collection(args: TokenStream, input: TokenStream) -> TokenStream {
    entrypoint(AttrKind::TransitiveCollection, args, input)
}

/// Optional per-option metadata: `name = "..."` overrides the lookup name,
/// `id = N` pins the id used by `by_id`.
#[proc_macro_attribute]
pub fn registry_option(args: TokenStream, input: TokenStream) -> TokenStream {
    entrypoint(AttrKind::RegistryOption, args, input)
}

/// 生成产物标记：带此标记的类型永不参与发现。
#[proc_macro_attribute]
pub fn generated(args: TokenStream, input: TokenStream) -> TokenStream {
    entrypoint(AttrKind::Generated, args, input)
}

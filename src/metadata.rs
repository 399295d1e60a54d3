//! 元数据提取：记录每个选项的公开构造函数及其参数。
use crate::{
    config::GeneratorConfig,
    discovery::find_annotation,
    graph::{Accessibility, DeclKey, SymbolGraph, TypeDecl, TypeRef},
    options::OptionHandle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRecord {
    pub name: String,
    pub ty: TypeRef,
    pub has_default: bool,
    /// 默认值字面量原文，供最小实例化使用
    pub default_literal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorRecord {
    pub name: String,
    pub accessibility: Accessibility,
    pub params: Vec<ParameterRecord>,
    pub is_primary: bool,
}

/// One discovered concrete option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRecord {
    pub key: DeclKey,
    pub name: String,
    pub qualified: String,
    pub namespace: String,
    pub constructors: Vec<ConstructorRecord>,
    /// Name override from the option annotation, if any.
    pub display_name: Option<String>,
    pub explicit_id: Option<u32>,
}

impl OptionRecord {
    /// Key used by name lookup in the generated registry.
    pub fn lookup_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn type_ref(&self) -> TypeRef {
        TypeRef::new(self.qualified.clone())
    }
}

pub fn extract_constructors(decl: &TypeDecl) -> Vec<ConstructorRecord> {
    decl.constructors
        .iter()
        .filter(|c| c.accessibility == Accessibility::Public)
        .map(|c| ConstructorRecord {
            name: c.name.clone(),
            accessibility: c.accessibility,
            params: c
                .params
                .iter()
                .map(|p| ParameterRecord {
                    name: p.name.clone(),
                    ty: p.ty.clone(),
                    has_default: p.has_default || p.default.is_some(),
                    default_literal: p.default.clone(),
                })
                .collect(),
            is_primary: c.is_primary,
        })
        .collect()
}

/// Capture construction metadata for one option handle.
///
/// The option annotation is optional metadata only; its absence never
/// excludes the option.
pub fn extract_option<G: SymbolGraph + ?Sized>(
    graph: &G,
    handle: &OptionHandle,
    cfg: &GeneratorConfig,
) -> Option<OptionRecord> {
    let site = graph.lookup(&handle.type_ref())?;
    let annotation = find_annotation(site.decl, &cfg.option_annotation);
    let display_name = annotation
        .and_then(|a| a.str_arg("name"))
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    let explicit_id = annotation
        .and_then(|a| a.int_arg("id"))
        .and_then(|id| match u32::try_from(id) {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(option = %handle.qualified, id, "option id out of range; ignored");
                None
            }
        });
    Some(OptionRecord {
        key: handle.key.clone(),
        name: handle.name.clone(),
        qualified: handle.qualified.clone(),
        namespace: handle.namespace.clone(),
        constructors: extract_constructors(site.decl),
        display_name,
        explicit_id,
    })
}

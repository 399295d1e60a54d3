//! 标记类型解析：确定每个集合声明所注册的标记类型，并构建不可变的 [`CollectionDefinition`]。
use crate::{
    config::GeneratorConfig,
    discovery::{Candidate, Scope},
    error::{RegistryError, Result},
    graph::{base_chain, capability_closure, SymbolGraph, TypeRef, TypeSite},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionFlags {
    /// 生成按 id 查找
    pub by_id: bool,
    /// 为每个选项生成具名访问器
    pub accessors: bool,
}

/// One resolved collection declaration. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDefinition {
    pub name: String,
    pub declaring: TypeRef,
    pub declaring_namespace: String,
    pub marker: TypeRef,
    pub scope: Scope,
    pub return_type: Option<TypeRef>,
    pub flags: CollectionFlags,
    pub inherits_collection_base: bool,
}

/// Resolve the marker a candidate registers against.
///
/// Order: the candidate's own constrained generic parameter, then the first
/// type argument of a known collection base in its base chain (or, failing
/// that, among its capabilities). `None` means the candidate is skipped.
pub fn resolve_marker<G: SymbolGraph + ?Sized>(
    graph: &G,
    site: &TypeSite<'_>,
    cfg: &GeneratorConfig,
) -> Option<TypeRef> {
    let from_constraint = site
        .decl
        .generics
        .iter()
        .flat_map(|g| g.constraints.iter())
        .find(|c| !c.is_param);
    if let Some(marker) = from_constraint {
        return Some(marker.clone());
    }
    // 基类链优先；宿主以 trait 表达集合基类时再查能力集合
    base_chain(graph, site.decl)
        .into_iter()
        .find(|base| is_collection_base(base, cfg))
        .or_else(|| {
            capability_closure(graph, site.decl)
                .into_iter()
                .find(|cap| is_collection_base(cap, cfg))
        })
        .and_then(|base| base.args.into_iter().next())
}

fn is_collection_base(ty: &TypeRef, cfg: &GeneratorConfig) -> bool {
    ty.arity() >= 1 && cfg.collection_bases.iter().any(|b| *b == ty.name)
}

/// 声明类型自身是否结构上继承已知的泛型集合基类（基类链优先，其次能力集合）
pub fn inherits_collection_base<G: SymbolGraph + ?Sized>(
    graph: &G,
    site: &TypeSite<'_>,
    cfg: &GeneratorConfig,
) -> bool {
    base_chain(graph, site.decl)
        .iter()
        .any(|b| is_collection_base(b, cfg))
        || capability_closure(graph, site.decl)
            .iter()
            .any(|c| is_collection_base(c, cfg))
}

/// Build the definition for one candidate.
///
/// `Err(MissingName)` is fatal for this declaration; `Ok(None)` is the
/// lenient skip for an unresolvable marker.
pub fn build_definition<G: SymbolGraph + ?Sized>(
    graph: &G,
    candidate: &Candidate<'_>,
    cfg: &GeneratorConfig,
) -> Result<Option<CollectionDefinition>> {
    let site = &candidate.site;
    let name = match candidate.annotation.str_arg("name").map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => {
            return Err(RegistryError::MissingName {
                declaration: site.qualified.clone(),
            })
        }
    };
    let Some(marker) = resolve_marker(graph, site, cfg) else {
        tracing::debug!(declaration = %site.qualified, "marker type unresolved; skipping");
        return Ok(None);
    };
    let annotation = candidate.annotation;
    let def = CollectionDefinition {
        name,
        declaring: site.type_ref(),
        declaring_namespace: site.namespace.clone(),
        marker,
        scope: candidate.scope(),
        return_type: annotation.type_arg("return_type").cloned(),
        flags: CollectionFlags {
            by_id: annotation.flag("by_id"),
            accessors: annotation.flag("accessors"),
        },
        inherits_collection_base: inherits_collection_base(graph, site, cfg),
    };
    tracing::debug!(declaration = %site.qualified, collection = %def.name, marker = %def.marker, "collection resolved");
    Ok(Some(def))
}

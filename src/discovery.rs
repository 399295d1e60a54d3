//! 集合声明发现：在当前模块中递归查找带集合注解的类型。
//!
//! 注解分派在此处一次性归类为 [`DeclarationKind`]，下游只按该枚举分支，不再读取原始注解。
use std::collections::HashSet;

use crate::{
    config::{annotation_matches, GeneratorConfig},
    graph::{walk_module, Annotation, SymbolGraph, TypeDecl, TypeSite},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    LocalCollection,
    TransitiveCollection,
    Other,
}

/// Discovery scope for options of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// 仅当前模块
    Local,
    /// 当前模块及其依赖可达的全部模块
    Transitive,
}

impl DeclarationKind {
    pub fn scope(self) -> Option<Scope> {
        match self {
            DeclarationKind::LocalCollection => Some(Scope::Local),
            DeclarationKind::TransitiveCollection => Some(Scope::Transitive),
            DeclarationKind::Other => None,
        }
    }
}

/// 两种注解同时存在时 transitive 优先
pub fn classify(decl: &TypeDecl, cfg: &GeneratorConfig) -> DeclarationKind {
    if find_annotation(decl, &cfg.transitive_annotation).is_some() {
        DeclarationKind::TransitiveCollection
    } else if find_annotation(decl, &cfg.collection_annotation).is_some() {
        DeclarationKind::LocalCollection
    } else {
        DeclarationKind::Other
    }
}

pub(crate) fn find_annotation<'d>(decl: &'d TypeDecl, name: &str) -> Option<&'d Annotation> {
    decl.annotations
        .iter()
        .find(|a| annotation_matches(&a.name, name))
}

/// Types produced by a previous emission are never inputs to discovery.
pub fn is_generated(decl: &TypeDecl, cfg: &GeneratorConfig) -> bool {
    find_annotation(decl, &cfg.generated_annotation).is_some()
}

/// A collection declaration before marker resolution.
#[derive(Debug, Clone)]
pub struct Candidate<'g> {
    pub site: TypeSite<'g>,
    pub kind: DeclarationKind,
    pub annotation: &'g Annotation,
}

impl Candidate<'_> {
    pub fn scope(&self) -> Scope {
        // 候选只会以两种集合变体构造
        self.kind.scope().unwrap_or(Scope::Local)
    }
}

/// Find every collection declaration in the current module, in declared order.
pub fn discover_collections<'g, G: SymbolGraph + ?Sized>(
    graph: &'g G,
    cfg: &GeneratorConfig,
) -> Vec<Candidate<'g>> {
    let Some(module) = graph.module(graph.current_module()) else {
        tracing::warn!(module = %graph.current_module(), "current module missing from symbol graph");
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    walk_module(module, &mut |site| {
        if is_generated(site.decl, cfg) {
            return;
        }
        let kind = classify(site.decl, cfg);
        let annotation_name = match kind {
            DeclarationKind::TransitiveCollection => &cfg.transitive_annotation,
            DeclarationKind::LocalCollection => &cfg.collection_annotation,
            DeclarationKind::Other => return,
        };
        let Some(annotation) = find_annotation(site.decl, annotation_name) else {
            return;
        };
        if !seen.insert(site.key()) {
            return;
        }
        tracing::debug!(declaration = %site.qualified, ?kind, "collection declaration found");
        out.push(Candidate {
            site,
            kind,
            annotation,
        });
    });
    out
}

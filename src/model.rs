//! 注册表模型构建与返回类型推断。
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};

use crate::{
    config::GeneratorConfig,
    graph::{capability_closure, substitute, DeclKey, SymbolGraph, TypeRef},
    marker::CollectionDefinition,
    metadata::OptionRecord,
};

/// One collection definition plus its de-duplicated options.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryModel {
    pub definition: CollectionDefinition,
    pub options: Vec<OptionRecord>,
    /// Element type exposed by the registry.
    pub return_type: TypeRef,
}

impl RegistryModel {
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Merge a definition with its options. Duplicates (by declaration key) keep
/// the first occurrence and its position.
pub fn build_model<G: SymbolGraph + ?Sized>(
    graph: &G,
    definition: CollectionDefinition,
    options: impl IntoIterator<Item = OptionRecord>,
    cfg: &GeneratorConfig,
) -> RegistryModel {
    let mut unique: IndexMap<DeclKey, OptionRecord> = IndexMap::new();
    for option in options {
        if unique.contains_key(&option.key) {
            tracing::debug!(option = %option.qualified, collection = %definition.name, "duplicate option dropped");
            continue;
        }
        unique.insert(option.key.clone(), option);
    }
    let return_type = infer_return_type(graph, &definition, cfg);
    RegistryModel {
        definition,
        options: unique.into_values().collect(),
        return_type,
    }
}

/// Element type of the registry.
///
/// An explicit return type wins. Otherwise the marker's capabilities are
/// searched outward (direct ones first, then theirs) for the first one
/// derived from the configured option capability; failing that, the marker.
pub fn infer_return_type<G: SymbolGraph + ?Sized>(
    graph: &G,
    definition: &CollectionDefinition,
    cfg: &GeneratorConfig,
) -> TypeRef {
    if let Some(explicit) = &definition.return_type {
        return explicit.clone();
    }
    let marker = &definition.marker;
    let Some(option_cap) = cfg.option_capability.as_deref() else {
        return marker.clone();
    };
    let Some(marker_site) = graph.lookup(marker) else {
        return marker.clone();
    };
    let mut queue: VecDeque<TypeRef> = marker_site
        .decl
        .capabilities
        .iter()
        .map(|c| substitute(c, &marker_site.decl.generics, &marker.args))
        .collect();
    let mut seen = HashSet::new();
    while let Some(cap) = queue.pop_front() {
        if !seen.insert(cap.clone()) {
            continue;
        }
        let Some(site) = graph.lookup(&cap) else {
            continue;
        };
        let derived = capability_closure(graph, site.decl)
            .iter()
            .any(|c| c.name == option_cap);
        if derived {
            return cap;
        }
        queue.extend(
            site.decl
                .capabilities
                .iter()
                .map(|c| substitute(c, &site.decl.generics, &cap.args)),
        );
    }
    marker.clone()
}

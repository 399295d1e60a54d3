//! 选项发现：在作用域内递归遍历符号图，收集结构上派生自 / 实现标记类型的具体类型。
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};

use crate::{
    config::GeneratorConfig,
    discovery::{is_generated, Scope},
    graph::{
        base_chain, capability_closure, walk_module, Accessibility, DeclKey, SymbolGraph,
        TypeKind, TypeRef, TypeSite,
    },
};

/// A discovered option type, detached from the graph borrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionHandle {
    pub key: DeclKey,
    pub name: String,
    pub qualified: String,
    pub namespace: String,
    pub module: String,
}

impl OptionHandle {
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::new(self.qualified.clone())
    }
}

/// Modules inspected for `scope`: the current one first, then every
/// dependency-reachable module breadth-first, each exactly once.
pub fn modules_in_scope<G: SymbolGraph + ?Sized>(graph: &G, scope: Scope) -> Vec<String> {
    let current = graph.current_module().to_string();
    if scope == Scope::Local {
        return vec![current];
    }
    let mut seen: HashSet<String> = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::from([current]);
    while let Some(m) = queue.pop_front() {
        if !seen.insert(m.clone()) {
            continue;
        }
        if graph.module(&m).is_none() {
            tracing::warn!(module = %m, "dependency module missing from symbol graph");
            continue;
        }
        queue.extend(graph.dependencies(&m).iter().cloned());
        order.push(m);
    }
    order
}

/// 标记类型是否为能力形态；无法在图中解析时按能力处理（两条判定路径都检查）
fn marker_may_be_capability<G: SymbolGraph + ?Sized>(graph: &G, marker: &TypeRef) -> bool {
    graph
        .lookup(marker)
        .map_or(true, |site| site.decl.kind == TypeKind::Capability)
}

/// Whether one visited type is an option for `marker`.
pub fn qualifies<G: SymbolGraph + ?Sized>(
    graph: &G,
    site: &TypeSite<'_>,
    marker: &TypeRef,
    cfg: &GeneratorConfig,
) -> bool {
    let decl = site.decl;
    if decl.kind == TypeKind::Capability || decl.is_abstract || decl.is_open_generic() {
        return false;
    }
    if is_generated(decl, cfg) {
        return false;
    }
    if site.module != graph.current_module() && decl.accessibility != Accessibility::Public {
        return false;
    }
    if site.key() == marker.decl_key() {
        return false;
    }
    if base_chain(graph, decl).iter().any(|b| b.unifies_with(marker)) {
        return true;
    }
    marker_may_be_capability(graph, marker)
        && capability_closure(graph, decl)
            .iter()
            .any(|c| c.unifies_with(marker))
}

/// Walk every module in scope and collect qualifying types, first-seen-wins.
pub fn discover_options<G: SymbolGraph + ?Sized>(
    graph: &G,
    marker: &TypeRef,
    scope: Scope,
    cfg: &GeneratorConfig,
) -> Vec<OptionHandle> {
    let mut found: IndexMap<DeclKey, OptionHandle> = IndexMap::new();
    for module_name in modules_in_scope(graph, scope) {
        let Some(module) = graph.module(&module_name) else {
            continue;
        };
        walk_module(module, &mut |site| {
            if found.contains_key(&site.key()) || !qualifies(graph, &site, marker, cfg) {
                return;
            }
            tracing::debug!(option = %site.qualified, module = %site.module, marker = %marker, "option discovered");
            found.insert(
                site.key(),
                OptionHandle {
                    key: site.key(),
                    name: site.decl.name.clone(),
                    qualified: site.qualified.clone(),
                    namespace: site.namespace.clone(),
                    module: site.module.to_string(),
                },
            );
        });
    }
    found.into_values().collect()
}

type CacheKey = (Vec<String>, DeclKey);

/// Per-pass memo of option discovery results keyed by (module set, marker).
///
/// 仅在一轮生成内有效：随 pass 一起丢弃，绝不跨轮复用。
#[derive(Default)]
pub struct OptionCache {
    inner: Mutex<HashMap<CacheKey, Arc<[OptionHandle]>>>,
}

impl OptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_discover<G: SymbolGraph + ?Sized>(
        &self,
        graph: &G,
        marker: &TypeRef,
        scope: Scope,
        cfg: &GeneratorConfig,
    ) -> Arc<[OptionHandle]> {
        let key = (modules_in_scope(graph, scope), marker.decl_key());
        if let Some(hit) = self.inner.lock().get(&key) {
            tracing::debug!(marker = %marker, "option discovery memo hit");
            return hit.clone();
        }
        // 不持锁遍历；并发下同键可能重复计算，结果相同，先写入者保留
        let fresh: Arc<[OptionHandle]> = discover_options(graph, marker, scope, cfg).into();
        self.inner.lock().entry(key).or_insert(fresh).clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

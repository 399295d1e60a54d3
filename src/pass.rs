use async_trait::async_trait;
use parking_lot::Mutex;
use std::{fmt, sync::Arc};
use tokio::{
    sync::{watch, Semaphore},
    task::JoinSet,
};

use crate::{
    config::GeneratorConfig,
    discovery::discover_collections,
    emit::{emit, GeneratedUnit},
    error::{RegistryError, Result},
    graph::SymbolGraph,
    marker::{build_definition, CollectionDefinition},
    metadata::extract_option,
    model::build_model,
    options::OptionCache,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One problem reported against a single collection declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub declaration: String,
    pub message: String,
}

impl Diagnostic {
    fn error(declaration: impl Into<String>, err: &RegistryError) -> Self {
        Self {
            severity: Severity::Error,
            declaration: declaration.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.declaration, self.message)
    }
}

/// Result of one generation pass.
#[derive(Debug, Default, Clone)]
pub struct PassReport {
    /// Generated units in declaration order.
    pub units: Vec<GeneratedUnit>,
    pub diagnostics: Vec<Diagnostic>,
    /// 取消后已完成的单元仍保留在 `units` 中
    pub cancelled: bool,
}

impl PassReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn unit(&self, collection: &str) -> Option<&GeneratedUnit> {
        self.units.iter().find(|u| u.collection == collection)
    }
}

/// Receives generated units; the host build pipeline decides where they go.
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn accept(&self, unit: GeneratedUnit) -> anyhow::Result<()>;
}

/// In-memory sink, mainly for tests and embedding.
#[derive(Default)]
pub struct MemorySink {
    units: Mutex<Vec<GeneratedUnit>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units(&self) -> Vec<GeneratedUnit> {
        self.units.lock().clone()
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn accept(&self, unit: GeneratedUnit) -> anyhow::Result<()> {
        self.units.lock().push(unit);
        Ok(())
    }
}

// 名称与标记解析在调用线程上完成；之后每个定义只依赖拥有所有权的数据
enum Prepared {
    Ready(CollectionDefinition),
    Skipped(Option<Diagnostic>),
    Failed(Diagnostic),
}

/// One generation pass over an immutable graph snapshot.
pub struct Generator<G> {
    graph: Arc<G>,
    cfg: Arc<GeneratorConfig>,
}

impl<G> Clone for Generator<G> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            cfg: self.cfg.clone(),
        }
    }
}

impl<G: SymbolGraph + 'static> Generator<G> {
    pub fn new(graph: Arc<G>, cfg: GeneratorConfig) -> Self {
        Self {
            graph,
            cfg: Arc::new(cfg),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.cfg
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    fn prepare(&self) -> Vec<Prepared> {
        let graph = &*self.graph;
        let cfg = &*self.cfg;
        discover_collections(graph, cfg)
            .iter()
            .map(|candidate| {
                let declaration = &candidate.site.qualified;
                match build_definition(graph, candidate, cfg) {
                    Ok(Some(def)) => Prepared::Ready(def),
                    Ok(None) if cfg.warn_on_unresolved_marker => {
                        tracing::warn!(declaration = %declaration, "collection marker type could not be resolved; skipped");
                        Prepared::Skipped(Some(Diagnostic {
                            severity: Severity::Warning,
                            declaration: declaration.clone(),
                            message: "marker type could not be resolved; no registry generated"
                                .to_string(),
                        }))
                    }
                    Ok(None) => Prepared::Skipped(None),
                    Err(e) => {
                        tracing::error!(declaration = %declaration, error = %e, "collection declaration rejected");
                        Prepared::Failed(Diagnostic::error(declaration.clone(), &e))
                    }
                }
            })
            .collect()
    }

    /// Run every step for one definition: option discovery, metadata, model, emission.
    fn realize(
        graph: &G,
        def: CollectionDefinition,
        cfg: &GeneratorConfig,
        cache: &OptionCache,
    ) -> Result<GeneratedUnit> {
        let handles = cache.get_or_discover(graph, &def.marker, def.scope, cfg);
        let records: Vec<_> = handles
            .iter()
            .filter_map(|h| extract_option(graph, h, cfg))
            .collect();
        let model = build_model(graph, def, records, cfg);
        emit(graph, &model, cfg)
    }

    fn record(report: &mut PassReport, declaration: &str, outcome: Result<GeneratedUnit>) {
        match outcome {
            Ok(unit) => report.units.push(unit),
            Err(e) => {
                tracing::error!(declaration = %declaration, error = %e, "registry generation failed");
                report.diagnostics.push(Diagnostic::error(declaration, &e));
            }
        }
    }

    fn finish(report: PassReport) -> PassReport {
        tracing::info!(
            units = report.units.len(),
            diagnostics = report.diagnostics.len(),
            cancelled = report.cancelled,
            "generation pass finished"
        );
        report
    }

    /// Synchronous, single-threaded pass.
    pub fn generate(&self) -> PassReport {
        let cache = OptionCache::new();
        let mut report = PassReport::default();
        for prepared in self.prepare() {
            match prepared {
                Prepared::Ready(def) => {
                    let declaration = def.declaring.name.clone();
                    let outcome = Self::realize(&self.graph, def, &self.cfg, &cache);
                    Self::record(&mut report, &declaration, outcome);
                }
                Prepared::Skipped(diag) => report.diagnostics.extend(diag),
                Prepared::Failed(diag) => report.diagnostics.push(diag),
            }
        }
        Self::finish(report)
    }

    /// Pass with independent definitions on blocking workers, at most
    /// `workers` at a time. Cancellation is checked before each definition
    /// starts; output order equals [`Generator::generate`].
    pub async fn generate_concurrent(&self, cancel: watch::Receiver<bool>) -> PassReport {
        let cache = Arc::new(OptionCache::new());
        let permits = Arc::new(Semaphore::new(self.cfg.workers.max(1)));
        let mut report = PassReport::default();
        // 每个槽位对应一个声明，按声明顺序回填
        let mut slots: Vec<Option<(String, Result<GeneratedUnit>)>> = Vec::new();
        let mut early: Vec<(usize, Diagnostic)> = Vec::new();
        let mut set = JoinSet::new();

        for (index, prepared) in self.prepare().into_iter().enumerate() {
            slots.push(None);
            let def = match prepared {
                Prepared::Ready(def) => def,
                Prepared::Skipped(diag) => {
                    early.extend(diag.map(|d| (index, d)));
                    continue;
                }
                Prepared::Failed(diag) => {
                    early.push((index, diag));
                    continue;
                }
            };
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            if *cancel.borrow() {
                tracing::info!(declaration = %def.declaring, "generation pass cancelled");
                report.cancelled = true;
                break;
            }
            let graph = self.graph.clone();
            let cfg = self.cfg.clone();
            let cache = cache.clone();
            set.spawn_blocking(move || {
                let _permit = permit;
                let declaration = def.declaring.name.clone();
                let outcome = Self::realize(&graph, def, &cfg, &cache);
                (index, declaration, outcome)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, declaration, outcome)) => slots[index] = Some((declaration, outcome)),
                Err(e) => {
                    tracing::error!(error = %e, "generation worker failed");
                    report.diagnostics.push(Diagnostic {
                        severity: Severity::Error,
                        declaration: String::new(),
                        message: format!("worker failed: {e}"),
                    });
                }
            }
        }

        let mut early = early.into_iter().peekable();
        for (index, slot) in slots.into_iter().enumerate() {
            while let Some((_, diag)) = early.next_if(|(i, _)| *i == index) {
                report.diagnostics.push(diag);
            }
            if let Some((declaration, outcome)) = slot {
                Self::record(&mut report, &declaration, outcome);
            }
        }
        Self::finish(report)
    }

    /// Concurrent pass, then hand every unit to `sink` in declaration order.
    ///
    /// Diagnostics stay in the report; only a sink failure is an `Err`.
    pub async fn run_into<S: OutputSink + ?Sized>(
        &self,
        sink: &S,
        cancel: watch::Receiver<bool>,
    ) -> Result<PassReport> {
        let report = self.generate_concurrent(cancel).await;
        for unit in &report.units {
            sink.accept(unit.clone()).await.map_err(RegistryError::Sink)?;
        }
        Ok(report)
    }
}

/// Receiver that never signals cancellation.
pub fn never_cancel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    // 发送端丢弃后接收端仍可读取最后的值
    drop(tx);
    rx
}

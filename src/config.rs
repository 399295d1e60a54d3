use serde::Deserialize;

use crate::error::{RegistryError, Result};

/// 生成器配置：一轮生成开始前确定，生成期间只读。
///
/// 注解名按最后一段路径比较（`mmg_typereg::collection` 与 `collection` 等价）。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub collection_annotation: String,
    pub transitive_annotation: String,
    pub option_annotation: String,
    /// 生成产物携带的标记注解；带此注解的类型永不参与发现
    pub generated_annotation: String,
    /// 已知的泛型集合基类（限定名），用于标记类型解析的第二步
    pub collection_bases: Vec<String>,
    /// 返回类型推断所用的“选项”能力标记
    pub option_capability: Option<String>,
    pub warn_on_unresolved_marker: bool,
    pub workers: usize,
    /// 生成代码中引用运行时契约的 crate 路径
    pub runtime_path: String,
}

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_RUNTIME_PATH: &str = "::mmg_typereg";

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            collection_annotation: "collection".to_string(),
            transitive_annotation: "transitive_collection".to_string(),
            option_annotation: "registry_option".to_string(),
            generated_annotation: "generated".to_string(),
            collection_bases: vec!["mmg_typereg::CollectionBase".to_string()],
            option_capability: Some("mmg_typereg::RegistryItem".to_string()),
            warn_on_unresolved_marker: false,
            workers: DEFAULT_WORKERS,
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// 从 JSON 载入；缺省字段取默认值。
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: GeneratorConfig =
            serde_json::from_str(text).map_err(|e| RegistryError::Config(e.to_string()))?;
        if cfg.workers == 0 {
            return Err(RegistryError::Config("workers must be at least 1".to_string()));
        }
        Ok(cfg)
    }

    pub fn with_collection_base(mut self, qualified: impl Into<String>) -> Self {
        self.collection_bases.push(qualified.into());
        self
    }

    pub fn with_option_capability(mut self, qualified: impl Into<String>) -> Self {
        self.option_capability = Some(qualified.into());
        self
    }

    pub fn warn_on_unresolved(mut self, on: bool) -> Self {
        self.warn_on_unresolved_marker = on;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Compare an annotation name against a configured one by final path segment.
pub(crate) fn annotation_matches(actual: &str, expected: &str) -> bool {
    last_segment(actual) == last_segment(expected)
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

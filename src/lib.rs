pub mod config;
pub mod discovery;
pub mod emit;
pub mod error;
pub mod graph;
pub mod marker;
pub mod metadata;
pub mod model;
pub mod options;
pub mod pass;
pub mod registry;

// 允许在本 crate 内通过 `mmg_typereg::...` 自引用（生成代码与属性宏展开使用绝对路径）
extern crate self as mmg_typereg;

pub mod prelude {
    pub use crate::config::GeneratorConfig;
    pub use crate::emit::GeneratedUnit;
    pub use crate::error::{RegistryError, Result};
    pub use crate::graph::{ProgramGraph, SymbolGraph, TypeRef};
    pub use crate::pass::{Generator, MemorySink, OutputSink, PassReport};
    pub use crate::registry::{CollectionBase, RegistryItem, TypeRegistry};
}

// 生成代码经 `<runtime>::inventory::submit!` 登记
pub use inventory;
pub use registry::{CollectionBase, RegistryEntry, RegistryItem, TypeRegistry};
pub use typereg_macros::*;

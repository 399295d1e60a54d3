//! 生成器统一错误类型：单一枚举 + 手写 Display，不引入额外错误栈。
//! 仅 `MissingName` 属于致命错误；其余可恢复情形（标记类型无法解析、查找未命中、零选项）均以返回值表达。
use std::{error::Error as StdError, fmt};

#[derive(Debug)]
pub enum RegistryError {
    /// 集合声明缺少名称：仅终止该声明的生成，同一轮中的其它声明不受影响
    MissingName { declaration: String },
    InvalidTypeRef(String),
    Emit { declaration: String, message: String },
    Graph(String),  // 符号图载入失败（JSON 格式错误等）
    Config(String), // 配置解析失败
    Sink(anyhow::Error), // 外部输出端失败
    Cancelled,
}

impl RegistryError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RegistryError::MissingName { .. })
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::MissingName { declaration } => {
                write!(f, "collection declaration on '{declaration}' has no name")
            }
            RegistryError::InvalidTypeRef(s) => write!(f, "invalid type reference: {s}"),
            RegistryError::Emit {
                declaration,
                message,
            } => write!(f, "failed to emit registry for '{declaration}': {message}"),
            RegistryError::Graph(msg) => write!(f, "invalid symbol graph: {msg}"),
            RegistryError::Config(msg) => write!(f, "invalid generator config: {msg}"),
            RegistryError::Sink(e) => write!(f, "output sink failed: {e}"),
            RegistryError::Cancelled => write!(f, "generation pass cancelled"),
        }
    }
}

impl StdError for RegistryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            RegistryError::Sink(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T = ()> = std::result::Result<T, RegistryError>;

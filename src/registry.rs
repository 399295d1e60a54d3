//! 运行时契约：生成的注册表实现 [`TypeRegistry`]，并通过 inventory 登记 [`RegistryEntry`]。
//!
//! 生成代码经由 `<runtime>::inventory::submit!` 提交条目，链接进程序的全部注册表可在运行期枚举。

/// Implemented by every generated registry.
pub trait TypeRegistry {
    /// Element type handed out by the registry.
    type Item;
    /// Collection name declared on the annotation.
    const NAME: &'static str;

    /// Lookup names in declared order.
    fn names() -> &'static [&'static str];
    /// A fresh collection of every option, in declared order.
    fn all() -> Vec<Self::Item>;
    /// `None` is the not-found sentinel.
    fn by_name(name: &str) -> Option<Self::Item>;
    fn by_id(_id: u32) -> Option<Self::Item> {
        None
    }
}

/// Generic collection base: a declaring type implementing `CollectionBase<M>`
/// registers options of `M`.
pub trait CollectionBase<T: ?Sized> {}

/// Capability marking option families; used to infer a registry's element type.
pub trait RegistryItem {}

/// Registration info for one generated registry collected via inventory.
#[derive(Debug)]
pub struct RegistryEntry {
    pub name: &'static str,
    pub options: &'static [&'static str],
}

inventory::collect!(RegistryEntry);

impl RegistryEntry {
    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn contains(&self, option: &str) -> bool {
        self.options.contains(&option)
    }
}

/// Every registry linked into the program, sorted by name.
pub fn entries() -> Vec<&'static RegistryEntry> {
    let mut all: Vec<&'static RegistryEntry> =
        inventory::iter::<RegistryEntry>.into_iter().collect();
    all.sort_by(|a, b| a.name.cmp(b.name));
    all
}

pub fn find(name: &str) -> Option<&'static RegistryEntry> {
    inventory::iter::<RegistryEntry>
        .into_iter()
        .find(|e| e.name == name)
}

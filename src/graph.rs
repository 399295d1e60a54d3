//! 符号图适配层：对宿主程序已声明类型的只读视图。
//!
//! 一轮生成期间符号图是不可变快照；跨模块的“整个链接程序”信息只通过
//! [`SymbolGraph::dependencies`] 这一纯查询进入分析过程。
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt,
    str::FromStr,
};

use crate::error::{RegistryError, Result};

/// Reference to a declared type, possibly a generic instantiation.
///
/// Equality is structural over the full value; [`TypeRef::unifies_with`]
/// compares only the unbound declaration, so `Base<Foo>` and `Base<Bar>`
/// unify.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TypeRefRepr")]
pub struct TypeRef {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TypeRef>,
    /// 引用的是泛型形参（如 `T`）而非已声明类型
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_param: bool,
}

/// Unbound generic declaration identity: qualified name plus arity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclKey {
    pub name: String,
    pub arity: usize,
}

impl fmt::Display for DeclKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arity == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}`{}", self.name, self.arity)
        }
    }
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            is_param: false,
        }
    }

    pub fn generic(name: impl Into<String>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().collect(),
            is_param: false,
        }
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            is_param: true,
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn decl_key(&self) -> DeclKey {
        DeclKey {
            name: self.name.clone(),
            arity: self.args.len(),
        }
    }

    /// Generic-unification-aware equality.
    pub fn unifies_with(&self, other: &TypeRef) -> bool {
        !self.is_param
            && !other.is_param
            && self.name == other.name
            && self.args.len() == other.args.len()
    }

    /// 是否仍含未绑定的泛型形参
    pub fn is_open(&self) -> bool {
        self.is_param || self.args.iter().any(TypeRef::is_open)
    }

    pub fn short_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeRef {
    type Err = RegistryError;

    /// 解析 `a::Base<b::Foo, C<D>>` 形式；不识别泛型形参（需显式构造 [`TypeRef::param`]）。
    fn from_str(s: &str) -> Result<Self> {
        let (ty, rest) = parse_type(s).ok_or_else(|| RegistryError::InvalidTypeRef(s.to_string()))?;
        if !rest.trim().is_empty() {
            return Err(RegistryError::InvalidTypeRef(s.to_string()));
        }
        Ok(ty)
    }
}

fn parse_type(input: &str) -> Option<(TypeRef, &str)> {
    let input = input.trim_start();
    let end = input
        .find(|c: char| c == '<' || c == '>' || c == ',')
        .unwrap_or(input.len());
    let name = input[..end].trim();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == ':');
    if !valid || name.starts_with(':') || name.ends_with(':') {
        return None;
    }
    let mut rest = &input[end..];
    let mut args = Vec::new();
    if let Some(after) = rest.strip_prefix('<') {
        rest = after;
        loop {
            let (arg, after) = parse_type(rest)?;
            args.push(arg);
            let after = after.trim_start();
            if let Some(next) = after.strip_prefix(',') {
                rest = next;
            } else if let Some(next) = after.strip_prefix('>') {
                rest = next;
                break;
            } else {
                return None;
            }
        }
    }
    Some((TypeRef::generic(name, args), rest))
}

// 符号图 JSON 中类型引用既可写成字符串，也可写成完整对象
#[derive(Deserialize)]
#[serde(untagged)]
enum TypeRefRepr {
    Text(String),
    Full {
        name: String,
        #[serde(default)]
        args: Vec<TypeRef>,
        #[serde(default)]
        is_param: bool,
    },
}

impl TryFrom<TypeRefRepr> for TypeRef {
    type Error = RegistryError;

    fn try_from(repr: TypeRefRepr) -> Result<Self> {
        match repr {
            TypeRefRepr::Text(text) => text.parse(),
            TypeRefRepr::Full {
                name,
                args,
                is_param,
            } => Ok(TypeRef {
                name,
                args,
                is_param,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
}

/// 类（可具体实例化）或能力（接口 / trait）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Capability,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericParam {
    pub name: String,
    #[serde(default)]
    pub constraints: Vec<TypeRef>,
}

impl GenericParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
        }
    }

    pub fn constrained_to(mut self, ty: TypeRef) -> Self {
        self.constraints.push(ty);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationValue {
    Str(String),
    Type(TypeRef),
    Bool(bool),
    Int(i64),
}

impl From<&str> for AnnotationValue {
    fn from(v: &str) -> Self {
        AnnotationValue::Str(v.to_string())
    }
}
impl From<TypeRef> for AnnotationValue {
    fn from(v: TypeRef) -> Self {
        AnnotationValue::Type(v)
    }
}
impl From<bool> for AnnotationValue {
    fn from(v: bool) -> Self {
        AnnotationValue::Bool(v)
    }
}
impl From<i64> for AnnotationValue {
    fn from(v: i64) -> Self {
        AnnotationValue::Int(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationArg {
    #[serde(default)]
    pub name: Option<String>,
    pub value: AnnotationValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default)]
    pub args: Vec<AnnotationArg>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn positional(mut self, value: impl Into<AnnotationValue>) -> Self {
        self.args.push(AnnotationArg {
            name: None,
            value: value.into(),
        });
        self
    }

    pub fn named(mut self, key: impl Into<String>, value: impl Into<AnnotationValue>) -> Self {
        self.args.push(AnnotationArg {
            name: Some(key.into()),
            value: value.into(),
        });
        self
    }

    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.args
            .iter()
            .find(|a| a.name.as_deref() == Some(key))
            .map(|a| &a.value)
    }

    pub fn positionals(&self) -> impl Iterator<Item = &AnnotationValue> {
        self.args.iter().filter(|a| a.name.is_none()).map(|a| &a.value)
    }

    /// 命名参数优先，否则取第一个字符串型位置参数
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(AnnotationValue::Str(s)) => Some(s.as_str()),
            Some(_) => None,
            None => self.positionals().find_map(|v| match v {
                AnnotationValue::Str(s) => Some(s.as_str()),
                _ => None,
            }),
        }
    }

    pub fn type_arg(&self, key: &str) -> Option<&TypeRef> {
        match self.get(key) {
            Some(AnnotationValue::Type(t)) => Some(t),
            Some(_) => None,
            None => self.positionals().find_map(|v| match v {
                AnnotationValue::Type(t) => Some(t),
                _ => None,
            }),
        }
    }

    pub fn int_arg(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(AnnotationValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some(AnnotationValue::Bool(true)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub has_default: bool,
    #[serde(default)]
    pub default: Option<String>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            has_default: false,
            default: None,
        }
    }

    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        self.has_default = true;
        self.default = Some(literal.into());
        self
    }
}

fn default_ctor_name() -> String {
    "new".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    #[serde(default = "default_ctor_name")]
    pub name: String,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub is_primary: bool,
}

impl Default for ConstructorDecl {
    fn default() -> Self {
        Self {
            name: default_ctor_name(),
            accessibility: Accessibility::Public,
            params: Vec::new(),
            is_primary: false,
        }
    }
}

impl ConstructorDecl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    #[serde(default)]
    pub base: Option<TypeRef>,
    #[serde(default)]
    pub capabilities: Vec<TypeRef>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDecl>,
    #[serde(default)]
    pub nested: Vec<TypeDecl>,
}

impl TypeDecl {
    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_abstract: false,
            accessibility: Accessibility::Public,
            generics: Vec::new(),
            base: None,
            capabilities: Vec::new(),
            annotations: Vec::new(),
            constructors: Vec::new(),
            nested: Vec::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    pub fn capability(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Capability)
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        let mut decl = Self::class(name);
        decl.is_abstract = true;
        decl
    }

    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    pub fn implements(mut self, capability: TypeRef) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn with_generic(mut self, param: GenericParam) -> Self {
        self.generics.push(param);
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_constructor(mut self, ctor: ConstructorDecl) -> Self {
        self.constructors.push(ctor);
        self
    }

    pub fn with_nested(mut self, nested: TypeDecl) -> Self {
        self.nested.push(nested);
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn is_open_generic(&self) -> bool {
        !self.generics.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    /// 空串表示全局命名空间
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn global() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    pub fn with_namespace(mut self, ns: Namespace) -> Self {
        self.namespaces.push(ns);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            namespaces: Vec::new(),
        }
    }

    pub fn depends_on(mut self, module: impl Into<String>) -> Self {
        self.dependencies.push(module.into());
        self
    }

    pub fn with_namespace(mut self, ns: Namespace) -> Self {
        self.namespaces.push(ns);
        self
    }
}

/// One declared type together with where it was found.
#[derive(Debug, Clone)]
pub struct TypeSite<'g> {
    pub module: &'g str,
    pub namespace: String,
    pub qualified: String,
    pub decl: &'g TypeDecl,
}

impl TypeSite<'_> {
    /// The declaration's own reference; generic parameters appear as params.
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::generic(
            self.qualified.clone(),
            self.decl.generics.iter().map(|g| TypeRef::param(g.name.clone())),
        )
    }

    pub fn key(&self) -> DeclKey {
        DeclKey {
            name: self.qualified.clone(),
            arity: self.decl.generics.len(),
        }
    }
}

/// Read-only view over a program's declared types.
pub trait SymbolGraph: Send + Sync {
    /// 当前正在处理的模块
    fn current_module(&self) -> &str;
    fn module(&self, name: &str) -> Option<&Module>;
    /// Direct dependencies of `module`, in declared order.
    fn dependencies(&self, module: &str) -> &[String];
    /// Resolve a reference to its declaration by unbound declaration key.
    fn lookup(&self, ty: &TypeRef) -> Option<TypeSite<'_>>;
}

fn join(prefix: &str, segment: &str) -> String {
    match (prefix.is_empty(), segment.is_empty()) {
        (_, true) => prefix.to_string(),
        (true, false) => segment.to_string(),
        (false, false) => format!("{prefix}::{segment}"),
    }
}

/// Visit every namespace and every nesting level of `module` in declared order.
pub fn walk_module<'g>(module: &'g Module, visit: &mut dyn FnMut(TypeSite<'g>)) {
    walk_located(module, &mut |_, site| visit(site));
}

#[derive(Debug, Clone, Default)]
struct Location {
    module: usize,
    namespaces: SmallVec<[usize; 4]>,
    types: SmallVec<[usize; 4]>,
}

fn walk_located<'g>(module: &'g Module, visit: &mut dyn FnMut(&Location, TypeSite<'g>)) {
    let mut loc = Location::default();
    for (i, ns) in module.namespaces.iter().enumerate() {
        loc.namespaces.push(i);
        walk_namespace(module, ns, "", &mut loc, visit);
        loc.namespaces.pop();
    }
}

fn walk_namespace<'g>(
    module: &'g Module,
    ns: &'g Namespace,
    prefix: &str,
    loc: &mut Location,
    visit: &mut dyn FnMut(&Location, TypeSite<'g>),
) {
    let path = join(prefix, &ns.name);
    for (i, decl) in ns.types.iter().enumerate() {
        loc.types.push(i);
        walk_type(module, decl, &path, &path, loc, visit);
        loc.types.pop();
    }
    for (i, child) in ns.namespaces.iter().enumerate() {
        loc.namespaces.push(i);
        walk_namespace(module, child, &path, loc, visit);
        loc.namespaces.pop();
    }
}

fn walk_type<'g>(
    module: &'g Module,
    decl: &'g TypeDecl,
    namespace: &str,
    prefix: &str,
    loc: &mut Location,
    visit: &mut dyn FnMut(&Location, TypeSite<'g>),
) {
    let qualified = join(prefix, &decl.name);
    visit(
        loc,
        TypeSite {
            module: &module.name,
            namespace: namespace.to_string(),
            qualified: qualified.clone(),
            decl,
        },
    );
    for (i, nested) in decl.nested.iter().enumerate() {
        loc.types.push(i);
        walk_type(module, nested, namespace, &qualified, loc, visit);
        loc.types.pop();
    }
}

/// In-memory symbol graph, loadable from JSON.
#[derive(Debug, Clone)]
pub struct ProgramGraph {
    current: String,
    modules: Vec<Module>,
    module_index: HashMap<String, usize>,
    // 声明键 -> (命名空间, 限定名, 位置)；同名重复声明取首个
    index: HashMap<DeclKey, (String, String, Location)>,
}

#[derive(Deserialize)]
struct ProgramGraphRepr {
    current: String,
    modules: Vec<Module>,
}

impl ProgramGraph {
    pub fn new(current: impl Into<String>, modules: Vec<Module>) -> Result<Self> {
        let current = current.into();
        let mut module_index = HashMap::new();
        for (i, m) in modules.iter().enumerate() {
            if module_index.insert(m.name.clone(), i).is_some() {
                return Err(RegistryError::Graph(format!("duplicate module '{}'", m.name)));
            }
        }
        if !module_index.contains_key(&current) {
            return Err(RegistryError::Graph(format!(
                "current module '{current}' is not part of the graph"
            )));
        }
        let mut index = HashMap::new();
        for (mi, m) in modules.iter().enumerate() {
            walk_located(m, &mut |loc, site| {
                let mut loc = loc.clone();
                loc.module = mi;
                index
                    .entry(site.key())
                    .or_insert_with(|| (site.namespace.clone(), site.qualified.clone(), loc));
            });
        }
        Ok(Self {
            current,
            modules,
            module_index,
            index,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let repr: ProgramGraphRepr =
            serde_json::from_str(text).map_err(|e| RegistryError::Graph(e.to_string()))?;
        Self::new(repr.current, repr.modules)
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    fn resolve(&self, loc: &Location) -> Option<&TypeDecl> {
        let module = self.modules.get(loc.module)?;
        let (first_ns, rest_ns) = loc.namespaces.split_first()?;
        let mut ns = module.namespaces.get(*first_ns)?;
        for i in rest_ns {
            ns = ns.namespaces.get(*i)?;
        }
        let (first_ty, rest_ty) = loc.types.split_first()?;
        let mut decl = ns.types.get(*first_ty)?;
        for i in rest_ty {
            decl = decl.nested.get(*i)?;
        }
        Some(decl)
    }
}

impl SymbolGraph for ProgramGraph {
    fn current_module(&self) -> &str {
        &self.current
    }

    fn module(&self, name: &str) -> Option<&Module> {
        self.module_index.get(name).map(|i| &self.modules[*i])
    }

    fn dependencies(&self, module: &str) -> &[String] {
        self.module(module)
            .map(|m| m.dependencies.as_slice())
            .unwrap_or(&[])
    }

    fn lookup(&self, ty: &TypeRef) -> Option<TypeSite<'_>> {
        if ty.is_param {
            return None;
        }
        let (namespace, qualified, loc) = self.index.get(&ty.decl_key())?;
        let decl = self.resolve(loc)?;
        Some(TypeSite {
            module: &self.modules[loc.module].name,
            namespace: namespace.clone(),
            qualified: qualified.clone(),
            decl,
        })
    }
}

/// Replace generic parameters of a declaration with the arguments it was
/// instantiated with.
pub fn substitute(ty: &TypeRef, params: &[GenericParam], args: &[TypeRef]) -> TypeRef {
    if ty.is_param {
        if let Some(pos) = params.iter().position(|p| p.name == ty.name) {
            if let Some(arg) = args.get(pos) {
                return arg.clone();
            }
        }
        return ty.clone();
    }
    TypeRef {
        name: ty.name.clone(),
        args: ty.args.iter().map(|a| substitute(a, params, args)).collect(),
        is_param: false,
    }
}

/// Ancestors of `decl`, nearest first, with generic arguments substituted
/// through each instantiation. Stops at unresolvable bases and on cycles.
pub fn base_chain<G: SymbolGraph + ?Sized>(graph: &G, decl: &TypeDecl) -> Vec<TypeRef> {
    let mut chain: Vec<TypeRef> = Vec::new();
    let mut seen = HashSet::new();
    let mut next = decl.base.clone();
    while let Some(base) = next.take() {
        if !seen.insert(base.decl_key()) {
            break;
        }
        next = graph.lookup(&base).and_then(|site| {
            site.decl
                .base
                .as_ref()
                .map(|b| substitute(b, &site.decl.generics, &base.args))
        });
        chain.push(base);
    }
    chain
}

/// Every capability `decl` implements: its own, those inherited through the
/// base chain, and the super-capabilities of each, breadth-first.
pub fn capability_closure<G: SymbolGraph + ?Sized>(graph: &G, decl: &TypeDecl) -> Vec<TypeRef> {
    let mut queue: VecDeque<TypeRef> = decl.capabilities.iter().cloned().collect();
    let mut next = decl.base.clone();
    let mut seen_bases = HashSet::new();
    while let Some(base) = next.take() {
        if !seen_bases.insert(base.decl_key()) {
            break;
        }
        next = graph.lookup(&base).and_then(|site| {
            queue.extend(
                site.decl
                    .capabilities
                    .iter()
                    .map(|c| substitute(c, &site.decl.generics, &base.args)),
            );
            site.decl
                .base
                .as_ref()
                .map(|b| substitute(b, &site.decl.generics, &base.args))
        });
    }
    let mut out: Vec<TypeRef> = Vec::new();
    while let Some(cap) = queue.pop_front() {
        if out.contains(&cap) {
            continue;
        }
        if let Some(site) = graph.lookup(&cap) {
            queue.extend(
                site.decl
                    .capabilities
                    .iter()
                    .map(|c| substitute(c, &site.decl.generics, &cap.args)),
            );
        }
        out.push(cap);
    }
    out
}

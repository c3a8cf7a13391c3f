//! Type and method-signature model used by Arbiter's overload resolution.
//!
//! Types are plain values ([`TypeRef`]) that refer to class and type-parameter definitions through
//! interned ids. Definitions live behind the [`TypeEnv`] trait; [`TypeStore`] is the in-memory
//! implementation produced by a type-graph builder, and [`TyContext`] layers per-resolution
//! allocations (capture variables) on top of any environment without mutating it.

#![forbid(unsafe_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

mod context;
mod format;
mod lub;
mod store;
mod subst;
mod subtyping;
mod supertypes;

pub use context::TyContext;
pub use format::{format_method_signature, format_type, SignatureDisplay, TypeDisplay};
pub use lub::{glb, lub, lub_with_depth, make_intersection, DEFAULT_LUB_DEPTH};
pub use store::{TypeStore, WellKnownTypes};
pub use subst::{
    canonicalize, class_substitution, erase_params, erasure, mentions_any, substitute,
    Substitution,
};
pub use subtyping::{
    boxed, conversion, is_convertible, is_subtype, unboxed, ApplicabilityPhase, Conversion,
};
pub use supertypes::{
    declared_methods, instantiate_as_supertype, supertypes_of, MethodRef, MethodSignature,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(u32);

impl ClassId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(u32);

impl TypeVarId {
    const CONTEXT_LOCAL_BIT: u32 = 1 << 31;

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }

    pub(crate) fn new_context_local(index: u32) -> Self {
        Self(Self::CONTEXT_LOCAL_BIT | index)
    }

    pub(crate) fn context_local_index(self) -> Option<usize> {
        if (self.0 & Self::CONTEXT_LOCAL_BIT) == 0 {
            return None;
        }
        Some((self.0 & !Self::CONTEXT_LOCAL_BIT) as usize)
    }

    /// Whether this variable was allocated by a [`TyContext`] rather than the global store.
    pub fn is_context_local(self) -> bool {
        self.context_local_index().is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Char,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveType::Boolean)
    }

    /// Identity or widening primitive conversion (JLS 5.1.2).
    pub fn widens_to(self, target: PrimitiveType) -> bool {
        use PrimitiveType::*;

        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Double | Boolean => false,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<TypeRef>),
    Super(Box<TypeRef>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<TypeRef>,
}

/// A reference to a type.
///
/// `Raw` never carries type arguments. A `Class` with no arguments whose definition declares
/// type parameters is treated as raw; [`canonicalize`] rewrites it to `Raw`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeRef {
    Void,
    Primitive(PrimitiveType),
    Class(ClassType),
    Raw(ClassId),
    TypeVar(TypeVarId),
    Wildcard(WildcardBound),
    Array(Box<TypeRef>),
    /// Only produced by lub/glb/capture; never written by a declaration.
    Intersection(Vec<TypeRef>),
    /// Type of the `null` literal.
    Null,
}

impl TypeRef {
    pub fn class(def: ClassId, args: Vec<TypeRef>) -> Self {
        TypeRef::Class(ClassType { def, args })
    }

    pub fn array(elem: TypeRef) -> Self {
        TypeRef::Array(Box::new(elem))
    }

    pub fn int() -> Self {
        TypeRef::Primitive(PrimitiveType::Int)
    }

    pub fn long() -> Self {
        TypeRef::Primitive(PrimitiveType::Long)
    }

    pub fn double() -> Self {
        TypeRef::Primitive(PrimitiveType::Double)
    }

    pub fn boolean() -> Self {
        TypeRef::Primitive(PrimitiveType::Boolean)
    }

    pub fn extends(bound: TypeRef) -> Self {
        TypeRef::Wildcard(WildcardBound::Extends(Box::new(bound)))
    }

    pub fn super_of(bound: TypeRef) -> Self {
        TypeRef::Wildcard(WildcardBound::Super(Box::new(bound)))
    }

    pub fn unbounded() -> Self {
        TypeRef::Wildcard(WildcardBound::Unbounded)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        !matches!(
            self,
            TypeRef::Primitive(_) | TypeRef::Void | TypeRef::Wildcard(_)
        )
    }

    /// The class this type names directly, if any (`List<String>` and raw `List` both yield
    /// `List`).
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            TypeRef::Class(ClassType { def, .. }) | TypeRef::Raw(def) => Some(*def),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    /// Never empty once stored: an unwritten bound is `Object`.
    pub upper_bounds: Vec<TypeRef>,
    /// Only capture variables of `? super` wildcards have a lower bound.
    pub lower_bound: Option<TypeRef>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    /// When `is_varargs` is set the last parameter is an array type.
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub thrown: Vec<TypeRef>,
    pub is_static: bool,
    pub is_varargs: bool,
    pub is_abstract: bool,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, params: Vec<TypeRef>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            params,
            return_type,
            thrown: Vec::new(),
            is_static: false,
            is_varargs: false,
            is_abstract: false,
        }
    }

    pub fn with_type_params(mut self, type_params: Vec<TypeVarId>) -> Self {
        self.type_params = type_params;
        self
    }

    pub fn with_thrown(mut self, thrown: Vec<TypeRef>) -> Self {
        self.thrown = thrown;
        self
    }

    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn into_varargs(mut self) -> Self {
        self.is_varargs = true;
        self
    }

    pub fn into_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Binary name, e.g. `java.util.List`.
    pub name: String,
    pub kind: ClassKind,
    pub is_abstract: bool,
    pub type_params: Vec<TypeVarId>,
    /// `None` on a class means `java.lang.Object` (except for `Object` itself).
    pub super_class: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, ClassKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            is_abstract: true,
            ..Self::new(name, ClassKind::Interface)
        }
    }

    fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_abstract: false,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn into_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_type_params(mut self, type_params: Vec<TypeVarId>) -> Self {
        self.type_params = type_params;
        self
    }

    pub fn extends(mut self, super_class: TypeRef) -> Self {
        self.super_class = Some(super_class);
        self
    }

    pub fn implements(mut self, iface: TypeRef) -> Self {
        self.interfaces.push(iface);
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// Unqualified name (`java.util.List` -> `List`).
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit(|c| c == '.' || c == '$')
            .next()
            .unwrap_or(&self.name)
    }
}

/// Read-only access to a fully-built type hierarchy.
///
/// Implementations must be immutable for the duration of a resolution pass; the trait requires
/// `Sync` so call sites can be resolved in parallel against one environment.
pub trait TypeEnv: Sync {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;

    /// Every class reachable from `id` through `extends`/`implements` (including `id` itself and,
    /// for interfaces, `Object`), in breadth-first order.
    ///
    /// Implementations are encouraged to memoise; the default recomputes on every call.
    fn erased_ancestors(&self, id: ClassId) -> Arc<[ClassId]> {
        compute_erased_ancestors(self, id)
    }
}

pub(crate) fn compute_erased_ancestors<E: TypeEnv + ?Sized>(env: &E, id: ClassId) -> Arc<[ClassId]> {
    let object = env.well_known().object;
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([id]);

    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        out.push(current);
        let Some(def) = env.class(current) else {
            continue;
        };
        match &def.super_class {
            Some(sc) => queue.extend(sc.class_id()),
            None if current != object => queue.push_back(object),
            None => {}
        }
        queue.extend(def.interfaces.iter().filter_map(TypeRef::class_id));
    }

    out.into()
}

/// Whether `sub` names `sup` or one of its (erased) subclasses/subinterfaces.
pub fn is_subclass(env: &dyn TypeEnv, sub: ClassId, sup: ClassId) -> bool {
    sub == sup || env.erased_ancestors(sub).contains(&sup)
}

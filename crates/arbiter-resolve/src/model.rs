use std::fmt;

use arbiter_types::{
    ApplicabilityPhase, ClassId, MethodSignature, Substitution, TypeEnv, TypeRef,
};
use serde::{Deserialize, Serialize};

/// Whether the call names its receiver through a type (`Foo.m()`) or an expression (`foo.m()`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    Static,
    Instance,
}

/// A method invocation whose argument types are already known.
///
/// Immutable once built; the whole value is the resolution cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    pub receiver_type: TypeRef,
    pub call_kind: CallKind,
    pub method_name: String,
    pub explicit_type_args: Option<Vec<TypeRef>>,
    pub argument_types: Vec<TypeRef>,
    /// Target type of an assignment context, used as a soft inference constraint.
    pub expected_return: Option<TypeRef>,
}

impl CallSite {
    pub fn new(
        receiver_type: TypeRef,
        method_name: impl Into<String>,
        argument_types: Vec<TypeRef>,
    ) -> Self {
        Self {
            receiver_type,
            call_kind: CallKind::Instance,
            method_name: method_name.into(),
            explicit_type_args: None,
            argument_types,
            expected_return: None,
        }
    }

    pub fn into_static(mut self) -> Self {
        self.call_kind = CallKind::Static;
        self
    }

    pub fn with_type_args(mut self, type_args: Vec<TypeRef>) -> Self {
        self.explicit_type_args = Some(type_args);
        self
    }

    pub fn expecting(mut self, expected: TypeRef) -> Self {
        self.expected_return = Some(expected);
        self
    }
}

/// A method found applicable for one call site, instantiated for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub signature: MethodSignature,
    /// Total over `signature.type_params`; empty for non-generic methods.
    pub substitution: Substitution,
    pub phase: ApplicabilityPhase,
    pub formal_params: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub used_varargs: bool,
    /// An argument needed unchecked conversion; the return type is erased in that case.
    pub unchecked: bool,
}

impl Candidate {
    pub fn declaring_class(&self) -> ClassId {
        self.signature.declaring_class()
    }

    pub fn display<'a>(&'a self, env: &'a dyn TypeEnv) -> CandidateDisplay<'a> {
        CandidateDisplay { env, candidate: self }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionResult {
    Selected(Candidate),
    Ambiguous(Vec<Candidate>),
    NotApplicable,
    /// Two equally specific candidates whose erasures collide without one overriding the other.
    NameClash(MethodSignature, MethodSignature),
}

impl ResolutionResult {
    pub fn selected(&self) -> Option<&Candidate> {
        match self {
            ResolutionResult::Selected(candidate) => Some(candidate),
            _ => None,
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, ResolutionResult::Selected(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolutionResult::Ambiguous(_))
    }

    pub fn display<'a>(&'a self, env: &'a dyn TypeEnv) -> ResultDisplay<'a> {
        ResultDisplay { env, result: self }
    }
}

/// A problem in a type declaration, independent of any call site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyFinding {
    NameClash {
        type_id: ClassId,
        method: MethodSignature,
        other: MethodSignature,
    },
    IncompatibleReturnType {
        type_id: ClassId,
        method: MethodSignature,
        other: MethodSignature,
    },
    UnimplementedAbstractMethod {
        type_id: ClassId,
        method: MethodSignature,
    },
}

impl ConsistencyFinding {
    pub fn type_id(&self) -> ClassId {
        match self {
            ConsistencyFinding::NameClash { type_id, .. }
            | ConsistencyFinding::IncompatibleReturnType { type_id, .. }
            | ConsistencyFinding::UnimplementedAbstractMethod { type_id, .. } => *type_id,
        }
    }

    pub(crate) fn kind_rank(&self) -> u8 {
        match self {
            ConsistencyFinding::NameClash { .. } => 0,
            ConsistencyFinding::IncompatibleReturnType { .. } => 1,
            ConsistencyFinding::UnimplementedAbstractMethod { .. } => 2,
        }
    }

    pub fn display<'a>(&'a self, env: &'a dyn TypeEnv) -> FindingDisplay<'a> {
        FindingDisplay { env, finding: self }
    }
}

pub struct CandidateDisplay<'a> {
    env: &'a dyn TypeEnv,
    candidate: &'a Candidate,
}

pub struct ResultDisplay<'a> {
    env: &'a dyn TypeEnv,
    result: &'a ResolutionResult,
}

pub struct FindingDisplay<'a> {
    env: &'a dyn TypeEnv,
    finding: &'a ConsistencyFinding,
}

/// `name(P1, P2)` with the instantiated parameter types.
impl fmt::Display for CandidateDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let candidate = self.candidate;
        let instantiated = MethodSignature {
            formal_params: candidate.formal_params.clone(),
            ..candidate.signature.clone()
        };
        write!(f, "{}", instantiated.display(self.env))
    }
}

/// A class as written in its own declaration, e.g. `AA<T>`.
pub(crate) fn generic_self_type(env: &dyn TypeEnv, id: ClassId) -> TypeRef {
    let params = env
        .class(id)
        .map(|def| def.type_params.iter().copied().map(TypeRef::TypeVar).collect())
        .unwrap_or_default();
    TypeRef::class(id, params)
}

/// The declaration behind `sig` as written: `<U>test(N)`.
fn write_declaration(
    env: &dyn TypeEnv,
    f: &mut fmt::Formatter<'_>,
    sig: &MethodSignature,
) -> fmt::Result {
    let Some(decl) = sig.declaration(env) else {
        return write!(f, "{}", sig.display(env));
    };
    if !decl.type_params.is_empty() {
        f.write_str("<")?;
        for (idx, tp) in decl.type_params.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", TypeRef::TypeVar(*tp).display(env))?;
        }
        f.write_str(">")?;
    }
    let as_written = MethodSignature {
        formal_params: decl.params.clone(),
        ..sig.clone()
    };
    write!(f, "{}", as_written.display(env))
}

fn write_owner(env: &dyn TypeEnv, f: &mut fmt::Formatter<'_>, sig: &MethodSignature) -> fmt::Result {
    match env.class(sig.declaring_class()) {
        Some(def) => f.write_str(def.simple_name()),
        None => write!(f, "{}", sig.declaring_type.display(env)),
    }
}

impl fmt::Display for ResultDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env = self.env;
        match self.result {
            ResolutionResult::Selected(candidate) => {
                write_owner(env, f, &candidate.signature)?;
                write!(f, ".{}", candidate.display(env))
            }
            ResolutionResult::Ambiguous(candidates) => {
                let Some(first) = candidates.first() else {
                    return f.write_str("ambiguous method call");
                };
                write!(
                    f,
                    "The method {} is ambiguous for the type {}",
                    first.display(env),
                    first.signature.declaring_type.display(env)
                )
            }
            ResolutionResult::NotApplicable => f.write_str("no applicable method"),
            ResolutionResult::NameClash(method, other) => write_name_clash(env, f, method, other),
        }
    }
}

fn write_name_clash(
    env: &dyn TypeEnv,
    f: &mut fmt::Formatter<'_>,
    method: &MethodSignature,
    other: &MethodSignature,
) -> fmt::Result {
    f.write_str("Name clash: The method ")?;
    write_declaration(env, f, method)?;
    write!(
        f,
        " of type {} has the same erasure as ",
        generic_self_type(env, method.declaring_class()).display(env)
    )?;
    write_declaration(env, f, other)?;
    write!(
        f,
        " of type {} but does not override it",
        generic_self_type(env, other.declaring_class()).display(env)
    )
}

impl fmt::Display for FindingDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env = self.env;
        match self.finding {
            ConsistencyFinding::NameClash { method, other, .. } => {
                write_name_clash(env, f, method, other)
            }
            ConsistencyFinding::IncompatibleReturnType {
                type_id,
                method,
                other,
            } => {
                write!(
                    f,
                    "The return type of {} in type {} is incompatible with ",
                    method.display(env),
                    generic_self_type(env, *type_id).display(env)
                )?;
                write_owner(env, f, other)?;
                write!(f, ".{}", other.display(env))
            }
            ConsistencyFinding::UnimplementedAbstractMethod { type_id, method } => {
                write!(
                    f,
                    "The type {} must implement the inherited abstract method ",
                    generic_self_type(env, *type_id).display(env)
                )?;
                write_owner(env, f, method)?;
                write!(f, ".{}", method.display(env))
            }
        }
    }
}

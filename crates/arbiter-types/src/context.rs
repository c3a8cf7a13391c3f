use std::fmt;
use std::sync::Arc;

use crate::{
    is_subtype, make_intersection, substitute, ClassDef, ClassId, ClassType, Substitution, TypeEnv,
    TypeParamDef, TypeRef, TypeVarId, WellKnownTypes, WildcardBound,
};

/// Per-resolution typing context.
///
/// Wraps a read-only [`TypeEnv`] and owns the type variables allocated while resolving one call
/// site (capture variables). Allocation never touches the shared environment, so a fresh context
/// per call site yields the same `CAP#n` ids no matter which thread resolves it or how often.
pub struct TyContext<'env> {
    base: &'env dyn TypeEnv,
    locals: Vec<TypeParamDef>,
}

impl fmt::Debug for TyContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TyContext")
            .field("locals", &self.locals)
            .finish_non_exhaustive()
    }
}

impl<'env> TyContext<'env> {
    pub fn new(base: &'env dyn TypeEnv) -> Self {
        Self {
            base,
            locals: Vec::new(),
        }
    }

    pub fn base(&self) -> &'env dyn TypeEnv {
        self.base
    }

    /// Drop every context-local allocation; ids handed out earlier become dangling.
    pub fn reset(&mut self) {
        self.locals.clear();
    }

    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    fn push_local(&mut self) -> TypeVarId {
        let idx: u32 = self
            .locals
            .len()
            .try_into()
            .expect("too many context-local type params");
        self.locals.push(TypeParamDef {
            name: format!("CAP#{}", idx + 1),
            upper_bounds: Vec::new(),
            lower_bound: None,
        });
        TypeVarId::new_context_local(idx)
    }

    /// Capture conversion (JLS 5.1.10).
    ///
    /// Every wildcard argument of a parameterised class type is replaced by a fresh capture
    /// variable. Its upper bounds are the wildcard's own bound (for `? extends`) followed by the
    /// formal's declared bounds with the captured arguments substituted, so F-bounded formals
    /// (`E extends Enum<E>`) refer to the capture variable itself. `? super L` yields `L` as the
    /// variable's lower bound. Types without wildcard arguments are returned unchanged.
    pub fn capture_conversion(&mut self, ty: &TypeRef) -> TypeRef {
        let TypeRef::Class(ClassType { def, args }) = ty else {
            return ty.clone();
        };
        if !args.iter().any(|arg| matches!(arg, TypeRef::Wildcard(_))) {
            return ty.clone();
        }
        let Some(class_def) = self.base.class(*def) else {
            return ty.clone();
        };
        if class_def.type_params.len() != args.len() {
            return ty.clone();
        }
        let formals = class_def.type_params.clone();

        let captured: Vec<TypeRef> = args
            .iter()
            .map(|arg| match arg {
                TypeRef::Wildcard(_) => TypeRef::TypeVar(self.push_local()),
                other => other.clone(),
            })
            .collect();
        let subst: Substitution = formals.iter().copied().zip(captured.iter().cloned()).collect();
        let object = TypeRef::class(self.well_known().object, vec![]);

        let mut resolved = Vec::new();
        for ((formal, arg), cap) in formals.iter().zip(args).zip(&captured) {
            let (TypeRef::Wildcard(bound), TypeRef::TypeVar(cap_id)) = (arg, cap) else {
                continue;
            };
            let declared: Vec<TypeRef> = self
                .base
                .type_param(*formal)
                .map(|tp| {
                    tp.upper_bounds
                        .iter()
                        .map(|b| substitute(b, &subst))
                        .collect()
                })
                .unwrap_or_default();

            let (mut upper, lower) = match bound {
                WildcardBound::Unbounded => (declared, None),
                WildcardBound::Super(lower) => (declared, Some((**lower).clone())),
                WildcardBound::Extends(upper) => {
                    let mut bounds = vec![(**upper).clone()];
                    bounds.extend(
                        declared
                            .into_iter()
                            .filter(|d| *d != object && !is_subtype(self.base, upper, d)),
                    );
                    (bounds, None)
                }
            };
            if upper.is_empty() {
                upper.push(object.clone());
            }
            resolved.push((*cap_id, upper, lower));
        }

        for (cap_id, upper, lower) in resolved {
            if let Some(idx) = cap_id.context_local_index() {
                let local = &mut self.locals[idx];
                local.upper_bounds = upper;
                local.lower_bound = lower;
            }
        }

        tracing::trace!(target: "arbiter.types", ty = ?ty, captured = ?captured, "capture conversion");
        TypeRef::class(*def, captured)
    }
}

impl TyContext<'_> {
    /// Upward projection (JLS 4.10.5): `ty` with every capture variable of this context replaced,
    /// so the result means the same thing outside the context. A capture variable becomes its
    /// upper bound at the top level and a wildcard inside type arguments.
    pub fn project_upward(&self, ty: &TypeRef) -> TypeRef {
        self.project(ty, &mut Vec::new())
    }

    fn mentions_local(ty: &TypeRef) -> bool {
        match ty {
            TypeRef::TypeVar(id) => id.is_context_local(),
            TypeRef::Class(ClassType { args, .. }) => args.iter().any(Self::mentions_local),
            TypeRef::Wildcard(WildcardBound::Extends(b) | WildcardBound::Super(b))
            | TypeRef::Array(b) => Self::mentions_local(b),
            TypeRef::Intersection(parts) => parts.iter().any(Self::mentions_local),
            TypeRef::Wildcard(WildcardBound::Unbounded)
            | TypeRef::Void
            | TypeRef::Primitive(_)
            | TypeRef::Raw(_)
            | TypeRef::Null => false,
        }
    }

    fn project(&self, ty: &TypeRef, active: &mut Vec<TypeVarId>) -> TypeRef {
        if !Self::mentions_local(ty) {
            return ty.clone();
        }
        match ty {
            TypeRef::TypeVar(id) => {
                let object = TypeRef::class(self.well_known().object, vec![]);
                if active.contains(id) {
                    return object;
                }
                let bounds = self
                    .type_param(*id)
                    .map(|tp| tp.upper_bounds.clone())
                    .unwrap_or_default();
                active.push(*id);
                let parts: Vec<TypeRef> = bounds.iter().map(|b| self.project(b, active)).collect();
                active.pop();
                make_intersection(self, parts)
            }
            TypeRef::Class(ClassType { def, args }) => {
                let args = args.iter().map(|arg| self.project_arg(arg, active)).collect();
                TypeRef::class(*def, args)
            }
            TypeRef::Array(elem) => TypeRef::array(self.project(elem, active)),
            TypeRef::Intersection(parts) => {
                let parts = parts.iter().map(|p| self.project(p, active)).collect();
                make_intersection(self, parts)
            }
            TypeRef::Wildcard(_) => self.project_arg(ty, active),
            TypeRef::Void | TypeRef::Primitive(_) | TypeRef::Raw(_) | TypeRef::Null => ty.clone(),
        }
    }

    fn project_arg(&self, arg: &TypeRef, active: &mut Vec<TypeVarId>) -> TypeRef {
        if !Self::mentions_local(arg) {
            return arg.clone();
        }
        let object = TypeRef::class(self.well_known().object, vec![]);
        let extends = |upper: TypeRef| {
            if upper == object {
                TypeRef::unbounded()
            } else {
                TypeRef::extends(upper)
            }
        };
        match arg {
            TypeRef::TypeVar(id) if !active.contains(id) => {
                let lower = self.type_param(*id).and_then(|tp| tp.lower_bound.clone());
                match lower {
                    Some(lower) if !Self::mentions_local(&lower) => TypeRef::super_of(lower),
                    _ => extends(self.project(arg, active)),
                }
            }
            TypeRef::Wildcard(WildcardBound::Extends(upper)) => extends(self.project(upper, active)),
            TypeRef::Wildcard(_) => TypeRef::unbounded(),
            other => extends(self.project(other, active)),
        }
    }
}

impl TypeEnv for TyContext<'_> {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.base.class(id)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        match id.context_local_index() {
            Some(idx) => self.locals.get(idx),
            None => self.base.type_param(id),
        }
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.base.lookup_class(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        self.base.well_known()
    }

    fn erased_ancestors(&self, id: ClassId) -> Arc<[ClassId]> {
        self.base.erased_ancestors(id)
    }
}

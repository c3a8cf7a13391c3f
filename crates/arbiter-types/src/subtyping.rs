use serde::{Deserialize, Serialize};

use crate::{
    canonicalize, instantiate_as_supertype, is_subclass, ClassType, PrimitiveType, TypeEnv,
    TypeRef, WildcardBound,
};

/// Recursion limit for structural subtyping over F-bounded or recursive declarations.
const MAX_DEPTH: u32 = 48;

/// The ordered invocation phases of JLS 15.12.2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApplicabilityPhase {
    /// Identity, widening (primitive and reference) and unchecked conversion only.
    Strict,
    /// Strict plus boxing and unboxing.
    Loose,
    /// Loose per argument, with the trailing array parameter expanded to the call's arity.
    VariableArity,
}

impl ApplicabilityPhase {
    pub const ALL: [ApplicabilityPhase; 3] = [
        ApplicabilityPhase::Strict,
        ApplicabilityPhase::Loose,
        ApplicabilityPhase::VariableArity,
    ];

    pub fn allows_boxing(self) -> bool {
        self != ApplicabilityPhase::Strict
    }

    pub fn allows_variable_arity(self) -> bool {
        self == ApplicabilityPhase::VariableArity
    }
}

/// The conversion that makes an argument compatible with a formal parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conversion {
    Identity,
    Widening,
    /// Raw type to a parameterisation of it (JLS 5.1.9).
    Unchecked,
    Boxing,
    Unboxing,
}

pub fn boxed(env: &dyn TypeEnv, prim: PrimitiveType) -> TypeRef {
    TypeRef::class(env.well_known().box_class(prim), vec![])
}

/// The primitive type `ty` unboxes to, looking through type-variable bounds and intersections.
pub fn unboxed(env: &dyn TypeEnv, ty: &TypeRef) -> Option<PrimitiveType> {
    fn inner(env: &dyn TypeEnv, ty: &TypeRef, depth: u32) -> Option<PrimitiveType> {
        if depth > MAX_DEPTH {
            return None;
        }
        match ty {
            TypeRef::Class(ClassType { def, .. }) | TypeRef::Raw(def) => {
                env.well_known().unbox_class(*def)
            }
            TypeRef::TypeVar(id) => env
                .type_param(*id)?
                .upper_bounds
                .iter()
                .find_map(|bound| inner(env, bound, depth + 1)),
            TypeRef::Intersection(parts) => {
                parts.iter().find_map(|part| inner(env, part, depth + 1))
            }
            _ => None,
        }
    }

    inner(env, ty, 0)
}

/// `sub <: sup` (JLS 4.10), including primitive widening (JLS 4.10.1).
pub fn is_subtype(env: &dyn TypeEnv, sub: &TypeRef, sup: &TypeRef) -> bool {
    let sub = canonicalize(env, sub);
    let sup = canonicalize(env, sup);
    subtype(env, &sub, &sup, 0)
}

fn subtype(env: &dyn TypeEnv, s: &TypeRef, t: &TypeRef, depth: u32) -> bool {
    if depth > MAX_DEPTH {
        tracing::trace!(target: "arbiter.types", "subtype recursion limit reached");
        return false;
    }
    if s == t {
        return true;
    }

    match (s, t) {
        (TypeRef::Void, _) | (_, TypeRef::Void) => return false,
        (TypeRef::Primitive(a), TypeRef::Primitive(b)) => return a.widens_to(*b),
        (TypeRef::Primitive(_), _) | (_, TypeRef::Primitive(_)) => return false,
        (_, TypeRef::Wildcard(_)) | (TypeRef::Wildcard(_), _) => return false,
        (TypeRef::Null, _) => return true,
        (_, TypeRef::Null) => return false,
        (_, TypeRef::Intersection(parts)) => {
            return parts.iter().all(|part| subtype(env, s, part, depth + 1));
        }
        (TypeRef::Intersection(parts), _) => {
            return parts.iter().any(|part| subtype(env, part, t, depth + 1));
        }
        _ => {}
    }

    if let TypeRef::TypeVar(id) = s {
        let via_bounds = env.type_param(*id).is_some_and(|tp| {
            tp.upper_bounds
                .iter()
                .any(|bound| subtype(env, bound, t, depth + 1))
        });
        if via_bounds {
            return true;
        }
    }
    if let TypeRef::TypeVar(id) = t {
        // Only capture variables of `? super L` have a lower bound to go through.
        return env
            .type_param(*id)
            .and_then(|tp| tp.lower_bound.as_ref())
            .is_some_and(|lower| subtype(env, s, lower, depth + 1));
    }
    if let TypeRef::TypeVar(_) = s {
        return false;
    }

    match (s, t) {
        (TypeRef::Array(a), TypeRef::Array(b)) => {
            if a.is_primitive() || b.is_primitive() {
                a == b
            } else {
                subtype(env, a, b, depth + 1)
            }
        }
        (TypeRef::Array(_), TypeRef::Class(ClassType { def, args })) => {
            let wk = env.well_known();
            args.is_empty() && (*def == wk.object || *def == wk.cloneable || *def == wk.serializable)
        }
        (TypeRef::Array(_), _) | (_, TypeRef::Array(_)) => false,
        (_, TypeRef::Raw(target)) => s.class_id().is_some_and(|def| is_subclass(env, def, *target)),
        (_, TypeRef::Class(ClassType { def: target, args })) if args.is_empty() => {
            s.class_id().is_some_and(|def| is_subclass(env, def, *target))
        }
        (TypeRef::Raw(_), TypeRef::Class(_)) => false,
        (TypeRef::Class(_), TypeRef::Class(ClassType { def: target, args: target_args })) => {
            match instantiate_as_supertype(env, s, *target) {
                Some(TypeRef::Class(ClassType { args, .. })) if args.len() == target_args.len() => {
                    target_args
                        .iter()
                        .zip(&args)
                        .all(|(t_arg, s_arg)| contains(env, t_arg, s_arg, depth + 1))
                }
                _ => false,
            }
        }
        _ => false,
    }
}

/// Type-argument containment `s_arg <= t_arg` (JLS 4.5.1).
fn contains(env: &dyn TypeEnv, t_arg: &TypeRef, s_arg: &TypeRef, depth: u32) -> bool {
    let object = TypeRef::class(env.well_known().object, vec![]);
    match t_arg {
        TypeRef::Wildcard(WildcardBound::Unbounded) => true,
        TypeRef::Wildcard(WildcardBound::Extends(upper)) => match s_arg {
            TypeRef::Wildcard(WildcardBound::Extends(s_upper)) => subtype(env, s_upper, upper, depth + 1),
            TypeRef::Wildcard(_) => subtype(env, &object, upper, depth + 1),
            other => subtype(env, other, upper, depth + 1),
        },
        TypeRef::Wildcard(WildcardBound::Super(lower)) => match s_arg {
            TypeRef::Wildcard(WildcardBound::Super(s_lower)) => subtype(env, lower, s_lower, depth + 1),
            TypeRef::Wildcard(_) => false,
            other => subtype(env, lower, other, depth + 1),
        },
        exact => same_type(env, exact, s_arg, depth),
    }
}

fn same_type(env: &dyn TypeEnv, a: &TypeRef, b: &TypeRef, depth: u32) -> bool {
    if a == b {
        return true;
    }
    // Intersections are equal up to component order.
    matches!((a, b), (TypeRef::Intersection(_), TypeRef::Intersection(_)))
        && subtype(env, a, b, depth + 1)
        && subtype(env, b, a, depth + 1)
}

/// Raw `C` (or a type whose `target` supertype is raw) to a parameterisation of `target`.
fn is_unchecked_convertible(env: &dyn TypeEnv, from: &TypeRef, to: &TypeRef) -> bool {
    match (from, to) {
        (TypeRef::Array(f), TypeRef::Array(t)) => {
            !f.is_primitive() && !t.is_primitive() && is_unchecked_convertible(env, f, t)
        }
        (_, TypeRef::Class(ClassType { def, args })) if !args.is_empty() => matches!(
            instantiate_as_supertype(env, from, *def),
            Some(TypeRef::Raw(_))
        ),
        _ => false,
    }
}

/// The conversion admitting an argument of type `from` for a formal of type `to` under `phase`,
/// or `None` when the argument is not compatible.
pub fn conversion(
    env: &dyn TypeEnv,
    from: &TypeRef,
    to: &TypeRef,
    phase: ApplicabilityPhase,
) -> Option<Conversion> {
    let from = canonicalize(env, from);
    let to = canonicalize(env, to);

    if from == to {
        return Some(Conversion::Identity);
    }
    if subtype(env, &from, &to, 0) {
        return Some(Conversion::Widening);
    }
    if is_unchecked_convertible(env, &from, &to) {
        return Some(Conversion::Unchecked);
    }
    if !phase.allows_boxing() {
        return None;
    }

    match (&from, &to) {
        (TypeRef::Primitive(prim), target) if target.is_reference() && *target != TypeRef::Null => {
            let boxed = boxed(env, *prim);
            subtype(env, &boxed, target, 0).then_some(Conversion::Boxing)
        }
        (source, TypeRef::Primitive(target)) => unboxed(env, source)
            .filter(|prim| prim.widens_to(*target))
            .map(|_| Conversion::Unboxing),
        _ => None,
    }
}

/// Phase-aware compatibility predicate: `from` can be passed where `to` is expected.
pub fn is_convertible(
    env: &dyn TypeEnv,
    from: &TypeRef,
    to: &TypeRef,
    phase: ApplicabilityPhase,
) -> bool {
    conversion(env, from, to, phase).is_some()
}

use std::collections::{HashMap, HashSet};

use crate::{ClassType, TypeEnv, TypeRef, TypeVarId, WildcardBound};

pub type Substitution = HashMap<TypeVarId, TypeRef>;

/// Replace type variables in `ty` according to `subst`. Variables without a mapping are kept.
pub fn substitute(ty: &TypeRef, subst: &Substitution) -> TypeRef {
    if subst.is_empty() {
        return ty.clone();
    }
    match ty {
        TypeRef::TypeVar(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        TypeRef::Class(ClassType { def, args }) => TypeRef::class(
            *def,
            args.iter().map(|arg| substitute(arg, subst)).collect(),
        ),
        TypeRef::Array(elem) => TypeRef::array(substitute(elem, subst)),
        TypeRef::Wildcard(WildcardBound::Extends(bound)) => {
            TypeRef::extends(substitute(bound, subst))
        }
        TypeRef::Wildcard(WildcardBound::Super(bound)) => TypeRef::super_of(substitute(bound, subst)),
        TypeRef::Intersection(parts) => {
            TypeRef::Intersection(parts.iter().map(|part| substitute(part, subst)).collect())
        }
        TypeRef::Void
        | TypeRef::Primitive(_)
        | TypeRef::Raw(_)
        | TypeRef::Wildcard(WildcardBound::Unbounded)
        | TypeRef::Null => ty.clone(),
    }
}

/// Whether `ty` mentions any of `vars`.
pub fn mentions_any(ty: &TypeRef, vars: &[TypeVarId]) -> bool {
    if vars.is_empty() {
        return false;
    }
    match ty {
        TypeRef::TypeVar(id) => vars.contains(id),
        TypeRef::Class(ClassType { args, .. }) => args.iter().any(|arg| mentions_any(arg, vars)),
        TypeRef::Array(elem) => mentions_any(elem, vars),
        TypeRef::Wildcard(WildcardBound::Extends(bound))
        | TypeRef::Wildcard(WildcardBound::Super(bound)) => mentions_any(bound, vars),
        TypeRef::Intersection(parts) => parts.iter().any(|part| mentions_any(part, vars)),
        TypeRef::Void
        | TypeRef::Primitive(_)
        | TypeRef::Raw(_)
        | TypeRef::Wildcard(WildcardBound::Unbounded)
        | TypeRef::Null => false,
    }
}

/// Normalise the two spellings of a raw type: an argument-less `Class` of a generic definition
/// becomes `Raw`, and a `Raw` of a non-generic definition becomes `Class`.
pub fn canonicalize(env: &dyn TypeEnv, ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Class(ClassType { def, args }) => {
            if args.is_empty() {
                return raw_or_plain(env, *def);
            }
            TypeRef::class(*def, args.iter().map(|arg| canonicalize(env, arg)).collect())
        }
        TypeRef::Raw(def) => raw_or_plain(env, *def),
        TypeRef::Array(elem) => TypeRef::array(canonicalize(env, elem)),
        TypeRef::Wildcard(WildcardBound::Extends(bound)) => TypeRef::extends(canonicalize(env, bound)),
        TypeRef::Wildcard(WildcardBound::Super(bound)) => TypeRef::super_of(canonicalize(env, bound)),
        TypeRef::Intersection(parts) => {
            TypeRef::Intersection(parts.iter().map(|part| canonicalize(env, part)).collect())
        }
        TypeRef::Void
        | TypeRef::Primitive(_)
        | TypeRef::TypeVar(_)
        | TypeRef::Wildcard(WildcardBound::Unbounded)
        | TypeRef::Null => ty.clone(),
    }
}

fn raw_or_plain(env: &dyn TypeEnv, def: crate::ClassId) -> TypeRef {
    let generic = env
        .class(def)
        .is_some_and(|class_def| !class_def.type_params.is_empty());
    if generic {
        TypeRef::Raw(def)
    } else {
        TypeRef::class(def, vec![])
    }
}

/// The substitution from a class's own type parameters to the arguments of `ty`.
///
/// Returns `None` for raw or argument-count-mismatched references; an empty map for non-generic
/// classes.
pub fn class_substitution(env: &dyn TypeEnv, ty: &TypeRef) -> Option<Substitution> {
    let (def, args) = match ty {
        TypeRef::Class(ClassType { def, args }) => (*def, args.as_slice()),
        TypeRef::Raw(def) => (*def, &[][..]),
        _ => return None,
    };
    let class_def = env.class(def)?;
    if class_def.type_params.is_empty() {
        return Some(Substitution::new());
    }
    if class_def.type_params.len() != args.len() {
        return None;
    }
    Some(
        class_def
            .type_params
            .iter()
            .copied()
            .zip(args.iter().cloned())
            .collect(),
    )
}

/// Type erasure (JLS 4.6): type arguments are dropped and type variables are replaced by the
/// erasure of their leftmost bound.
pub fn erasure(env: &dyn TypeEnv, ty: &TypeRef) -> TypeRef {
    fn inner(env: &dyn TypeEnv, ty: &TypeRef, seen: &mut HashSet<TypeVarId>) -> TypeRef {
        match ty {
            TypeRef::Class(ClassType { def, .. }) | TypeRef::Raw(def) => raw_or_plain(env, *def),
            TypeRef::TypeVar(id) => {
                let object = TypeRef::class(env.well_known().object, vec![]);
                if !seen.insert(*id) {
                    return object;
                }
                let erased = env
                    .type_param(*id)
                    .and_then(|tp| tp.upper_bounds.first())
                    .map(|bound| inner(env, bound, seen))
                    .unwrap_or(object);
                seen.remove(id);
                erased
            }
            TypeRef::Array(elem) => TypeRef::array(inner(env, elem, seen)),
            TypeRef::Intersection(parts) => match parts.first() {
                Some(first) => inner(env, first, seen),
                None => TypeRef::class(env.well_known().object, vec![]),
            },
            TypeRef::Wildcard(WildcardBound::Extends(bound)) => inner(env, bound, seen),
            TypeRef::Wildcard(_) => TypeRef::class(env.well_known().object, vec![]),
            TypeRef::Void | TypeRef::Primitive(_) | TypeRef::Null => ty.clone(),
        }
    }

    inner(env, ty, &mut HashSet::new())
}

pub fn erase_params(env: &dyn TypeEnv, params: &[TypeRef]) -> Vec<TypeRef> {
    params.iter().map(|param| erasure(env, param)).collect()
}

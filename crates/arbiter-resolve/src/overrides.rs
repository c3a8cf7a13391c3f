//! Subsignature, override and name-clash relations between method signatures (JLS 8.4.2, 8.4.8).

use arbiter_config::ClashErasure;
use arbiter_types::{
    canonicalize, declared_methods, erase_params, erasure, instantiate_as_supertype, is_convertible,
    is_subclass, is_subtype, substitute, ApplicabilityPhase, MethodRef, MethodSignature,
    Substitution, TypeEnv, TypeRef, TypeVarId,
};

use crate::model::generic_self_type;

/// `m1` is a subsignature of `m2` (JLS 8.4.2): equal signatures after renaming `m2`'s type
/// parameters to `m1`'s, or a non-generic `m1` whose parameters equal the erasure of `m2`'s.
pub fn is_subsignature(env: &dyn TypeEnv, m1: &MethodSignature, m2: &MethodSignature) -> bool {
    if m1.name != m2.name || m1.arity() != m2.arity() {
        return false;
    }

    if m1.type_params.len() == m2.type_params.len() {
        let rename = renaming(&m2.type_params, &m1.type_params);
        let params_equal = m1
            .formal_params
            .iter()
            .zip(&m2.formal_params)
            .all(|(a, b)| canonicalize(env, a) == canonicalize(env, &substitute(b, &rename)));
        if params_equal && bounds_match(env, m1, m2, &rename) {
            return true;
        }
    }

    if m1.type_params.is_empty() {
        let erased = erase_params(env, &m2.formal_params);
        return m1
            .formal_params
            .iter()
            .zip(&erased)
            .all(|(a, b)| canonicalize(env, a) == *b);
    }
    false
}

pub fn override_equivalent(env: &dyn TypeEnv, a: &MethodSignature, b: &MethodSignature) -> bool {
    is_subsignature(env, a, b) || is_subsignature(env, b, a)
}

fn renaming(from: &[TypeVarId], to: &[TypeVarId]) -> Substitution {
    from.iter()
        .copied()
        .zip(to.iter().copied().map(TypeRef::TypeVar))
        .collect()
}

/// Declared bounds of corresponding method type parameters agree, either after renaming or after
/// erasure. Method type-parameter bounds are stored as written, so bounds mentioning the class's
/// own variables only line up once erased.
fn bounds_match(
    env: &dyn TypeEnv,
    m1: &MethodSignature,
    m2: &MethodSignature,
    rename: &Substitution,
) -> bool {
    m1.type_params.iter().zip(&m2.type_params).all(|(t1, t2)| {
        let (Some(p1), Some(p2)) = (env.type_param(*t1), env.type_param(*t2)) else {
            return t1 == t2;
        };
        if p1.upper_bounds.len() != p2.upper_bounds.len() {
            return false;
        }
        let renamed: Vec<TypeRef> = p2
            .upper_bounds
            .iter()
            .map(|b| canonicalize(env, &substitute(b, rename)))
            .collect();
        let same_renamed = p1
            .upper_bounds
            .iter()
            .all(|b| renamed.contains(&canonicalize(env, b)));
        same_renamed || erase_params(env, &p1.upper_bounds) == erase_params(env, &p2.upper_bounds)
    })
}

/// The member of `ty` that was declared as `origin`.
fn member_of(env: &dyn TypeEnv, ty: &TypeRef, origin: MethodRef) -> Option<MethodSignature> {
    declared_methods(env, ty)
        .into_iter()
        .nth(origin.index as usize)
        .filter(|sig| sig.origin == origin)
}

/// Both methods as seen from `sub`'s declaring class: `sub` as declared there, and `sup` as a
/// member of the supertype of that class that names `sup`'s declaring class (JLS 8.4.8.1).
///
/// `None` when `sub` cannot override `sup` at all (different name or static-ness, same method,
/// or unrelated declaring classes).
pub(crate) fn override_views(
    env: &dyn TypeEnv,
    sub: &MethodSignature,
    sup: &MethodSignature,
) -> Option<(MethodSignature, MethodSignature)> {
    if sub.name != sup.name || sub.is_static != sup.is_static || sub.origin == sup.origin {
        return None;
    }
    let (derived, base) = (sub.declaring_class(), sup.declaring_class());
    if derived == base || !is_subclass(env, derived, base) {
        return None;
    }
    let self_ty = generic_self_type(env, derived);
    let sub_view = member_of(env, &self_ty, sub.origin)?;
    let base_ty = instantiate_as_supertype(env, &self_ty, base)?;
    let sup_view = member_of(env, &base_ty, sup.origin)?;
    Some((sub_view, sup_view))
}

/// `sub` overrides (or, for statics, hides) `sup`.
pub fn overrides(env: &dyn TypeEnv, sub: &MethodSignature, sup: &MethodSignature) -> bool {
    override_views(env, sub, sup).is_some_and(|(sub, sup)| is_subsignature(env, &sub, &sup))
}

/// Return-type-substitutability of an overrider (JLS 8.4.8.3): primitives and `void` must match
/// exactly; a reference return must be a subtype of the overridden one (after renaming type
/// parameters), of its erasure, or convertible to it without a check.
pub fn return_substitutable(
    env: &dyn TypeEnv,
    overrider: &MethodSignature,
    overridden: &MethodSignature,
) -> bool {
    let target = if overrider.type_params.len() == overridden.type_params.len() {
        substitute(
            &overridden.return_type,
            &renaming(&overridden.type_params, &overrider.type_params),
        )
    } else {
        overridden.return_type.clone()
    };
    let source = canonicalize(env, &overrider.return_type);
    let target = canonicalize(env, &target);

    match (&source, &target) {
        (TypeRef::Void | TypeRef::Primitive(_), _) | (_, TypeRef::Void | TypeRef::Primitive(_)) => {
            source == target
        }
        _ => {
            is_convertible(env, &source, &target, ApplicabilityPhase::Strict)
                || is_subtype(env, &source, &erasure(env, &target))
        }
    }
}

/// Erased parameter list used for clash detection.
pub(crate) fn clash_erasure(
    env: &dyn TypeEnv,
    sig: &MethodSignature,
    mode: ClashErasure,
) -> Vec<TypeRef> {
    match mode {
        ClashErasure::Member => erase_params(env, &sig.formal_params),
        ClashErasure::Declared => erase_params(env, &sig.declared_params(env)),
    }
}

/// Two distinct methods whose erasures collide without one overriding the other (JLS 8.4.8.3).
pub fn is_name_clash(
    env: &dyn TypeEnv,
    a: &MethodSignature,
    b: &MethodSignature,
    mode: ClashErasure,
) -> bool {
    if a.origin == b.origin
        || a.name != b.name
        || a.is_static != b.is_static
        || a.arity() != b.arity()
    {
        return false;
    }
    if clash_erasure(env, a, mode) != clash_erasure(env, b, mode) {
        return false;
    }

    let (ka, kb) = (a.declaring_class(), b.declaring_class());
    if ka == kb {
        return true;
    }
    if is_subclass(env, ka, kb) {
        return !overrides(env, a, b);
    }
    if is_subclass(env, kb, ka) {
        return !overrides(env, b, a);
    }
    !override_equivalent(env, a, b)
}

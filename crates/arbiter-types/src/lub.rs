use crate::{
    boxed, canonicalize, instantiate_as_supertype, is_subclass, is_subtype, ClassId, TypeEnv,
    TypeRef, WildcardBound,
};

/// How many levels of nested parameterisation `lub` expands before giving up with `?`.
///
/// `lub(Integer, String)` recurses through `Comparable<? extends ...>` forever without a limit.
pub const DEFAULT_LUB_DEPTH: usize = 2;

/// Least upper bound (JLS 4.10.4) with the default recursion depth.
pub fn lub(env: &dyn TypeEnv, types: &[TypeRef]) -> TypeRef {
    lub_with_depth(env, types, DEFAULT_LUB_DEPTH)
}

/// Least upper bound of `types`.
///
/// Primitives are boxed first and `null` is ignored; the lub of nothing but `null` is `null`.
/// The result is a single type or an [`TypeRef::Intersection`] with the class component first.
pub fn lub_with_depth(env: &dyn TypeEnv, types: &[TypeRef], depth: usize) -> TypeRef {
    let mut tys: Vec<TypeRef> = Vec::with_capacity(types.len());
    for ty in types {
        let ty = match canonicalize(env, ty) {
            TypeRef::Primitive(prim) => boxed(env, prim),
            TypeRef::Null | TypeRef::Void => continue,
            other => other,
        };
        if !tys.contains(&ty) {
            tys.push(ty);
        }
    }

    match tys.len() {
        0 => return TypeRef::Null,
        1 => return tys.remove(0),
        _ => {}
    }
    if let Some(top) = tys.iter().find(|c| tys.iter().all(|t| is_subtype(env, t, c))) {
        return top.clone();
    }

    // Erased candidate set: classes that are erased supertypes of every input, in the order the
    // first input reaches them.
    let mut candidates = erased_supertype_classes(env, &tys[0]);
    for ty in &tys[1..] {
        let others = erased_supertype_classes(env, ty);
        candidates.retain(|c| others.contains(c));
    }

    let minimal: Vec<ClassId> = candidates
        .iter()
        .copied()
        .filter(|c| {
            !candidates
                .iter()
                .any(|d| d != c && is_subclass(env, *d, *c))
        })
        .collect();

    let parts: Vec<TypeRef> = minimal
        .into_iter()
        .map(|class| least_containing_invocation(env, &tys, class, depth))
        .collect();
    make_intersection(env, parts)
}

fn erased_supertype_classes(env: &dyn TypeEnv, ty: &TypeRef) -> Vec<ClassId> {
    fn collect(env: &dyn TypeEnv, ty: &TypeRef, out: &mut Vec<ClassId>, depth: u32) {
        if depth > 16 {
            return;
        }
        let push_all = |out: &mut Vec<ClassId>, ids: &[ClassId]| {
            for id in ids {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
        };
        match ty {
            TypeRef::Class(_) | TypeRef::Raw(_) => {
                if let Some(def) = ty.class_id() {
                    push_all(out, &env.erased_ancestors(def));
                }
            }
            TypeRef::Array(_) => {
                let wk = env.well_known();
                push_all(out, &[wk.object, wk.cloneable, wk.serializable]);
            }
            TypeRef::TypeVar(id) => {
                let bounds = env
                    .type_param(*id)
                    .map(|tp| tp.upper_bounds.clone())
                    .unwrap_or_default();
                if bounds.is_empty() {
                    push_all(out, &[env.well_known().object]);
                }
                for bound in &bounds {
                    collect(env, bound, out, depth + 1);
                }
            }
            TypeRef::Intersection(parts) => {
                for part in parts {
                    collect(env, part, out, depth + 1);
                }
            }
            TypeRef::Void | TypeRef::Primitive(_) | TypeRef::Wildcard(_) | TypeRef::Null => {}
        }
    }

    let mut out = Vec::new();
    collect(env, ty, &mut out, 0);
    out
}

/// `lci` of the parameterisations of `class` among `tys`, or raw `class` if any of them is raw.
fn least_containing_invocation(
    env: &dyn TypeEnv,
    tys: &[TypeRef],
    class: ClassId,
    depth: usize,
) -> TypeRef {
    let generic = env
        .class(class)
        .is_some_and(|def| !def.type_params.is_empty());
    if !generic {
        return TypeRef::class(class, vec![]);
    }

    let mut acc: Option<Vec<TypeRef>> = None;
    for ty in tys {
        let Some(TypeRef::Class(view)) = instantiate_as_supertype(env, ty, class) else {
            return TypeRef::Raw(class);
        };
        acc = Some(match acc {
            None => view.args,
            Some(prev) => prev
                .iter()
                .zip(&view.args)
                .map(|(a, b)| least_containing_arg(env, a, b, depth))
                .collect(),
        });
    }
    match acc {
        Some(args) => TypeRef::class(class, args),
        None => TypeRef::Raw(class),
    }
}

fn least_containing_arg(env: &dyn TypeEnv, a: &TypeRef, b: &TypeRef, depth: usize) -> TypeRef {
    use WildcardBound::*;

    if a == b {
        return a.clone();
    }
    let extends_lub = |u: &TypeRef, v: &TypeRef| {
        if depth == 0 {
            return TypeRef::unbounded();
        }
        let bound = lub_with_depth(env, &[u.clone(), v.clone()], depth - 1);
        if bound.class_id() == Some(env.well_known().object) {
            TypeRef::unbounded()
        } else {
            TypeRef::extends(bound)
        }
    };

    match (a, b) {
        (TypeRef::Wildcard(Unbounded), _) | (_, TypeRef::Wildcard(Unbounded)) => {
            TypeRef::unbounded()
        }
        (TypeRef::Wildcard(Extends(u)), TypeRef::Wildcard(Extends(v))) => extends_lub(&**u, &**v),
        (TypeRef::Wildcard(Super(u)), TypeRef::Wildcard(Super(v))) => {
            TypeRef::super_of(glb(env, u, v))
        }
        (TypeRef::Wildcard(Extends(_)), TypeRef::Wildcard(Super(_)))
        | (TypeRef::Wildcard(Super(_)), TypeRef::Wildcard(Extends(_))) => TypeRef::unbounded(),
        (TypeRef::Wildcard(Extends(u)), v) | (v, TypeRef::Wildcard(Extends(u))) => {
            extends_lub(&**u, v)
        }
        (TypeRef::Wildcard(Super(u)), v) | (v, TypeRef::Wildcard(Super(u))) => {
            TypeRef::super_of(glb(env, u, v))
        }
        (u, v) => extends_lub(u, v),
    }
}

/// Greatest lower bound of two reference types.
pub fn glb(env: &dyn TypeEnv, a: &TypeRef, b: &TypeRef) -> TypeRef {
    if is_subtype(env, a, b) {
        return a.clone();
    }
    if is_subtype(env, b, a) {
        return b.clone();
    }
    make_intersection(env, vec![a.clone(), b.clone()])
}

/// Build an intersection type: nested intersections are flattened, duplicates and components
/// that are supertypes of another component are dropped, and a class component (if any) is moved
/// to the front. Collapses to the single remaining component, or `Object` when empty.
pub fn make_intersection(env: &dyn TypeEnv, parts: Vec<TypeRef>) -> TypeRef {
    let mut flat: Vec<TypeRef> = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            TypeRef::Intersection(inner) => {
                for ty in inner {
                    if !flat.contains(&ty) {
                        flat.push(ty);
                    }
                }
            }
            other => {
                if !flat.contains(&other) {
                    flat.push(other);
                }
            }
        }
    }

    let mut kept: Vec<TypeRef> = Vec::with_capacity(flat.len());
    for (idx, ty) in flat.iter().enumerate() {
        let subsumed = flat
            .iter()
            .enumerate()
            .any(|(other_idx, other)| {
                other_idx != idx
                    && is_subtype(env, other, ty)
                    && (!is_subtype(env, ty, other) || other_idx < idx)
            });
        if !subsumed {
            kept.push(ty.clone());
        }
    }

    let is_class_component = |ty: &TypeRef| {
        ty.class_id()
            .and_then(|id| env.class(id))
            .is_some_and(|def| !def.is_interface())
    };
    if let Some(pos) = kept.iter().position(is_class_component) {
        let class = kept.remove(pos);
        kept.insert(0, class);
    }

    match kept.len() {
        0 => TypeRef::class(env.well_known().object, vec![]),
        1 => kept.remove(0),
        _ => TypeRef::Intersection(kept),
    }
}

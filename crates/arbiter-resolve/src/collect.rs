use std::collections::{HashSet, VecDeque};

use arbiter_types::{
    canonicalize, declared_methods, supertypes_of, ClassId, MethodRef, MethodSignature, TypeEnv,
    TypeRef, TypeVarId,
};
use serde::{Deserialize, Serialize};

use crate::model::CallKind;
use crate::overrides::{is_subsignature, override_views, return_substitutable};

/// Methods of one name visible through a receiver, after override merging.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedMethods {
    /// In walk order: the receiver's class chain first, then superinterfaces breadth-first.
    pub candidates: Vec<MethodSignature>,
    pub overridden: Vec<OverriddenMethod>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverriddenMethod {
    pub method: MethodSignature,
    pub by: MethodRef,
}

/// Every type whose declared members are visible through `receiver`, each class once.
///
/// The class chain comes first (receiver, superclass, ...), then superinterfaces breadth-first in
/// declaration order, then `Object` if it was not reached. Type-variable receivers walk each bound
/// and intersection receivers each component; arrays see `Object`. Primitive, `void` and `null`
/// receivers have no members.
pub fn visible_types(env: &dyn TypeEnv, receiver: &TypeRef) -> Vec<TypeRef> {
    let receiver = canonicalize(env, receiver);
    if matches!(
        receiver,
        TypeRef::Primitive(_) | TypeRef::Void | TypeRef::Null | TypeRef::Wildcard(_)
    ) {
        return Vec::new();
    }
    let object = env.well_known().object;
    let mut walk = Walk {
        env,
        out: Vec::new(),
        seen_classes: HashSet::new(),
        seen_vars: HashSet::new(),
    };
    walk.visit(&receiver);
    if walk.seen_classes.insert(object) {
        walk.out.push(TypeRef::class(object, vec![]));
    }
    walk.out
}

struct Walk<'a> {
    env: &'a dyn TypeEnv,
    out: Vec<TypeRef>,
    seen_classes: HashSet<ClassId>,
    seen_vars: HashSet<TypeVarId>,
}

impl Walk<'_> {
    fn is_interface(&self, id: ClassId) -> bool {
        self.env.class(id).is_some_and(|def| def.is_interface())
    }

    fn visit(&mut self, ty: &TypeRef) {
        match ty {
            TypeRef::Class(_) | TypeRef::Raw(_) => self.visit_class(ty.clone()),
            TypeRef::TypeVar(id) => {
                if !self.seen_vars.insert(*id) {
                    return;
                }
                let bounds = self
                    .env
                    .type_param(*id)
                    .map(|tp| tp.upper_bounds.clone())
                    .unwrap_or_default();
                for bound in &bounds {
                    self.visit(&canonicalize(self.env, bound));
                }
            }
            TypeRef::Intersection(parts) => {
                for part in parts {
                    self.visit(part);
                }
            }
            // Arrays only add `Object`, appended by the caller.
            TypeRef::Array(_)
            | TypeRef::Void
            | TypeRef::Primitive(_)
            | TypeRef::Wildcard(_)
            | TypeRef::Null => {}
        }
    }

    fn visit_class(&mut self, start: TypeRef) {
        let object = self.env.well_known().object;
        let mut interfaces = VecDeque::new();

        let mut current = Some(start);
        while let Some(ty) = current.take() {
            let Some(id) = ty.class_id() else {
                break;
            };
            if self.is_interface(id) {
                interfaces.push_back(ty);
                break;
            }
            if !self.seen_classes.insert(id) {
                break;
            }
            let supers = supertypes_of(self.env, &ty);
            self.out.push(ty);
            for sup in supers {
                match sup.class_id() {
                    Some(sid) if self.is_interface(sid) => interfaces.push_back(sup),
                    Some(_) if current.is_none() => current = Some(sup),
                    _ => {}
                }
            }
        }

        while let Some(ty) = interfaces.pop_front() {
            let Some(id) = ty.class_id() else {
                continue;
            };
            if id == object || !self.seen_classes.insert(id) {
                continue;
            }
            interfaces.extend(supertypes_of(self.env, &ty));
            self.out.push(ty);
        }
    }
}

/// Members visible through `receiver` (optionally only those named `name`), each declaration
/// once, in walk order.
pub fn visible_methods(
    env: &dyn TypeEnv,
    receiver: &TypeRef,
    name: Option<&str>,
) -> Vec<MethodSignature> {
    let mut seen = HashSet::new();
    visible_types(env, receiver)
        .iter()
        .flat_map(|ty| declared_methods(env, ty))
        .filter(|sig| name.map_or(true, |name| sig.name == name))
        .filter(|sig| seen.insert(sig.origin))
        .collect()
}

/// `overrider` replaces `overridden` in the visible member set.
pub(crate) fn merges_over(
    env: &dyn TypeEnv,
    overrider: &MethodSignature,
    overridden: &MethodSignature,
) -> bool {
    override_views(env, overrider, overridden).is_some_and(|(sub, sup)| {
        is_subsignature(env, &sub, &sup) && return_substitutable(env, &sub, &sup)
    })
}

/// Candidate methods for `name` through `receiver` (JLS 15.12.1, 15.12.2.1).
///
/// Overridden declarations are dropped from `candidates` and reported in `overridden`. A static
/// call keeps only static methods.
pub fn collect_methods(
    env: &dyn TypeEnv,
    receiver: &TypeRef,
    name: &str,
    kind: CallKind,
) -> CollectedMethods {
    let visible = visible_methods(env, receiver, Some(name));

    let mut collected = CollectedMethods::default();
    for method in &visible {
        let overrider = visible
            .iter()
            .find(|other| merges_over(env, other, method));
        match overrider {
            Some(overrider) => collected.overridden.push(OverriddenMethod {
                method: method.clone(),
                by: overrider.origin,
            }),
            None => collected.candidates.push(method.clone()),
        }
    }

    if kind == CallKind::Static {
        collected.candidates.retain(|sig| sig.is_static);
    }

    tracing::trace!(
        target: "arbiter.resolve",
        name,
        candidates = collected.candidates.len(),
        overridden = collected.overridden.len(),
        "collected candidate methods"
    );
    collected
}

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{
    canonicalize, class_substitution, erase_params, erasure, substitute, ClassId, ClassKind,
    ClassType, MethodDef, TypeEnv, TypeRef, TypeVarId,
};

/// Identifies a method declaration: the declaring class plus its index in `ClassDef::methods`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodRef {
    pub class: ClassId,
    pub index: u32,
}

/// A method as a member of a particular (possibly parameterised) type.
///
/// `formal_params`, `return_type` and `thrown` have the declaring type's arguments substituted.
/// Viewed through a raw declaring type, instance members are erased and lose their type params.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    pub declaring_type: TypeRef,
    pub origin: MethodRef,
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub formal_params: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub thrown: Vec<TypeRef>,
    pub is_static: bool,
    pub is_varargs: bool,
    pub is_abstract: bool,
}

impl MethodSignature {
    pub fn declaring_class(&self) -> ClassId {
        self.origin.class
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn arity(&self) -> usize {
        self.formal_params.len()
    }

    /// Element type of the trailing array parameter of a variable-arity method.
    pub fn varargs_element(&self) -> Option<&TypeRef> {
        if !self.is_varargs {
            return None;
        }
        match self.formal_params.last() {
            Some(TypeRef::Array(elem)) => Some(elem),
            _ => None,
        }
    }

    pub fn erased_params(&self, env: &dyn TypeEnv) -> Vec<TypeRef> {
        erase_params(env, &self.formal_params)
    }

    /// The declaration this member was derived from.
    pub fn declaration<'e>(&self, env: &'e dyn TypeEnv) -> Option<&'e MethodDef> {
        env.class(self.origin.class)?
            .methods
            .get(self.origin.index as usize)
    }

    /// Parameter types as written on the declaration, before any class-level substitution.
    pub fn declared_params(&self, env: &dyn TypeEnv) -> Vec<TypeRef> {
        match self.declaration(env) {
            Some(def) => def.params.clone(),
            None => self.formal_params.clone(),
        }
    }
}

/// `true` when `def` declares type parameters but `args` supplies none.
fn is_raw_use(env: &dyn TypeEnv, def: ClassId, args: &[TypeRef]) -> bool {
    args.is_empty()
        && env
            .class(def)
            .is_some_and(|class_def| !class_def.type_params.is_empty())
}

/// Direct supertypes of `ty` with its type arguments substituted (JLS 4.10.2).
///
/// Raw types have raw supertypes; interfaces (and classes without an explicit superclass) have
/// `Object`; arrays have `Object`, `Cloneable` and `Serializable`; type variables have their bounds.
pub fn supertypes_of(env: &dyn TypeEnv, ty: &TypeRef) -> Vec<TypeRef> {
    let object = env.well_known().object;
    let ty = canonicalize(env, ty);
    let (def, args) = match &ty {
        TypeRef::Class(ClassType { def, args }) => (*def, args.as_slice()),
        TypeRef::Raw(def) => (*def, &[][..]),
        TypeRef::Array(_) => {
            let wk = env.well_known();
            return [wk.object, wk.cloneable, wk.serializable]
                .into_iter()
                .map(|id| TypeRef::class(id, vec![]))
                .collect();
        }
        TypeRef::TypeVar(id) => {
            let mut out: Vec<TypeRef> = env
                .type_param(*id)
                .map(|tp| tp.upper_bounds.iter().map(|b| canonicalize(env, b)).collect())
                .unwrap_or_default();
            if out.is_empty() {
                out.push(TypeRef::class(object, vec![]));
            }
            return out;
        }
        TypeRef::Intersection(parts) => return parts.clone(),
        TypeRef::Void
        | TypeRef::Primitive(_)
        | TypeRef::Wildcard(_)
        | TypeRef::Null => return Vec::new(),
    };

    let Some(class_def) = env.class(def) else {
        return Vec::new();
    };
    let subst = if is_raw_use(env, def, args) {
        None
    } else {
        class_substitution(env, &ty)
    };
    let view = |declared: &TypeRef| match &subst {
        Some(subst) => canonicalize(env, &substitute(declared, subst)),
        None => erasure(env, declared),
    };

    let mut out = Vec::with_capacity(class_def.interfaces.len() + 1);
    match &class_def.super_class {
        Some(sc) => out.push(view(sc)),
        None if class_def.kind == ClassKind::Class && def != object => {
            out.push(TypeRef::class(object, vec![]));
        }
        None => {}
    }
    out.extend(class_def.interfaces.iter().map(view));
    if class_def.kind == ClassKind::Interface {
        out.push(TypeRef::class(object, vec![]));
    }
    out
}

/// Methods declared directly on `ty`'s class, viewed through `ty`'s parameterisation.
pub fn declared_methods(env: &dyn TypeEnv, ty: &TypeRef) -> Vec<MethodSignature> {
    let ty = canonicalize(env, ty);
    let (def, args) = match &ty {
        TypeRef::Class(ClassType { def, args }) => (*def, args.as_slice()),
        TypeRef::Raw(def) => (*def, &[][..]),
        _ => return Vec::new(),
    };
    let Some(class_def) = env.class(def) else {
        return Vec::new();
    };

    let subst = if is_raw_use(env, def, args) {
        None
    } else {
        class_substitution(env, &ty)
    };

    class_def
        .methods
        .iter()
        .enumerate()
        .map(|(index, method)| {
            let origin = MethodRef {
                class: def,
                index: index as u32,
            };
            match (&subst, method.is_static) {
                // Instance members of a raw type are erased (JLS 4.8).
                (None, false) => MethodSignature {
                    declaring_type: ty.clone(),
                    origin,
                    name: method.name.clone(),
                    type_params: Vec::new(),
                    formal_params: erase_params(env, &method.params),
                    return_type: erasure(env, &method.return_type),
                    thrown: erase_params(env, &method.thrown),
                    is_static: false,
                    is_varargs: method.is_varargs,
                    is_abstract: method.is_abstract,
                },
                (subst, _) => {
                    let view = |declared: &TypeRef| match subst {
                        Some(subst) => canonicalize(env, &substitute(declared, subst)),
                        None => canonicalize(env, declared),
                    };
                    MethodSignature {
                        declaring_type: ty.clone(),
                        origin,
                        name: method.name.clone(),
                        type_params: method.type_params.clone(),
                        formal_params: method.params.iter().map(view).collect(),
                        return_type: view(&method.return_type),
                        thrown: method.thrown.iter().map(view).collect(),
                        is_static: method.is_static,
                        is_varargs: method.is_varargs,
                        is_abstract: method.is_abstract,
                    }
                }
            }
        })
        .collect()
}

/// Return `ty` viewed as its supertype `target`, applying type-argument substitution along the
/// way.
///
/// Rawness is preserved: `ArrayList` (raw) viewed as `List` is raw `List`. Type variables and
/// intersections are viewed through each bound/component; if two of them reach `target` with
/// different arguments the result is `None`.
///
/// Example: `ArrayList<String>` instantiated as `List` returns `List<String>`.
pub fn instantiate_as_supertype(env: &dyn TypeEnv, ty: &TypeRef, target: ClassId) -> Option<TypeRef> {
    fn merge(existing: Option<TypeRef>, found: TypeRef) -> Result<Option<TypeRef>, ()> {
        match existing {
            None => Ok(Some(found)),
            Some(existing) if existing == found => Ok(Some(existing)),
            Some(_) => Err(()),
        }
    }

    fn inner(
        env: &dyn TypeEnv,
        ty: &TypeRef,
        target: ClassId,
        seen_type_vars: &mut HashSet<TypeVarId>,
    ) -> Option<TypeRef> {
        match ty {
            TypeRef::Array(_) => {
                let wk = env.well_known();
                if target == wk.object || target == wk.cloneable || target == wk.serializable {
                    return Some(TypeRef::class(target, vec![]));
                }
                return None;
            }
            TypeRef::Intersection(parts) => {
                let mut out = None;
                for part in parts {
                    let Some(found) = inner(env, part, target, seen_type_vars) else {
                        continue;
                    };
                    out = merge(out, found).ok()?;
                }
                return out;
            }
            TypeRef::TypeVar(id) => {
                if !seen_type_vars.insert(*id) {
                    return None;
                }
                let mut out = None;
                let mut conflict = false;
                if let Some(tp) = env.type_param(*id) {
                    for bound in &tp.upper_bounds {
                        let Some(found) = inner(env, bound, target, seen_type_vars) else {
                            continue;
                        };
                        match merge(out.take(), found) {
                            Ok(merged) => out = merged,
                            Err(()) => {
                                conflict = true;
                                break;
                            }
                        }
                    }
                }
                seen_type_vars.remove(id);
                return if conflict { None } else { out };
            }
            TypeRef::Class(_) | TypeRef::Raw(_) => {}
            TypeRef::Void
            | TypeRef::Primitive(_)
            | TypeRef::Wildcard(_)
            | TypeRef::Null => return None,
        }

        let mut queue = VecDeque::from([canonicalize(env, ty)]);
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if current.class_id() == Some(target) {
                return Some(current);
            }
            queue.extend(supertypes_of(env, &current));
        }
        None
    }

    inner(env, ty, target, &mut HashSet::new())
}

//! Type-argument inference for generic method candidates (a pragmatic subset of JLS 18).
//!
//! Constraints are reduced to per-variable equality, lower and upper bounds, then each variable is
//! resolved in declaration order and the solution is checked against the declared bounds. Any
//! failure excludes the candidate.

use std::collections::HashMap;

use arbiter_types::{
    boxed, class_substitution, erasure, glb, instantiate_as_supertype, is_convertible, is_subtype,
    lub_with_depth, make_intersection, mentions_any, substitute, ApplicabilityPhase, ClassType,
    MethodSignature, Substitution, TypeEnv, TypeRef, TypeVarId, WildcardBound,
};

use crate::applicability::formals_for_arity;

const MAX_REDUCTION_DEPTH: u32 = 32;

pub(crate) struct InferenceRequest<'a> {
    pub signature: &'a MethodSignature,
    pub args: &'a [TypeRef],
    pub explicit: Option<&'a [TypeRef]>,
    pub expected: Option<&'a TypeRef>,
    pub phase: ApplicabilityPhase,
    pub lub_depth: usize,
}

/// Infer a substitution for `request.signature`'s own type parameters, or `None` when the
/// candidate must be excluded.
pub(crate) fn infer(env: &dyn TypeEnv, request: &InferenceRequest<'_>) -> Option<Substitution> {
    let sig = request.signature;
    if !sig.is_generic() {
        return Some(Substitution::new());
    }
    if let Some(explicit) = request.explicit {
        return check_explicit(env, sig, explicit);
    }

    let formals = formals_for_arity(
        &sig.formal_params,
        sig.is_varargs,
        request.args.len(),
        request.phase,
    )?;

    let mut base = Constraints::new(env, &sig.type_params, request.phase);
    for (formal, arg) in formals.iter().zip(request.args) {
        if !base.reduce(formal, arg, Relation::Compatible, 0) {
            tracing::trace!(
                target: "arbiter.resolve",
                method = %sig.name,
                formal = %formal.display(env),
                arg = %arg.display(env),
                "argument constraint failed"
            );
            return None;
        }
    }

    // The assignment context is a soft constraint: drop it if it makes the system unsolvable.
    if let Some(expected) = request.expected.filter(|_| mentions_any(&sig.return_type, &sig.type_params)) {
        let mut with_target = base.clone();
        let expected = match expected {
            TypeRef::Primitive(prim) => boxed(env, *prim),
            other => other.clone(),
        };
        if with_target.reduce(&sig.return_type, &expected, Relation::Subtype, 0) {
            if let Some(solution) = with_target.solve(sig, request.lub_depth) {
                return Some(solution);
            }
        }
    }
    base.solve(sig, request.lub_depth)
}

/// Explicit type arguments replace inference; each must satisfy its bounds with the earlier
/// arguments substituted in.
fn check_explicit(
    env: &dyn TypeEnv,
    sig: &MethodSignature,
    explicit: &[TypeRef],
) -> Option<Substitution> {
    if explicit.len() != sig.type_params.len() {
        tracing::trace!(
            target: "arbiter.resolve",
            method = %sig.name,
            expected = sig.type_params.len(),
            found = explicit.len(),
            "explicit type argument count mismatch"
        );
        return None;
    }
    let mut subst = class_substitution(env, &sig.declaring_type).unwrap_or_default();
    let mut solution = Substitution::new();
    for (tp, arg) in sig.type_params.iter().zip(explicit) {
        subst.insert(*tp, arg.clone());
        solution.insert(*tp, arg.clone());
        let bounds = env.type_param(*tp).map(|def| def.upper_bounds.as_slice()).unwrap_or_default();
        for bound in bounds {
            let bound = substitute(bound, &subst);
            if !is_convertible(env, arg, &bound, ApplicabilityPhase::Strict) {
                return None;
            }
        }
    }
    Some(solution)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Relation {
    /// `actual` must be compatible with (a subtype of) `formal`.
    Compatible,
    /// `formal` and `actual` must be the same type.
    Equal,
    /// `formal` must be a subtype of `actual`.
    Subtype,
}

#[derive(Clone, Debug, Default)]
struct VarBounds {
    equal: Vec<TypeRef>,
    lower: Vec<TypeRef>,
    upper: Vec<TypeRef>,
}

#[derive(Clone)]
struct Constraints<'a> {
    env: &'a dyn TypeEnv,
    vars: &'a [TypeVarId],
    phase: ApplicabilityPhase,
    bounds: HashMap<TypeVarId, VarBounds>,
}

impl<'a> Constraints<'a> {
    fn new(env: &'a dyn TypeEnv, vars: &'a [TypeVarId], phase: ApplicabilityPhase) -> Self {
        Self {
            env,
            vars,
            phase,
            bounds: vars.iter().map(|v| (*v, VarBounds::default())).collect(),
        }
    }

    fn own_var(&self, ty: &TypeRef) -> Option<TypeVarId> {
        match ty {
            TypeRef::TypeVar(id) if self.vars.contains(id) => Some(*id),
            _ => None,
        }
    }

    /// Record what `formal <rel> actual` implies for the inference variables; `false` when the
    /// relation can never hold.
    fn reduce(&mut self, formal: &TypeRef, actual: &TypeRef, rel: Relation, depth: u32) -> bool {
        if depth > MAX_REDUCTION_DEPTH {
            return false;
        }
        if !mentions_any(formal, self.vars) {
            return true;
        }
        if matches!(actual, TypeRef::Null) && rel == Relation::Compatible {
            return true;
        }

        if let Some(var) = self.own_var(formal) {
            let actual = match actual {
                TypeRef::Primitive(prim) => {
                    if !self.phase.allows_boxing() {
                        return false;
                    }
                    boxed(self.env, *prim)
                }
                TypeRef::Wildcard(_) | TypeRef::Void => return false,
                other => other.clone(),
            };
            let Some(bounds) = self.bounds.get_mut(&var) else {
                return false;
            };
            match rel {
                Relation::Compatible => bounds.lower.push(actual),
                Relation::Equal => bounds.equal.push(actual),
                Relation::Subtype => bounds.upper.push(actual),
            }
            return true;
        }

        match formal {
            TypeRef::Array(formal_elem) => match actual {
                TypeRef::Array(actual_elem) => {
                    if actual_elem.is_primitive() {
                        return false;
                    }
                    self.reduce(formal_elem, actual_elem, rel, depth + 1)
                }
                // A type variable bounded by an array type: no structure to match.
                TypeRef::TypeVar(_) | TypeRef::Intersection(_) => true,
                _ => rel == Relation::Subtype,
            },
            TypeRef::Class(ClassType { def, args }) => match rel {
                Relation::Compatible => self.reduce_compatible_class(*def, args, actual, depth),
                Relation::Equal => self.reduce_equal_class(*def, args, actual, depth),
                Relation::Subtype => self.reduce_subtype_class(formal, actual, depth),
            },
            // Wildcards only occur nested inside class arguments and are handled there.
            TypeRef::Wildcard(_) | TypeRef::Intersection(_) => true,
            TypeRef::TypeVar(_)
            | TypeRef::Void
            | TypeRef::Primitive(_)
            | TypeRef::Raw(_)
            | TypeRef::Null => true,
        }
    }

    /// `actual` compatible with `C<F1..Fn>`.
    fn reduce_compatible_class(
        &mut self,
        def: arbiter_types::ClassId,
        formal_args: &[TypeRef],
        actual: &TypeRef,
        depth: u32,
    ) -> bool {
        let actual = match actual {
            TypeRef::Primitive(prim) => {
                if !self.phase.allows_boxing() {
                    return false;
                }
                boxed(self.env, *prim)
            }
            other => other.clone(),
        };
        match instantiate_as_supertype(self.env, &actual, def) {
            // Unchecked conversion: nothing to learn from a raw argument.
            Some(TypeRef::Raw(_)) => true,
            Some(TypeRef::Class(view)) => {
                if view.args.len() != formal_args.len() {
                    return view.args.is_empty();
                }
                formal_args
                    .iter()
                    .zip(&view.args)
                    .all(|(f, a)| self.reduce_contained(f, a, depth + 1))
            }
            _ => false,
        }
    }

    /// Actual type argument `a` contained by formal type argument `f` (JLS 4.5.1).
    fn reduce_contained(&mut self, f: &TypeRef, a: &TypeRef, depth: u32) -> bool {
        match (f, a) {
            (TypeRef::Wildcard(WildcardBound::Unbounded), _) => true,
            (TypeRef::Wildcard(WildcardBound::Extends(fb)), TypeRef::Wildcard(bound)) => match bound {
                WildcardBound::Extends(ab) => self.reduce(fb, ab, Relation::Compatible, depth),
                WildcardBound::Unbounded | WildcardBound::Super(_) => {
                    let object = TypeRef::class(self.env.well_known().object, vec![]);
                    self.reduce(fb, &object, Relation::Compatible, depth)
                }
            },
            (TypeRef::Wildcard(WildcardBound::Extends(fb)), a) => {
                self.reduce(fb, a, Relation::Compatible, depth)
            }
            (TypeRef::Wildcard(WildcardBound::Super(fb)), TypeRef::Wildcard(bound)) => match bound {
                WildcardBound::Super(ab) => self.reduce(fb, ab, Relation::Subtype, depth),
                WildcardBound::Unbounded | WildcardBound::Extends(_) => false,
            },
            (TypeRef::Wildcard(WildcardBound::Super(fb)), a) => {
                self.reduce(fb, a, Relation::Subtype, depth)
            }
            (_, TypeRef::Wildcard(_)) => false,
            (f, a) => self.reduce(f, a, Relation::Equal, depth),
        }
    }

    fn reduce_equal_class(
        &mut self,
        def: arbiter_types::ClassId,
        formal_args: &[TypeRef],
        actual: &TypeRef,
        depth: u32,
    ) -> bool {
        match actual {
            TypeRef::Class(ClassType { def: actual_def, args }) if *actual_def == def => {
                if args.len() != formal_args.len() {
                    return false;
                }
                formal_args.iter().zip(args).all(|(f, a)| match (f, a) {
                    (TypeRef::Wildcard(fw), TypeRef::Wildcard(aw)) => match (fw, aw) {
                        (WildcardBound::Unbounded, WildcardBound::Unbounded) => true,
                        (WildcardBound::Extends(fb), WildcardBound::Extends(ab))
                        | (WildcardBound::Super(fb), WildcardBound::Super(ab)) => {
                            self.reduce(fb, ab, Relation::Equal, depth + 1)
                        }
                        _ => false,
                    },
                    (TypeRef::Wildcard(_), _) | (_, TypeRef::Wildcard(_)) => false,
                    (f, a) => self.reduce(f, a, Relation::Equal, depth + 1),
                })
            }
            TypeRef::Raw(actual_def) => *actual_def == def,
            _ => false,
        }
    }

    /// `formal <: actual`, where `formal` mentions inference variables (return type against an
    /// assignment target).
    fn reduce_subtype_class(&mut self, formal: &TypeRef, actual: &TypeRef, depth: u32) -> bool {
        let target = match actual {
            TypeRef::Class(ClassType { def, args }) if !args.is_empty() => *def,
            // Non-generic or raw targets constrain nothing.
            TypeRef::Class(_) | TypeRef::Raw(_) | TypeRef::TypeVar(_) | TypeRef::Intersection(_) => {
                return true
            }
            _ => return false,
        };
        let Some(TypeRef::Class(view)) = instantiate_as_supertype(self.env, formal, target) else {
            return false;
        };
        let TypeRef::Class(ClassType { args: target_args, .. }) = actual else {
            return false;
        };
        if view.args.len() != target_args.len() {
            return false;
        }
        view.args
            .iter()
            .zip(target_args)
            .all(|(f, t)| match t {
                TypeRef::Wildcard(WildcardBound::Unbounded) => true,
                TypeRef::Wildcard(WildcardBound::Extends(bound)) => {
                    self.reduce(f, bound, Relation::Subtype, depth + 1)
                }
                TypeRef::Wildcard(WildcardBound::Super(bound)) => {
                    self.reduce(f, bound, Relation::Compatible, depth + 1)
                }
                t => self.reduce(f, t, Relation::Equal, depth + 1),
            })
    }

    /// Resolve every variable in declaration order and verify the declared bounds.
    fn solve(&self, sig: &MethodSignature, lub_depth: usize) -> Option<Substitution> {
        let env = self.env;
        let class_subst = class_substitution(env, &sig.declaring_type).unwrap_or_default();
        let mut solution = Substitution::new();

        for var in self.vars {
            let bounds = self.bounds.get(var).cloned().unwrap_or_default();
            let resolved = if let Some(first) = bounds.equal.first() {
                if bounds.equal.iter().any(|other| !same_type(env, first, other)) {
                    return None;
                }
                if bounds.lower.iter().any(|lower| !is_subtype(env, lower, first)) {
                    return None;
                }
                first.clone()
            } else if !bounds.lower.is_empty() {
                lub_with_depth(env, &bounds.lower, lub_depth)
            } else if let Some((first, rest)) = bounds.upper.split_first() {
                rest.iter().fold(first.clone(), |acc, ty| glb(env, &acc, ty))
            } else {
                self.declared_bound(*var, &class_subst, &solution)
            };

            if bounds.upper.iter().any(|upper| !is_subtype(env, &resolved, upper)) {
                return None;
            }
            solution.insert(*var, resolved);
        }

        let mut full = class_subst;
        full.extend(solution.iter().map(|(k, v)| (*k, v.clone())));
        for var in self.vars {
            let ty = &solution[var];
            let declared = env.type_param(*var).map(|tp| tp.upper_bounds.as_slice()).unwrap_or_default();
            for bound in declared {
                let bound = substitute(bound, &full);
                if !is_convertible(env, ty, &bound, ApplicabilityPhase::Strict) {
                    tracing::trace!(
                        target: "arbiter.resolve",
                        method = %sig.name,
                        inferred = %ty.display(env),
                        bound = %bound.display(env),
                        "inferred type argument violates its bound"
                    );
                    return None;
                }
            }
        }
        Some(solution)
    }

    /// Fallback for an unconstrained variable: its declared bound, with already-resolved variables
    /// substituted and erased if it still refers to the method's own variables.
    fn declared_bound(
        &self,
        var: TypeVarId,
        class_subst: &Substitution,
        solved: &Substitution,
    ) -> TypeRef {
        let env = self.env;
        let bounds: Vec<TypeRef> = env
            .type_param(var)
            .map(|tp| tp.upper_bounds.clone())
            .unwrap_or_default()
            .iter()
            .map(|bound| {
                let bound = substitute(&substitute(bound, class_subst), solved);
                if mentions_any(&bound, self.vars) {
                    erasure(env, &bound)
                } else {
                    bound
                }
            })
            .collect();
        make_intersection(env, bounds)
    }
}

fn same_type(env: &dyn TypeEnv, a: &TypeRef, b: &TypeRef) -> bool {
    a == b || (is_subtype(env, a, b) && is_subtype(env, b, a))
}

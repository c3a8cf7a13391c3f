use arbiter_config::GenericSpecificity;
use arbiter_types::{is_subtype, substitute, ApplicabilityPhase, TypeEnv, TypeRef};

use crate::applicability::formals_for_arity;
use crate::infer::{infer, InferenceRequest};
use crate::model::Candidate;

/// Parameters shared by every pairwise comparison of one call site.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Comparison {
    pub phase: ApplicabilityPhase,
    pub arg_count: usize,
    pub mode: GenericSpecificity,
    pub lub_depth: usize,
}

impl Comparison {
    /// How many leading formals take part: the call's arity, plus the variadic element itself in
    /// the variable-arity phase.
    fn compared_len(&self) -> usize {
        if self.phase.allows_variable_arity() {
            self.arg_count + 1
        } else {
            self.arg_count
        }
    }

    fn expand(&self, formals: &[TypeRef], is_varargs: bool, len: usize) -> Option<Vec<TypeRef>> {
        formals_for_arity(formals, is_varargs, len, self.phase)
    }
}

/// `a` is at least as specific as `b` (JLS 15.12.2.5).
///
/// In the variable-arity phase both formal lists are expanded to the call's arity `k`; when `b`
/// declares `k + 1` formals the variadic element types are compared as well.
pub(crate) fn more_specific(env: &dyn TypeEnv, a: &Candidate, b: &Candidate, cmp: &Comparison) -> bool {
    let k = cmp.arg_count;
    let (a_formals, b_formals) = match cmp.mode {
        GenericSpecificity::Instantiated => (a.formal_params.clone(), b.formal_params.clone()),
        GenericSpecificity::Inferred => {
            let a_formals = a.signature.formal_params.clone();
            let b_formals = if b.signature.is_generic() {
                let Some(a_as_args) = cmp.expand(&a_formals, a.signature.is_varargs, k) else {
                    return false;
                };
                let request = InferenceRequest {
                    signature: &b.signature,
                    args: &a_as_args,
                    explicit: None,
                    expected: None,
                    phase: cmp.phase,
                    lub_depth: cmp.lub_depth,
                };
                let Some(subst) = infer(env, &request) else {
                    return false;
                };
                b.signature
                    .formal_params
                    .iter()
                    .map(|param| substitute(param, &subst))
                    .collect()
            } else {
                b.signature.formal_params.clone()
            };
            (a_formals, b_formals)
        }
    };

    if !cmp.phase.allows_variable_arity() {
        return a_formals.len() == b_formals.len()
            && a_formals
                .iter()
                .zip(&b_formals)
                .all(|(s, t)| is_subtype(env, s, t));
    }

    let len = cmp.compared_len();
    let (Some(a_expanded), Some(b_expanded)) = (
        cmp.expand(&a_formals, a.signature.is_varargs, len),
        cmp.expand(&b_formals, b.signature.is_varargs, len),
    ) else {
        return false;
    };
    let mut compared = k;
    if b_formals.len() == k + 1 {
        compared += 1;
    }
    a_expanded
        .iter()
        .zip(&b_expanded)
        .take(compared)
        .all(|(s, t)| is_subtype(env, s, t))
}

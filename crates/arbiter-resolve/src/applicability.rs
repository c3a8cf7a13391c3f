use arbiter_types::{
    conversion, erasure, substitute, ApplicabilityPhase, Conversion, MethodSignature, TypeEnv,
    TypeRef,
};

use crate::infer::{infer, InferenceRequest};
use crate::model::{CallSite, Candidate};

/// Formal parameter types lined up with `arg_count` arguments.
///
/// Outside the variable-arity phase this is `formals` itself when the counts match. In the
/// variable-arity phase the trailing array parameter is replaced by as many copies of its element
/// type as there are trailing arguments (possibly none).
pub(crate) fn formals_for_arity(
    formals: &[TypeRef],
    is_varargs: bool,
    arg_count: usize,
    phase: ApplicabilityPhase,
) -> Option<Vec<TypeRef>> {
    if !phase.allows_variable_arity() {
        return (formals.len() == arg_count).then(|| formals.to_vec());
    }
    let (last, fixed) = formals.split_last()?;
    if !is_varargs || arg_count < fixed.len() {
        return None;
    }
    let TypeRef::Array(elem) = last else {
        return None;
    };
    let mut out = fixed.to_vec();
    out.extend(std::iter::repeat((**elem).clone()).take(arg_count - fixed.len()));
    Some(out)
}

/// Check `sig` against the (captured) argument types under `phase`, inferring its type arguments
/// first when it is generic.
pub(crate) fn check_applicable(
    env: &dyn TypeEnv,
    sig: &MethodSignature,
    call: &CallSite,
    args: &[TypeRef],
    phase: ApplicabilityPhase,
    lub_depth: usize,
) -> Option<Candidate> {
    formals_for_arity(&sig.formal_params, sig.is_varargs, args.len(), phase)?;

    let substitution = infer(
        env,
        &InferenceRequest {
            signature: sig,
            args,
            explicit: call.explicit_type_args.as_deref(),
            expected: call.expected_return.as_ref(),
            phase,
            lub_depth,
        },
    )?;
    if let Some(missing) = sig
        .type_params
        .iter()
        .find(|tp| !substitution.contains_key(*tp))
    {
        panic!(
            "inference for `{}` succeeded without a type argument for {missing:?}",
            sig.name
        );
    }

    let formal_params: Vec<TypeRef> = sig
        .formal_params
        .iter()
        .map(|param| substitute(param, &substitution))
        .collect();
    let expanded = formals_for_arity(&formal_params, sig.is_varargs, args.len(), phase)?;
    // Variable-arity invocation checks each argument under loose rules.
    let per_arg_phase = if phase.allows_variable_arity() {
        ApplicabilityPhase::Loose
    } else {
        phase
    };

    let mut unchecked = false;
    for (arg, formal) in args.iter().zip(&expanded) {
        match conversion(env, arg, formal, per_arg_phase) {
            Some(Conversion::Unchecked) => unchecked = true,
            Some(_) => {}
            None => return None,
        }
    }

    let return_type = substitute(&sig.return_type, &substitution);
    let return_type = if unchecked {
        erasure(env, &return_type)
    } else {
        return_type
    };

    tracing::trace!(
        target: "arbiter.resolve",
        method = %sig.display(env),
        ?phase,
        unchecked,
        "candidate applicable"
    );
    Some(Candidate {
        signature: sig.clone(),
        substitution,
        phase,
        formal_params,
        return_type,
        used_varargs: phase.allows_variable_arity(),
        unchecked,
    })
}

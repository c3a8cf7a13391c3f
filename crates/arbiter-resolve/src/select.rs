use arbiter_config::ResolverConfig;
use arbiter_types::{canonicalize, is_subclass, is_subtype, ApplicabilityPhase, TypeEnv, TypeRef};

use crate::model::{Candidate, ResolutionResult};
use crate::overrides::{clash_erasure, is_name_clash};
use crate::specificity::{more_specific, Comparison};

/// Pick the most specific candidate among those applicable in `phase` (JLS 15.12.2.5).
///
/// `applicable` must be in collection order; every candidate reported in the result comes from it,
/// in that order.
pub(crate) fn select_most_specific(
    env: &dyn TypeEnv,
    mut applicable: Vec<Candidate>,
    phase: ApplicabilityPhase,
    arg_count: usize,
    config: &ResolverConfig,
) -> ResolutionResult {
    match applicable.len() {
        0 => return ResolutionResult::NotApplicable,
        1 => return ResolutionResult::Selected(applicable.remove(0)),
        _ => {}
    }

    if let Some(clashing) = inherited_generic_clashes(env, &applicable, config) {
        tracing::debug!(
            target: "arbiter.resolve",
            candidates = clashing.len(),
            "generic and non-generic candidates of related types share an erasure"
        );
        return ResolutionResult::Ambiguous(clashing);
    }

    let cmp = Comparison {
        phase,
        arg_count,
        mode: config.generic_specificity,
        lub_depth: config.lub_depth,
    };
    let n = applicable.len();
    let mut dominates = vec![vec![false; n]; n];
    for i in 0..n {
        for j in 0..n {
            dominates[i][j] = i == j || more_specific(env, &applicable[i], &applicable[j], &cmp);
        }
    }

    let maximal: Vec<usize> = (0..n)
        .filter(|&i| !(0..n).any(|j| dominates[j][i] && !dominates[i][j]))
        .collect();
    let mut remaining: Vec<Candidate> = maximal.iter().map(|&i| applicable[i].clone()).collect();
    if remaining.len() == 1 {
        return ResolutionResult::Selected(remaining.remove(0));
    }

    let incomparable = maximal.iter().enumerate().any(|(pos, &i)| {
        maximal[pos + 1..]
            .iter()
            .any(|&j| !dominates[i][j] && !dominates[j][i])
    });
    if incomparable {
        tracing::debug!(
            target: "arbiter.resolve",
            candidates = remaining.len(),
            "mutually non-dominating candidates"
        );
        return ResolutionResult::Ambiguous(remaining);
    }

    for (pos, a) in remaining.iter().enumerate() {
        if let Some(b) = remaining[pos + 1..]
            .iter()
            .find(|b| is_name_clash(env, &a.signature, &b.signature, config.clash_erasure))
        {
            return ResolutionResult::NameClash(a.signature.clone(), b.signature.clone());
        }
    }

    break_ties(env, remaining, config)
}

/// Candidates caught in a generic/non-generic name clash between a type and one of its supertypes.
///
/// Neither method overrides the other, so the call cannot pick one even when inference makes the
/// generic formal narrower. `None` when no such pair is applicable.
fn inherited_generic_clashes(
    env: &dyn TypeEnv,
    applicable: &[Candidate],
    config: &ResolverConfig,
) -> Option<Vec<Candidate>> {
    let mut involved = vec![false; applicable.len()];
    for (i, a) in applicable.iter().enumerate() {
        for (j, b) in applicable.iter().enumerate().skip(i + 1) {
            let (ka, kb) = (a.declaring_class(), b.declaring_class());
            let related = ka != kb && (is_subclass(env, ka, kb) || is_subclass(env, kb, ka));
            if related
                && a.signature.is_generic() != b.signature.is_generic()
                && is_name_clash(env, &a.signature, &b.signature, config.clash_erasure)
            {
                involved[i] = true;
                involved[j] = true;
            }
        }
    }
    if !involved.contains(&true) {
        return None;
    }
    Some(
        applicable
            .iter()
            .zip(&involved)
            .filter_map(|(candidate, &hit)| hit.then(|| candidate.clone()))
            .collect(),
    )
}

fn break_ties(
    env: &dyn TypeEnv,
    remaining: Vec<Candidate>,
    config: &ResolverConfig,
) -> ResolutionResult {
    // A non-generic method beats a generic one with the same erased signature.
    let erased: Vec<Vec<TypeRef>> = remaining
        .iter()
        .map(|c| clash_erasure(env, &c.signature, config.clash_erasure))
        .collect();
    let keep: Vec<bool> = remaining
        .iter()
        .enumerate()
        .map(|(i, c)| {
            !c.signature.is_generic()
                || !remaining
                    .iter()
                    .enumerate()
                    .any(|(j, other)| !other.signature.is_generic() && erased[j] == erased[i])
        })
        .collect();
    let mut remaining: Vec<Candidate> = remaining
        .into_iter()
        .zip(keep)
        .filter_map(|(candidate, keep)| keep.then_some(candidate))
        .collect();
    if remaining.len() == 1 {
        return ResolutionResult::Selected(remaining.remove(0));
    }

    if config.prefer_most_derived {
        let most_derived = remaining.iter().position(|c| {
            remaining.iter().all(|other| {
                other.signature.origin == c.signature.origin
                    || (c.declaring_class() != other.declaring_class()
                        && is_subclass(env, c.declaring_class(), other.declaring_class()))
            })
        });
        if let Some(pos) = most_derived {
            return ResolutionResult::Selected(remaining.swap_remove(pos));
        }
    }

    let concrete: Vec<usize> = (0..remaining.len())
        .filter(|&i| !remaining[i].signature.is_abstract)
        .collect();
    match concrete.as_slice() {
        [only] => return ResolutionResult::Selected(remaining.swap_remove(*only)),
        [] => {
            let most_specific_return = remaining.iter().position(|c| {
                remaining
                    .iter()
                    .all(|other| return_at_least_as_specific(env, &c.return_type, &other.return_type))
            });
            if let Some(pos) = most_specific_return {
                return ResolutionResult::Selected(remaining.swap_remove(pos));
            }
        }
        _ => {}
    }

    ResolutionResult::Ambiguous(remaining)
}

fn return_at_least_as_specific(env: &dyn TypeEnv, a: &TypeRef, b: &TypeRef) -> bool {
    match (a, b) {
        (TypeRef::Void, TypeRef::Void) => true,
        (TypeRef::Void, _) | (_, TypeRef::Void) => false,
        _ => canonicalize(env, a) == canonicalize(env, b) || is_subtype(env, a, b),
    }
}

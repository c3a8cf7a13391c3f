//! Declaration-level checks over one type: erasure clashes, incompatible return types of
//! overriding or jointly inherited methods, and abstract methods a concrete class never
//! implements.

use arbiter_config::ResolverConfig;
use arbiter_types::{is_subclass, ClassId, MethodSignature, TypeEnv};

use crate::collect::visible_methods;
use crate::model::{generic_self_type, ConsistencyFinding};
use crate::overrides::{
    is_name_clash, is_subsignature, override_equivalent, override_views, overrides,
    return_substitutable,
};

pub(crate) fn check_type(
    env: &dyn TypeEnv,
    type_id: ClassId,
    config: &ResolverConfig,
) -> Vec<ConsistencyFinding> {
    let Some(class_def) = env.class(type_id) else {
        return Vec::new();
    };
    let self_ty = generic_self_type(env, type_id);
    let visible = visible_methods(env, &self_ty, None);
    let (own, inherited): (Vec<&MethodSignature>, Vec<&MethodSignature>) = visible
        .iter()
        .partition(|sig| sig.declaring_class() == type_id);

    // Inherited methods nobody visible overrides.
    let effective: Vec<&MethodSignature> = inherited
        .iter()
        .copied()
        .filter(|sig| !visible.iter().any(|other| overrides(env, other, sig)))
        .collect();

    let mut findings = Vec::new();
    let mode = config.clash_erasure;
    let clash = |method: &MethodSignature, other: &MethodSignature| ConsistencyFinding::NameClash {
        type_id,
        method: method.clone(),
        other: other.clone(),
    };

    for (pos, method) in own.iter().enumerate() {
        for other in &own[pos + 1..] {
            if is_name_clash(env, method, other, mode) {
                findings.push(clash(method, other));
            }
        }
        for other in &effective {
            if is_name_clash(env, method, other, mode) {
                findings.push(clash(method, other));
            }
        }
    }

    for (pos, method) in effective.iter().enumerate() {
        for other in &effective[pos + 1..] {
            if independent(env, method, other) && is_name_clash(env, method, other, mode) {
                findings.push(clash(method, other));
            }
        }
    }

    for method in &own {
        for other in &inherited {
            let Some((sub, sup)) = override_views(env, method, other) else {
                continue;
            };
            if is_subsignature(env, &sub, &sup) && !return_substitutable(env, &sub, &sup) {
                findings.push(ConsistencyFinding::IncompatibleReturnType {
                    type_id,
                    method: (*method).clone(),
                    other: (*other).clone(),
                });
            }
        }
    }

    for (pos, method) in effective.iter().enumerate() {
        for other in &effective[pos + 1..] {
            if method.name != other.name
                || method.is_static != other.is_static
                || !independent(env, method, other)
                || !override_equivalent(env, method, other)
            {
                continue;
            }
            if !return_substitutable(env, method, other) && !return_substitutable(env, other, method)
            {
                findings.push(ConsistencyFinding::IncompatibleReturnType {
                    type_id,
                    method: (*method).clone(),
                    other: (*other).clone(),
                });
            }
        }
    }

    if !class_def.is_interface() && !class_def.is_abstract {
        let obligations = own.iter().chain(&effective).copied();
        for method in obligations.filter(|sig| sig.is_abstract && !sig.is_static) {
            let implemented = visible.iter().any(|candidate| {
                candidate.origin != method.origin
                    && !candidate.is_abstract
                    && !candidate.is_static
                    && candidate.name == method.name
                    && is_subsignature(env, candidate, method)
            });
            if !implemented {
                findings.push(ConsistencyFinding::UnimplementedAbstractMethod {
                    type_id,
                    method: method.clone(),
                });
            }
        }
    }

    sort_findings(env, &mut findings);
    tracing::debug!(
        target: "arbiter.resolve",
        class = %self_ty.display(env),
        findings = findings.len(),
        "checked type consistency"
    );
    findings
}

/// Neither declaring type is a subtype of the other.
fn independent(env: &dyn TypeEnv, a: &MethodSignature, b: &MethodSignature) -> bool {
    let (ka, kb) = (a.declaring_class(), b.declaring_class());
    !is_subclass(env, ka, kb) && !is_subclass(env, kb, ka)
}

fn sort_findings(env: &dyn TypeEnv, findings: &mut Vec<ConsistencyFinding>) {
    let mut keyed: Vec<((u8, String), ConsistencyFinding)> = findings
        .drain(..)
        .map(|finding| ((finding.kind_rank(), finding.display(env).to_string()), finding))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.dedup_by(|a, b| a.0 == b.0);
    findings.extend(keyed.into_iter().map(|(_, finding)| finding));
}

//! Java method-overload resolution (JLS 15.12.2) over an `arbiter_types` environment.
//!
//! A [`Resolver`] takes a [`CallSite`] through candidate collection, per-phase applicability
//! (strict, loose, variable arity) with type-argument inference, and most-specific selection.
//! [`Resolver::check_consistency`] reports declaration-level problems (erasure clashes,
//! incompatible overriding returns, unimplemented abstract methods) independent of any call.

#![forbid(unsafe_code)]

mod applicability;
mod cache;
mod collect;
mod consistency;
mod infer;
mod model;
mod overrides;
mod resolver;
mod select;
mod specificity;

pub use arbiter_config::{ClashErasure, GenericSpecificity, ResolverConfig};
pub use cache::{CacheStats, ResolutionCache};
pub use collect::{collect_methods, visible_methods, visible_types, CollectedMethods, OverriddenMethod};
pub use model::{
    CallKind, CallSite, Candidate, CandidateDisplay, ConsistencyFinding, FindingDisplay,
    ResolutionResult, ResultDisplay,
};
pub use overrides::{
    is_name_clash, is_subsignature, override_equivalent, overrides, return_substitutable,
};
pub use resolver::Resolver;

use arbiter_types::{ClassId, TypeEnv};

/// Resolve one call site with the default configuration and no cache.
pub fn resolve(env: &dyn TypeEnv, call: &CallSite) -> ResolutionResult {
    Resolver::with_config(env, uncached()).resolve(call)
}

/// Consistency findings for one type with the default configuration.
pub fn check_consistency(env: &dyn TypeEnv, type_id: ClassId) -> Vec<ConsistencyFinding> {
    Resolver::with_config(env, uncached()).check_consistency(type_id)
}

fn uncached() -> ResolverConfig {
    let mut config = ResolverConfig::default();
    config.cache.enabled = false;
    config
}

use arbiter_config::ResolverConfig;
use arbiter_types::{ApplicabilityPhase, ClassId, MethodSignature, TyContext, TypeEnv, TypeRef};
use rayon::prelude::*;

use crate::applicability::check_applicable;
use crate::cache::{CacheStats, ResolutionCache};
use crate::collect::collect_methods;
use crate::consistency::check_type;
use crate::model::{CallSite, Candidate, ConsistencyFinding, ResolutionResult};
use crate::select::select_most_specific;

enum Pool {
    /// Use rayon's global pool.
    Global,
    Dedicated(rayon::ThreadPool),
    /// Worker threads could not be spawned; run batches on the calling thread.
    Inline,
}

fn build_pool(parallelism: Option<usize>) -> Pool {
    let Some(threads) = parallelism else {
        return Pool::Global;
    };
    // Thread creation can fail under low process limits; degrade to fewer threads, then to inline
    // execution, instead of failing resolution.
    let mut threads = threads.max(1);
    loop {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("arbiter-resolve-{idx}"))
            .build()
        {
            Ok(pool) => return Pool::Dedicated(pool),
            Err(_) if threads > 1 => threads = (threads / 2).max(1),
            Err(err) => {
                tracing::warn!(
                    target: "arbiter.resolve",
                    error = %err,
                    "failed to build resolver thread pool; resolving inline"
                );
                return Pool::Inline;
            }
        }
    }
}

/// Rewrite a result so no capture variable of `ctx` escapes the call site.
fn project_result(ctx: &TyContext<'_>, result: ResolutionResult) -> ResolutionResult {
    match result {
        ResolutionResult::Selected(candidate) => {
            ResolutionResult::Selected(project_candidate(ctx, candidate))
        }
        ResolutionResult::Ambiguous(candidates) => ResolutionResult::Ambiguous(
            candidates
                .into_iter()
                .map(|candidate| project_candidate(ctx, candidate))
                .collect(),
        ),
        ResolutionResult::NameClash(a, b) => {
            ResolutionResult::NameClash(project_signature(ctx, a), project_signature(ctx, b))
        }
        ResolutionResult::NotApplicable => ResolutionResult::NotApplicable,
    }
}

fn project_candidate(ctx: &TyContext<'_>, candidate: Candidate) -> Candidate {
    let project_all = |types: &[TypeRef]| -> Vec<TypeRef> {
        types.iter().map(|ty| ctx.project_upward(ty)).collect()
    };
    Candidate {
        substitution: candidate
            .substitution
            .iter()
            .map(|(var, ty)| (*var, ctx.project_upward(ty)))
            .collect(),
        formal_params: project_all(&candidate.formal_params),
        return_type: ctx.project_upward(&candidate.return_type),
        signature: project_signature(ctx, candidate.signature),
        ..candidate
    }
}

fn project_signature(ctx: &TyContext<'_>, signature: MethodSignature) -> MethodSignature {
    let project_all = |types: &[TypeRef]| -> Vec<TypeRef> {
        types.iter().map(|ty| ctx.project_upward(ty)).collect()
    };
    MethodSignature {
        declaring_type: ctx.project_upward(&signature.declaring_type),
        formal_params: project_all(&signature.formal_params),
        return_type: ctx.project_upward(&signature.return_type),
        thrown: project_all(&signature.thrown),
        ..signature
    }
}

/// Overload resolution over one immutable type environment.
///
/// Every call site is resolved in a fresh [`TyContext`], so results depend only on the call site
/// and the environment. Capture variables never appear in a result: they are projected upward to
/// their bounds before it is returned. A `Resolver` can be shared between threads;
/// [`Resolver::resolve_all`] and [`Resolver::check_all`] fan out over rayon.
pub struct Resolver<'env> {
    env: &'env dyn TypeEnv,
    config: ResolverConfig,
    cache: Option<ResolutionCache>,
    pool: Pool,
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<'env> Resolver<'env> {
    pub fn new(env: &'env dyn TypeEnv) -> Self {
        Self::with_config(env, ResolverConfig::default())
    }

    pub fn with_config(env: &'env dyn TypeEnv, config: ResolverConfig) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| ResolutionCache::new(config.cache.shards));
        let pool = build_pool(config.parallelism);
        Self {
            env,
            config,
            cache,
            pool,
        }
    }

    pub fn env(&self) -> &'env dyn TypeEnv {
        self.env
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve one call site (JLS 15.12.2).
    pub fn resolve(&self, call: &CallSite) -> ResolutionResult {
        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(call)) {
            return hit;
        }
        let result = self.resolve_uncached(call);
        if let Some(cache) = &self.cache {
            cache.insert(call.clone(), result.clone());
        }
        result
    }

    fn resolve_uncached(&self, call: &CallSite) -> ResolutionResult {
        let _span = tracing::debug_span!(
            target: "arbiter.resolve",
            "resolve",
            method = %call.method_name,
            args = call.argument_types.len()
        )
        .entered();

        let mut ctx = TyContext::new(self.env);
        let receiver = ctx.capture_conversion(&call.receiver_type);
        let args: Vec<TypeRef> = call
            .argument_types
            .iter()
            .map(|arg| ctx.capture_conversion(arg))
            .collect();

        let collected = collect_methods(&ctx, &receiver, &call.method_name, call.call_kind);
        if collected.candidates.is_empty() {
            tracing::debug!(target: "arbiter.resolve", "no method with a matching name");
            return ResolutionResult::NotApplicable;
        }

        for phase in ApplicabilityPhase::ALL {
            let applicable: Vec<Candidate> = collected
                .candidates
                .iter()
                .filter_map(|sig| {
                    check_applicable(&ctx, sig, call, &args, phase, self.config.lub_depth)
                })
                .collect();
            if applicable.is_empty() {
                continue;
            }
            let result = select_most_specific(&ctx, applicable, phase, args.len(), &self.config);
            let result = project_result(&ctx, result);
            tracing::debug!(
                target: "arbiter.resolve",
                ?phase,
                result = %result.display(&ctx),
                "resolved call site"
            );
            return result;
        }

        tracing::debug!(target: "arbiter.resolve", "no applicable method in any phase");
        ResolutionResult::NotApplicable
    }

    /// Resolve many call sites in parallel; results are in input order.
    pub fn resolve_all(&self, calls: &[CallSite]) -> Vec<ResolutionResult> {
        match &self.pool {
            Pool::Global => calls.par_iter().map(|call| self.resolve(call)).collect(),
            Pool::Dedicated(pool) => {
                pool.install(|| calls.par_iter().map(|call| self.resolve(call)).collect())
            }
            Pool::Inline => calls.iter().map(|call| self.resolve(call)).collect(),
        }
    }

    /// Declaration-level findings for one type, sorted by kind and rendered text.
    pub fn check_consistency(&self, type_id: ClassId) -> Vec<ConsistencyFinding> {
        let _span =
            tracing::debug_span!(target: "arbiter.resolve", "check_consistency", ?type_id).entered();
        check_type(self.env, type_id, &self.config)
    }

    pub fn check_all(&self, type_ids: &[ClassId]) -> Vec<Vec<ConsistencyFinding>> {
        let check = |id: &ClassId| self.check_consistency(*id);
        match &self.pool {
            Pool::Global => type_ids.par_iter().map(check).collect(),
            Pool::Dedicated(pool) => pool.install(|| type_ids.par_iter().map(check).collect()),
            Pool::Inline => type_ids.iter().map(check).collect(),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .as_ref()
            .map(ResolutionCache::stats)
            .unwrap_or_default()
    }

    /// Forget every memoised result, e.g. before resolving against a rebuilt environment.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}

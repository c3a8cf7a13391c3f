use arbiter_resolve::{CacheStats, CallSite, ResolutionResult, Resolver, ResolverConfig};
use arbiter_test_utils::{init_test_tracing, void_method, Fixture};
use arbiter_types::{ClassDef, TypeRef};

use pretty_assertions::assert_eq;

fn uncached(parallelism: Option<usize>) -> ResolverConfig {
    let mut config = ResolverConfig {
        parallelism,
        ..ResolverConfig::default()
    };
    config.cache.enabled = false;
    config
}

fn call_sites(fx: &Fixture, x: arbiter_types::ClassId) -> Vec<CallSite> {
    let wk = fx.well_known();
    let numbers = fx.list_of(TypeRef::extends(fx.number()));
    vec![
        CallSite::new(fx.ty(x), "m", vec![TypeRef::int()]),
        CallSite::new(fx.ty(x), "m", vec![fx.string()]),
        CallSite::new(fx.ty(x), "m", vec![fx.integer(), fx.integer()]),
        CallSite::new(numbers.clone(), "get", vec![TypeRef::int()]),
        CallSite::new(numbers, "size", vec![]),
        CallSite::new(TypeRef::class(wk.array_list, vec![fx.string()]), "add", vec![fx.string()]),
        CallSite::new(fx.ty(x), "missing", vec![]),
    ]
}

fn overloads(fx: &mut Fixture) -> arbiter_types::ClassId {
    let (integer, object, string) = (fx.integer(), fx.object(), fx.string());
    fx.add(
        ClassDef::class("p.X")
            .method(void_method("m", vec![TypeRef::long()]))
            .method(void_method("m", vec![string]))
            .method(void_method("m", vec![integer.clone(), object.clone()]))
            .method(void_method("m", vec![object, integer])),
    )
}

#[test]
fn batch_results_match_sequential_resolution() {
    init_test_tracing();
    let mut fx = Fixture::new();
    let x = overloads(&mut fx);
    let calls = call_sites(&fx, x);
    let env = fx.store();

    let resolver = Resolver::with_config(env, uncached(Some(2)));
    let sequential: Vec<ResolutionResult> = calls.iter().map(|call| resolver.resolve(call)).collect();
    let batch = resolver.resolve_all(&calls);
    assert_eq!(batch, sequential);
    assert_eq!(resolver.resolve_all(&calls), batch);

    assert!(batch[0].is_selected());
    assert!(batch[2].is_ambiguous());
    assert_eq!(batch[6], ResolutionResult::NotApplicable);
}

#[test]
fn capture_variables_do_not_escape_the_call_site() {
    let fx = Fixture::new();
    let env = fx.store();
    let call = CallSite::new(fx.list_of(TypeRef::extends(fx.number())), "get", vec![TypeRef::int()]);

    let resolver = Resolver::with_config(env, uncached(None));
    let first = resolver.resolve(&call);
    let second = resolver.resolve(&call);
    assert_eq!(first, second);
    assert_eq!(first.selected().map(|c| &c.return_type), Some(&fx.number()));
}

#[test]
fn cache_serves_repeated_call_sites() {
    let mut fx = Fixture::new();
    let x = overloads(&mut fx);
    let env = fx.store();
    let call = CallSite::new(fx.ty(x), "m", vec![TypeRef::int()]);

    let resolver = Resolver::new(env);
    let first = resolver.resolve(&call);
    let second = resolver.resolve(&call);
    assert_eq!(first, second);
    assert_eq!(
        resolver.cache_stats(),
        CacheStats {
            hits: 1,
            misses: 1,
            entries: 1,
        }
    );

    resolver.clear_cache();
    assert_eq!(resolver.cache_stats(), CacheStats::default());
    assert_eq!(resolver.resolve(&call), first);
}

#[test]
fn disabled_cache_reports_no_activity() {
    let mut fx = Fixture::new();
    let x = overloads(&mut fx);
    let env = fx.store();

    let resolver = Resolver::with_config(env, uncached(None));
    resolver.resolve(&CallSite::new(fx.ty(x), "m", vec![TypeRef::int()]));
    assert_eq!(resolver.cache_stats(), CacheStats::default());
}

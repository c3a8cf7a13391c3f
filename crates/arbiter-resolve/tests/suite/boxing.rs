use arbiter_resolve::{resolve, CallSite, ResolutionResult};
use arbiter_test_utils::{assert_selected, void_method, Fixture};
use arbiter_types::{ApplicabilityPhase, ClassDef, TypeRef};

use pretty_assertions::assert_eq;

#[test]
fn primitive_widening_wins_over_boxing() {
    let mut fx = Fixture::new();
    let x = fx.add(
        ClassDef::class("p.X")
            .method(void_method("m", vec![TypeRef::long()]))
            .method(void_method("m", vec![fx.integer()])),
    );

    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.ty(x), "m", vec![TypeRef::int()]));
    assert_selected(env, &result, fx.method(x, "m", 0));
    assert_eq!(result.selected().map(|c| c.phase), Some(ApplicabilityPhase::Strict));
}

#[test]
fn boxing_wins_over_variable_arity() {
    let mut fx = Fixture::new();
    let x = fx.add(
        ClassDef::class("p.X")
            .method(void_method("m", vec![fx.integer()]))
            .method(void_method("m", vec![TypeRef::array(fx.object())]).into_varargs()),
    );

    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.ty(x), "m", vec![TypeRef::int()]));
    assert_selected(env, &result, fx.method(x, "m", 0));
    let candidate = result.selected().expect("selected");
    assert_eq!(candidate.phase, ApplicabilityPhase::Loose);
    assert!(!candidate.used_varargs);
}

#[test]
fn boxing_then_widening_to_object() {
    let mut fx = Fixture::new();
    let x = fx.add(ClassDef::class("p.X").method(void_method("m", vec![fx.object()])));

    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.ty(x), "m", vec![TypeRef::int()]));
    assert_eq!(result.selected().map(|c| c.phase), Some(ApplicabilityPhase::Loose));
}

#[test]
fn unboxing_and_unboxing_then_widening() {
    let mut fx = Fixture::new();
    let int_sink = fx.add(ClassDef::class("p.IntSink").method(void_method("m", vec![TypeRef::int()])));
    let long_sink =
        fx.add(ClassDef::class("p.LongSink").method(void_method("m", vec![TypeRef::long()])));

    let env = fx.store();
    for sink in [int_sink, long_sink] {
        let result = resolve(env, &CallSite::new(fx.ty(sink), "m", vec![fx.integer()]));
        assert_selected(env, &result, fx.method(sink, "m", 0));
        assert_eq!(result.selected().map(|c| c.phase), Some(ApplicabilityPhase::Loose));
    }
}

#[test]
fn boxing_never_widens_the_primitive_first() {
    let mut fx = Fixture::new();
    let x = fx.add(ClassDef::class("p.X").method(void_method("m", vec![fx.long()])));

    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.ty(x), "m", vec![TypeRef::int()]));
    assert!(!result.is_selected());
}

#[test]
fn primitive_receiver_is_not_boxed_to_find_members() {
    let fx = Fixture::new();
    let env = fx.store();

    let result = resolve(env, &CallSite::new(TypeRef::int(), "toString", vec![]));
    assert_eq!(result, ResolutionResult::NotApplicable);
}

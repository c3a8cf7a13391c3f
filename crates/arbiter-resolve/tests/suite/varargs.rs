use arbiter_resolve::{resolve, CallSite};
use arbiter_test_utils::{assert_selected, void_method, Fixture};
use arbiter_types::{ApplicabilityPhase, ClassDef, TypeRef};

use pretty_assertions::assert_eq;

#[test]
fn fixed_arity_method_wins_over_variable_arity() {
    let mut fx = Fixture::new();
    let string = fx.string();
    let x = fx.add(
        ClassDef::class("p.X")
            .method(void_method("m", vec![string.clone()]))
            .method(void_method("m", vec![TypeRef::array(string.clone())]).into_varargs()),
    );

    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.ty(x), "m", vec![string]));
    assert_selected(env, &result, fx.method(x, "m", 0));
}

#[test]
fn trailing_arguments_may_be_absent() {
    let mut fx = Fixture::new();
    let x = fx.add(ClassDef::class("p.X").method(
        void_method("m", vec![TypeRef::int(), TypeRef::array(fx.string())]).into_varargs(),
    ));

    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.ty(x), "m", vec![TypeRef::int()]));
    assert_selected(env, &result, fx.method(x, "m", 0));
    let candidate = result.selected().expect("selected");
    assert_eq!(candidate.phase, ApplicabilityPhase::VariableArity);
    assert!(candidate.used_varargs);

    let many = resolve(
        env,
        &CallSite::new(fx.ty(x), "m", vec![TypeRef::int(), fx.string(), fx.string()]),
    );
    assert_eq!(many.selected().map(|c| c.used_varargs), Some(true));
}

#[test]
fn array_argument_matches_the_varargs_parameter_directly() {
    let mut fx = Fixture::new();
    let strings = TypeRef::array(fx.string());
    let x = fx.add(
        ClassDef::class("p.X").method(void_method("m", vec![strings.clone()]).into_varargs()),
    );

    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.ty(x), "m", vec![strings]));
    let candidate = result.selected().expect("selected");
    assert_eq!(candidate.phase, ApplicabilityPhase::Strict);
    assert!(!candidate.used_varargs);
}

#[test]
fn narrower_element_type_is_more_specific() {
    let mut fx = Fixture::new();
    let x = fx.add(
        ClassDef::class("p.X")
            .method(void_method("m", vec![TypeRef::array(fx.object())]).into_varargs())
            .method(void_method("m", vec![TypeRef::array(fx.integer())]).into_varargs()),
    );

    let env = fx.store();
    let result = resolve(
        env,
        &CallSite::new(fx.ty(x), "m", vec![fx.integer(), fx.integer()]),
    );
    assert_selected(env, &result, fx.method(x, "m", 1));
    assert_eq!(result.selected().map(|c| c.phase), Some(ApplicabilityPhase::VariableArity));
}

#[test]
fn non_varargs_array_parameter_does_not_spread() {
    let mut fx = Fixture::new();
    let x = fx.add(ClassDef::class("p.X").method(void_method("m", vec![TypeRef::array(fx.string())])));

    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.ty(x), "m", vec![fx.string()]));
    assert!(!result.is_selected());
}

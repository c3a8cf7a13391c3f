use arbiter_resolve::{resolve, CallSite, ResolutionResult};
use arbiter_test_utils::{assert_selected, Fixture};
use arbiter_types::{ClassDef, ClassId, MethodDef, TypeRef};

use pretty_assertions::assert_eq;

fn return_of(result: &ResolutionResult) -> Option<TypeRef> {
    result.selected().map(|c| c.return_type.clone())
}

/// class Util { <T> T pick(T a, T b) }
fn pick() -> (Fixture, ClassId) {
    let mut fx = Fixture::new();
    let t = fx.type_param("T", vec![]);
    let util = fx.add(ClassDef::class("p.Util").method(
        MethodDef::new(
            "pick",
            vec![TypeRef::TypeVar(t), TypeRef::TypeVar(t)],
            TypeRef::TypeVar(t),
        )
        .with_type_params(vec![t]),
    ));
    (fx, util)
}

#[test]
fn lower_bounds_are_joined_with_lub() {
    let (fx, util) = pick();
    let env = fx.store();

    let mixed = resolve(env, &CallSite::new(fx.ty(util), "pick", vec![fx.integer(), fx.long()]));
    assert_selected(env, &mixed, fx.method(util, "pick", 0));
    match return_of(&mixed) {
        Some(TypeRef::Intersection(parts)) => assert_eq!(parts[0], fx.number()),
        other => panic!("expected an intersection, got {other:?}"),
    }

    let nested = resolve(env, &CallSite::new(fx.ty(util), "pick", vec![fx.integer(), fx.number()]));
    assert_eq!(return_of(&nested), Some(fx.number()));
}

#[test]
fn declared_bound_rejects_incompatible_argument() {
    let mut fx = Fixture::new();
    let t = fx.type_param("T", vec![fx.number()]);
    let util = fx.add(ClassDef::class("p.Util").method(
        MethodDef::new("take", vec![TypeRef::TypeVar(t)], TypeRef::Void).with_type_params(vec![t]),
    ));

    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.ty(util), "take", vec![fx.string()]));
    assert_eq!(result, ResolutionResult::NotApplicable);
}

/// class Factory { <T> T make(); <N extends Number> N num() }
fn factory() -> (Fixture, ClassId) {
    let mut fx = Fixture::new();
    let t = fx.type_param("T", vec![]);
    let n = fx.type_param("N", vec![fx.number()]);
    let factory = fx.add(
        ClassDef::class("p.Factory")
            .method(MethodDef::new("make", vec![], TypeRef::TypeVar(t)).with_type_params(vec![t]))
            .method(MethodDef::new("num", vec![], TypeRef::TypeVar(n)).with_type_params(vec![n])),
    );
    (fx, factory)
}

#[test]
fn explicit_type_arguments_are_used_verbatim() {
    let (fx, factory) = factory();
    let env = fx.store();
    let call = CallSite::new(fx.ty(factory), "make", vec![]);

    let explicit = resolve(env, &call.clone().with_type_args(vec![fx.string()]));
    assert_eq!(return_of(&explicit), Some(fx.string()));

    let wrong_count = resolve(env, &call.with_type_args(vec![fx.string(), fx.string()]));
    assert_eq!(wrong_count, ResolutionResult::NotApplicable);

    let out_of_bounds = resolve(
        env,
        &CallSite::new(fx.ty(factory), "num", vec![]).with_type_args(vec![fx.string()]),
    );
    assert_eq!(out_of_bounds, ResolutionResult::NotApplicable);
}

#[test]
fn expected_return_type_guides_inference() {
    let (fx, factory) = factory();
    let env = fx.store();
    let call = CallSite::new(fx.ty(factory), "make", vec![]);

    assert_eq!(return_of(&resolve(env, &call.clone().expecting(fx.string()))), Some(fx.string()));
    assert_eq!(return_of(&resolve(env, &call)), Some(fx.object()));
}

#[test]
fn unsatisfiable_expected_return_type_is_dropped() {
    let (fx, factory) = factory();
    let env = fx.store();

    let call = CallSite::new(fx.ty(factory), "num", vec![]).expecting(fx.string());
    assert_eq!(return_of(&resolve(env, &call)), Some(fx.number()));
}

#[test]
fn wildcard_argument_result_is_projected_to_the_capture_bound() {
    // class Util { <T> T first(List<? extends T> items) }
    let mut fx = Fixture::new();
    let t = fx.type_param("T", vec![]);
    let param = fx.list_of(TypeRef::extends(TypeRef::TypeVar(t)));
    let util = fx.add(ClassDef::class("p.Util").method(
        MethodDef::new("first", vec![param], TypeRef::TypeVar(t)).with_type_params(vec![t]),
    ));

    let env = fx.store();
    let arg = fx.list_of(TypeRef::extends(fx.number()));
    let result = resolve(env, &CallSite::new(fx.ty(util), "first", vec![arg.clone()]));
    let selected = result
        .selected()
        .unwrap_or_else(|| panic!("expected a selection, got {result:?}"));
    assert_eq!(selected.return_type, fx.number());
    assert_eq!(selected.substitution.get(&t), Some(&fx.number()));
    assert_eq!(selected.formal_params, vec![arg]);
}

#[test]
fn super_wildcard_receiver_yields_object_element() {
    let fx = Fixture::new();
    let env = fx.store();
    let receiver = fx.list_of(TypeRef::super_of(fx.integer()));
    let result = resolve(env, &CallSite::new(receiver.clone(), "get", vec![TypeRef::int()]));
    let selected = result
        .selected()
        .unwrap_or_else(|| panic!("expected a selection, got {result:?}"));
    assert_eq!(selected.return_type, fx.object());
    assert_eq!(selected.signature.declaring_type, receiver);
}

#[test]
fn invariant_type_argument_fixes_the_variable() {
    // class Util { <T> void fill(List<T> items, T value) }
    let mut fx = Fixture::new();
    let t = fx.type_param("T", vec![]);
    let list_t = fx.list_of(TypeRef::TypeVar(t));
    let util = fx.add(ClassDef::class("p.Util").method(
        MethodDef::new("fill", vec![list_t, TypeRef::TypeVar(t)], TypeRef::Void)
            .with_type_params(vec![t]),
    ));

    let env = fx.store();
    let numbers = resolve(
        env,
        &CallSite::new(fx.ty(util), "fill", vec![fx.list_of(fx.number()), fx.integer()]),
    );
    let candidate = numbers.selected().expect("selected");
    assert_eq!(candidate.substitution.get(&t), Some(&fx.number()));

    let strings = resolve(
        env,
        &CallSite::new(fx.ty(util), "fill", vec![fx.list_of(fx.string()), fx.integer()]),
    );
    assert_eq!(strings, ResolutionResult::NotApplicable);
}

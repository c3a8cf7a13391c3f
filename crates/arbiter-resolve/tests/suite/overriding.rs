use arbiter_resolve::{collect_methods, resolve, CallKind, CallSite, ResolutionResult};
use arbiter_test_utils::{assert_selected, generic_void_method, void_method, Fixture};
use arbiter_types::{ClassDef, MethodDef, TypeRef};

use pretty_assertions::assert_eq;

#[test]
fn overloads_across_the_hierarchy_pick_the_most_specific() {
    // class A { void foo(A a) }  class B extends A { void foo(B b) }  class C extends B {}
    let mut fx = Fixture::new();
    let a = fx.declare("p.A");
    let b = fx.declare("p.B");
    fx.define(a, ClassDef::class("p.A").method(void_method("foo", vec![TypeRef::class(a, vec![])])));
    fx.define(
        b,
        ClassDef::class("p.B")
            .extends(fx.ty(a))
            .method(void_method("foo", vec![TypeRef::class(b, vec![])])),
    );
    let c = fx.add(ClassDef::class("p.C").extends(fx.ty(b)));

    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.ty(c), "foo", vec![fx.ty(c)]));
    assert_selected(env, &result, fx.method(b, "foo", 0));
    assert_eq!(result.display(env).to_string(), "B.foo(B)");
}

#[test]
fn overriding_method_replaces_the_inherited_one() {
    let mut fx = Fixture::new();
    let string = fx.string();
    let a = fx.add(ClassDef::class("p.A").method(void_method("foo", vec![string.clone()])));
    let b = fx.add(
        ClassDef::class("p.B")
            .extends(fx.ty(a))
            .method(void_method("foo", vec![string.clone()])),
    );

    let env = fx.store();
    let collected = collect_methods(env, &fx.ty(b), "foo", CallKind::Instance);
    assert_eq!(collected.candidates.len(), 1);
    assert_eq!(collected.overridden.len(), 1);
    assert_eq!(collected.overridden[0].method.origin, fx.method(a, "foo", 0));
    assert_eq!(collected.overridden[0].by, fx.method(b, "foo", 0));

    let on_b = resolve(env, &CallSite::new(fx.ty(b), "foo", vec![string.clone()]));
    assert_selected(env, &on_b, fx.method(b, "foo", 0));
    let on_a = resolve(env, &CallSite::new(fx.ty(a), "foo", vec![string]));
    assert_selected(env, &on_a, fx.method(a, "foo", 0));
}

#[test]
fn generic_method_with_renamed_type_parameter_overrides() {
    // class Supertype<T1> { <U1> void foo(U1 u, T1 t) }
    // class Subtype<T2> extends Supertype<T2> { <U3> void foo(U3 u, T2 t) }
    let mut fx = Fixture::new();
    let t1 = fx.type_param("T1", vec![]);
    let u1 = fx.type_param("U1", vec![]);
    let supertype = fx.add(
        ClassDef::class("p.Supertype")
            .with_type_params(vec![t1])
            .method(generic_void_method(
                "foo",
                vec![u1],
                vec![TypeRef::TypeVar(u1), TypeRef::TypeVar(t1)],
            )),
    );
    let t2 = fx.type_param("T2", vec![]);
    let u3 = fx.type_param("U3", vec![]);
    let subtype = fx.add(
        ClassDef::class("p.Subtype")
            .with_type_params(vec![t2])
            .extends(fx.generic(supertype, vec![TypeRef::TypeVar(t2)]))
            .method(generic_void_method(
                "foo",
                vec![u3],
                vec![TypeRef::TypeVar(u3), TypeRef::TypeVar(t2)],
            )),
    );

    let env = fx.store();
    let receiver = fx.generic(subtype, vec![fx.string()]);
    let result = resolve(
        env,
        &CallSite::new(receiver, "foo", vec![fx.integer(), fx.string()]),
    );
    assert_selected(env, &result, fx.method(subtype, "foo", 0));
    let candidate = result.selected().expect("selected");
    assert_eq!(candidate.substitution.get(&u3), Some(&fx.integer()));
}

#[test]
fn covariant_return_override_is_merged() {
    let mut fx = Fixture::new();
    let a = fx.add(ClassDef::class("p.A").method(MethodDef::new("get", vec![], fx.number())));
    let b = fx.add(
        ClassDef::class("p.B")
            .extends(fx.ty(a))
            .method(MethodDef::new("get", vec![], fx.integer())),
    );

    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.ty(b), "get", vec![]));
    assert_selected(env, &result, fx.method(b, "get", 0));
    assert_eq!(result.selected().map(|c| c.return_type.clone()), Some(fx.integer()));
}

#[test]
fn static_call_only_sees_static_methods() {
    let mut fx = Fixture::new();
    let string = fx.string();
    let util = fx.add(
        ClassDef::class("p.Util")
            .method(void_method("run", vec![string.clone()]))
            .method(void_method("run", vec![fx.object()]).into_static()),
    );

    let env = fx.store();
    let call = CallSite::new(fx.ty(util), "run", vec![string]);
    assert_selected(env, &resolve(env, &call), fx.method(util, "run", 0));
    assert_selected(env, &resolve(env, &call.into_static()), fx.method(util, "run", 1));
}

#[test]
fn unknown_method_name_is_not_applicable() {
    let fx = Fixture::new();
    let env = fx.store();
    let result = resolve(env, &CallSite::new(fx.string(), "frobnicate", vec![]));
    assert_eq!(result, ResolutionResult::NotApplicable);
    assert_eq!(result.display(env).to_string(), "no applicable method");
}

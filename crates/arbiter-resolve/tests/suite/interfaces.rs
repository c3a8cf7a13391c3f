use arbiter_resolve::{check_consistency, resolve, CallSite, ConsistencyFinding};
use arbiter_test_utils::{assert_selected, render_findings, void_method, Fixture};
use arbiter_types::{ClassDef, ClassId, TypeRef};

use pretty_assertions::assert_eq;

/// interface I1<E1> { void method(E1 e) }
/// interface I2<E2> { void method(E2 e) }
/// interface I3<E3, E4> extends I1<E3>, I2<E4> {}
fn diamond() -> (Fixture, ClassId, ClassId, ClassId) {
    let mut fx = Fixture::new();
    let e1 = fx.type_param("E1", vec![]);
    let i1 = fx.add(
        ClassDef::interface("p.I1")
            .with_type_params(vec![e1])
            .method(void_method("method", vec![TypeRef::TypeVar(e1)]).into_abstract()),
    );
    let e2 = fx.type_param("E2", vec![]);
    let i2 = fx.add(
        ClassDef::interface("p.I2")
            .with_type_params(vec![e2])
            .method(void_method("method", vec![TypeRef::TypeVar(e2)]).into_abstract()),
    );
    let e3 = fx.type_param("E3", vec![]);
    let e4 = fx.type_param("E4", vec![]);
    let i3 = fx.add(
        ClassDef::interface("p.I3")
            .with_type_params(vec![e3, e4])
            .implements(fx.generic(i1, vec![TypeRef::TypeVar(e3)]))
            .implements(fx.generic(i2, vec![TypeRef::TypeVar(e4)])),
    );
    (fx, i1, i2, i3)
}

#[test]
fn independently_inherited_methods_with_equal_erasure_clash() {
    let (fx, i1, i2, i3) = diamond();
    let env = fx.store();

    let findings = check_consistency(env, i3);
    assert_eq!(findings.len(), 1);
    let ConsistencyFinding::NameClash { method, other, .. } = &findings[0] else {
        panic!("expected a name clash, got {findings:#?}");
    };
    assert_eq!(method.origin, fx.method(i1, "method", 0));
    assert_eq!(other.origin, fx.method(i2, "method", 0));
    assert_eq!(
        render_findings(env, &findings),
        vec![
            "Name clash: The method method(E1) of type I1<E1> has the same erasure as method(E2) of type I2<E2> but does not override it"
                .to_string()
        ]
    );
}

#[test]
fn call_through_equal_instantiations_picks_the_first_abstract_method() {
    let (fx, i1, _i2, i3) = diamond();
    let env = fx.store();
    let receiver = fx.generic(i3, vec![fx.string(), fx.string()]);

    let result = resolve(env, &CallSite::new(receiver, "method", vec![fx.string()]));
    assert_selected(env, &result, fx.method(i1, "method", 0));
}

#[test]
fn concrete_implementation_satisfies_both_interfaces() {
    let (mut fx, _i1, _i2, i3) = diamond();
    let string = fx.string();
    let receiver = fx.generic(i3, vec![string.clone(), string.clone()]);
    let c = fx.add(
        ClassDef::class("p.C")
            .implements(receiver)
            .method(void_method("method", vec![string.clone()])),
    );

    let env = fx.store();
    assert!(check_consistency(env, c).is_empty());
    let result = resolve(env, &CallSite::new(fx.ty(c), "method", vec![string]));
    assert_selected(env, &result, fx.method(c, "method", 0));
}

#[test]
fn concrete_class_without_implementation_is_reported() {
    let (mut fx, i1, _i2, _i3) = diamond();
    let implemented = fx.generic(i1, vec![fx.string()]);
    let d = fx.add(ClassDef::class("p.D").implements(implemented));

    let env = fx.store();
    assert_eq!(
        render_findings(env, &check_consistency(env, d)),
        vec!["The type D must implement the inherited abstract method I1.method(String)".to_string()]
    );
}

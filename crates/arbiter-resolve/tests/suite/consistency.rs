use arbiter_resolve::{check_consistency, ConsistencyFinding, Resolver};
use arbiter_test_utils::{render_findings, void_method, Fixture};
use arbiter_types::{ClassDef, ClassId, MethodDef, TypeRef};

use pretty_assertions::assert_eq;

/// abstract class Shape { abstract double area() }
fn shape(fx: &mut Fixture) -> ClassId {
    fx.add(
        ClassDef::class("p.Shape")
            .into_abstract()
            .method(MethodDef::new("area", vec![], TypeRef::double()).into_abstract()),
    )
}

#[test]
fn concrete_subclass_must_implement_abstract_methods() {
    let mut fx = Fixture::new();
    let shape = shape(&mut fx);
    let square = fx.add(ClassDef::class("p.Square").extends(fx.ty(shape)));
    let circle = fx.add(
        ClassDef::class("p.Circle")
            .extends(fx.ty(shape))
            .method(MethodDef::new("area", vec![], TypeRef::double())),
    );

    let env = fx.store();
    assert_eq!(
        render_findings(env, &check_consistency(env, square)),
        vec!["The type Square must implement the inherited abstract method Shape.area()".to_string()]
    );
    assert!(check_consistency(env, circle).is_empty());
    assert!(check_consistency(env, shape).is_empty());
}

#[test]
fn implementation_inherited_from_a_superclass_satisfies_an_interface() {
    // interface Named { String name() }  class Base { String name() }
    // class Impl extends Base implements Named {}
    let mut fx = Fixture::new();
    let string = fx.string();
    let named = fx.add(
        ClassDef::interface("p.Named")
            .method(MethodDef::new("name", vec![], string.clone()).into_abstract()),
    );
    let base = fx.add(ClassDef::class("p.Base").method(MethodDef::new("name", vec![], string)));
    let implementor = fx.add(
        ClassDef::class("p.Impl")
            .extends(fx.ty(base))
            .implements(fx.ty(named)),
    );

    let env = fx.store();
    assert!(check_consistency(env, implementor).is_empty());
}

#[test]
fn overriding_with_an_unrelated_return_type_is_reported() {
    let mut fx = Fixture::new();
    let a = fx.add(ClassDef::class("p.A").method(MethodDef::new("get", vec![], fx.number())));
    let b = fx.add(
        ClassDef::class("p.B")
            .extends(fx.ty(a))
            .method(MethodDef::new("get", vec![], fx.string())),
    );

    let env = fx.store();
    let findings = check_consistency(env, b);
    assert!(matches!(
        findings.as_slice(),
        [ConsistencyFinding::IncompatibleReturnType { type_id, .. }] if *type_id == b
    ));
    assert_eq!(
        render_findings(env, &findings),
        vec!["The return type of get() in type B is incompatible with A.get()".to_string()]
    );
}

#[test]
fn jointly_inherited_methods_need_a_common_return_type() {
    // interface J1 { Integer value() }  interface J2 { String value() }
    // abstract class K implements J1, J2 {}
    let mut fx = Fixture::new();
    let j1 = fx.add(
        ClassDef::interface("p.J1")
            .method(MethodDef::new("value", vec![], fx.integer()).into_abstract()),
    );
    let j2 = fx.add(
        ClassDef::interface("p.J2")
            .method(MethodDef::new("value", vec![], fx.string()).into_abstract()),
    );
    let k = fx.add(
        ClassDef::class("p.K")
            .into_abstract()
            .implements(fx.ty(j1))
            .implements(fx.ty(j2)),
    );

    let env = fx.store();
    assert_eq!(
        render_findings(env, &check_consistency(env, k)),
        vec!["The return type of value() in type K is incompatible with J2.value()".to_string()]
    );
}

#[test]
fn findings_are_ordered_by_kind_and_stable() {
    // class Mixed extends Shape { void m(List<String> a); void m(List<Integer> b) }
    let mut fx = Fixture::new();
    let shape = shape(&mut fx);
    let strings = fx.list_of(fx.string());
    let integers = fx.list_of(fx.integer());
    let mixed = fx.add(
        ClassDef::class("p.Mixed")
            .extends(fx.ty(shape))
            .method(void_method("m", vec![strings]))
            .method(void_method("m", vec![integers])),
    );

    let env = fx.store();
    let resolver = Resolver::new(env);
    let findings = resolver.check_consistency(mixed);
    assert!(matches!(
        findings.as_slice(),
        [
            ConsistencyFinding::NameClash { .. },
            ConsistencyFinding::UnimplementedAbstractMethod { .. },
        ]
    ));
    assert_eq!(resolver.check_consistency(mixed), findings);
    assert_eq!(
        resolver.check_all(&[mixed, shape]),
        vec![findings, Vec::new()]
    );
}

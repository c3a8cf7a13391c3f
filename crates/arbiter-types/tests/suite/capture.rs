use arbiter_types::{
    format_type, is_subtype, ClassDef, ClassType, TyContext, TypeEnv, TypeParamDef, TypeRef,
    TypeStore,
};

use pretty_assertions::assert_eq;

fn capture_var(ty: &TypeRef, idx: usize) -> arbiter_types::TypeVarId {
    match ty {
        TypeRef::Class(ClassType { args, .. }) => match &args[idx] {
            TypeRef::TypeVar(id) => *id,
            other => panic!("expected capture variable, got {other:?}"),
        },
        other => panic!("expected class type, got {other:?}"),
    }
}

#[test]
fn capture_of_extends_wildcard_is_a_subtype_of_its_bound() {
    let env = TypeStore::with_minimal_jdk();
    let wk = env.well_known();
    let number = TypeRef::class(wk.number, vec![]);
    let list_ext = TypeRef::class(wk.list, vec![TypeRef::extends(number.clone())]);

    let mut ctx = TyContext::new(&env);
    let captured = ctx.capture_conversion(&list_ext);
    let cap = TypeRef::TypeVar(capture_var(&captured, 0));

    assert!(is_subtype(&ctx, &cap, &number));
    assert!(is_subtype(&ctx, &captured, &list_ext));
    assert_eq!(format_type(&ctx, &captured), "List<CAP#1>");
}

#[test]
fn capture_substitutes_f_bounded_formals() {
    let mut env = TypeStore::with_minimal_jdk();
    let comparable = env.well_known().comparable;

    // class Sorted<E extends Comparable<E>>
    let e = env.add_type_param("E", vec![]);
    env.define_type_param(
        e,
        TypeParamDef {
            name: "E".to_string(),
            upper_bounds: vec![TypeRef::class(comparable, vec![TypeRef::TypeVar(e)])],
            lower_bound: None,
        },
    );
    let sorted = env.add_class(ClassDef::class("com.example.Sorted").with_type_params(vec![e]));

    let mut ctx = TyContext::new(&env);
    let captured = ctx.capture_conversion(&TypeRef::class(sorted, vec![TypeRef::unbounded()]));
    let cap = capture_var(&captured, 0);

    assert_eq!(
        ctx.type_param(cap).map(|tp| tp.upper_bounds.clone()),
        Some(vec![TypeRef::class(comparable, vec![TypeRef::TypeVar(cap)])])
    );
}

#[test]
fn non_wildcard_arguments_are_kept() {
    let env = TypeStore::with_minimal_jdk();
    let wk = env.well_known();
    let list_string = TypeRef::class(wk.list, vec![TypeRef::class(wk.string, vec![])]);

    let mut ctx = TyContext::new(&env);
    assert_eq!(ctx.capture_conversion(&list_string), list_string);
    assert_eq!(ctx.local_count(), 0);

    ctx.capture_conversion(&TypeRef::class(wk.list, vec![TypeRef::unbounded()]));
    assert_eq!(ctx.local_count(), 1);
    ctx.reset();
    assert_eq!(ctx.local_count(), 0);
}

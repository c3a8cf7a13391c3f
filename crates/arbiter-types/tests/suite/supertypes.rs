use arbiter_types::{
    declared_methods, erasure, format_method_signature, format_type, instantiate_as_supertype,
    supertypes_of, ClassDef, MethodDef, TypeEnv, TypeRef, TypeStore,
};

use pretty_assertions::assert_eq;

#[test]
fn supertypes_substitute_class_arguments() {
    let env = TypeStore::with_minimal_jdk();
    let wk = env.well_known();
    let string = TypeRef::class(wk.string, vec![]);

    let supers = supertypes_of(&env, &TypeRef::class(wk.array_list, vec![string.clone()]));
    assert_eq!(
        supers,
        vec![
            TypeRef::class(wk.object, vec![]),
            TypeRef::class(wk.list, vec![string]),
            TypeRef::class(wk.cloneable, vec![]),
            TypeRef::class(wk.serializable, vec![]),
        ]
    );
}

#[test]
fn raw_types_have_raw_supertypes() {
    let env = TypeStore::with_minimal_jdk();
    let wk = env.well_known();

    let supers = supertypes_of(&env, &TypeRef::Raw(wk.list));
    assert_eq!(
        supers,
        vec![TypeRef::Raw(wk.collection), TypeRef::class(wk.object, vec![])]
    );
}

#[test]
fn declared_methods_are_viewed_through_the_parameterisation() {
    let mut env = TypeStore::with_minimal_jdk();
    let string = TypeRef::class(env.well_known().string, vec![]);
    let t = env.add_type_param("T", vec![]);
    let holder = env.add_class(
        ClassDef::class("com.example.Holder")
            .with_type_params(vec![t])
            .method(MethodDef::new("set", vec![TypeRef::TypeVar(t)], TypeRef::Void))
            .method(MethodDef::new("get", vec![], TypeRef::TypeVar(t))),
    );

    let methods = declared_methods(&env, &TypeRef::class(holder, vec![string.clone()]));
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0].formal_params, vec![string.clone()]);
    assert_eq!(methods[1].return_type, string);
    assert_eq!(methods[0].declaring_class(), holder);
    assert_eq!(format_method_signature(&env, &methods[0]), "set(String)");
    assert_eq!(
        methods[0].declared_params(&env),
        vec![TypeRef::TypeVar(t)]
    );
}

#[test]
fn varargs_signatures_render_with_ellipsis() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = TypeRef::class(env.well_known().object, vec![]);
    let util = env.add_class(
        ClassDef::class("com.example.Util").method(
            MethodDef::new("all", vec![TypeRef::int(), TypeRef::array(object.clone())], TypeRef::Void)
                .into_static()
                .into_varargs(),
        ),
    );

    let methods = declared_methods(&env, &TypeRef::class(util, vec![]));
    assert_eq!(format_method_signature(&env, &methods[0]), "all(int, Object...)");
    assert_eq!(methods[0].varargs_element(), Some(&object));
}

#[test]
fn intersections_view_each_component() {
    let env = TypeStore::with_minimal_jdk();
    let wk = env.well_known();
    let integer = TypeRef::class(wk.integer, vec![]);
    let comparable_integer = TypeRef::class(wk.comparable, vec![integer.clone()]);
    let inter = TypeRef::Intersection(vec![
        TypeRef::class(wk.number, vec![]),
        comparable_integer.clone(),
    ]);

    assert_eq!(
        instantiate_as_supertype(&env, &inter, wk.comparable),
        Some(comparable_integer)
    );
    assert_eq!(format_type(&env, &inter), "Number & Comparable<Integer>");
    assert_eq!(erasure(&env, &inter), TypeRef::class(wk.number, vec![]));
}

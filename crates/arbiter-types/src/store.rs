use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    compute_erased_ancestors, ClassDef, ClassId, MethodDef, PrimitiveType, TypeEnv, TypeParamDef,
    TypeRef, TypeVarId,
};

/// Ids of the platform classes the resolution rules refer to directly (boxing, arrays, `Object`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub char_sequence: ClassId,
    pub number: ClassId,
    pub boolean: ClassId,
    pub byte: ClassId,
    pub short: ClassId,
    pub character: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub float: ClassId,
    pub double: ClassId,
    pub comparable: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub runnable: ClassId,
    pub iterable: ClassId,
    pub collection: ClassId,
    pub list: ClassId,
    pub array_list: ClassId,
}

impl WellKnownTypes {
    fn placeholder() -> Self {
        let zero = ClassId::new(0);
        Self {
            object: zero,
            string: zero,
            char_sequence: zero,
            number: zero,
            boolean: zero,
            byte: zero,
            short: zero,
            character: zero,
            integer: zero,
            long: zero,
            float: zero,
            double: zero,
            comparable: zero,
            cloneable: zero,
            serializable: zero,
            runnable: zero,
            iterable: zero,
            collection: zero,
            list: zero,
            array_list: zero,
        }
    }

    /// Wrapper class for a primitive type (JLS 5.1.7).
    pub fn box_class(&self, prim: PrimitiveType) -> ClassId {
        match prim {
            PrimitiveType::Boolean => self.boolean,
            PrimitiveType::Byte => self.byte,
            PrimitiveType::Short => self.short,
            PrimitiveType::Char => self.character,
            PrimitiveType::Int => self.integer,
            PrimitiveType::Long => self.long,
            PrimitiveType::Float => self.float,
            PrimitiveType::Double => self.double,
        }
    }

    /// Primitive type unboxed from a wrapper class (JLS 5.1.8).
    pub fn unbox_class(&self, class: ClassId) -> Option<PrimitiveType> {
        PrimitiveType::ALL
            .into_iter()
            .find(|prim| self.box_class(*prim) == class)
    }
}

/// In-memory type hierarchy.
///
/// The store is built once (by a type-graph builder or by tests) and then shared read-only.
/// Erased ancestor sets are memoised on first use; every `&mut self` mutation drops the memo.
pub struct TypeStore {
    classes: Vec<ClassDef>,
    class_by_name: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
    ancestors: RwLock<HashMap<ClassId, Arc<[ClassId]>>>,
}

impl fmt::Debug for TypeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeStore")
            .field("classes", &self.classes.len())
            .field("type_params", &self.type_params.len())
            .finish_non_exhaustive()
    }
}

impl Clone for TypeStore {
    fn clone(&self) -> Self {
        Self {
            classes: self.classes.clone(),
            class_by_name: self.class_by_name.clone(),
            type_params: self.type_params.clone(),
            well_known: self.well_known.clone(),
            ancestors: RwLock::new(self.ancestors.read().clone()),
        }
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::with_minimal_jdk()
    }
}

impl TypeStore {
    fn empty() -> Self {
        Self {
            classes: Vec::new(),
            class_by_name: HashMap::new(),
            type_params: Vec::new(),
            well_known: WellKnownTypes::placeholder(),
            ancestors: RwLock::new(HashMap::new()),
        }
    }

    /// Reserve an id for `name` without defining it, so self-referential declarations
    /// (`class Enum<E extends Enum<E>>`) can refer to themselves.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.class_by_name.get(name) {
            return *id;
        }
        let raw: u32 = self
            .classes
            .len()
            .try_into()
            .expect("too many classes in type store");
        let id = ClassId::new(raw);
        self.classes.push(ClassDef::class(name));
        self.class_by_name.insert(name.to_string(), id);
        id
    }

    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        self.ancestors.get_mut().clear();
        self.class_by_name.insert(def.name.clone(), id);
        self.classes[id.index()] = def;
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.ancestors.get_mut().clear();
        self.classes.get_mut(id.index())
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len()).map(|idx| ClassId::new(idx as u32))
    }

    /// Allocate a type parameter. An empty bound list means `extends Object`.
    pub fn add_type_param(&mut self, name: impl Into<String>, upper_bounds: Vec<TypeRef>) -> TypeVarId {
        let raw: u32 = self
            .type_params
            .len()
            .try_into()
            .expect("too many type params in type store");
        let id = TypeVarId::new(raw);
        assert!(!id.is_context_local(), "type param id space exhausted");
        let upper_bounds = if upper_bounds.is_empty() {
            vec![TypeRef::class(self.well_known.object, vec![])]
        } else {
            upper_bounds
        };
        self.type_params.push(TypeParamDef {
            name: name.into(),
            upper_bounds,
            lower_bound: None,
        });
        id
    }

    pub fn define_type_param(&mut self, id: TypeVarId, def: TypeParamDef) {
        self.type_params[id.to_raw() as usize] = def;
    }

    /// A store pre-populated with the handful of `java.lang`/`java.util` types the resolution
    /// rules depend on.
    pub fn with_minimal_jdk() -> Self {
        let mut store = Self::empty();

        let object = store.intern_class_id("java.lang.Object");
        let string = store.intern_class_id("java.lang.String");
        store.well_known.object = object;

        let object_ty = TypeRef::class(object, vec![]);
        let string_ty = TypeRef::class(string, vec![]);

        store.define_class(
            object,
            ClassDef::class("java.lang.Object")
                .method(MethodDef::new(
                    "equals",
                    vec![object_ty.clone()],
                    TypeRef::boolean(),
                ))
                .method(MethodDef::new("hashCode", vec![], TypeRef::int()))
                .method(MethodDef::new("toString", vec![], string_ty.clone())),
        );

        let serializable = store.add_class(ClassDef::interface("java.io.Serializable"));
        let cloneable = store.add_class(ClassDef::interface("java.lang.Cloneable"));
        let char_sequence = store.add_class(
            ClassDef::interface("java.lang.CharSequence")
                .method(MethodDef::new("length", vec![], TypeRef::int()).into_abstract()),
        );
        let runnable = store.add_class(
            ClassDef::interface("java.lang.Runnable")
                .method(MethodDef::new("run", vec![], TypeRef::Void).into_abstract()),
        );

        let comparable_t = store.add_type_param("T", vec![]);
        let comparable = store.add_class(
            ClassDef::interface("java.lang.Comparable")
                .with_type_params(vec![comparable_t])
                .method(
                    MethodDef::new(
                        "compareTo",
                        vec![TypeRef::TypeVar(comparable_t)],
                        TypeRef::int(),
                    )
                    .into_abstract(),
                ),
        );

        store.define_class(
            string,
            ClassDef::class("java.lang.String")
                .implements(TypeRef::class(serializable, vec![]))
                .implements(TypeRef::class(comparable, vec![string_ty.clone()]))
                .implements(TypeRef::class(char_sequence, vec![]))
                .method(MethodDef::new("length", vec![], TypeRef::int()))
                .method(MethodDef::new(
                    "compareTo",
                    vec![string_ty.clone()],
                    TypeRef::int(),
                )),
        );

        let number = store.add_class(
            ClassDef::class("java.lang.Number")
                .into_abstract()
                .implements(TypeRef::class(serializable, vec![]))
                .method(MethodDef::new("intValue", vec![], TypeRef::int()).into_abstract()),
        );

        let wrapper = |store: &mut TypeStore, name: &str, prim: PrimitiveType| {
            let id = store.intern_class_id(name);
            let self_ty = TypeRef::class(id, vec![]);
            let mut def = ClassDef::class(name)
                .implements(TypeRef::class(serializable, vec![]))
                .implements(TypeRef::class(comparable, vec![self_ty.clone()]))
                .method(MethodDef::new("compareTo", vec![self_ty], TypeRef::int()));
            if prim.is_numeric() && prim != PrimitiveType::Char {
                def = def
                    .extends(TypeRef::class(number, vec![]))
                    .method(MethodDef::new("intValue", vec![], TypeRef::int()));
            }
            store.define_class(id, def);
            id
        };

        let boolean = wrapper(&mut store, "java.lang.Boolean", PrimitiveType::Boolean);
        let byte = wrapper(&mut store, "java.lang.Byte", PrimitiveType::Byte);
        let short = wrapper(&mut store, "java.lang.Short", PrimitiveType::Short);
        let character = wrapper(&mut store, "java.lang.Character", PrimitiveType::Char);
        let integer = wrapper(&mut store, "java.lang.Integer", PrimitiveType::Int);
        let long = wrapper(&mut store, "java.lang.Long", PrimitiveType::Long);
        let float = wrapper(&mut store, "java.lang.Float", PrimitiveType::Float);
        let double = wrapper(&mut store, "java.lang.Double", PrimitiveType::Double);

        let iterable_t = store.add_type_param("T", vec![]);
        let iterable = store.add_class(
            ClassDef::interface("java.lang.Iterable").with_type_params(vec![iterable_t]),
        );

        let collection_e = store.add_type_param("E", vec![]);
        let collection = store.add_class(
            ClassDef::interface("java.util.Collection")
                .with_type_params(vec![collection_e])
                .implements(TypeRef::class(
                    iterable,
                    vec![TypeRef::TypeVar(collection_e)],
                ))
                .method(
                    MethodDef::new(
                        "add",
                        vec![TypeRef::TypeVar(collection_e)],
                        TypeRef::boolean(),
                    )
                    .into_abstract(),
                )
                .method(MethodDef::new("size", vec![], TypeRef::int()).into_abstract()),
        );

        let list_e = store.add_type_param("E", vec![]);
        let list = store.add_class(
            ClassDef::interface("java.util.List")
                .with_type_params(vec![list_e])
                .implements(TypeRef::class(collection, vec![TypeRef::TypeVar(list_e)]))
                .method(
                    MethodDef::new("get", vec![TypeRef::int()], TypeRef::TypeVar(list_e))
                        .into_abstract(),
                ),
        );

        let array_list_e = store.add_type_param("E", vec![]);
        let array_list_e_ty = TypeRef::TypeVar(array_list_e);
        let array_list = store.add_class(
            ClassDef::class("java.util.ArrayList")
                .with_type_params(vec![array_list_e])
                .implements(TypeRef::class(list, vec![array_list_e_ty.clone()]))
                .implements(TypeRef::class(cloneable, vec![]))
                .implements(TypeRef::class(serializable, vec![]))
                .method(MethodDef::new(
                    "add",
                    vec![array_list_e_ty.clone()],
                    TypeRef::boolean(),
                ))
                .method(MethodDef::new("size", vec![], TypeRef::int()))
                .method(MethodDef::new(
                    "get",
                    vec![TypeRef::int()],
                    array_list_e_ty,
                )),
        );

        store.well_known = WellKnownTypes {
            object,
            string,
            char_sequence,
            number,
            boolean,
            byte,
            short,
            character,
            integer,
            long,
            float,
            double,
            comparable,
            cloneable,
            serializable,
            runnable,
            iterable,
            collection,
            list,
            array_list,
        };
        store.ancestors.get_mut().clear();
        store
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index())
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        if id.is_context_local() {
            return None;
        }
        self.type_params.get(id.to_raw() as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_id(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }

    fn erased_ancestors(&self, id: ClassId) -> Arc<[ClassId]> {
        if let Some(hit) = self.ancestors.read().get(&id) {
            return hit.clone();
        }
        let computed = compute_erased_ancestors(self, id);
        self.ancestors.write().insert(id, computed.clone());
        computed
    }
}

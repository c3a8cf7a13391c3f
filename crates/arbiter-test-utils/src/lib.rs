//! Utilities shared by Arbiter tests.
//!
//! [`Fixture`] builds small class hierarchies on top of the minimal JDK so integration suites can
//! describe the Java declarations they exercise in a few lines, and the `assert_*` helpers render
//! unexpected resolution results in Java-like text.

use arbiter_config::LoggingConfig;
use arbiter_resolve::{ConsistencyFinding, ResolutionResult};
use arbiter_types::{
    ClassDef, ClassId, MethodDef, MethodRef, TypeEnv, TypeRef, TypeStore, TypeVarId, WellKnownTypes,
};

/// A type store under construction.
pub struct Fixture {
    store: TypeStore,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: TypeStore::with_minimal_jdk(),
        }
    }

    pub fn store(&self) -> &TypeStore {
        &self.store
    }

    pub fn into_store(self) -> TypeStore {
        self.store
    }

    pub fn well_known(&self) -> WellKnownTypes {
        self.store.well_known().clone()
    }

    pub fn object(&self) -> TypeRef {
        TypeRef::class(self.store.well_known().object, vec![])
    }

    pub fn string(&self) -> TypeRef {
        TypeRef::class(self.store.well_known().string, vec![])
    }

    pub fn number(&self) -> TypeRef {
        TypeRef::class(self.store.well_known().number, vec![])
    }

    pub fn integer(&self) -> TypeRef {
        TypeRef::class(self.store.well_known().integer, vec![])
    }

    pub fn long(&self) -> TypeRef {
        TypeRef::class(self.store.well_known().long, vec![])
    }

    pub fn list_of(&self, elem: TypeRef) -> TypeRef {
        TypeRef::class(self.store.well_known().list, vec![elem])
    }

    /// A type parameter; no bounds means `Object`.
    pub fn type_param(&mut self, name: &str, bounds: Vec<TypeRef>) -> TypeVarId {
        self.store.add_type_param(name, bounds)
    }

    pub fn add(&mut self, def: ClassDef) -> ClassId {
        self.store.add_class(def)
    }

    /// Reserve an id for a class that is defined later with [`Fixture::define`], for
    /// self-referential or mutually recursive declarations.
    pub fn declare(&mut self, name: &str) -> ClassId {
        self.store.intern_class_id(name)
    }

    pub fn define(&mut self, id: ClassId, def: ClassDef) {
        self.store.define_class(id, def);
    }

    /// Plain reference to a non-generic class.
    pub fn ty(&self, id: ClassId) -> TypeRef {
        TypeRef::class(id, vec![])
    }

    pub fn generic(&self, id: ClassId, args: Vec<TypeRef>) -> TypeRef {
        TypeRef::class(id, args)
    }

    /// The `nth` method named `name` declared directly on `class`.
    #[track_caller]
    pub fn method(&self, class: ClassId, name: &str, nth: usize) -> MethodRef {
        let def = self
            .store
            .class(class)
            .unwrap_or_else(|| panic!("unknown class {class:?}"));
        let index = def
            .methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.name == name)
            .map(|(idx, _)| idx)
            .nth(nth)
            .unwrap_or_else(|| panic!("{} declares no method #{nth} named {name}", def.name));
        MethodRef {
            class,
            index: index as u32,
        }
    }
}

/// `void name(params)`.
pub fn void_method(name: &str, params: Vec<TypeRef>) -> MethodDef {
    MethodDef::new(name, params, TypeRef::Void)
}

/// `<tps> void name(params)`.
pub fn generic_void_method(name: &str, type_params: Vec<TypeVarId>, params: Vec<TypeRef>) -> MethodDef {
    MethodDef::new(name, params, TypeRef::Void).with_type_params(type_params)
}

/// Install a quiet tracing subscriber (raise it with `RUST_LOG=arbiter.resolve=trace`).
pub fn init_test_tracing() {
    arbiter_config::init_tracing(&LoggingConfig {
        level: "warn".to_string(),
        ..LoggingConfig::default()
    });
}

#[track_caller]
pub fn assert_selected(env: &dyn TypeEnv, result: &ResolutionResult, expected: MethodRef) {
    match result {
        ResolutionResult::Selected(candidate) if candidate.signature.origin == expected => {}
        other => panic!(
            "expected {expected:?} to be selected, got `{}`: {other:#?}",
            other.display(env)
        ),
    }
}

/// Origins of an ambiguous result, in report order.
#[track_caller]
pub fn ambiguous_origins(env: &dyn TypeEnv, result: &ResolutionResult) -> Vec<MethodRef> {
    match result {
        ResolutionResult::Ambiguous(candidates) => {
            candidates.iter().map(|c| c.signature.origin).collect()
        }
        other => panic!("expected an ambiguous result, got `{}`", other.display(env)),
    }
}

pub fn render_findings(env: &dyn TypeEnv, findings: &[ConsistencyFinding]) -> Vec<String> {
    findings
        .iter()
        .map(|finding| finding.display(env).to_string())
        .collect()
}

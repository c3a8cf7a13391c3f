#![no_main]

use libfuzzer_sys::fuzz_target;

use arbiter_config::ResolverConfig;
use arbiter_resolve::{CallSite, Resolver};
use arbiter_types::{ClassDef, ClassId, MethodDef, TypeEnv, TypeRef, TypeStore, TypeVarId};

const MAX_CLASSES: usize = 6;
const MAX_METHODS: usize = 4;
const MAX_CALLS: usize = 8;

/// Reads the input one byte at a time; exhausted input yields zeros.
struct Bytes<'a> {
    data: &'a [u8],
}

impl Bytes<'_> {
    fn next(&mut self) -> u8 {
        match self.data.split_first() {
            Some((first, rest)) => {
                self.data = rest;
                *first
            }
            None => 0,
        }
    }

    fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            0
        } else {
            self.next() as usize % n
        }
    }
}

/// Types a generated declaration or call may mention.
struct Palette {
    types: Vec<TypeRef>,
}

impl Palette {
    fn pick(&self, bytes: &mut Bytes<'_>, vars: &[TypeVarId]) -> TypeRef {
        let choice = bytes.below(self.types.len() + vars.len() + 2);
        if choice < self.types.len() {
            return self.types[choice].clone();
        }
        let choice = choice - self.types.len();
        if choice < vars.len() {
            return TypeRef::TypeVar(vars[choice]);
        }
        if choice == vars.len() {
            TypeRef::int()
        } else {
            TypeRef::array(self.types[bytes.below(self.types.len())].clone())
        }
    }
}

fn build(bytes: &mut Bytes<'_>) -> (TypeStore, Vec<ClassId>, Palette) {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut palette = Palette {
        types: [wk.object, wk.string, wk.number, wk.integer, wk.long]
            .into_iter()
            .map(|id| TypeRef::class(id, vec![]))
            .collect(),
    };

    let mut classes: Vec<ClassId> = Vec::new();
    for idx in 0..1 + bytes.below(MAX_CLASSES) {
        let mut def = if bytes.next() % 4 == 0 {
            ClassDef::interface(format!("fuzz.I{idx}"))
        } else {
            ClassDef::class(format!("fuzz.C{idx}"))
        };
        if !classes.is_empty() && bytes.next() % 2 == 0 {
            let parent = classes[bytes.below(classes.len())];
            let parent_is_interface = store.class(parent).is_some_and(|p| p.is_interface());
            def = if parent_is_interface {
                def.implements(TypeRef::class(parent, vec![]))
            } else if !def.is_interface() {
                def.extends(TypeRef::class(parent, vec![]))
            } else {
                def
            };
        }
        for _ in 0..bytes.below(MAX_METHODS + 1) {
            let vars: Vec<TypeVarId> = match bytes.next() % 3 {
                0 => {
                    let bound = palette.pick(bytes, &[]);
                    let bounds = if bound.class_id().is_some() { vec![bound] } else { vec![] };
                    vec![store.add_type_param("T", bounds)]
                }
                _ => Vec::new(),
            };
            let params: Vec<TypeRef> = (0..bytes.below(3))
                .map(|_| palette.pick(bytes, &vars))
                .collect();
            let return_type = match bytes.next() % 3 {
                0 => TypeRef::Void,
                _ => palette.pick(bytes, &vars),
            };
            let mut method = MethodDef::new("m", params, return_type).with_type_params(vars);
            if matches!(method.params.last(), Some(TypeRef::Array(_))) && bytes.next() % 2 == 0 {
                method = method.into_varargs();
            }
            if def.is_interface() {
                method = method.into_abstract();
            }
            def = def.method(method);
        }
        let id = store.add_class(def);
        palette.types.push(TypeRef::class(id, vec![]));
        classes.push(id);
    }
    (store, classes, palette)
}

fn run_one(data: &[u8]) {
    let mut bytes = Bytes { data };
    let (store, classes, palette) = build(&mut bytes);

    let calls: Vec<CallSite> = (0..1 + bytes.below(MAX_CALLS))
        .map(|_| {
            let receiver = TypeRef::class(classes[bytes.below(classes.len())], vec![]);
            let args = (0..bytes.below(4)).map(|_| palette.pick(&mut bytes, &[])).collect();
            CallSite::new(receiver, "m", args)
        })
        .collect();

    let mut config = ResolverConfig::default();
    config.cache.enabled = false;
    let uncached = Resolver::with_config(&store, config);
    let cached = Resolver::new(&store);

    let sequential: Vec<_> = calls.iter().map(|call| uncached.resolve(call)).collect();
    assert_eq!(uncached.resolve_all(&calls), sequential, "batch resolution diverged");
    for (call, expected) in calls.iter().zip(&sequential) {
        assert_eq!(&cached.resolve(call), expected, "cached resolution diverged");
        assert_eq!(&cached.resolve(call), expected, "cache hit diverged");
    }

    let findings = uncached.check_all(&classes);
    assert_eq!(uncached.check_all(&classes), findings, "consistency checks are not stable");
}

fuzz_target!(|data: &[u8]| {
    run_one(data);
});

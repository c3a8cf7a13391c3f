use std::fmt;

use crate::{ClassType, MethodSignature, TypeEnv, TypeRef, WildcardBound};

/// Render a type the way javac prints it in diagnostics, using simple class names.
pub fn format_type(env: &dyn TypeEnv, ty: &TypeRef) -> String {
    ty.display(env).to_string()
}

/// `name(P1, P2...)`, with a trailing `...` for variable-arity methods.
pub fn format_method_signature(env: &dyn TypeEnv, sig: &MethodSignature) -> String {
    sig.display(env).to_string()
}

pub struct TypeDisplay<'a> {
    env: &'a dyn TypeEnv,
    ty: &'a TypeRef,
}

pub struct SignatureDisplay<'a> {
    env: &'a dyn TypeEnv,
    sig: &'a MethodSignature,
}

impl TypeRef {
    pub fn display<'a>(&'a self, env: &'a dyn TypeEnv) -> TypeDisplay<'a> {
        TypeDisplay { env, ty: self }
    }
}

impl MethodSignature {
    pub fn display<'a>(&'a self, env: &'a dyn TypeEnv) -> SignatureDisplay<'a> {
        SignatureDisplay { env, sig: self }
    }
}

fn write_class_name(env: &dyn TypeEnv, f: &mut fmt::Formatter<'_>, def: crate::ClassId) -> fmt::Result {
    match env.class(def) {
        Some(class_def) => f.write_str(class_def.simple_name()),
        None => write!(f, "<class#{}>", def.to_raw()),
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env = self.env;
        match self.ty {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Null => f.write_str("null"),
            TypeRef::Primitive(prim) => f.write_str(prim.keyword()),
            TypeRef::Raw(def) => write_class_name(env, f, *def),
            TypeRef::Class(ClassType { def, args }) => {
                write_class_name(env, f, *def)?;
                if args.is_empty() {
                    return Ok(());
                }
                f.write_str("<")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg.display(env))?;
                }
                f.write_str(">")
            }
            TypeRef::TypeVar(id) => match env.type_param(*id) {
                Some(tp) => f.write_str(&tp.name),
                None => write!(f, "<tv#{}>", id.to_raw()),
            },
            TypeRef::Wildcard(WildcardBound::Unbounded) => f.write_str("?"),
            TypeRef::Wildcard(WildcardBound::Extends(bound)) => {
                write!(f, "? extends {}", bound.display(env))
            }
            TypeRef::Wildcard(WildcardBound::Super(bound)) => {
                write!(f, "? super {}", bound.display(env))
            }
            TypeRef::Array(elem) => write!(f, "{}[]", elem.display(env)),
            TypeRef::Intersection(parts) => {
                for (idx, part) in parts.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{}", part.display(env))?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for SignatureDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env = self.env;
        let sig = self.sig;
        write!(f, "{}(", sig.name)?;
        let last = sig.formal_params.len().saturating_sub(1);
        for (idx, param) in sig.formal_params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            match param {
                TypeRef::Array(elem) if sig.is_varargs && idx == last => {
                    write!(f, "{}...", elem.display(env))?
                }
                other => write!(f, "{}", other.display(env))?,
            }
        }
        f.write_str(")")
    }
}

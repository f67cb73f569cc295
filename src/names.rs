//! Origin type reference → target type expression.
//!
//! Everything in here is a pure function of its input: descriptors are cached
//! by identity and the same mapped name is reused at every emission site.
use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::metadata::{Primitive, TypeRef};

/// Runtime types with a fixed target alias.
static WELL_KNOWN: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("System.Object", "any"),
        ("Puerts.ArrayBuffer", "ArrayBuffer"),
        ("System.Delegate", "Function"),
        ("Puerts.GenericDelegate", "Function"),
        ("System.Threading.Tasks.Task", "$Task<any>"),
    ])
});

const NULLABLE: &str = "System.Nullable`1";

pub fn primitive_name(kind: Primitive) -> &'static str {
    match kind {
        Primitive::Char
        | Primitive::SByte
        | Primitive::Byte
        | Primitive::Int16
        | Primitive::UInt16
        | Primitive::Int32
        | Primitive::UInt32
        | Primitive::Single
        | Primitive::Double => "number",
        Primitive::Boolean => "boolean",
        Primitive::Int64 | Primitive::UInt64 => "bigint",
        Primitive::String => "string",
        Primitive::Void => "void",
    }
}

/// Fixed alias for a well-known runtime type, if any.
pub fn well_known_alias(full_name: &str) -> Option<&'static str> {
    WELL_KNOWN.get(full_name).copied()
}

/// `Outer`1/Inner` → `Outer$1.Inner`
pub fn normalize_full_name(full_name: &str) -> String {
    full_name.replace(['/', '+'], ".").replace('`', "$")
}

/// Nested separators collapsed to `.`, arity kept as is. Used for filter matching.
pub fn hierarchical_name(full_name: &str) -> String {
    full_name.replace(['/', '+'], ".")
}

/// `List`1` → `List$1`
pub fn simple_name(name: &str) -> String {
    name.replace('`', "$")
}

/// Map a type reference to its target type expression.
///
/// `is_variadic` is set for the trailing `params` parameter, where arrays are
/// written as rest-parameter arrays instead of the wrapper form.
pub fn map_name(ty: &TypeRef, is_variadic: bool) -> String {
    match ty {
        TypeRef::Primitive(kind) => primitive_name(*kind).to_string(),
        TypeRef::ByReference(element) => format!("$Ref<{}>", map_name(element, false)),
        TypeRef::RequiredModifier(element) => map_name(element, is_variadic),
        TypeRef::Array(element) if is_variadic => format!("{}[]", map_name(element, false)),
        TypeRef::Array(element) => format!("System.Array$1<{}>", map_name(element, false)),
        TypeRef::Named { full_name, generic_args, .. } if generic_args.is_empty() => {
            if full_name.is_empty() {
                return "any".to_string();
            }
            match well_known_alias(full_name) {
                Some(alias) => alias.to_string(),
                None => normalize_full_name(full_name),
            }
        }
        TypeRef::Named { full_name, generic_args, .. } => {
            if full_name == NULLABLE && generic_args.len() == 1 {
                return format!("{} | null", map_name(&generic_args[0], false));
            }
            let args = generic_args.iter().map(|a| map_name(a, false)).collect::<Vec<_>>();
            format!("{}<{}>", normalize_full_name(full_name), args.join(", "))
        }
        TypeRef::GenericParameter { name, .. } if !name.is_empty() => name.clone(),
        TypeRef::GenericParameter { position, .. } => format!("T{position}"),
        TypeRef::Pointer(_) => "any".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_map_to_fixed_aliases_regardless_of_module() {
        let cases = [
            (Primitive::Int32, "number"),
            (Primitive::UInt16, "number"),
            (Primitive::Char, "number"),
            (Primitive::Double, "number"),
            (Primitive::Boolean, "boolean"),
            (Primitive::Int64, "bigint"),
            (Primitive::UInt64, "bigint"),
            (Primitive::String, "string"),
            (Primitive::Void, "void"),
        ];
        for (kind, expected) in cases {
            assert_eq!(map_name(&TypeRef::Primitive(kind), false), expected);
            assert_eq!(map_name(&TypeRef::Primitive(kind), true), expected);
        }
        assert_eq!(map_name(&TypeRef::named("System.Object", "mscorlib"), false), "any");
        assert_eq!(map_name(&TypeRef::named("System.Object", "System.Runtime"), false), "any");
    }

    #[test]
    fn wrappers() {
        let int = TypeRef::Primitive(Primitive::Int32);
        let arr = TypeRef::Array(Box::new(int.clone()));
        assert_eq!(map_name(&arr, false), "System.Array$1<number>");
        assert_eq!(map_name(&arr, true), "number[]");
        assert_eq!(map_name(&TypeRef::ByReference(Box::new(int.clone())), false), "$Ref<number>");
        assert_eq!(map_name(&TypeRef::RequiredModifier(Box::new(int.clone())), false), "number");
        let nullable = TypeRef::instance(NULLABLE, "mscorlib", vec![int]);
        assert_eq!(map_name(&nullable, false), "number | null");
    }

    #[test]
    fn generic_instances_carry_arity_suffix() {
        let dict = TypeRef::instance(
            "System.Collections.Generic.Dictionary`2",
            "mscorlib",
            vec![TypeRef::Primitive(Primitive::String), TypeRef::named("Zoo.Animal", "Zoo")],
        );
        assert_eq!(map_name(&dict, false), "System.Collections.Generic.Dictionary$2<string, Zoo.Animal>");
        let nested = TypeRef::instance("Zoo.Cage`1/Door", "Zoo", vec![TypeRef::type_param(0, "T")]);
        assert_eq!(map_name(&nested, false), "Zoo.Cage$1.Door<T>");
    }

    #[test]
    fn well_known_and_fallbacks() {
        assert_eq!(map_name(&TypeRef::named("System.Delegate", "mscorlib"), false), "Function");
        assert_eq!(map_name(&TypeRef::named("System.Threading.Tasks.Task", "mscorlib"), false), "$Task<any>");
        assert_eq!(map_name(&TypeRef::named("Puerts.ArrayBuffer", "Puerts"), false), "ArrayBuffer");
        assert_eq!(map_name(&TypeRef::named("", "?"), false), "any");
        assert_eq!(map_name(&TypeRef::named("Zoo.Outer/Inner", "Zoo"), false), "Zoo.Outer.Inner");
    }

    #[test]
    fn mapping_is_referentially_transparent() {
        let t = TypeRef::instance("A.B`1", "M", vec![TypeRef::Array(Box::new(TypeRef::named("A.C", "M")))]);
        assert_eq!(map_name(&t, false), map_name(&t.clone(), false));
    }
}

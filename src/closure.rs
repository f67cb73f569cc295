//! Reference closure: every named type transitively reachable from what the
//! translated signatures mention.
//!
//! The set only grows. Visitation is recorded before recursing, so cyclic
//! base/interface/generic-argument graphs terminate.
use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::metadata::{MetadataProvider, TypeKey, TypeRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureEntry {
    /// Definition form (no generic arguments) of the discovered type.
    pub reference: TypeRef,
    /// `false` when the reference could not be resolved; such entries are
    /// emitted as opaque declarations.
    pub resolved: bool,
}

#[derive(Debug, Default)]
pub struct ReferenceSet {
    visited: HashSet<TypeRef>,
    entries: IndexMap<TypeKey, ClosureEntry>,
}

/// Compiler-generated names start with `<` (`<>c__DisplayClass`, `<Foo>d__1`, ...).
pub fn is_synthetic_name(full_name: &str) -> bool {
    full_name.rsplit(['.', '/', '+']).next().is_some_and(|simple| simple.starts_with('<'))
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &IndexMap<TypeKey, ClosureEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get_index(&self, index: usize) -> Option<(&TypeKey, &ClosureEntry)> {
        self.entries.get_index(index)
    }

    /// Idempotent. Adds every named type reachable from `ty`.
    pub fn visit<P: MetadataProvider + ?Sized>(&mut self, provider: &P, ty: &TypeRef) {
        match ty {
            TypeRef::Primitive(_) | TypeRef::Pointer(_) | TypeRef::GenericParameter { .. } => {}
            TypeRef::Array(element) | TypeRef::ByReference(element) | TypeRef::RequiredModifier(element) => {
                self.visit(provider, element)
            }
            TypeRef::Named { full_name, generic_args, .. } => {
                if is_synthetic_name(full_name) || !self.visited.insert(ty.clone()) {
                    return;
                }
                if !generic_args.is_empty() {
                    for arg in generic_args {
                        self.visit(provider, arg);
                    }
                    self.visit(provider, &ty.element_definition());
                    return;
                }
                self.visit_definition(provider, ty);
            }
        }
    }

    fn visit_definition<P: MetadataProvider + ?Sized>(&mut self, provider: &P, ty: &TypeRef) {
        let Some(key) = ty.key() else { return };
        match provider.resolve(ty) {
            Ok(def) => {
                trace!(r#type = %key, "closure: discovered");
                self.entries.entry(key).or_insert(ClosureEntry { reference: ty.clone(), resolved: true });
                if let Some(base) = &def.base_type {
                    self.visit(provider, base);
                }
                for itf in &def.interfaces {
                    self.visit(provider, itf);
                }
                if provider.is_delegate(def) {
                    if let Some(invoke) = def.invoke_method() {
                        for t in invoke.signature_types() {
                            self.visit(provider, t);
                        }
                    }
                }
            }
            Err(error) => {
                warn!(r#type = %key, %error, "closure: unresolved reference kept as opaque entry");
                self.entries.entry(key).or_insert(ClosureEntry { reference: ty.clone(), resolved: false });
            }
        }
    }
}

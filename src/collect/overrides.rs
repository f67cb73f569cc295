//! Override/shadow resolution.
//!
//! The target language checks a subtype's members against *every* inherited
//! member of the same name, so a subtype that declares `Foo(string)` hides
//! the inherited `Foo(int)` unless the latter is declared again on it. This
//! module finds the inherited methods that must be re-declared ("forced").
use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::trace;

use super::generics::{Frame, Level, class_chain, interface_closure};
use super::members::admit_method;
use crate::metadata::{MetadataProvider, MethodDef, TypeDef, TypeKey};

/// Stable identity of a method definition: owner plus declaration index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodId {
    pub owner: TypeKey,
    pub index: usize,
}

/// A method together with where it was found and how its owner's generic
/// parameters read in the frame of the type being resolved.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub owner: &'a TypeDef,
    pub index: usize,
    pub method: &'a MethodDef,
    pub frame: Frame,
    /// Emitted name (explicit implementations use their trailing segment).
    pub name: String,
}

impl Candidate<'_> {
    pub fn id(&self) -> MethodId {
        MethodId { owner: self.owner.key(), index: self.index }
    }
}

const MAX_CHAIN: usize = 64;

struct Resolver<'a> {
    /// The type itself followed by its resolved base chain.
    chain: Vec<Level<'a>>,
}

/// Methods inherited by `def` that must be re-declared on it, in discovery order.
pub fn forced_methods<'a, P: MetadataProvider + ?Sized>(provider: &'a P, def: &'a TypeDef) -> Vec<Candidate<'a>> {
    let mut chain = vec![Level { def, frame: Frame::Own }];
    chain.extend(class_chain(provider, def));
    let resolver = Resolver { chain };

    let mut by_name: IndexMap<String, Vec<Candidate<'a>>> = IndexMap::new();
    for candidate in admitted(&resolver.chain[0]) {
        by_name.entry(candidate.name.clone()).or_default().push(candidate);
    }

    let mut forced: Vec<Candidate<'a>> = Vec::new();
    let mut seen: HashSet<MethodId> = HashSet::new();
    let mut force = |candidate: Candidate<'a>, by_name: &mut IndexMap<String, Vec<Candidate<'a>>>| {
        if seen.insert(candidate.id()) {
            trace!(r#type = %def.key(), method = %candidate.name, from = %candidate.owner.key(), "forced");
            by_name.entry(candidate.name.clone()).or_default().push(candidate.clone());
            forced.push(candidate);
        }
    };

    if def.is_abstract && !def.is_interface {
        for level in interface_closure(provider, def, &Frame::Own) {
            for candidate in admitted(&level) {
                if !candidate.method.is_static && !resolver.is_implemented(&candidate) {
                    force(candidate, &mut by_name);
                }
            }
        }
    }

    let levels = if def.is_interface {
        interface_closure(provider, def, &Frame::Own)
    } else {
        resolver.chain[1..].to_vec()
    };
    for level in &levels {
        for target in admitted(level) {
            let Some(candidates) = by_name.get(&target.name) else { continue };
            if candidates.iter().any(|c| resolver.overrides(c, &target)) {
                continue;
            }
            force(target, &mut by_name);
        }
    }
    forced
}

/// Admitted non-constructor methods of one level.
fn admitted<'a>(level: &Level<'a>) -> Vec<Candidate<'a>> {
    level
        .def
        .methods
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.is_constructor())
        .filter_map(|(index, method)| {
            let name = admit_method(level.def, method).ok()?;
            Some(Candidate { owner: level.def, index, method, frame: level.frame.clone(), name })
        })
        .collect()
}

impl<'a> Resolver<'a> {
    /// Do `a` (in frame `fa`) and `b` (in frame `fb`) take the same parameters?
    fn same_parameters(a: &MethodDef, fa: &Frame, b: &MethodDef, fb: &Frame) -> bool {
        a.parameters.len() == b.parameters.len()
            && a.parameters.iter().zip(&b.parameters).all(|(x, y)| match (fa.apply(&x.ty), fb.apply(&y.ty)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            })
    }

    fn explicitly_implements(m: &MethodDef, target: &Candidate<'_>) -> bool {
        let owner = target.owner.key();
        m.overrides.iter().any(|r| {
            r.declaring_type.key().as_ref() == Some(&owner)
                && r.name == target.method.name
                && r.parameter_count == target.method.parameters.len()
        })
    }

    /// Is the interface method `target` implemented somewhere on the class chain?
    fn is_implemented(&self, target: &Candidate<'_>) -> bool {
        self.chain.iter().any(|level| {
            level.def.methods.iter().any(|m| {
                Self::explicitly_implements(m, target)
                    || (m.is_public()
                        && !m.is_static
                        && m.name == target.method.name
                        && Self::same_parameters(m, &level.frame, target.method, &target.frame))
            })
        })
    }

    /// Is `candidate` a true override (or implementation) of `target`?
    ///
    /// Walks the candidate's override chain upward comparing identity.
    fn overrides(&self, candidate: &Candidate<'a>, target: &Candidate<'a>) -> bool {
        if candidate.id() == target.id() || Self::explicitly_implements(candidate.method, target) {
            return true;
        }
        if target.owner.is_interface {
            return candidate.method.is_public()
                && !candidate.method.is_static
                && !candidate.owner.is_interface
                && candidate.method.name == target.method.name
                && Self::same_parameters(candidate.method, &candidate.frame, target.method, &target.frame);
        }
        let mut current = candidate.clone();
        for _ in 0..MAX_CHAIN {
            if current.id() == target.id() {
                return true;
            }
            let m = current.method;
            if m.is_static || !m.is_virtual || m.is_new_slot {
                return false;
            }
            match self.base_method(&current) {
                Some(base) => current = base,
                None => return false,
            }
        }
        false
    }

    /// The method `current` overrides: the nearest virtual method further up
    /// the chain with the same name and parameters.
    fn base_method(&self, current: &Candidate<'a>) -> Option<Candidate<'a>> {
        let start = self.chain.iter().position(|l| l.def.key() == current.owner.key())?;
        self.chain[start + 1..].iter().find_map(|level| {
            level.def.methods.iter().enumerate().find_map(|(index, m)| {
                let matches = m.is_virtual
                    && !m.is_static
                    && m.name == current.method.name
                    && Self::same_parameters(m, &level.frame, current.method, &current.frame);
                matches.then(|| Candidate {
                    owner: level.def,
                    index,
                    method: m,
                    frame: level.frame.clone(),
                    name: current.name.clone(),
                })
            })
        })
    }
}

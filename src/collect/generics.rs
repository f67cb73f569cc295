//! Generic substitution: mapping an ancestor's type parameters into the frame
//! of the type being translated, and re-emitting static members of a closed
//! generic base on the derived type.
use super::members::{screen_field, screen_property};
use crate::metadata::{GenericOwner, MetadataProvider, MethodDef, PropertyDef, FieldDef, TypeDef, TypeRef};

/// How the type parameters of some ancestor read in the frame of the type
/// under translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The type under translation itself.
    Own,
    /// Positional arguments for the ancestor's type parameters.
    Mapped(Vec<TypeRef>),
    /// The instantiation could not be followed; anything mentioning a type
    /// parameter of this level is unrepresentable.
    Unknown,
}

impl Frame {
    pub fn apply(&self, ty: &TypeRef) -> Option<TypeRef> {
        match self {
            Frame::Own => Some(ty.clone()),
            Frame::Mapped(args) => substitute(ty, &|owner, position, original| match owner {
                GenericOwner::Type => args.get(position).cloned(),
                GenericOwner::Method => Some(original.clone()),
            }),
            Frame::Unknown if ty.mentions_generic_parameter(GenericOwner::Type) => None,
            Frame::Unknown => Some(ty.clone()),
        }
    }

    /// Frame of an ancestor reached through `reference` (whose generic
    /// arguments are written in this frame).
    pub fn through(&self, reference: &TypeRef) -> Frame {
        let TypeRef::Named { generic_args, .. } = reference else { return Frame::Unknown };
        let mapped: Option<Vec<TypeRef>> = generic_args.iter().map(|a| self.apply(a)).collect();
        mapped.map_or(Frame::Unknown, Frame::Mapped)
    }
}

/// Replace every generic parameter through `lookup`. `None` from the lookup
/// makes the whole substitution fail.
pub fn substitute(
    ty: &TypeRef,
    lookup: &dyn Fn(GenericOwner, usize, &TypeRef) -> Option<TypeRef>,
) -> Option<TypeRef> {
    Some(match ty {
        TypeRef::GenericParameter { owner, position, .. } => lookup(*owner, *position, ty)?,
        TypeRef::Primitive(_) => ty.clone(),
        TypeRef::Array(e) => TypeRef::Array(Box::new(substitute(e, lookup)?)),
        TypeRef::ByReference(e) => TypeRef::ByReference(Box::new(substitute(e, lookup)?)),
        TypeRef::Pointer(e) => TypeRef::Pointer(Box::new(substitute(e, lookup)?)),
        TypeRef::RequiredModifier(e) => TypeRef::RequiredModifier(Box::new(substitute(e, lookup)?)),
        TypeRef::Named { full_name, module, generic_args } => TypeRef::Named {
            full_name: full_name.clone(),
            module: module.clone(),
            generic_args: generic_args.iter().map(|a| substitute(a, lookup)).collect::<Option<Vec<_>>>()?,
        },
    })
}

/// One ancestor (base class or interface) together with its frame.
#[derive(Debug, Clone)]
pub struct Level<'a> {
    pub def: &'a TypeDef,
    pub frame: Frame,
}

/// Resolved base chain of `def`, nearest first.
pub fn class_chain<'a, P: MetadataProvider + ?Sized>(provider: &'a P, def: &'a TypeDef) -> Vec<Level<'a>> {
    let mut frame = Frame::Own;
    provider
        .ancestors(def)
        .into_iter()
        .map(|(reference, base)| {
            frame = frame.through(reference);
            Level { def: base, frame: frame.clone() }
        })
        .collect()
}

/// Interfaces declared on `def` and, transitively, the interfaces they extend.
/// De-duplicated by identity, declaration order, breadth first.
pub fn interface_closure<'a, P: MetadataProvider + ?Sized>(
    provider: &'a P,
    def: &'a TypeDef,
    frame: &Frame,
) -> Vec<Level<'a>> {
    let mut out: Vec<Level<'a>> = Vec::new();
    let mut queue: Vec<(&'a TypeRef, Frame)> = def.interfaces.iter().map(|i| (i, frame.clone())).collect();
    let mut cursor = 0;
    while cursor < queue.len() {
        let (reference, outer) = queue[cursor].clone();
        cursor += 1;
        let Ok(itf) = provider.resolve(reference) else { continue };
        if itf.key() == def.key() || out.iter().any(|l| l.def.key() == itf.key()) {
            continue;
        }
        let inner = outer.through(reference);
        queue.extend(itf.interfaces.iter().map(|i| (i, inner.clone())));
        out.push(Level { def: itf, frame: inner });
    }
    out
}

/// Static members of the closed generic base, rewritten with its arguments.
pub struct InheritedStatics<'a> {
    pub methods: Vec<(&'a MethodDef, MethodDef)>,
    pub properties: Vec<PropertyDef>,
    pub fields: Vec<FieldDef>,
}

/// Only applies when the declared base is a closed generic instantiation.
/// Members whose substitution fails are dropped, and so are members the
/// ordinary admission checks would reject; methods with their own generic
/// parameters included.
pub fn inherited_statics<'a, P: MetadataProvider + ?Sized>(provider: &'a P, def: &'a TypeDef) -> InheritedStatics<'a> {
    let mut out = InheritedStatics { methods: Vec::new(), properties: Vec::new(), fields: Vec::new() };
    let Some(base) = def.base_type.as_ref().filter(|b| b.is_generic_instance()) else { return out };
    if base.mentions_generic_parameter(GenericOwner::Type) || base.mentions_generic_parameter(GenericOwner::Method) {
        return out;
    }
    let Ok(base_def) = provider.resolve(base) else { return out };
    let frame = Frame::Own.through(base);
    if let Frame::Mapped(args) = &frame {
        if args.len() != base_def.generic_params.len() {
            return out;
        }
    }

    let accessors: Vec<&str> = base_def.properties.iter().flat_map(|p| p.accessors()).map(|a| a.name.as_str()).collect();
    for m in &base_def.methods {
        if m.is_special_name && accessors.contains(&m.name.as_str()) {
            continue;
        }
        let uses_param = m.signature_types().any(|t| t.mentions_generic_parameter(GenericOwner::Type));
        if !(m.is_static && m.is_public() && !m.is_constructor() && uses_param && m.generic_params.is_empty()) {
            continue;
        }
        let params = m
            .parameters
            .iter()
            .map(|p| frame.apply(&p.ty).map(|ty| crate::metadata::ParamDef { ty, ..p.clone() }))
            .collect::<Option<Vec<_>>>();
        let (Some(parameters), Some(return_type)) = (params, frame.apply(&m.return_type)) else {
            tracing::trace!(method = %m.name, "generic substitution failed, member dropped");
            continue;
        };
        out.methods.push((m, MethodDef { parameters, return_type, ..m.clone() }));
    }

    for p in &base_def.properties {
        let public_static = p.is_static() && p.accessors().any(|a| a.is_public());
        if !public_static || !p.ty.mentions_generic_parameter(GenericOwner::Type) {
            continue;
        }
        if let Err(reason) = screen_property(p) {
            tracing::trace!(property = %p.name, ?reason, "inherited static dropped");
            continue;
        }
        if let Some(ty) = frame.apply(&p.ty) {
            out.properties.push(PropertyDef { ty, ..p.clone() });
        }
    }

    for f in &base_def.fields {
        let public = f.visibility == crate::metadata::Visibility::Public;
        if !(public && f.is_static && f.ty.mentions_generic_parameter(GenericOwner::Type)) {
            continue;
        }
        if let Err(reason) = screen_field(f) {
            tracing::trace!(field = %f.name, ?reason, "inherited static dropped");
            continue;
        }
        if let Some(ty) = frame.apply(&f.ty) {
            out.fields.push(FieldDef { ty, ..f.clone() });
        }
    }
    out
}

//! Extension methods: static methods marked as extensions are re-exposed as
//! instance members of the type their first parameter extends.
use tracing::trace;

use super::generics::substitute;
use super::members::{Rejection, screen_method};
use crate::metadata::{Attributed, GenericOwner, Marker, MetadataProvider, MethodDef, TypeDef, TypeKey, TypeRef};

/// An eligible extension method, ready to attach to its extended type.
#[derive(Debug, Clone)]
pub struct ExtensionMethod {
    /// Identity of the extended type's definition.
    pub target: TypeKey,
    /// Definition reference of the extended type.
    pub target_ref: TypeRef,
    /// The method with its receiver stripped and method generic parameters erased.
    pub method: MethodDef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    NotExtension,
    Screened(Rejection),
    ByRefReceiver,
    /// A method generic parameter has no usable bound.
    Unerasable,
    /// A method generic parameter only appears in the return type.
    ReturnOnlyParameter,
}

/// Decide whether `m` (declared on `declaring`) is an attachable extension method.
pub fn consider<P: MetadataProvider + ?Sized>(
    provider: &P,
    declaring: &TypeDef,
    m: &MethodDef,
) -> Option<ExtensionMethod> {
    match extension(provider, m) {
        Ok(ext) => Some(ext),
        Err(Unsupported::NotExtension) => None,
        Err(reason) => {
            trace!(r#type = %declaring.key(), method = %m.name, ?reason, "extension method skipped");
            None
        }
    }
}

fn extension<P: MetadataProvider + ?Sized>(provider: &P, m: &MethodDef) -> Result<ExtensionMethod, Unsupported> {
    let Some((receiver, rest)) = m.parameters.split_first() else { return Err(Unsupported::NotExtension) };
    if !m.is_static || !m.has(Marker::Extension) {
        return Err(Unsupported::NotExtension);
    }
    screen_method(m).map_err(Unsupported::Screened)?;
    if matches!(receiver.ty, TypeRef::ByReference(_)) {
        return Err(Unsupported::ByRefReceiver);
    }

    let erasures: Vec<Option<TypeRef>> = m.generic_params.iter().map(|gp| erasure(provider, gp)).collect();
    let erase = |ty: &TypeRef| {
        substitute(ty, &|owner, position, original| match owner {
            GenericOwner::Method => erasures.get(position).cloned().flatten(),
            GenericOwner::Type => Some(original.clone()),
        })
    };

    let mut in_parameters = vec![false; m.generic_params.len()];
    for p in &m.parameters {
        p.ty.for_each_generic_parameter(&mut |owner, position| {
            if owner == GenericOwner::Method {
                if let Some(seen) = in_parameters.get_mut(position) {
                    *seen = true;
                }
            }
        });
    }
    let mut return_only = false;
    m.return_type.for_each_generic_parameter(&mut |owner, position| {
        return_only |= owner == GenericOwner::Method && !in_parameters.get(position).copied().unwrap_or(false);
    });
    if return_only {
        return Err(Unsupported::ReturnOnlyParameter);
    }

    let parameters = rest
        .iter()
        .map(|p| erase(&p.ty).map(|ty| crate::metadata::ParamDef { ty, ..p.clone() }))
        .collect::<Option<Vec<_>>>()
        .ok_or(Unsupported::Unerasable)?;
    let return_type = erase(&m.return_type).ok_or(Unsupported::Unerasable)?;

    let extended = match &receiver.ty {
        TypeRef::GenericParameter { owner: GenericOwner::Method, position, .. } => m
            .generic_params
            .get(*position)
            .and_then(|gp| receiver_bound(provider, gp))
            .ok_or(Unsupported::Unerasable)?,
        other => other.clone(),
    };
    let target_ref = extended.element_definition();
    let target = target_ref.key().ok_or(Unsupported::Unerasable)?;

    Ok(ExtensionMethod {
        target,
        target_ref,
        method: MethodDef {
            is_static: false,
            generic_params: Vec::new(),
            parameters,
            return_type,
            ..m.clone()
        },
    })
}

/// The first constraint usable as a stand-in for the parameter: a named,
/// non-generic reference type.
fn erasure<P: MetadataProvider + ?Sized>(provider: &P, gp: &crate::metadata::GenericParamDef) -> Option<TypeRef> {
    if gp.value_type_constraint {
        return None;
    }
    gp.constraints
        .iter()
        .find(|c| {
            matches!(c, TypeRef::Named { generic_args, .. } if generic_args.is_empty())
                && provider.resolve(c).map_or(true, |d| !d.is_value_type)
        })
        .cloned()
}

/// The type a constrained generic receiver extends: its first constraint
/// that is not a value type. Generic instantiations qualify, since only the
/// definition is used to group the method.
fn receiver_bound<P: MetadataProvider + ?Sized>(provider: &P, gp: &crate::metadata::GenericParamDef) -> Option<TypeRef> {
    if gp.value_type_constraint {
        return None;
    }
    gp.constraints
        .iter()
        .find(|c| matches!(c, TypeRef::Named { .. }) && provider.resolve(c).map_or(true, |d| !d.is_value_type))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MetadataSet, Primitive};
    use crate::test_support::{FixtureBuilder, constrained, method, param};

    fn int() -> TypeRef {
        TypeRef::Primitive(Primitive::Int32)
    }

    fn ifoo() -> TypeRef {
        TypeRef::named("G.IFoo", "M")
    }

    fn fixture() -> MetadataSet {
        FixtureBuilder::new("M")
            .interface("G.IFoo", |t| t)
            .value_type("G.Point", |t| t)
            .class("G.FooExtensions", |t| t.static_class().attribute(Marker::Extension))
            .build()
    }

    fn host(meta: &MetadataSet) -> &TypeDef {
        meta.get(&TypeKey::new("G.FooExtensions", "M")).unwrap()
    }

    fn ext(name: &str) -> MethodDef {
        method(name).static_().attribute(Marker::Extension)
    }

    #[test]
    fn receiver_is_stripped() {
        let meta = fixture();
        let m = ext("Length").param(param("self", ifoo())).returns(int());
        let found = consider(&meta, host(&meta), &m).unwrap();
        assert_eq!(found.target, TypeKey::new("G.IFoo", "M"));
        assert!(found.method.parameters.is_empty());
        assert!(!found.method.is_static);
        assert_eq!(found.method.return_type, int());
    }

    #[test]
    fn ineligible_shapes() {
        let meta = fixture();
        let host = host(&meta);
        // not marked, not static, no parameters
        assert!(consider(&meta, host, &method("Length").static_().param(param("s", ifoo()))).is_none());
        assert!(consider(&meta, host, &method("Length").attribute(Marker::Extension).param(param("s", ifoo()))).is_none());
        assert!(consider(&meta, host, &ext("Nothing")).is_none());
        // by-ref receiver
        let byref = ext("Bump").param(param("s", TypeRef::ByReference(Box::new(ifoo()))));
        assert_eq!(extension(&meta, &byref).unwrap_err(), Unsupported::ByRefReceiver);
    }

    #[test]
    fn generic_receiver_is_erased_to_its_bound() {
        let meta = fixture();
        let t = TypeRef::method_param(0, "T");
        let m = ext("Touch")
            .generic(constrained("T", vec![ifoo()]))
            .param(param("self", t.clone()))
            .param(param("other", t.clone()))
            .returns(t);
        let found = extension(&meta, &m).unwrap();
        assert_eq!(found.target, TypeKey::new("G.IFoo", "M"));
        assert_eq!(found.method.parameters[0].ty, ifoo());
        assert_eq!(found.method.return_type, ifoo());
    }

    #[test]
    fn value_type_and_unconstrained_bounds_are_rejected() {
        let meta = fixture();
        let t = TypeRef::method_param(0, "T");
        let point_bound = ext("Near")
            .generic(constrained("T", vec![TypeRef::named("G.Point", "M")]))
            .param(param("self", ifoo()))
            .param(param("other", t.clone()));
        assert_eq!(extension(&meta, &point_bound).unwrap_err(), Unsupported::Unerasable);

        let unconstrained = ext("Pick").generic(constrained("T", vec![])).param(param("self", ifoo())).param(param("x", t));
        assert_eq!(extension(&meta, &unconstrained).unwrap_err(), Unsupported::Unerasable);
    }

    #[test]
    fn return_only_generic_parameter_is_rejected() {
        let meta = fixture();
        let m = ext("Make")
            .generic(constrained("T", vec![ifoo()]))
            .param(param("self", ifoo()))
            .returns(TypeRef::method_param(0, "T"));
        assert_eq!(extension(&meta, &m).unwrap_err(), Unsupported::ReturnOnlyParameter);
    }

    #[test]
    fn receiver_bound_may_be_a_generic_instance() {
        let meta = fixture();
        let list = TypeRef::instance("G.List`1", "M", vec![int()]);
        let m = ext("Total")
            .generic(constrained("T", vec![TypeRef::named("G.Point", "M"), list]))
            .param(param("self", TypeRef::method_param(0, "T")))
            .returns(int());
        let found = extension(&meta, &m).unwrap();
        assert_eq!(found.target, TypeKey::new("G.List`1", "M"));
        assert!(found.method.parameters.is_empty());
        assert_eq!(found.method.return_type, int());
    }

    #[test]
    fn generic_instance_receiver_groups_under_definition() {
        let meta = fixture();
        let list = TypeRef::instance("G.List`1", "M", vec![int()]);
        let m = ext("Sum").param(param("self", list)).returns(int());
        let found = extension(&meta, &m).unwrap();
        assert_eq!(found.target, TypeKey::new("G.List`1", "M"));
    }
}

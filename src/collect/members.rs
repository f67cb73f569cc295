//! Member admission. Every check answers "can this member be expressed in the
//! declaration output at all?", in a fixed order, stopping at the first
//! failure.
use crate::metadata::{
    Attributed, FieldDef, GenericOwner, Marker, MethodDef, PropertyDef, TypeDef, Visibility,
};

/// Reason a member is left out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotPublic,
    Obsolete,
    Pointer,
    CompilerGenerated,
    /// The method introduces its own generic parameters.
    OpenGeneric,
    /// Indexed property; exposed through the `get_Item`/`set_Item` contract instead.
    Indexer,
    /// Static member over the declaring type's own generic parameters.
    StaticOverTypeParameter,
    StaticConstructor,
    /// Accessor of a declared property; the property is emitted instead.
    Accessor,
}

/// Explicit interface implementations (`System.IDisposable.Dispose`) are
/// private in metadata; they are exposed under their trailing segment.
fn explicit_name(name: &str) -> Option<&str> {
    let (_, tail) = name.rsplit_once('.')?;
    (!tail.is_empty()).then_some(tail)
}

fn visible_name(name: &str, visibility: Visibility, is_constructor: bool) -> Result<String, Rejection> {
    if visibility == Visibility::Public {
        return Ok(name.to_string());
    }
    match explicit_name(name) {
        Some(tail) if !is_constructor => Ok(tail.to_string()),
        _ => Err(Rejection::NotPublic),
    }
}

fn is_generated_name(name: &str) -> bool {
    name.starts_with('<')
}

/// Checks shared by declared and extension methods: visibility, obsolete
/// marker, pointers and compiler-generated markers. Returns the emitted name.
pub fn screen_method(m: &MethodDef) -> Result<String, Rejection> {
    let name = visible_name(&m.name, m.visibility, m.is_constructor())?;
    if m.has(Marker::Obsolete) {
        return Err(Rejection::Obsolete);
    }
    if m.signature_types().any(|t| t.contains_pointer()) {
        return Err(Rejection::Pointer);
    }
    if m.has(Marker::CompilerGenerated) || is_generated_name(&m.name) {
        return Err(Rejection::CompilerGenerated);
    }
    Ok(name)
}

pub fn admit_method(def: &TypeDef, m: &MethodDef) -> Result<String, Rejection> {
    let name = screen_method(m)?;
    if !m.generic_params.is_empty() {
        return Err(Rejection::OpenGeneric);
    }
    if m.name == ".cctor" {
        return Err(Rejection::StaticConstructor);
    }
    if m.is_special_name && is_property_accessor(def, &m.name) {
        return Err(Rejection::Accessor);
    }
    if m.is_static && m.signature_types().any(|t| t.mentions_generic_parameter(GenericOwner::Type)) {
        return Err(Rejection::StaticOverTypeParameter);
    }
    Ok(name)
}

fn is_property_accessor(def: &TypeDef, name: &str) -> bool {
    def.properties.iter().flat_map(|p| p.accessors()).any(|a| a.name == name)
}

pub fn admit_property(p: &PropertyDef) -> Result<String, Rejection> {
    let name = screen_property(p)?;
    if p.is_static() && p.ty.mentions_generic_parameter(GenericOwner::Type) {
        return Err(Rejection::StaticOverTypeParameter);
    }
    Ok(name)
}

/// Every property check except the one on static members over the
/// declaring type's generic parameters.
pub fn screen_property(p: &PropertyDef) -> Result<String, Rejection> {
    let visibility = if p.accessors().any(|a| a.is_public()) { Visibility::Public } else { Visibility::Private };
    let name = visible_name(&p.name, visibility, false)?;
    if p.has(Marker::Obsolete) {
        return Err(Rejection::Obsolete);
    }
    if p.ty.contains_pointer() || p.parameters.iter().any(|i| i.ty.contains_pointer()) {
        return Err(Rejection::Pointer);
    }
    if p.has(Marker::CompilerGenerated) || is_generated_name(&p.name) {
        return Err(Rejection::CompilerGenerated);
    }
    if !p.parameters.is_empty() {
        return Err(Rejection::Indexer);
    }
    Ok(name)
}

pub fn admit_field(f: &FieldDef) -> Result<String, Rejection> {
    let name = screen_field(f)?;
    if f.is_static && f.ty.mentions_generic_parameter(GenericOwner::Type) {
        return Err(Rejection::StaticOverTypeParameter);
    }
    Ok(name)
}

pub fn screen_field(f: &FieldDef) -> Result<String, Rejection> {
    if f.visibility != Visibility::Public {
        return Err(Rejection::NotPublic);
    }
    if f.has(Marker::Obsolete) {
        return Err(Rejection::Obsolete);
    }
    if f.ty.contains_pointer() {
        return Err(Rejection::Pointer);
    }
    if f.has(Marker::CompilerGenerated) || is_generated_name(&f.name) {
        return Err(Rejection::CompilerGenerated);
    }
    Ok(f.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Primitive, TypeRef};
    use crate::test_support::{field, method, param, property};

    fn int() -> TypeRef {
        TypeRef::Primitive(Primitive::Int32)
    }

    fn host() -> TypeDef {
        TypeDef {
            name: "Host`1".into(),
            namespace: "G".into(),
            generic_params: vec![crate::test_support::constrained("T", vec![])],
            properties: vec![property("Count", int())],
            ..TypeDef::default()
        }
    }

    #[test]
    fn checks_run_in_order() {
        let def = host();
        // private and obsolete: visibility is reported first
        let m = method("Hidden").visibility(Visibility::Private).attribute(Marker::Obsolete);
        assert_eq!(admit_method(&def, &m), Err(Rejection::NotPublic));
        let m = method("Old").attribute(Marker::Obsolete).param(param("p", TypeRef::Pointer(Box::new(int()))));
        assert_eq!(admit_method(&def, &m), Err(Rejection::Obsolete));
        let m = method("Raw").param(param("p", TypeRef::Pointer(Box::new(int()))));
        assert_eq!(admit_method(&def, &m), Err(Rejection::Pointer));
        let m = method("<Main>b__0");
        assert_eq!(admit_method(&def, &m), Err(Rejection::CompilerGenerated));
        let m = method("Map").generic(crate::test_support::constrained("U", vec![]));
        assert_eq!(admit_method(&def, &m), Err(Rejection::OpenGeneric));
    }

    #[test]
    fn explicit_implementations_use_trailing_segment() {
        let def = host();
        let m = method("System.IDisposable.Dispose").visibility(Visibility::Private);
        assert_eq!(admit_method(&def, &m).as_deref(), Ok("Dispose"));
        let ctor = method(".ctor").visibility(Visibility::Private);
        assert_eq!(admit_method(&def, &ctor), Err(Rejection::NotPublic));
        assert_eq!(admit_method(&def, &method(".ctor")).as_deref(), Ok(".ctor"));
    }

    #[test]
    fn declaring_type_parameters_are_fine_unless_static() {
        let def = host();
        let t = TypeRef::type_param(0, "T");
        assert!(admit_method(&def, &method("Get").returns(t.clone())).is_ok());
        assert_eq!(
            admit_method(&def, &method("Make").static_().returns(t.clone())),
            Err(Rejection::StaticOverTypeParameter)
        );
        assert_eq!(admit_field(&field("Default", t.clone()).static_()), Err(Rejection::StaticOverTypeParameter));
        assert_eq!(admit_property(&property("Shared", t.clone()).static_()), Err(Rejection::StaticOverTypeParameter));
        // the screening half alone lets them through
        assert!(screen_field(&field("Default", t.clone()).static_()).is_ok());
        assert!(screen_property(&property("Shared", t).static_()).is_ok());
    }

    #[test]
    fn accessors_and_indexers() {
        let def = host();
        let getter = method("get_Count").returns(int()).special_name();
        assert_eq!(admit_method(&def, &getter), Err(Rejection::Accessor));
        // same name without the special-name flag is an ordinary method
        assert!(admit_method(&def, &method("get_Count")).is_ok());
        let item = property("Item", int()).index(param("i", int()));
        assert_eq!(admit_property(&item), Err(Rejection::Indexer));
        assert_eq!(admit_method(&def, &method(".cctor").static_()), Err(Rejection::StaticConstructor));
    }

    #[test]
    fn non_public_fields_and_backing_fields() {
        assert_eq!(admit_field(&field("secret", int()).visibility(Visibility::Private)), Err(Rejection::NotPublic));
        assert_eq!(admit_field(&field("<Name>k__BackingField", int())), Err(Rejection::CompilerGenerated));
        assert_eq!(admit_field(&field("Value", int())).as_deref(), Ok("Value"));
    }
}

//! Origin-side type metadata, as handed over by a metadata provider.
//!
//! Everything here is declarative: names, signatures, attribute names and
//! constant values. Nothing is ever loaded or executed. The shapes mirror what
//! a CLI metadata reader exposes (type/method/field/property definitions plus
//! type references), flattened into plain serde-friendly data so that a module
//! dump can be produced by any external tool.
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

pub use loader::MetadataSet;

// ------------------------------- Identity --------------------------------- //

/// Identity of a named type: `(full name, module)`.
///
/// The full name uses `/` between an outer type and its nested types and keeps
/// the arity backtick (`List`1`), exactly as the metadata spells it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey {
    pub full_name: String,
    pub module: String,
}

impl TypeKey {
    pub fn new(full_name: impl Into<String>, module: impl Into<String>) -> Self {
        Self { full_name: full_name.into(), module: module.into() }
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]{}", self.module, self.full_name)
    }
}

// ---------------------------- Type references ----------------------------- //

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Void,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenericOwner {
    Type,
    Method,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Primitive(Primitive),
    Named {
        full_name: String,
        module: String,
        /// Non-empty for a generic instantiation (`List`1<int>`).
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        generic_args: Vec<TypeRef>,
    },
    Array(Box<TypeRef>),
    ByReference(Box<TypeRef>),
    Pointer(Box<TypeRef>),
    GenericParameter {
        owner: GenericOwner,
        position: usize,
        name: String,
    },
    RequiredModifier(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(full_name: impl Into<String>, module: impl Into<String>) -> Self {
        TypeRef::Named { full_name: full_name.into(), module: module.into(), generic_args: Vec::new() }
    }

    pub fn instance(full_name: impl Into<String>, module: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Named { full_name: full_name.into(), module: module.into(), generic_args: args }
    }

    pub fn type_param(position: usize, name: impl Into<String>) -> Self {
        TypeRef::GenericParameter { owner: GenericOwner::Type, position, name: name.into() }
    }

    pub fn method_param(position: usize, name: impl Into<String>) -> Self {
        TypeRef::GenericParameter { owner: GenericOwner::Method, position, name: name.into() }
    }

    /// Identity of the named type behind this reference (generic arguments and
    /// required modifiers are looked through).
    pub fn key(&self) -> Option<TypeKey> {
        match self {
            TypeRef::Named { full_name, module, .. } => Some(TypeKey::new(full_name, module)),
            TypeRef::RequiredModifier(inner) => inner.key(),
            _ => None,
        }
    }

    pub fn full_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { full_name, .. } => Some(full_name),
            TypeRef::RequiredModifier(inner) => inner.full_name(),
            _ => None,
        }
    }

    pub fn is_generic_instance(&self) -> bool {
        matches!(self, TypeRef::Named { generic_args, .. } if !generic_args.is_empty())
    }

    /// The non-generic (definition) form of a generic instantiation.
    pub fn element_definition(&self) -> TypeRef {
        match self {
            TypeRef::Named { full_name, module, .. } => TypeRef::named(full_name, module),
            other => other.clone(),
        }
    }

    pub fn contains_pointer(&self) -> bool {
        match self {
            TypeRef::Pointer(_) => true,
            TypeRef::Array(e) | TypeRef::ByReference(e) | TypeRef::RequiredModifier(e) => e.contains_pointer(),
            TypeRef::Named { generic_args, .. } => generic_args.iter().any(TypeRef::contains_pointer),
            TypeRef::Primitive(_) | TypeRef::GenericParameter { .. } => false,
        }
    }

    /// Does any generic parameter of the given owner kind appear in this reference?
    pub fn mentions_generic_parameter(&self, owner: GenericOwner) -> bool {
        let mut found = false;
        self.for_each_generic_parameter(&mut |o, _| found |= o == owner);
        found
    }

    pub fn for_each_generic_parameter(&self, f: &mut impl FnMut(GenericOwner, usize)) {
        match self {
            TypeRef::GenericParameter { owner, position, .. } => f(*owner, *position),
            TypeRef::Array(e) | TypeRef::ByReference(e) | TypeRef::Pointer(e) | TypeRef::RequiredModifier(e) => {
                e.for_each_generic_parameter(f)
            }
            TypeRef::Named { generic_args, .. } => {
                for arg in generic_args {
                    arg.for_each_generic_parameter(f);
                }
            }
            TypeRef::Primitive(_) => {}
        }
    }
}

// ------------------------------- Markers ---------------------------------- //

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Obsolete,
    Extension,
    CompilerGenerated,
}

impl Marker {
    pub fn attribute_name(self) -> &'static str {
        match self {
            Marker::Obsolete => "System.ObsoleteAttribute",
            Marker::Extension => "System.Runtime.CompilerServices.ExtensionAttribute",
            Marker::CompilerGenerated => "System.Runtime.CompilerServices.CompilerGeneratedAttribute",
        }
    }
}

/// Capability query over the attribute list of a definition.
pub trait Attributed {
    fn attributes(&self) -> &[String];

    fn has(&self, marker: Marker) -> bool {
        self.attributes().iter().any(|a| a == marker.attribute_name())
    }
}

// ------------------------------ Definitions ------------------------------- //

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeDef>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericParamDef {
    pub name: String,
    pub constraints: Vec<TypeRef>,
    /// `where T : struct`
    pub value_type_constraint: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TypeDef {
    /// Simple name, arity backtick included.
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Full name of the enclosing type for nested types.
    #[serde(default)]
    pub declaring_type: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_interface: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_sealed: bool,
    #[serde(default)]
    pub is_value_type: bool,
    #[serde(default)]
    pub is_enum: bool,
    #[serde(default)]
    pub base_type: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub generic_params: Vec<GenericParamDef>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub documentation: Option<String>,
    /// Owning module; filled in by the loader.
    #[serde(skip)]
    pub module: String,
}

impl TypeDef {
    pub fn full_name(&self) -> String {
        match &self.declaring_type {
            Some(outer) => format!("{outer}/{}", self.name),
            None if self.namespace.is_empty() => self.name.clone(),
            None => format!("{}.{}", self.namespace, self.name),
        }
    }

    pub fn key(&self) -> TypeKey {
        TypeKey::new(self.full_name(), &self.module)
    }

    /// A reference to this definition, open over its own generic parameters.
    pub fn self_ref(&self) -> TypeRef {
        TypeRef::named(self.full_name(), &self.module)
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_static_class(&self) -> bool {
        self.is_abstract && self.is_sealed
    }

    pub fn invoke_method(&self) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == "Invoke")
    }
}

impl Attributed for TypeDef {
    fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRef {
    pub declaring_type: TypeRef,
    pub name: String,
    #[serde(default)]
    pub parameter_count: usize,
}

fn void_type() -> TypeRef {
    TypeRef::Primitive(Primitive::Void)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
    /// `newslot`: a virtual method that starts a new override chain.
    #[serde(default)]
    pub is_new_slot: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_special_name: bool,
    #[serde(default)]
    pub generic_params: Vec<GenericParamDef>,
    #[serde(default)]
    pub parameters: Vec<ParamDef>,
    #[serde(default = "void_type")]
    pub return_type: TypeRef,
    /// Explicit implementations (`void IFoo.Bar()`).
    #[serde(default)]
    pub overrides: Vec<MethodRef>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub documentation: Option<String>,
}

impl MethodDef {
    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor" || self.name == ".cctor"
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Every type the signature mentions, return type first.
    pub fn signature_types(&self) -> impl Iterator<Item = &TypeRef> {
        std::iter::once(&self.return_type).chain(self.parameters.iter().map(|p| &p.ty))
    }
}

impl Attributed for MethodDef {
    fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// `params T[]`
    #[serde(default)]
    pub is_params: bool,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub has_default: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessorDef {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl AccessorDef {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub getter: Option<AccessorDef>,
    #[serde(default)]
    pub setter: Option<AccessorDef>,
    /// Index parameters; non-empty for indexers.
    #[serde(default)]
    pub parameters: Vec<ParamDef>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub documentation: Option<String>,
}

impl PropertyDef {
    pub fn is_static(&self) -> bool {
        self.getter.as_ref().or(self.setter.as_ref()).is_some_and(|a| a.is_static)
    }

    pub fn accessors(&self) -> impl Iterator<Item = &AccessorDef> {
        self.getter.iter().chain(self.setter.iter())
    }
}

impl Attributed for PropertyDef {
    fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_init_only: bool,
    /// Literal value of a `const` field, already rendered as text.
    #[serde(default)]
    pub constant: Option<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub documentation: Option<String>,
}

impl Attributed for FieldDef {
    fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

// ------------------------------- Provider --------------------------------- //

/// Full names of the types every delegate ultimately derives from.
pub const DELEGATE_ROOTS: [&str; 2] = ["System.MulticastDelegate", "System.Delegate"];

/// Read-only view over the loaded modules.
pub trait MetadataProvider {
    fn modules(&self) -> &[ModuleDef];

    fn get(&self, key: &TypeKey) -> Option<&TypeDef>;

    /// Resolve a named reference (generic arguments are ignored) to its definition.
    fn resolve(&self, reference: &TypeRef) -> Result<&TypeDef, ResolveError> {
        let key = reference.key().ok_or_else(|| ResolveError::NotNamed(format!("{reference:?}")))?;
        if !self.modules().iter().any(|m| m.name == key.module) {
            return Err(ResolveError::ModuleNotLoaded { module: key.module, full_name: key.full_name });
        }
        self.get(&key).ok_or(ResolveError::TypeNotFound { module: key.module, full_name: key.full_name })
    }

    /// Delegate-like: the base chain bottoms out at one of the delegate roots.
    fn is_delegate(&self, def: &TypeDef) -> bool {
        let mut current = def.base_type.clone();
        let mut depth = 0;
        while let Some(base) = current {
            if base.full_name().is_some_and(|n| DELEGATE_ROOTS.contains(&n)) {
                return true;
            }
            depth += 1;
            if depth > 64 {
                return false;
            }
            current = self.resolve(&base).ok().and_then(|d| d.base_type.clone());
        }
        false
    }

    /// Walk the resolved base chain, nearest first. Unresolvable links end the walk.
    fn ancestors<'a>(&'a self, def: &'a TypeDef) -> Vec<(&'a TypeRef, &'a TypeDef)> {
        let mut out: Vec<(&TypeRef, &TypeDef)> = Vec::new();
        let mut current = def;
        while let Some(base) = current.base_type.as_ref() {
            let Ok(base_def) = self.resolve(base) else { break };
            if out.iter().any(|(_, d)| d.key() == base_def.key()) || base_def.key() == def.key() {
                break;
            }
            out.push((base, base_def));
            current = base_def;
        }
        out
    }
}

//! Strongly-typed descriptor IR handed to the renderer. No metadata types here
//! except identities.
use serde::Serialize;

pub use crate::metadata::TypeKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Delegate,
}

/// A use site of a type: the mapped target expression plus, for named types,
/// the identity of the declaration it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeUse {
    pub ts_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<TypeKey>,
}

/// Why a member sits on a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberOrigin {
    Declared,
    /// Re-declared from an ancestor that the type hides or leaves unimplemented.
    Forced,
    /// Static member of a closed generic base, concretized.
    Substituted,
    /// Extension method, receiver stripped.
    Extension,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: TypeUse,
    pub is_variadic: bool,
    pub is_optional: bool,
    pub is_first: bool,
    pub is_last: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub is_static: bool,
    pub is_constructor: bool,
    pub origin: MemberOrigin,
    pub parameters: Vec<ParameterDescriptor>,
    pub return_type: TypeUse,
    pub document_lines: Vec<String>,
}

impl MethodDescriptor {
    /// Overload identity: name, staticness and mapped parameter types.
    pub fn signature(&self) -> (String, bool, Vec<String>) {
        (
            self.name.clone(),
            self.is_static,
            self.parameters.iter().map(|p| p.ty.ts_name.clone()).collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub is_static: bool,
    pub has_getter: bool,
    pub has_setter: bool,
    /// Render as `get`/`set` accessors rather than a field.
    pub as_accessor: bool,
    pub origin: MemberOrigin,
    pub property_type: TypeUse,
    pub document_lines: Vec<String>,
}

/// Structural `get_Item`/`set_Item` contract of an indexable type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexerDescriptor {
    pub index_type: TypeUse,
    pub value_type: TypeUse,
    pub has_getter: bool,
    pub has_setter: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumMember {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumBody {
    Members(Vec<EnumMember>),
    /// Produced by a configured enum hook.
    Hooked { declare_keyword: String, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegateSignature {
    pub parameters: Vec<ParameterDescriptor>,
    pub return_type: TypeUse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDescriptor {
    pub key: TypeKey,
    pub name: String,
    pub namespace: String,
    pub full_name: String,
    pub ts_name: String,
    pub kind: TypeKind,
    pub is_value_type: bool,
    pub is_abstract: bool,
    /// `false` for opaque entries whose definition could not be resolved.
    pub is_resolved: bool,
    /// Finalized exactly once.
    #[serde(skip)]
    pub proceeded: bool,
    pub base_type: Option<TypeUse>,
    pub interfaces: Vec<TypeUse>,
    pub generic_parameters: Vec<String>,
    pub methods: Vec<MethodDescriptor>,
    pub properties: Vec<PropertyDescriptor>,
    pub indexer: Option<IndexerDescriptor>,
    pub extension_methods: Vec<MethodDescriptor>,
    pub enum_body: Option<EnumBody>,
    pub delegate: Option<DelegateSignature>,
    pub document_lines: Vec<String>,
}

impl TypeDescriptor {
    pub fn forced_methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter().filter(|m| m.origin == MemberOrigin::Forced)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NamespaceDescriptor {
    pub name: String,
    pub types: Vec<TypeDescriptor>,
    pub is_global: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenCodeData {
    pub namespaces: Vec<NamespaceDescriptor>,
}

impl GenCodeData {
    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.namespaces.iter().flat_map(|ns| ns.types.iter())
    }

    pub fn find(&self, full_name: &str) -> Option<&TypeDescriptor> {
        self.types().find(|t| t.key.full_name == full_name)
    }
}

/// Split documentation text into lines, dropping a trailing empty line.
pub fn to_lines(doc: Option<&str>) -> Vec<String> {
    match doc {
        None => Vec::new(),
        Some(text) => text.trim_end_matches('\n').split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect(),
    }
}

/// Mark first/last ordinals on a parameter list.
pub fn mark_boundaries(parameters: &mut [ParameterDescriptor]) {
    let n = parameters.len();
    for (i, p) in parameters.iter_mut().enumerate() {
        p.is_first = i == 0;
        p.is_last = i + 1 == n;
    }
}

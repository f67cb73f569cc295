//! Translation of type definitions into descriptors.
//!
//! A [`Collector`] owns the two run-scoped tables: the descriptor cache keyed
//! by type identity and the [`ReferenceSet`]. Roots are translated in full;
//! everything their signatures reach is then declared from the closure, either
//! shallowly (kind, base type, enum values and delegate signatures) or in full
//! when `collectAllReferences` is set.
//!
//! Descriptors are filled in two phases. The shell (identity, kind, base type)
//! is inserted first; implemented interfaces and members are attached
//! afterwards, so nothing in the member pass ever needs a descriptor that is
//! still under construction. A shallow dependency therefore never claims an
//! interface whose members it does not declare.
pub mod extensions;
pub mod generics;
pub mod members;
pub mod overrides;

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, info, trace, warn};

use crate::closure::ReferenceSet;
use crate::config::FilterConfiguration;
use crate::ir::{
    DelegateSignature, EnumBody, EnumMember, GenCodeData, IndexerDescriptor, MemberOrigin, MethodDescriptor,
    NamespaceDescriptor, ParameterDescriptor, PropertyDescriptor, TypeDescriptor, TypeKind, TypeUse, mark_boundaries,
    to_lines,
};
use crate::metadata::{
    DELEGATE_ROOTS, FieldDef, MetadataProvider, MethodDef, ParamDef, PropertyDef, TypeDef, TypeKey, TypeRef,
    Visibility,
};
use crate::names::{map_name, normalize_full_name, simple_name};
use generics::Frame;
use members::{Rejection, admit_field, admit_method, admit_property, screen_method};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Depth {
    /// Identity, kind, base type, enum values and delegate signature.
    Dependency,
    /// Everything, members included.
    Deep,
}

pub struct Collector<'a, P: MetadataProvider + ?Sized> {
    provider: &'a P,
    filter: &'a FilterConfiguration,
    types: IndexMap<TypeKey, TypeDescriptor>,
    closure: ReferenceSet,
    /// Closure entries before this index have been declared.
    cursor: usize,
    extensions: IndexMap<TypeKey, Vec<MethodDescriptor>>,
}

impl<'a, P: MetadataProvider + ?Sized> Collector<'a, P> {
    pub fn new(provider: &'a P, filter: &'a FilterConfiguration) -> Self {
        Self {
            provider,
            filter,
            types: IndexMap::new(),
            closure: ReferenceSet::new(),
            cursor: 0,
            extensions: IndexMap::new(),
        }
    }

    /// Select roots through the filter and collect them.
    pub fn run(provider: &'a P, filter: &'a FilterConfiguration) -> GenCodeData {
        let roots = filter.select_roots(provider);
        Self::new(provider, filter).collect(&roots)
    }

    /// Drop both run-scoped tables.
    pub fn reset(&mut self) {
        self.types.clear();
        self.closure = ReferenceSet::new();
        self.cursor = 0;
        self.extensions.clear();
    }

    pub fn closure(&self) -> &ReferenceSet {
        &self.closure
    }

    pub fn descriptor(&self, key: &TypeKey) -> Option<&TypeDescriptor> {
        self.types.get(key)
    }

    pub fn collect(mut self, roots: &[TypeKey]) -> GenCodeData {
        let provider = self.provider;
        let mut root_defs = Vec::with_capacity(roots.len());
        for key in roots {
            match provider.get(key) {
                Some(def) => {
                    self.closure.visit(provider, &def.self_ref());
                    self.translate(def);
                    root_defs.push(def);
                }
                None => warn!(r#type = %key, "root type not found, skipped"),
            }
        }
        self.drain();

        for def in root_defs {
            self.index_extensions(def);
        }
        self.drain();
        self.attach_extensions();

        info!(
            roots = roots.len(),
            types = self.types.len(),
            closure = self.closure.len(),
            "collection finished"
        );
        self.into_gen_code_data()
    }

    /// Full translation of `def`. Idempotent: a type is finalized once and
    /// later calls return the cached descriptor.
    pub fn translate(&mut self, def: &'a TypeDef) -> &TypeDescriptor {
        self.fill(def, Depth::Deep)
    }

    fn fill(&mut self, def: &'a TypeDef, depth: Depth) -> &TypeDescriptor {
        let key = def.key();
        let index = match self.types.get_index_of(&key) {
            Some(index) => index,
            None => {
                let shell = self.shell(def);
                self.types.insert_full(key.clone(), shell).0
            }
        };
        if depth == Depth::Deep && !self.types[index].proceeded {
            self.types[index].proceeded = true;
            debug!(r#type = %key, "translating members");
            let interfaces = self.interfaces(def);
            let members = self.members(def);
            self.types[index].interfaces = interfaces;
            members.apply(&mut self.types[index]);
        }
        &self.types[index]
    }

    /// Declare every closure entry not declared yet. Declaring an entry may
    /// grow the closure; the loop runs until it stops growing.
    fn drain(&mut self) {
        let provider = self.provider;
        let depth = if self.filter.collect_all_references { Depth::Deep } else { Depth::Dependency };
        while let Some((key, entry)) = self.closure.get_index(self.cursor).map(|(k, e)| (k.clone(), e.clone())) {
            self.cursor += 1;
            if self.types.contains_key(&key) && depth == Depth::Dependency {
                continue;
            }
            let resolved = if entry.resolved { provider.resolve(&entry.reference).ok() } else { None };
            match resolved {
                Some(def) => {
                    self.fill(def, depth);
                }
                None => {
                    self.types.entry(key.clone()).or_insert_with(|| opaque(&key));
                }
            }
        }
    }

    // ------------------------------- Shell --------------------------------- //

    fn type_use(&mut self, ty: &TypeRef, is_variadic: bool) -> TypeUse {
        self.closure.visit(self.provider, ty);
        TypeUse { ts_name: map_name(ty, is_variadic), key: ty.key() }
    }

    fn shell(&mut self, def: &'a TypeDef) -> TypeDescriptor {
        let provider = self.provider;
        let full_name = def.full_name();
        let kind = if def.is_enum {
            TypeKind::Enum
        } else if def.is_interface {
            TypeKind::Interface
        } else if DELEGATE_ROOTS.contains(&full_name.as_str()) || provider.is_delegate(def) {
            TypeKind::Delegate
        } else {
            TypeKind::Class
        };
        let name = simple_name(&def.name);
        let namespace = match &def.declaring_type {
            Some(outer) => normalize_full_name(outer),
            None => def.namespace.clone(),
        };

        let mut descriptor = TypeDescriptor {
            key: def.key(),
            full_name: normalize_full_name(&full_name),
            ts_name: map_name(&def.self_ref(), false),
            kind,
            is_value_type: def.is_value_type && !def.is_enum,
            is_abstract: def.is_abstract && !def.is_interface,
            is_resolved: true,
            proceeded: false,
            base_type: None,
            interfaces: Vec::new(),
            generic_parameters: def.generic_params.iter().map(|g| g.name.clone()).collect(),
            methods: Vec::new(),
            properties: Vec::new(),
            indexer: None,
            extension_methods: Vec::new(),
            enum_body: None,
            delegate: None,
            document_lines: to_lines(def.documentation.as_deref()),
            name,
            namespace,
        };

        match kind {
            TypeKind::Enum => {
                descriptor.enum_body = Some(self.enum_body(def, &descriptor));
                descriptor.proceeded = true;
            }
            TypeKind::Delegate => {
                descriptor.delegate = Some(self.delegate_signature(def, &full_name));
                descriptor.proceeded = true;
            }
            TypeKind::Class => {
                let base = def.base_type.as_ref().filter(|b| b.full_name() != Some("System.Object"));
                if let Some(base) = base {
                    descriptor.base_type = Some(self.type_use(base, false));
                }
            }
            TypeKind::Interface => {}
        }
        descriptor
    }

    fn enum_body(&self, def: &TypeDef, descriptor: &TypeDescriptor) -> EnumBody {
        if let Some(hook) = self.filter.enum_hook(&def.full_name()) {
            debug!(r#type = %descriptor.key, "enum rendered by hook");
            return EnumBody::Hooked {
                declare_keyword: hook.declare_keyword.clone(),
                body: hook.render(&descriptor.name, &descriptor.full_name, &descriptor.namespace),
            };
        }
        EnumBody::Members(
            def.fields
                .iter()
                .filter(|f| f.is_static && f.visibility == Visibility::Public && f.name != "value__")
                .filter_map(|f| Some(EnumMember { name: f.name.clone(), value: f.constant.clone()? }))
                .collect(),
        )
    }

    fn delegate_signature(&mut self, def: &TypeDef, full_name: &str) -> DelegateSignature {
        let invoke = def.invoke_method().filter(|_| !DELEGATE_ROOTS.contains(&full_name));
        let Some(invoke) = invoke else {
            return DelegateSignature {
                parameters: vec![ParameterDescriptor {
                    name: "args".to_string(),
                    ty: TypeUse { ts_name: "any[]".to_string(), key: None },
                    is_variadic: true,
                    is_optional: false,
                    is_first: true,
                    is_last: true,
                }],
                return_type: TypeUse { ts_name: "any".to_string(), key: None },
            };
        };
        DelegateSignature {
            parameters: self.parameters(&invoke.parameters),
            return_type: self.type_use(&invoke.return_type, false),
        }
    }

    /// Interfaces of the type and of its base chain, most-derived first,
    /// written in the type's own frame.
    fn interfaces(&mut self, def: &'a TypeDef) -> Vec<TypeUse> {
        let provider = self.provider;
        let mut declared: Vec<TypeRef> = def.interfaces.clone();
        for level in generics::class_chain(provider, def) {
            declared.extend(level.def.interfaces.iter().filter_map(|i| level.frame.apply(i)));
        }
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for itf in declared {
            if provider.resolve(&itf).is_ok_and(|d| !d.is_public()) {
                continue;
            }
            let used = self.type_use(&itf, false);
            if seen.insert(used.ts_name.clone()) {
                out.push(used);
            }
        }
        out
    }

    // ------------------------------ Members -------------------------------- //

    fn parameters(&mut self, params: &[ParamDef]) -> Vec<ParameterDescriptor> {
        let mut out: Vec<ParameterDescriptor> = params
            .iter()
            .map(|p| ParameterDescriptor {
                name: p.name.clone(),
                ty: self.type_use(&p.ty, p.is_params),
                is_variadic: p.is_params,
                is_optional: p.is_optional || p.has_default,
                is_first: false,
                is_last: false,
            })
            .collect();
        mark_boundaries(&mut out);
        out
    }

    fn method(&mut self, m: &MethodDef, name: String, origin: MemberOrigin) -> MethodDescriptor {
        let is_constructor = m.is_constructor();
        MethodDescriptor {
            name: if is_constructor { "constructor".to_string() } else { name },
            is_static: m.is_static && !is_constructor,
            is_constructor,
            origin,
            parameters: self.parameters(&m.parameters),
            return_type: self.type_use(&m.return_type, false),
            document_lines: to_lines(m.documentation.as_deref()),
        }
    }

    fn property(&mut self, p: &PropertyDef, name: String, as_accessor: bool, origin: MemberOrigin) -> PropertyDescriptor {
        PropertyDescriptor {
            name,
            is_static: p.is_static(),
            has_getter: p.getter.as_ref().is_some_and(|a| a.is_public() || a.name.contains('.')),
            has_setter: p.setter.as_ref().is_some_and(|a| a.is_public() || a.name.contains('.')),
            as_accessor,
            origin,
            property_type: self.type_use(&p.ty, false),
            document_lines: to_lines(p.documentation.as_deref()),
        }
    }

    fn field(&mut self, f: &FieldDef, origin: MemberOrigin) -> PropertyDescriptor {
        PropertyDescriptor {
            name: f.name.clone(),
            is_static: f.is_static,
            has_getter: true,
            has_setter: !f.is_init_only && f.constant.is_none(),
            as_accessor: false,
            origin,
            property_type: self.type_use(&f.ty, false),
            document_lines: to_lines(f.documentation.as_deref()),
        }
    }

    fn members(&mut self, def: &'a TypeDef) -> Members {
        let provider = self.provider;
        let key = def.key();
        let mut out = Members::default();
        if def.is_enum || matches!(self.types.get(&key).map(|t| t.kind), Some(TypeKind::Delegate)) {
            return out;
        }
        let as_accessor = !def.is_interface;
        let dropped = |member: &str, reason: Rejection| trace!(r#type = %key, member, ?reason, "member dropped");

        for p in &def.properties {
            match admit_property(p) {
                Ok(name) => {
                    let descriptor = self.property(p, name, as_accessor, MemberOrigin::Declared);
                    out.push_property(descriptor);
                }
                Err(Rejection::Indexer) if out.indexer.is_none() && p.parameters.len() == 1 => {
                    out.indexer = Some(IndexerDescriptor {
                        index_type: self.type_use(&p.parameters[0].ty, false),
                        value_type: self.type_use(&p.ty, false),
                        has_getter: p.getter.as_ref().is_some_and(|a| a.is_public()),
                        has_setter: p.setter.as_ref().is_some_and(|a| a.is_public()),
                    });
                }
                Err(reason) => dropped(&p.name, reason),
            }
        }
        for f in &def.fields {
            match admit_field(f) {
                Ok(_) => {
                    let descriptor = self.field(f, MemberOrigin::Declared);
                    out.push_property(descriptor);
                }
                Err(reason) => dropped(&f.name, reason),
            }
        }

        let mut has_default_constructor = false;
        for m in &def.methods {
            match admit_method(def, m) {
                Ok(name) => {
                    has_default_constructor |= m.is_constructor() && m.parameters.is_empty();
                    let descriptor = self.method(m, name, MemberOrigin::Declared);
                    out.push_method(descriptor);
                }
                Err(reason) => dropped(&m.name, reason),
            }
        }
        if def.is_value_type && !has_default_constructor {
            out.push_method(MethodDescriptor {
                name: "constructor".to_string(),
                is_static: false,
                is_constructor: true,
                origin: MemberOrigin::Declared,
                parameters: Vec::new(),
                return_type: TypeUse { ts_name: "void".to_string(), key: None },
                document_lines: Vec::new(),
            });
        }

        for candidate in overrides::forced_methods(provider, def) {
            match concretize(candidate.method, &candidate.frame) {
                Some(m) => {
                    let descriptor = self.method(&m, candidate.name.clone(), MemberOrigin::Forced);
                    out.push_method(descriptor);
                }
                None => trace!(r#type = %key, member = %candidate.name, "forced member not expressible in this frame"),
            }
        }

        let statics = generics::inherited_statics(provider, def);
        for (_, m) in &statics.methods {
            if let Ok(name) = screen_method(m) {
                let descriptor = self.method(m, name, MemberOrigin::Substituted);
                out.push_method(descriptor);
            }
        }
        for p in &statics.properties {
            let descriptor = self.property(p, p.name.clone(), as_accessor, MemberOrigin::Substituted);
            out.push_property(descriptor);
        }
        for f in &statics.fields {
            let descriptor = self.field(f, MemberOrigin::Substituted);
            out.push_property(descriptor);
        }

        out.drop_shadowed_methods();
        out
    }

    // ----------------------------- Extensions ------------------------------ //

    fn index_extensions(&mut self, def: &'a TypeDef) {
        let provider = self.provider;
        for m in &def.methods {
            let Some(ext) = extensions::consider(provider, def, m) else { continue };
            self.closure.visit(provider, &ext.target_ref);
            let descriptor = self.method(&ext.method, ext.method.name.clone(), MemberOrigin::Extension);
            self.extensions.entry(ext.target).or_default().push(descriptor);
        }
    }

    fn attach_extensions(&mut self) {
        for (target, group) in std::mem::take(&mut self.extensions) {
            let Some(descriptor) = self.types.get_mut(&target) else {
                warn!(r#type = %target, "extended type was never declared");
                continue;
            };
            if descriptor.kind == TypeKind::Enum {
                trace!(r#type = %target, "extension methods on enums are not attached");
                continue;
            }
            for method in group {
                let signature = method.signature();
                if !descriptor.extension_methods.iter().any(|m| m.signature() == signature) {
                    descriptor.extension_methods.push(method);
                }
            }
        }
    }

    fn into_gen_code_data(self) -> GenCodeData {
        let mut grouped: IndexMap<String, Vec<TypeDescriptor>> = IndexMap::new();
        for (_, descriptor) in self.types {
            grouped.entry(descriptor.namespace.clone()).or_default().push(descriptor);
        }
        GenCodeData {
            namespaces: grouped
                .into_iter()
                .map(|(name, types)| NamespaceDescriptor { is_global: name.is_empty(), name, types })
                .collect(),
        }
    }
}

/// Parameters and return type of `m` rewritten into the derived frame.
fn concretize(m: &MethodDef, frame: &Frame) -> Option<MethodDef> {
    let parameters = m
        .parameters
        .iter()
        .map(|p| frame.apply(&p.ty).map(|ty| ParamDef { ty, ..p.clone() }))
        .collect::<Option<Vec<_>>>()?;
    Some(MethodDef { parameters, return_type: frame.apply(&m.return_type)?, ..m.clone() })
}

/// Declaration for a reference that could not be resolved.
fn opaque(key: &TypeKey) -> TypeDescriptor {
    let full_name = normalize_full_name(&key.full_name);
    let (namespace, name) = match full_name.rsplit_once('.') {
        Some((ns, name)) => (ns.to_string(), name.to_string()),
        None => (String::new(), full_name.clone()),
    };
    TypeDescriptor {
        key: key.clone(),
        name,
        namespace,
        ts_name: full_name.clone(),
        full_name,
        kind: TypeKind::Class,
        is_value_type: false,
        is_abstract: false,
        is_resolved: false,
        proceeded: true,
        base_type: None,
        interfaces: Vec::new(),
        generic_parameters: Vec::new(),
        methods: Vec::new(),
        properties: Vec::new(),
        indexer: None,
        extension_methods: Vec::new(),
        enum_body: None,
        delegate: None,
        document_lines: Vec::new(),
    }
}

#[derive(Debug, Default)]
struct Members {
    methods: Vec<MethodDescriptor>,
    properties: Vec<PropertyDescriptor>,
    indexer: Option<IndexerDescriptor>,
}

impl Members {
    fn push_method(&mut self, method: MethodDescriptor) {
        let signature = method.signature();
        if !self.methods.iter().any(|m| m.signature() == signature) {
            self.methods.push(method);
        }
    }

    /// First declaration of a `(name, is_static)` pair wins.
    fn push_property(&mut self, property: PropertyDescriptor) {
        if !self.properties.iter().any(|p| p.name == property.name && p.is_static == property.is_static) {
            self.properties.push(property);
        }
    }

    /// A property wins over a method of the same name.
    fn drop_shadowed_methods(&mut self) {
        let names: HashSet<&str> = self.properties.iter().map(|p| p.name.as_str()).collect();
        self.methods.retain(|m| m.is_constructor || !names.contains(m.name.as_str()));
    }

    fn apply(self, descriptor: &mut TypeDescriptor) {
        descriptor.methods = self.methods;
        descriptor.properties = self.properties;
        descriptor.indexer = self.indexer;
    }
}

//! Declaration text from a descriptor tree.
//!
//! Everything lives under one ambient `CS` namespace. A small preamble
//! declares the helper types that mapped names refer to (`$Ref<T>`,
//! `System.Array$1<T>`, `$Task<T>`) and the unique symbol used to keep
//! otherwise structurally identical classes incompatible.
use crate::ir::{
    EnumBody, GenCodeData, IndexerDescriptor, MethodDescriptor, NamespaceDescriptor, ParameterDescriptor,
    PropertyDescriptor, TypeDescriptor, TypeKind,
};

const INDENT: &str = "    ";

const PREAMBLE: &str = "\
declare namespace CS {
    // keeps structurally identical classes incompatible
    const __keep_incompatibility: unique symbol;
    interface $Ref<T> {
        __doNoAccess: T
    }
    namespace System {
        interface Array$1<T> extends System.Array {
            get_Item(index: number): T;
            set_Item(index: number, value: T): void;
        }
    }
    interface $Task<T> {}
";

/// Where a member is being written; decides which modifiers it may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Host {
    Class,
    Interface,
}

#[derive(Debug, Default)]
pub struct Codegen {
    output: String,
    depth: usize,
}

impl Codegen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.output
    }

    pub fn emit(&mut self, data: &GenCodeData) {
        self.output.push_str(PREAMBLE);
        self.depth = 1;
        for namespace in &data.namespaces {
            self.emit_namespace(namespace);
        }
        self.depth = 0;
        self.output.push_str("}\n");
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.output.push_str(INDENT);
        }
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn emit_namespace(&mut self, namespace: &NamespaceDescriptor) {
        if !namespace.is_global {
            self.line(&format!("namespace {} {{", namespace.name));
            self.depth += 1;
        }
        for ty in &namespace.types {
            self.emit_type(ty);
        }
        if !namespace.is_global {
            self.depth -= 1;
            self.line("}");
        }
    }

    fn emit_docs(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        self.line("/**");
        for l in lines {
            self.line(format!(" * {l}").trim_end());
        }
        self.line(" */");
    }

    fn emit_type(&mut self, ty: &TypeDescriptor) {
        self.emit_docs(&ty.document_lines);
        match ty.kind {
            TypeKind::Enum => self.emit_enum(ty),
            TypeKind::Delegate => self.emit_delegate(ty),
            TypeKind::Interface => self.emit_interface(ty),
            TypeKind::Class => self.emit_class(ty),
        }
        if !ty.extension_methods.is_empty() && matches!(ty.kind, TypeKind::Class | TypeKind::Interface) {
            self.line(&format!("interface {} {{", declared_name(ty)));
            self.depth += 1;
            for m in &ty.extension_methods {
                self.emit_method(m, Host::Interface);
            }
            self.depth -= 1;
            self.line("}");
        }
    }

    fn emit_enum(&mut self, ty: &TypeDescriptor) {
        match &ty.enum_body {
            Some(EnumBody::Hooked { declare_keyword, body }) => {
                self.line(&format!("{declare_keyword} {} {{ {body} }}", ty.name));
            }
            Some(EnumBody::Members(members)) => {
                let pairs = members.iter().map(|m| format!("{} = {}", m.name, m.value)).collect::<Vec<_>>();
                self.line(&format!("enum {} {{ {} }}", ty.name, pairs.join(", ")));
            }
            None => self.line(&format!("enum {} {{ }}", ty.name)),
        }
    }

    fn emit_delegate(&mut self, ty: &TypeDescriptor) {
        let (params, ret) = match &ty.delegate {
            Some(sig) => (render_parameters(&sig.parameters), sig.return_type.ts_name.clone()),
            None => ("...args: any[]".to_string(), "any".to_string()),
        };
        self.line(&format!("type {} = ({params}) => {ret};", declared_name(ty)));
    }

    fn emit_interface(&mut self, ty: &TypeDescriptor) {
        let mut header = format!("interface {}", declared_name(ty));
        if !ty.interfaces.is_empty() {
            let names = ty.interfaces.iter().map(|i| i.ts_name.as_str()).collect::<Vec<_>>();
            header.push_str(&format!(" extends {}", names.join(", ")));
        }
        self.line(&format!("{header} {{"));
        self.depth += 1;
        self.emit_members(ty, Host::Interface);
        self.depth -= 1;
        self.line("}");
    }

    fn emit_class(&mut self, ty: &TypeDescriptor) {
        let keyword = if ty.is_abstract && ty.is_resolved { "abstract class" } else { "class" };
        let mut header = format!("{keyword} {}", declared_name(ty));
        if let Some(base) = &ty.base_type {
            header.push_str(&format!(" extends {}", base.ts_name));
        }
        if !ty.interfaces.is_empty() {
            let names = ty.interfaces.iter().map(|i| i.ts_name.as_str()).collect::<Vec<_>>();
            header.push_str(&format!(" implements {}", names.join(", ")));
        }
        self.line(&format!("{header} {{"));
        self.depth += 1;
        self.line("protected [__keep_incompatibility]: never;");
        self.emit_members(ty, Host::Class);
        self.depth -= 1;
        self.line("}");
    }

    fn emit_members(&mut self, ty: &TypeDescriptor, host: Host) {
        for p in &ty.properties {
            self.emit_property(p, host);
        }
        if let Some(indexer) = &ty.indexer {
            self.emit_indexer(indexer, host);
        }
        for m in &ty.methods {
            if host == Host::Interface && m.is_constructor {
                continue;
            }
            self.emit_method(m, host);
        }
    }

    fn emit_property(&mut self, p: &PropertyDescriptor, host: Host) {
        self.emit_docs(&p.document_lines);
        let modifiers = modifiers(host, p.is_static);
        let ty = &p.property_type.ts_name;
        if p.as_accessor && host == Host::Class {
            if p.has_getter {
                self.line(&format!("{modifiers}get {}(): {ty};", p.name));
            }
            if p.has_setter {
                self.line(&format!("{modifiers}set {}(value: {ty});", p.name));
            }
            return;
        }
        let readonly = if p.has_setter { "" } else { "readonly " };
        self.line(&format!("{modifiers}{readonly}{}: {ty};", p.name));
    }

    fn emit_indexer(&mut self, indexer: &IndexerDescriptor, host: Host) {
        let modifiers = modifiers(host, false);
        let (index, value) = (&indexer.index_type.ts_name, &indexer.value_type.ts_name);
        if indexer.has_getter {
            self.line(&format!("{modifiers}get_Item(index: {index}): {value};"));
        }
        if indexer.has_setter {
            self.line(&format!("{modifiers}set_Item(index: {index}, value: {value}): void;"));
        }
    }

    fn emit_method(&mut self, m: &MethodDescriptor, host: Host) {
        self.emit_docs(&m.document_lines);
        let modifiers = modifiers(host, m.is_static);
        let params = render_parameters(&m.parameters);
        if m.is_constructor {
            self.line(&format!("{modifiers}constructor({params});"));
        } else {
            self.line(&format!("{modifiers}{}({params}): {};", m.name, m.return_type.ts_name));
        }
    }
}

fn modifiers(host: Host, is_static: bool) -> &'static str {
    match (host, is_static) {
        (Host::Interface, _) => "",
        (Host::Class, true) => "public static ",
        (Host::Class, false) => "public ",
    }
}

/// `Name<T, U>` for generic types.
fn declared_name(ty: &TypeDescriptor) -> String {
    if ty.generic_parameters.is_empty() {
        ty.name.clone()
    } else {
        format!("{}<{}>", ty.name, ty.generic_parameters.join(", "))
    }
}

/// Parameter names get a `$` prefix so reserved words stay legal. A parameter
/// is only written optional when everything after it is optional too.
fn render_parameters(params: &[ParameterDescriptor]) -> String {
    let mut optional_tail = vec![false; params.len()];
    let mut all_optional = true;
    for (i, p) in params.iter().enumerate().rev() {
        all_optional &= p.is_optional || p.is_variadic;
        optional_tail[i] = all_optional;
    }
    params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if p.is_variadic && p.is_last {
                format!("...${}: {}", p.name, p.ty.ts_name)
            } else if p.is_optional && optional_tail[i] {
                format!("${}?: {}", p.name, p.ty.ts_name)
            } else {
                format!("${}: {}", p.name, p.ty.ts_name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

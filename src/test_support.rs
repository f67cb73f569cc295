//! Compact builders for metadata fixtures used by the unit tests.
use crate::metadata::{
    AccessorDef, FieldDef, GenericParamDef, Marker, MetadataSet, MethodDef, MethodRef, ModuleDef, ParamDef,
    Primitive, PropertyDef, TypeDef, TypeRef, Visibility,
};

pub struct FixtureBuilder {
    modules: Vec<ModuleDef>,
}

impl FixtureBuilder {
    pub fn new(module: &str) -> Self {
        Self { modules: vec![ModuleDef { name: module.to_string(), types: Vec::new() }] }
    }

    /// Subsequent types go into `name`.
    pub fn module(mut self, name: &str) -> Self {
        self.modules.push(ModuleDef { name: name.to_string(), types: Vec::new() });
        self
    }

    pub fn class(self, full_name: &str, f: impl FnOnce(TypeBuilder) -> TypeBuilder) -> Self {
        self.add(full_name, |t| t, f)
    }

    pub fn interface(self, full_name: &str, f: impl FnOnce(TypeBuilder) -> TypeBuilder) -> Self {
        self.add(full_name, |mut t| { t.0.is_interface = true; t.0.is_abstract = true; t }, f)
    }

    pub fn value_type(self, full_name: &str, f: impl FnOnce(TypeBuilder) -> TypeBuilder) -> Self {
        self.add(full_name, |mut t| { t.0.is_value_type = true; t.0.is_sealed = true; t }, f)
    }

    pub fn enumeration(self, full_name: &str, members: &[(&str, &str)]) -> Self {
        self.enumeration_with(full_name, members, |t| t)
    }

    /// Like [`Self::enumeration`], with room for extra fields.
    pub fn enumeration_with(
        self,
        full_name: &str,
        members: &[(&str, &str)],
        f: impl FnOnce(TypeBuilder) -> TypeBuilder,
    ) -> Self {
        self.add(
            full_name,
            |mut t| {
                t.0.is_enum = true;
                t.0.is_value_type = true;
                t.0.fields.push(FieldDef { visibility: Visibility::Public, ..field("value__", TypeRef::Primitive(Primitive::Int32)) });
                for (name, value) in members {
                    t.0.fields.push(FieldDef {
                        is_static: true,
                        constant: Some(value.to_string()),
                        ..field(name, TypeRef::named(full_name, ""))
                    });
                }
                t
            },
            f,
        )
    }

    fn add(
        mut self,
        full_name: &str,
        preset: impl FnOnce(TypeBuilder) -> TypeBuilder,
        f: impl FnOnce(TypeBuilder) -> TypeBuilder,
    ) -> Self {
        let mut def = TypeDef::default();
        match full_name.rsplit_once('/') {
            Some((outer, name)) => {
                def.declaring_type = Some(outer.to_string());
                def.name = name.to_string();
            }
            None => match full_name.rsplit_once('.') {
                Some((ns, name)) => {
                    def.namespace = ns.to_string();
                    def.name = name.to_string();
                }
                None => def.name = full_name.to_string(),
            },
        }
        let built = f(preset(TypeBuilder(def))).0;
        if let Some(module) = self.modules.last_mut() {
            module.types.push(built);
        }
        self
    }

    pub fn build(self) -> MetadataSet {
        MetadataSet::from_modules(self.modules).expect("fixture modules are consistent")
    }
}

pub struct TypeBuilder(pub TypeDef);

impl TypeBuilder {
    pub fn generic(mut self, name: &str) -> Self {
        self.0.generic_params.push(GenericParamDef { name: name.to_string(), ..GenericParamDef::default() });
        self
    }
    pub fn base(mut self, base: TypeRef) -> Self {
        self.0.base_type = Some(base);
        self
    }
    pub fn implements(mut self, itf: TypeRef) -> Self {
        self.0.interfaces.push(itf);
        self
    }
    pub fn abstract_(mut self) -> Self {
        self.0.is_abstract = true;
        self
    }
    pub fn static_class(mut self) -> Self {
        self.0.is_abstract = true;
        self.0.is_sealed = true;
        self
    }
    pub fn visibility(mut self, v: Visibility) -> Self {
        self.0.visibility = v;
        self
    }
    pub fn attribute(mut self, marker: Marker) -> Self {
        self.0.attributes.push(marker.attribute_name().to_string());
        self
    }
    pub fn doc(mut self, text: &str) -> Self {
        self.0.documentation = Some(text.to_string());
        self
    }
    pub fn method(mut self, m: MethodDef) -> Self {
        self.0.methods.push(m);
        self
    }
    pub fn property(mut self, p: PropertyDef) -> Self {
        self.0.properties.push(p);
        self
    }
    pub fn field(mut self, f: FieldDef) -> Self {
        self.0.fields.push(f);
        self
    }
}

pub fn method(name: &str) -> MethodDef {
    MethodDef {
        name: name.to_string(),
        visibility: Visibility::Public,
        is_static: false,
        is_virtual: false,
        is_new_slot: false,
        is_abstract: false,
        is_special_name: false,
        generic_params: Vec::new(),
        parameters: Vec::new(),
        return_type: TypeRef::Primitive(Primitive::Void),
        overrides: Vec::new(),
        attributes: Vec::new(),
        documentation: None,
    }
}

pub fn param(name: &str, ty: TypeRef) -> ParamDef {
    ParamDef { name: name.to_string(), ty, is_params: false, is_optional: false, has_default: false }
}

/// Public read/write property with `get_`/`set_` accessors.
pub fn property(name: &str, ty: TypeRef) -> PropertyDef {
    let accessor = |prefix: &str| AccessorDef {
        name: format!("{prefix}_{name}"),
        visibility: Visibility::Public,
        is_static: false,
        attributes: Vec::new(),
    };
    PropertyDef {
        name: name.to_string(),
        ty,
        getter: Some(accessor("get")),
        setter: Some(accessor("set")),
        parameters: Vec::new(),
        attributes: Vec::new(),
        documentation: None,
    }
}

pub fn field(name: &str, ty: TypeRef) -> FieldDef {
    FieldDef {
        name: name.to_string(),
        ty,
        visibility: Visibility::Public,
        is_static: false,
        is_init_only: false,
        constant: None,
        attributes: Vec::new(),
        documentation: None,
    }
}

impl MethodDef {
    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }
    /// `virtual` introducing a new slot.
    pub fn virtual_(mut self) -> Self {
        self.is_virtual = true;
        self.is_new_slot = true;
        self
    }
    /// `override`
    pub fn override_(mut self) -> Self {
        self.is_virtual = true;
        self.is_new_slot = false;
        self
    }
    pub fn abstract_(mut self) -> Self {
        self.is_virtual = true;
        self.is_new_slot = true;
        self.is_abstract = true;
        self
    }
    pub fn special_name(mut self) -> Self {
        self.is_special_name = true;
        self
    }
    pub fn visibility(mut self, v: Visibility) -> Self {
        self.visibility = v;
        self
    }
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.return_type = ty;
        self
    }
    pub fn param(mut self, p: ParamDef) -> Self {
        self.parameters.push(p);
        self
    }
    pub fn generic(mut self, gp: GenericParamDef) -> Self {
        self.generic_params.push(gp);
        self
    }
    pub fn attribute(mut self, marker: Marker) -> Self {
        self.attributes.push(marker.attribute_name().to_string());
        self
    }
    pub fn implements(mut self, declaring_type: TypeRef, name: &str, parameter_count: usize) -> Self {
        self.overrides.push(MethodRef { declaring_type, name: name.to_string(), parameter_count });
        self
    }
    pub fn doc(mut self, text: &str) -> Self {
        self.documentation = Some(text.to_string());
        self
    }
}

impl PropertyDef {
    pub fn static_(mut self) -> Self {
        for a in self.getter.iter_mut().chain(self.setter.iter_mut()) {
            a.is_static = true;
        }
        self
    }
    pub fn read_only(mut self) -> Self {
        self.setter = None;
        self
    }
    pub fn index(mut self, p: ParamDef) -> Self {
        self.parameters.push(p);
        self
    }
    pub fn attribute(mut self, marker: Marker) -> Self {
        self.attributes.push(marker.attribute_name().to_string());
        self
    }
}

impl FieldDef {
    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }
    pub fn visibility(mut self, v: Visibility) -> Self {
        self.visibility = v;
        self
    }
    pub fn constant(mut self, value: &str) -> Self {
        self.constant = Some(value.to_string());
        self
    }
    pub fn attribute(mut self, marker: Marker) -> Self {
        self.attributes.push(marker.attribute_name().to_string());
        self
    }
}

pub fn constrained(name: &str, constraints: Vec<TypeRef>) -> GenericParamDef {
    GenericParamDef { name: name.to_string(), constraints, value_type_constraint: false }
}

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use super::{MetadataProvider, ModuleDef, TypeDef, TypeKey};
use crate::error::LoadError;

/// In-memory metadata provider built from module dumps.
#[derive(Debug, Default)]
pub struct MetadataSet {
    modules: Vec<ModuleDef>,
    index: HashMap<TypeKey, (usize, usize)>,
}

impl MetadataSet {
    pub fn from_modules(modules: Vec<ModuleDef>) -> Result<Self, LoadError> {
        let mut set = Self::default();
        for module in modules {
            set.add_module(module)?;
        }
        Ok(set)
    }

    /// Load one `ModuleDef` JSON document per path.
    pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, LoadError> {
        let mut set = Self::default();
        for path in paths {
            let path = path.as_ref();
            let source = std::fs::read_to_string(path)
                .map_err(|source| LoadError::Read { path: path.to_path_buf(), source })?;
            let module = crate::path_de::from_str_with_path::<ModuleDef>(&source)
                .map_err(|source| LoadError::Parse { path: path.to_path_buf(), source })?;
            debug!(module = %module.name, types = module.types.len(), path = %path.display(), "loaded module");
            set.add_module(module)?;
        }
        Ok(set)
    }

    pub fn add_module(&mut self, mut module: ModuleDef) -> Result<(), LoadError> {
        let module_ix = self.modules.len();
        for (type_ix, def) in module.types.iter_mut().enumerate() {
            def.module = module.name.clone();
            let key = def.key();
            if self.index.insert(key.clone(), (module_ix, type_ix)).is_some() {
                return Err(LoadError::DuplicateType { module: key.module, full_name: key.full_name });
            }
        }
        self.modules.push(module);
        Ok(())
    }

    pub fn type_count(&self) -> usize {
        self.index.len()
    }
}

impl MetadataProvider for MetadataSet {
    fn modules(&self) -> &[ModuleDef] {
        &self.modules
    }

    fn get(&self, key: &TypeKey) -> Option<&TypeDef> {
        let (m, t) = *self.index.get(key)?;
        self.modules.get(m)?.types.get(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::metadata::TypeRef;

    #[test]
    fn module_dump_parses_with_defaults() {
        let src = r#"{
            "name": "Zoo",
            "types": [
                { "name": "Animal", "namespace": "Zoo",
                  "methods": [ { "name": "Speak", "is_virtual": true, "return_type": { "primitive": "string" } } ] },
                { "name": "Kind", "namespace": "Zoo", "declaring_type": "Zoo.Animal", "is_enum": true }
            ]
        }"#;
        let module: ModuleDef = crate::path_de::from_str_with_path(src).unwrap();
        let set = MetadataSet::from_modules(vec![module]).unwrap();
        assert_eq!(set.type_count(), 2);
        let nested = set.resolve(&TypeRef::named("Zoo.Animal/Kind", "Zoo")).unwrap();
        assert!(nested.is_enum);
        assert_eq!(nested.module, "Zoo");
        let animal = set.resolve(&TypeRef::named("Zoo.Animal", "Zoo")).unwrap();
        assert_eq!(animal.methods[0].return_type, TypeRef::Primitive(crate::metadata::Primitive::String));
    }

    #[test]
    fn parse_errors_carry_json_path() {
        let src = r#"{ "name": "Zoo", "types": [ { "name": 3 } ] }"#;
        let err = crate::path_de::from_str_with_path::<ModuleDef>(src).unwrap_err();
        assert!(err.json_path.starts_with("types[0].name"), "{}", err.json_path);
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let def = TypeDef { name: "A".into(), ..TypeDef::default() };
        let module = ModuleDef { name: "M".into(), types: vec![def.clone(), def] };
        assert!(matches!(MetadataSet::from_modules(vec![module]), Err(LoadError::DuplicateType { .. })));
    }

    #[test]
    fn resolution_distinguishes_missing_module_from_missing_type() {
        let set = MetadataSet::from_modules(vec![ModuleDef { name: "M".into(), types: vec![] }]).unwrap();
        assert!(matches!(
            set.resolve(&TypeRef::named("X", "Other")),
            Err(ResolveError::ModuleNotLoaded { .. })
        ));
        assert!(matches!(set.resolve(&TypeRef::named("X", "M")), Err(ResolveError::TypeNotFound { .. })));
    }
}

//! Generation configuration: which assemblies contribute root types, which of
//! their types are exposed, and how enums may be rendered by hooks.
//!
//! The JSON layout follows the generator configuration file:
//!
//! ```json
//! {
//!   "assemblies": { "^Game\\..*$": { "whitelist": ["Game.Player"], "blacklist": ["Game.Player.Secret"] } },
//!   "enumGenerateHooks": [ { "pattern": "Flags$", "declareKeyword": "const enum", "bodyTemplate": "..." } ],
//!   "collectAllReferences": false,
//!   "metadataPaths": ["meta/*.json"]
//! }
//! ```
use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::metadata::{Attributed, Marker, MetadataProvider, TypeDef, TypeKey};
use crate::names::hierarchical_name;

// ————————————————————————————————————————————————————————————————————————————
// FILE FORMAT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateConfig {
    /// Assembly-name regex → allow/deny lists. Order matters: first match wins.
    #[serde(alias = "assemblys")]
    pub assemblies: IndexMap<String, AssemblyConfig>,
    pub enum_generate_hooks: Vec<EnumHookConfig>,
    pub collect_all_references: bool,
    /// Module dump paths or glob patterns.
    pub metadata_paths: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssemblyConfig {
    pub whitelist: Option<Vec<String>>,
    pub blacklist: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumHookConfig {
    pub pattern: String,
    pub declare_keyword: String,
    pub body_template: String,
}

impl GenerateConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        crate::path_de::from_str_with_path(&source)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// COMPILED FILTER
// ————————————————————————————————————————————————————————————————————————————

/// Fully-qualified type names with hierarchical prefix expansion: naming an
/// outer type (or namespace) governs everything nested below it.
#[derive(Debug, Clone, Default)]
struct NameSet(HashSet<String>);

impl NameSet {
    fn compile(module: &str, list: &'static str, entries: &[String]) -> Result<Self, ConfigError> {
        let mut set = HashSet::with_capacity(entries.len());
        for entry in entries {
            let normalized = hierarchical_name(entry.trim());
            let malformed = normalized.is_empty()
                || normalized.split('.').any(str::is_empty)
                || normalized.chars().any(char::is_whitespace);
            if malformed {
                return Err(ConfigError::TypeNamePattern {
                    module: module.to_string(),
                    list,
                    entry: entry.clone(),
                });
            }
            set.insert(normalized);
        }
        Ok(Self(set))
    }

    fn matches(&self, hierarchical: &str) -> bool {
        if self.0.contains(hierarchical) {
            return true;
        }
        hierarchical
            .match_indices('.')
            .any(|(ix, _)| self.0.contains(&hierarchical[..ix]))
    }
}

#[derive(Debug, Clone)]
struct AssemblyFilter {
    source: String,
    pattern: Regex,
    allow: Option<NameSet>,
    deny: Option<NameSet>,
}

impl AssemblyFilter {
    fn admits(&self, full_name: &str) -> bool {
        let name = hierarchical_name(full_name);
        let allowed = self.allow.as_ref().is_none_or(|allow| allow.matches(&name));
        let denied = self.deny.as_ref().is_some_and(|deny| deny.matches(&name));
        allowed && !denied
    }
}

#[derive(Debug, Clone)]
pub struct EnumHook {
    pattern: Regex,
    pub declare_keyword: String,
    pub body_template: String,
}

impl EnumHook {
    /// Fill the body template. Recognised placeholders: `{{Name}}`,
    /// `{{FullName}}` and `{{Namespace}}`.
    pub fn render(&self, name: &str, full_name: &str, namespace: &str) -> String {
        self.body_template
            .replace("{{Name}}", name)
            .replace("{{FullName}}", full_name)
            .replace("{{Namespace}}", namespace)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterConfiguration {
    assemblies: Vec<AssemblyFilter>,
    enum_hooks: Vec<EnumHook>,
    pub collect_all_references: bool,
}

impl FilterConfiguration {
    /// Compile every pattern up front. Any malformed pattern is fatal.
    pub fn compile(config: &GenerateConfig) -> Result<Self, ConfigError> {
        let mut assemblies = Vec::with_capacity(config.assemblies.len());
        for (source, assembly) in &config.assemblies {
            let pattern = Regex::new(&format!("^(?:{source})$"))
                .map_err(|e| ConfigError::AssemblyPattern { pattern: source.clone(), source: e })?;
            let allow = assembly
                .whitelist
                .as_deref()
                .map(|xs| NameSet::compile(source, "whitelist", xs))
                .transpose()?;
            let deny = assembly
                .blacklist
                .as_deref()
                .map(|xs| NameSet::compile(source, "blacklist", xs))
                .transpose()?;
            assemblies.push(AssemblyFilter { source: source.clone(), pattern, allow, deny });
        }

        let mut enum_hooks = Vec::with_capacity(config.enum_generate_hooks.len());
        for hook in &config.enum_generate_hooks {
            let pattern = Regex::new(&hook.pattern)
                .map_err(|e| ConfigError::EnumHookPattern { pattern: hook.pattern.clone(), source: e })?;
            enum_hooks.push(EnumHook {
                pattern,
                declare_keyword: hook.declare_keyword.clone(),
                body_template: hook.body_template.clone(),
            });
        }

        Ok(Self { assemblies, enum_hooks, collect_all_references: config.collect_all_references })
    }

    fn assembly(&self, module: &str) -> Option<&AssemblyFilter> {
        self.assemblies.iter().find(|a| a.pattern.is_match(module))
    }

    /// Is `full_name` in `module` selected for generation?
    /// Modules that match no assembly pattern only serve as a reference pool.
    pub fn is_allowed(&self, module: &str, full_name: &str) -> bool {
        self.assembly(module).is_some_and(|a| a.admits(full_name))
    }

    /// First hook whose pattern matches the enum's full name.
    pub fn enum_hook(&self, full_name: &str) -> Option<&EnumHook> {
        let name = hierarchical_name(full_name);
        self.enum_hooks.iter().find(|h| h.pattern.is_match(&name))
    }

    /// Root types: public, not compiler-generated, admitted by the filter.
    pub fn select_roots<P: MetadataProvider + ?Sized>(&self, provider: &P) -> Vec<TypeKey> {
        let mut roots = Vec::new();
        for module in provider.modules() {
            let Some(assembly) = self.assembly(&module.name) else { continue };
            for def in &module.types {
                if !is_exposed(provider, def) || is_compiler_generated(provider, def) {
                    continue;
                }
                let full_name = def.full_name();
                if assembly.admits(&full_name) {
                    debug!(module = %module.name, assembly = %assembly.source, r#type = %full_name, "root selected");
                    roots.push(def.key());
                }
            }
        }
        roots
    }
}

/// Public, and every enclosing type public too.
fn is_exposed<P: MetadataProvider + ?Sized>(provider: &P, def: &TypeDef) -> bool {
    let mut current = def;
    loop {
        if !current.is_public() {
            return false;
        }
        let Some(outer) = &current.declaring_type else { return true };
        match provider.get(&TypeKey::new(outer, &current.module)) {
            Some(outer_def) => current = outer_def,
            None => return true,
        }
    }
}

/// Compiler-generated types (and anything nested inside one).
pub fn is_compiler_generated<P: MetadataProvider + ?Sized>(provider: &P, def: &TypeDef) -> bool {
    if def.name.starts_with('<') || (!def.is_interface && def.has(Marker::CompilerGenerated)) {
        return true;
    }
    def.declaring_type
        .as_ref()
        .and_then(|outer| provider.get(&TypeKey::new(outer, &def.module)))
        .is_some_and(|outer| is_compiler_generated(provider, outer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(allow: &[&str], deny: &[&str]) -> GenerateConfig {
        let mut assemblies = IndexMap::new();
        assemblies.insert(
            "Game".to_string(),
            AssemblyConfig {
                whitelist: Some(allow.iter().map(|s| s.to_string()).collect()),
                blacklist: Some(deny.iter().map(|s| s.to_string()).collect()),
            },
        );
        GenerateConfig { assemblies, ..GenerateConfig::default() }
    }

    #[test]
    fn deny_beats_allow_and_prefixes_expand() {
        let filter = FilterConfiguration::compile(&config(&["A.B"], &["A.B.C"])).unwrap();
        assert!(!filter.is_allowed("Game", "A.B.C"));
        assert!(filter.is_allowed("Game", "A.B.D"));
        assert!(filter.is_allowed("Game", "A.B"));
        // nested separators are normalized before matching
        assert!(!filter.is_allowed("Game", "A.B/C"));
        assert!(filter.is_allowed("Game", "A.B/D/E"));
        assert!(!filter.is_allowed("Game", "A.X"));
        // prefix expansion works on whole segments only
        assert!(!filter.is_allowed("Game", "A.Bee"));
    }

    #[test]
    fn unmatched_modules_select_nothing() {
        let filter = FilterConfiguration::compile(&config(&["A"], &[])).unwrap();
        assert!(!filter.is_allowed("Game.Extra", "A.B"));
        assert!(!filter.is_allowed("mscorlib", "System.String"));
    }

    #[test]
    fn missing_lists_admit_everything() {
        let mut assemblies = IndexMap::new();
        assemblies.insert("Game.*".to_string(), AssemblyConfig::default());
        let cfg = GenerateConfig { assemblies, ..GenerateConfig::default() };
        let filter = FilterConfiguration::compile(&cfg).unwrap();
        assert!(filter.is_allowed("Game.Core", "Any.Thing"));
    }

    #[test]
    fn malformed_patterns_are_fatal_and_named() {
        let mut assemblies = IndexMap::new();
        assemblies.insert("Game(".to_string(), AssemblyConfig::default());
        let cfg = GenerateConfig { assemblies, ..GenerateConfig::default() };
        let err = FilterConfiguration::compile(&cfg).unwrap_err();
        assert!(err.to_string().contains("Game("));

        let err = FilterConfiguration::compile(&config(&["A..B"], &[])).unwrap_err();
        match err {
            ConfigError::TypeNamePattern { module, list, entry } => {
                assert_eq!(module, "Game");
                assert_eq!(list, "whitelist");
                assert_eq!(entry, "A..B");
            }
            other => panic!("unexpected {other:?}"),
        }

        let cfg = GenerateConfig {
            enum_generate_hooks: vec![EnumHookConfig {
                pattern: "[".into(),
                declare_keyword: "enum".into(),
                body_template: String::new(),
            }],
            ..GenerateConfig::default()
        };
        assert!(matches!(FilterConfiguration::compile(&cfg), Err(ConfigError::EnumHookPattern { .. })));
    }

    #[test]
    fn first_enum_hook_wins() {
        let hook = |pattern: &str, kw: &str| EnumHookConfig {
            pattern: pattern.into(),
            declare_keyword: kw.into(),
            body_template: "{{Name}} in {{Namespace}}".into(),
        };
        let cfg = GenerateConfig {
            enum_generate_hooks: vec![hook("Flags$", "const enum"), hook(".*", "enum")],
            ..GenerateConfig::default()
        };
        let filter = FilterConfiguration::compile(&cfg).unwrap();
        let h = filter.enum_hook("Game.Input/KeyFlags").unwrap();
        assert_eq!(h.declare_keyword, "const enum");
        assert_eq!(h.render("KeyFlags", "Game.Input.KeyFlags", "Game.Input"), "KeyFlags in Game.Input");
        assert_eq!(filter.enum_hook("Game.Color").unwrap().declare_keyword, "enum");
    }

    #[test]
    fn config_file_uses_camel_case_keys() {
        let src = r#"{
            "assemblys": { "Game": { "whitelist": ["Game.Player"] } },
            "enumGenerateHooks": [ { "pattern": "X", "declareKeyword": "enum", "bodyTemplate": "" } ],
            "collectAllReferences": true
        }"#;
        let cfg: GenerateConfig = crate::path_de::from_str_with_path(src).unwrap();
        assert!(cfg.collect_all_references);
        assert_eq!(cfg.enum_generate_hooks.len(), 1);
        assert!(cfg.assemblies["Game"].blacklist.is_none());
    }
}

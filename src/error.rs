//! Error types for the fallible edges of a run.
//!
//! Only configuration and loading problems abort a run. Resolution failures are
//! reported through [`ResolveError`] but the engine always recovers from them
//! locally (opaque entry or dropped member).
use std::path::PathBuf;

use crate::path_de::JsonPathError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid assembly pattern `{pattern}`: {source}")]
    AssemblyPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid enum hook pattern `{pattern}`: {source}")]
    EnumHookPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("malformed type name `{entry}` in {list} of assembly pattern `{module}`")]
    TypeNamePattern {
        module: String,
        list: &'static str,
        entry: String,
    },
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: JsonPathError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("module `{module}` is not loaded (needed for `{full_name}`)")]
    ModuleNotLoaded { module: String, full_name: String },
    #[error("type `{full_name}` not found in module `{module}`")]
    TypeNotFound { module: String, full_name: String },
    #[error("`{0}` is not a named type reference")]
    NotNamed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read metadata file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse metadata file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: JsonPathError,
    },
    #[error("type `{full_name}` is defined twice in module `{module}`")]
    DuplicateType { module: String, full_name: String },
}

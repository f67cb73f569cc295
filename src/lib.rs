//! Generates TypeScript declaration files from CLI type metadata.
//!
//! Pipeline: module dumps ([`metadata::MetadataSet`]) → root selection
//! ([`config::FilterConfiguration`]) → translation and reference closure
//! ([`collect::Collector`]) → descriptor tree ([`ir::GenCodeData`]) →
//! declaration text ([`emit::Codegen`]).
pub mod closure;
pub mod collect;
pub mod config;
pub mod emit;
pub mod error;
pub mod ir;
pub mod logging;
pub mod metadata;
pub mod names;
pub mod path_de;

#[cfg(test)]
mod test_support;

pub use collect::Collector;
pub use config::{FilterConfiguration, GenerateConfig};
pub use emit::Codegen;
pub use ir::GenCodeData;
pub use metadata::{MetadataProvider, MetadataSet};

/// Collect and render in one go.
pub fn generate<P: MetadataProvider + ?Sized>(provider: &P, filter: &FilterConfiguration) -> String {
    let data = Collector::run(provider, filter);
    let mut codegen = Codegen::new();
    codegen.emit(&data);
    codegen.into_string()
}

//! Runs the whole pipeline over every fixture directory and checks run-level
//! invariants that unit tests cannot see.
//!
//! A fixture directory holds `gen.json` (whose `metadataPaths` are relative to
//! it) and optionally `expect.txt`: one expected output line per line, or a
//! line prefixed with `!` that must not appear anywhere.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use colored::Colorize;

use dts_gen::ir::TypeUse;
use dts_gen::{Codegen, Collector, FilterConfiguration, GenCodeData, GenerateConfig, MetadataSet};

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn load_metadata(dir: &Path, config: &GenerateConfig) -> anyhow::Result<MetadataSet> {
    let mut paths = Vec::new();
    for pattern in &config.metadata_paths {
        let pattern = dir.join(pattern);
        for entry in glob::glob(&pattern.to_string_lossy())? {
            paths.push(entry?);
        }
    }
    paths.sort();
    Ok(MetadataSet::load_files(&paths)?)
}

fn check_invariants(data: &GenCodeData, roots: &[dts_gen::ir::TypeKey]) -> Vec<String> {
    let mut failures = Vec::new();
    let mut declared = HashSet::new();
    for ty in data.types() {
        if !declared.insert(ty.key.clone()) {
            failures.push(format!("emitted twice: {}", ty.key));
        }
    }
    for root in roots {
        if !declared.contains(root) {
            failures.push(format!("root missing from output: {root}"));
        }
    }
    for ty in data.types() {
        let mut uses: Vec<&TypeUse> = Vec::new();
        uses.extend(ty.base_type.iter());
        uses.extend(ty.interfaces.iter());
        uses.extend(ty.properties.iter().map(|p| &p.property_type));
        for m in ty.methods.iter().chain(ty.extension_methods.iter()) {
            uses.push(&m.return_type);
            uses.extend(m.parameters.iter().map(|p| &p.ty));
        }
        if let Some(sig) = &ty.delegate {
            uses.push(&sig.return_type);
            uses.extend(sig.parameters.iter().map(|p| &p.ty));
        }
        for used in uses {
            if let Some(key) = &used.key {
                if !declared.contains(key) {
                    failures.push(format!("{} references undeclared {}", ty.key, key));
                }
            }
        }
    }
    failures
}

fn check_expectations(dir: &Path, rendered: &str) -> anyhow::Result<Vec<String>> {
    let path = dir.join("expect.txt");
    if !path.exists() {
        return Ok(Vec::new());
    }
    let expect = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let lines: Vec<&str> = rendered.lines().map(str::trim).collect();
    let mut failures = Vec::new();
    for wanted in expect.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match wanted.strip_prefix('!') {
            Some(banned) if rendered.contains(banned) => failures.push(format!("unexpected output: {banned}")),
            Some(_) => {}
            None if !lines.contains(&wanted) => failures.push(format!("missing line: {wanted}")),
            None => {}
        }
    }
    Ok(failures)
}

fn run_fixture(dir: &Path) -> anyhow::Result<Vec<String>> {
    let config = GenerateConfig::load(&dir.join("gen.json"))?;
    let filter = FilterConfiguration::compile(&config)?;
    let metadata = load_metadata(dir, &config)?;
    let roots = filter.select_roots(&metadata);

    let data = Collector::run(&metadata, &filter);
    let mut failures = check_invariants(&data, &roots);

    // a second run over the same inputs must produce the same tree
    let again = Collector::run(&metadata, &filter);
    if serde_json::to_value(&data)? != serde_json::to_value(&again)? {
        failures.push("collection is not deterministic".to_string());
    }

    let mut codegen = Codegen::new();
    codegen.emit(&data);
    let rendered = codegen.into_string();
    failures.extend(check_expectations(dir, &rendered)?);
    Ok(failures)
}

fn main() -> anyhow::Result<()> {
    let mut dirs = std::fs::read_dir(fixtures_root())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.join("gen.json").exists())
        .collect::<Vec<_>>();
    dirs.sort();

    let mut failed = 0;
    for dir in &dirs {
        let name = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        match run_fixture(dir) {
            Ok(failures) if failures.is_empty() => eprintln!("✅ {}", name.green()),
            Ok(failures) => {
                failed += 1;
                eprintln!("❌ {}", name.red());
                for failure in failures {
                    eprintln!("   {failure}");
                }
            }
            Err(error) => {
                failed += 1;
                eprintln!("❌ {}: {error:#}", name.red());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} fixtures failed", dirs.len());
    }
    Ok(())
}

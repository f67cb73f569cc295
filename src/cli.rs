//! CLI: metadata dumps + generator config → (declarations | descriptor model)
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use dts_gen::{Codegen, Collector, FilterConfiguration, GenCodeData, GenerateConfig, MetadataSet};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate TypeScript declarations from CLI type metadata dumps
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// collect and print the declaration file
    Dts(DtsOut),
    /// collect and print the descriptor tree as JSON
    Model(ModelOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// generator configuration (JSON)
    #[arg(long, short)]
    config: PathBuf,

    /// Module dumps. May be literal paths or quoted glob patterns.
    ///
    /// Falls back to `metadataPaths` from the config (relative to the config file).
    #[arg(long, short, num_args = 1..)]
    input: Vec<String>,

    /// declare referenced types with their full member lists
    #[arg(long, default_value_t = false)]
    collect_all_references: bool,
}

#[derive(clap::Parser, Debug)]
struct DtsOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .d.ts file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ModelOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn collect(&self) -> anyhow::Result<GenCodeData> {
        let mut config = GenerateConfig::load(&self.config)?;
        config.collect_all_references |= self.collect_all_references;
        let filter = FilterConfiguration::compile(&config)
            .with_context(|| format!("invalid configuration in {}", self.config.display()))?;

        let patterns = if self.input.is_empty() {
            let base = self.config.parent().unwrap_or(Path::new("."));
            config.metadata_paths.iter().map(|p| relative_to(base, p)).collect::<Vec<_>>()
        } else {
            self.input.clone()
        };
        if patterns.is_empty() {
            bail!("no metadata inputs: pass --input or set `metadataPaths` in {}", self.config.display());
        }
        let paths = resolve_file_path_patterns(&patterns)?;
        let metadata = MetadataSet::load_files(&paths)?;
        eprintln!(
            "{} {} modules, {} types",
            "loaded".green().bold(),
            paths.len(),
            metadata.type_count()
        );
        Ok(Collector::run(&metadata, &filter))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Dts(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let data = target.input_settings.collect()?;
                let mut codegen = Codegen::new();
                codegen.emit(&data);
                write_output(target.out.as_deref(), &codegen.into_string(), data.types().count())
            }
            Command::Model(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let data = target.input_settings.collect()?;
                let model = serde_json::to_string_pretty(&data).context("failed to serialize descriptor tree")?;
                write_output(target.out.as_deref(), &model, data.types().count())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, source: &str, type_count: usize) -> anyhow::Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, source).with_context(|| format!("failed to write {}", out.display()))?;
            eprintln!("{} {} types → {}", "wrote".green().bold(), type_count, out.display());
        }
        None => println!("{source}"),
    }
    Ok(())
}

fn relative_to(base: &Path, pattern: &str) -> String {
    if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        base.join(pattern).to_string_lossy().into_owned()
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

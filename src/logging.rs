//! Diagnostic logging for generator runs.
//!
//! Output format is controlled by `DTS_GEN_LOG_FORMAT`:
//!
//! - `text` (default): flat `tracing-subscriber` lines
//! - `json`: one JSON object per event
//!
//! ```bash
//! # which roots were selected and why members were dropped
//! DTS_GEN_LOG=dts_gen::config=debug,dts_gen::collect=trace dts-gen dts --config gen.json
//!
//! DTS_GEN_LOG=debug DTS_GEN_LOG_FORMAT=json dts-gen model --config gen.json
//! ```
//!
//! Nothing is installed unless `DTS_GEN_LOG` (or `RUST_LOG`) is set.
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("DTS_GEN_LOG_FORMAT").unwrap_or_default())
    }
}

/// `DTS_GEN_LOG` wins over `RUST_LOG` when both are set.
fn build_filter() -> EnvFilter {
    match std::env::var("DTS_GEN_LOG") {
        Ok(directives) => EnvFilter::builder().parse_lossy(directives),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Install the global subscriber. Output always goes to stderr; stdout may
/// carry the generated declarations.
pub fn init_tracing() {
    if std::env::var_os("DTS_GEN_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Json => {
            let layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_formats_fall_back_to_text() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("tree"), LogFormat::Text);
        assert_eq!(LogFormat::parse(""), LogFormat::Text);
    }
}

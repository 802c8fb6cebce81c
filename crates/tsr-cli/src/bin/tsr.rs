//! The `tsr` binary.
//!
//! The frontend (lexer + parser) is supplied by the embedding collaborator;
//! without one linked, this binary covers the configuration surface:
//! resolving and printing project config, and validating package
//! descriptors.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use tsr_cli::args::CliArgs;
use tsr_cli::config::{CompilerConfig, PackageDescriptor};
use tsr_cli::trace::init_tracing;

fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let project_dir = args
        .project
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let config_path = if project_dir.is_dir() {
        project_dir.join("tsrconfig.json")
    } else {
        project_dir.clone()
    };

    if args.show_config {
        let config = if config_path.is_file() {
            CompilerConfig::from_file(&config_path)?
        } else {
            CompilerConfig::default()
        };
        println!("{}", serde_json::to_string_pretty(&ShowConfig::from(&config))?);
        return Ok(());
    }

    if args.check_package {
        let package_path = project_dir.join("package.json");
        let text = std::fs::read_to_string(&package_path)
            .with_context(|| format!("reading '{}'", package_path.display()))?;
        let descriptor = PackageDescriptor::from_text(&text)
            .with_context(|| format!("validating '{}'", package_path.display()))?;
        println!("ok: {} {}", descriptor.name, descriptor.version);
        return Ok(());
    }

    if args.entry.is_some() {
        bail!(
            "no frontend is linked into this binary; embed tsr-cli as a library \
             and supply a parser through `FsHost::new`"
        );
    }

    bail!("nothing to do; try --showConfig or --checkPackage")
}

/// Serializable view of the resolved configuration.
#[derive(serde::Serialize)]
struct ShowConfig {
    strict: bool,
    out_dir: Option<String>,
    root_dir: Option<String>,
    target: Option<String>,
    namespace: Option<String>,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl From<&CompilerConfig> for ShowConfig {
    fn from(config: &CompilerConfig) -> Self {
        ShowConfig {
            strict: config.compiler_options.strict,
            out_dir: config.compiler_options.out_dir.clone(),
            root_dir: config.compiler_options.root_dir.clone(),
            target: config.compiler_options.target.clone(),
            namespace: config.compiler_options.namespace.clone(),
            include: config.include.clone(),
            exclude: config.exclude.clone(),
        }
    }
}

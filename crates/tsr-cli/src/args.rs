//! Command-line arguments for the `tsr` binary.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tsr", version, about = "TypeScript static semantics and execution pipeline")]
pub struct CliArgs {
    /// Entry file to load (requires a linked frontend).
    pub entry: Option<PathBuf>,

    /// Path to tsrconfig.json or a directory containing it.
    #[arg(short = 'p', long = "project")]
    pub project: Option<PathBuf>,

    /// Print the resolved configuration instead of building.
    #[arg(long = "showConfig", alias = "show-config")]
    pub show_config: bool,

    /// Validate the package descriptor in the project directory.
    #[arg(long = "checkPackage", alias = "check-package")]
    pub check_package: bool,

    /// Disable colored diagnostic output.
    #[arg(long = "noPretty", alias = "no-pretty")]
    pub no_pretty: bool,
}

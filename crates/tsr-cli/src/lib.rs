//! Driver and host-facing surface for tsr.
//!
//! The lexer and parser live with the embedding host; everything from
//! module loading to lowering is driven from here through programmatic
//! entry points (`Driver::load_entry`, `check_all`, `lower_module`) and
//! handed to a [`driver::Backend`] for execution or emission.
//!
//! - `args` - command-line surface for the collaborator binary
//! - `config` - lenient tsconfig-like reader, strict package descriptor
//! - `driver` - pipeline orchestration and the backend seam
//! - `render` - human-readable diagnostic output
//! - `trace` - tracing-subscriber initialization

pub mod args;
pub mod config;
pub mod driver;
pub mod render;
pub mod trace;

pub use config::{CompilerConfig, PackageDescriptor};
pub use driver::{Backend, Driver, LoweredModule, TypeEnvironment};

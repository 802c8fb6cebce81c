//! Module graph for tsr.
//!
//! Given an entry path, this crate resolves specifiers, loads and parses
//! files through the `CompileHost` seam, detects dependency cycles, and
//! produces a topologically ordered module list for the checker.
//!
//! - `resolve` - specifier resolution (relative paths, builtins, packages)
//! - `loader` - the memoized loading protocol and ordering
//! - `imports` - specifier collection from parsed trees

pub mod imports;
pub mod loader;
pub mod resolve;

pub use loader::{LoadError, ModuleLoader};
pub use resolve::{is_builtin_specifier, resolve_specifier, BUILTIN_PREFIX};

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tsr_ast::SourceFile;
use tsr_common::Diagnostic;
use tsr_types::TypeId;

/// Index of a module in the loader's table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

/// Script vs module, decided by the presence of import/export syntax,
/// except that being imported makes any file a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleKind {
    Script,
    Module,
}

/// A loaded module. Owned by the loader's cache for the whole session.
#[derive(Debug)]
pub struct Module {
    pub path: PathBuf,
    pub kind: ModuleKind,
    /// Parsed tree; `None` only for builtins, which have no source text.
    pub source: Option<SourceFile>,
    /// Static imports, re-exports, and require-style imports, in source order.
    pub dependencies: Vec<ModuleId>,
    /// `/// <reference path>` targets. Only a Script may have these.
    pub referenced_scripts: Vec<ModuleId>,
    /// Exported name -> type, filled in by the checker.
    pub exports: FxHashMap<String, TypeId>,
    pub default_export: Option<TypeId>,
    pub is_type_checked: bool,
    pub is_builtin: bool,
}

impl Module {
    fn builtin(path: PathBuf) -> Self {
        Module {
            path,
            kind: ModuleKind::Module,
            source: None,
            dependencies: Vec::new(),
            referenced_scripts: Vec::new(),
            exports: FxHashMap::default(),
            default_export: None,
            is_type_checked: true,
            is_builtin: true,
        }
    }
}

/// The seam to the host environment: file access and the external parser.
pub trait CompileHost {
    fn read_file(&self, path: &Path) -> anyhow::Result<String>;
    fn file_exists(&self, path: &Path) -> bool;
    /// Parse source text into a tree. Parse failures are diagnostics.
    fn parse(&self, path: &Path, source: &str) -> Result<SourceFile, Diagnostic>;
    /// Canonicalize a path for cache keying. The default is lexical
    /// normalization so in-memory hosts work without a real filesystem.
    fn canonicalize(&self, path: &Path) -> PathBuf {
        normalize_path(path)
    }
}

/// Lexically normalize `.` and `..` segments without touching the disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

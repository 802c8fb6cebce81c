//! Specifier resolution.
//!
//! Three specifier classes, tried in this order:
//! 1. relative or absolute paths, with extension completion (as written,
//!    `.ts` appended, `/index.ts` as a directory)
//! 2. builtin module names: a closed registry resolving to synthetic paths
//!    behind a reserved prefix, never read from disk
//! 3. package names, resolved by walking upward from the importing file
//!    through `node_modules` directories; first hit wins

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

use crate::CompileHost;

/// Reserved prefix for synthetic builtin paths.
pub const BUILTIN_PREFIX: &str = "tsr:builtin/";

/// The closed set of builtin module names.
static BUILTIN_MODULES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "assert", "buffer", "console", "fs", "os", "path", "process", "stream", "timers", "util",
    ]
    .into_iter()
    .collect()
});

pub fn is_builtin_specifier(specifier: &str) -> bool {
    BUILTIN_MODULES.contains(specifier)
}

/// Synthetic path for a builtin module name.
pub fn builtin_path(name: &str) -> PathBuf {
    PathBuf::from(format!("{BUILTIN_PREFIX}{name}"))
}

pub fn is_builtin_path(path: &Path) -> bool {
    path.to_string_lossy().starts_with(BUILTIN_PREFIX)
}

/// Resolve a specifier relative to the importing file. `None` when nothing
/// matched; the caller reports the resolution diagnostic.
pub fn resolve_specifier(
    host: &dyn CompileHost,
    importer: &Path,
    specifier: &str,
) -> Option<PathBuf> {
    if specifier.starts_with("./")
        || specifier.starts_with("../")
        || Path::new(specifier).is_absolute()
    {
        let base = importer.parent().unwrap_or_else(|| Path::new(""));
        let candidate = if Path::new(specifier).is_absolute() {
            PathBuf::from(specifier)
        } else {
            base.join(specifier)
        };
        return complete_extension(host, &candidate);
    }

    if is_builtin_specifier(specifier) {
        return Some(builtin_path(specifier));
    }

    resolve_package(host, importer, specifier)
}

/// Extension completion: as written, then `.ts`, then `<dir>/index.ts`.
fn complete_extension(host: &dyn CompileHost, candidate: &Path) -> Option<PathBuf> {
    let normalized = host.canonicalize(candidate);
    if host.file_exists(&normalized) {
        return Some(normalized);
    }
    let with_ts = append_extension(&normalized, "ts");
    if host.file_exists(&with_ts) {
        return Some(with_ts);
    }
    let index = normalized.join("index.ts");
    if host.file_exists(&index) {
        return Some(index);
    }
    None
}

/// Walk upward from the importer looking for
/// `node_modules/<name>/index.ts` or `node_modules/<name>.ts`.
fn resolve_package(host: &dyn CompileHost, importer: &Path, name: &str) -> Option<PathBuf> {
    let mut current = importer.parent();
    while let Some(dir) = current {
        let package_dir = dir.join("node_modules").join(name).join("index.ts");
        if host.file_exists(&package_dir) {
            return Some(package_dir);
        }
        let package_file = append_extension(&dir.join("node_modules").join(name), "ts");
        if host.file_exists(&package_file) {
            return Some(package_file);
        }
        current = dir.parent();
    }
    None
}

/// Append (not replace) an extension: `a.b` -> `a.b.ts`.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

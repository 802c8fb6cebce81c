//! Pipeline orchestration: load, check, lower, hand to a backend.
//!
//! The driver owns the interner and the module loader; the host supplies
//! file access and the parser through `CompileHost`. Backends sit below the
//! lowering boundary and consume `(LoweredModule, TypeEnvironment,
//! Vec<AsyncMachine>)`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info_span;
use tsr_ast::SourceFile;
use tsr_checker::check_module_full;
use tsr_common::Diagnostic;
use tsr_lowering::{lower_module, AsyncMachine};
use tsr_modules::{CompileHost, ModuleId, ModuleLoader};
use tsr_types::{TypeId, TypeInterner};

/// The checker's environment as backends see it.
pub struct TypeEnvironment<'a> {
    pub db: &'a TypeInterner,
}

/// One module after checking and lowering.
pub struct LoweredModule<'a> {
    pub id: ModuleId,
    pub path: &'a Path,
    pub source: &'a SourceFile,
}

/// The execution/emission seam. Implementations interpret the module or
/// emit native code for it.
pub trait Backend {
    fn consume(
        &mut self,
        module: &LoweredModule<'_>,
        env: &TypeEnvironment<'_>,
        machines: &[AsyncMachine],
    ) -> Result<()>;
}

pub struct Driver<'h> {
    pub db: TypeInterner,
    loader: ModuleLoader<'h>,
    diagnostics: Vec<Diagnostic>,
    entry: Option<ModuleId>,
    /// Optional user-chosen namespace for qualified class names.
    pub namespace: Option<String>,
}

impl<'h> Driver<'h> {
    pub fn new(host: &'h dyn CompileHost) -> Self {
        Driver {
            db: TypeInterner::new(),
            loader: ModuleLoader::new(host),
            diagnostics: Vec::new(),
            entry: None,
            namespace: None,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn loader(&self) -> &ModuleLoader<'h> {
        &self.loader
    }

    /// Load the entry file and its transitive graph.
    pub fn load_entry(&mut self, path: &Path) -> Result<ModuleId> {
        let span = info_span!("load", entry = %path.display());
        let _guard = span.enter();
        match self.loader.load_entry(path) {
            Ok(id) => {
                self.entry = Some(id);
                Ok(id)
            }
            Err(err) => {
                self.diagnostics.push(err.diagnostic.clone());
                Err(err.into())
            }
        }
    }

    /// Check every loaded module in dependency order, recording export
    /// tables. Returns true when no errors were produced.
    pub fn check_all(&mut self) -> bool {
        let Some(entry) = self.entry else {
            return true;
        };
        let order = self.loader.ordered_modules(entry);
        for id in order {
            let module = self.loader.module(id);
            if module.is_type_checked {
                continue;
            }
            let Some(source) = &module.source else {
                continue;
            };
            let span = info_span!("check", module = %module.path.display());
            let _guard = span.enter();

            let result = check_module_full(&self.db, source);
            self.diagnostics.extend(result.diagnostics);

            let module = self.loader.module_mut(id);
            for (name, type_id) in result.exports {
                module.exports.insert(name, type_id);
            }
            module.default_export = result.default_export;
            module.is_type_checked = true;
        }
        !self.diagnostics.iter().any(|d| d.is_error())
    }

    /// Lower one module's async and generator functions.
    pub fn lower_module(&self, id: ModuleId) -> Vec<AsyncMachine> {
        let module = self.loader.module(id);
        let Some(source) = &module.source else {
            return Vec::new();
        };
        // Frame slots default to any; the embedding checker hook can refine.
        lower_module(source, &|_| TypeId::ANY)
    }

    /// Run the full pipeline and feed each module to the backend in
    /// dependency order.
    pub fn run(&mut self, backend: &mut dyn Backend) -> Result<()> {
        let Some(entry) = self.entry else {
            anyhow::bail!("no entry module loaded");
        };
        if !self.check_all() {
            anyhow::bail!("type checking failed with {} diagnostics", self.diagnostics.len());
        }
        let env = TypeEnvironment { db: &self.db };
        for id in self.loader.ordered_modules(entry) {
            let module = self.loader.module(id);
            let Some(source) = &module.source else {
                continue;
            };
            let machines = lower_module(source, &|_| TypeId::ANY);
            let lowered = LoweredModule {
                id,
                path: &module.path,
                source,
            };
            backend.consume(&lowered, &env, &machines)?;
        }
        Ok(())
    }

    /// The `resolve` hook for classes: the globally-qualified name of a
    /// simple name in a module context.
    pub fn qualified_class_name(&self, module_path: &Path, name: &str) -> String {
        qualified_name(module_path, self.namespace.as_deref(), name)
    }
}

/// Reserved sigil prefixing every globally-qualified name.
const QUALIFIED_SIGIL: &str = "$";

/// `module path + optional namespace + name`, sanitized so slashes, dots,
/// and hyphens become underscores.
pub fn qualified_name(module_path: &Path, namespace: Option<&str>, name: &str) -> String {
    let stem = module_path.with_extension("");
    let sanitized = sanitize(&stem.to_string_lossy());
    match namespace {
        Some(ns) => format!("{QUALIFIED_SIGIL}{}_{}_{name}", sanitize(ns), sanitized),
        None => format!("{QUALIFIED_SIGIL}{sanitized}_{name}"),
    }
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '/' | '\\' | '.' | '-' | ':' => '_',
            c => c,
        })
        .collect::<String>()
        .trim_start_matches('_')
        .to_string()
}

/// A disk-backed host. The parser still comes from the embedding
/// collaborator; this only wires file access.
pub struct FsHost {
    parser: Box<dyn Fn(&Path, &str) -> Result<SourceFile, Diagnostic>>,
}

impl FsHost {
    pub fn new(parser: Box<dyn Fn(&Path, &str) -> Result<SourceFile, Diagnostic>>) -> Self {
        FsHost { parser }
    }
}

impl CompileHost for FsHost {
    fn read_file(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn parse(&self, path: &Path, source: &str) -> Result<SourceFile, Diagnostic> {
        (self.parser)(path, source)
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap_or_else(|_| tsr_modules::normalize_path(path))
    }
}

//! The loading protocol.
//!
//! `load()` is memoized on the canonical absolute path. A path found on the
//! in-progress stack is a circular dependency and aborts loading. Otherwise:
//! read, parse, classify script-vs-module, process reference directives,
//! cache, then recursively load every static import. Each transitively
//! imported file is forced to `Module` kind, because being imported defines
//! it as a module. Dynamic-import string literals load best-effort at the
//! end; their failures are swallowed (the runtime rejects the promise).

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::debug;
use tsr_common::diagnostics::{codes, format_message, messages};
use tsr_common::{Diagnostic, Span};

use crate::resolve::{is_builtin_path, resolve_specifier};
use crate::{imports, CompileHost, Module, ModuleId, ModuleKind};

/// A loading failure, carrying the diagnostic the driver surfaces.
#[derive(Debug)]
pub struct LoadError {
    pub diagnostic: Diagnostic,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diagnostic.message_text)
    }
}

impl std::error::Error for LoadError {}

impl LoadError {
    fn new(file: &Path, message: String, code: u32) -> Self {
        LoadError {
            diagnostic: Diagnostic::error(
                file.display().to_string(),
                Span::dummy(),
                message,
                code,
            ),
        }
    }
}

pub struct ModuleLoader<'a> {
    host: &'a dyn CompileHost,
    /// Canonical path -> module. Insertion order is load completion order.
    cache: IndexMap<PathBuf, ModuleId>,
    modules: Vec<Module>,
    /// Paths currently being loaded, outermost first.
    in_progress: Vec<PathBuf>,
}

impl<'a> ModuleLoader<'a> {
    pub fn new(host: &'a dyn CompileHost) -> Self {
        ModuleLoader {
            host,
            cache: IndexMap::new(),
            modules: Vec::new(),
            in_progress: Vec::new(),
        }
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0 as usize]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0 as usize]
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i as u32), m))
    }

    pub fn by_path(&self, path: &Path) -> Option<ModuleId> {
        self.cache.get(&self.host.canonicalize(path)).copied()
    }

    /// Load an entry file and its transitive graph.
    pub fn load_entry(&mut self, path: &Path) -> Result<ModuleId, LoadError> {
        self.load(path, false)
    }

    fn load(&mut self, path: &Path, as_import: bool) -> Result<ModuleId, LoadError> {
        let canonical = self.host.canonicalize(path);

        // Cycle check precedes memoization: a cached id for an in-flight
        // module must not hide the cycle.
        if self.in_progress.contains(&canonical) {
            let chain: Vec<String> = self
                .in_progress
                .iter()
                .map(|p| p.display().to_string())
                .chain(std::iter::once(canonical.display().to_string()))
                .collect();
            let message = format!(
                "{} Import chain: {}.",
                format_message(
                    messages::CIRCULAR_DEPENDENCY,
                    &[&canonical.display().to_string()],
                ),
                chain.join(" -> "),
            );
            return Err(LoadError::new(
                &canonical,
                message,
                codes::CIRCULAR_DEPENDENCY,
            ));
        }
        if let Some(&id) = self.cache.get(&canonical) {
            // Importing a cached script still promotes it to a module.
            if as_import {
                self.modules[id.0 as usize].kind = ModuleKind::Module;
            }
            return Ok(id);
        }

        if is_builtin_path(&canonical) {
            let id = ModuleId(self.modules.len() as u32);
            self.modules.push(Module::builtin(canonical.clone()));
            self.cache.insert(canonical, id);
            return Ok(id);
        }

        debug!(path = %canonical.display(), "loading module");
        let source_text = self.host.read_file(&canonical).map_err(|err| {
            LoadError::new(
                &canonical,
                format!("Cannot read file '{}': {err}.", canonical.display()),
                codes::CANNOT_RESOLVE_MODULE,
            )
        })?;
        let file = self
            .host
            .parse(&canonical, &source_text)
            .map_err(|diagnostic| LoadError { diagnostic })?;

        let kind = if as_import || file.has_module_syntax() {
            ModuleKind::Module
        } else {
            ModuleKind::Script
        };

        let collected = imports::collect_imports(&file);
        let reference_paths = file.reference_paths.clone();

        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(Module {
            path: canonical.clone(),
            kind,
            source: Some(file),
            dependencies: Vec::new(),
            referenced_scripts: Vec::new(),
            exports: rustc_hash::FxHashMap::default(),
            default_export: None,
            is_type_checked: false,
            is_builtin: false,
        });
        self.cache.insert(canonical.clone(), id);
        self.in_progress.push(canonical.clone());

        let result = self.load_children(id, &canonical, kind, &reference_paths, &collected);
        self.in_progress.pop();
        result?;
        Ok(id)
    }

    fn load_children(
        &mut self,
        id: ModuleId,
        canonical: &Path,
        kind: ModuleKind,
        reference_paths: &[String],
        collected: &imports::CollectedImports,
    ) -> Result<(), LoadError> {
        // Reference directives are a script-only feature; they load before
        // the regular dependencies and must themselves be scripts.
        if kind == ModuleKind::Script {
            for reference in reference_paths {
                let target = self.resolve_or_fail(canonical, reference)?;
                let target_id = self.load(&target, false)?;
                if self.module(target_id).kind == ModuleKind::Module {
                    let message = format_message(
                        messages::SCRIPT_REFERENCES_MODULE,
                        &[
                            &canonical.display().to_string(),
                            &target.display().to_string(),
                        ],
                    );
                    return Err(LoadError::new(
                        canonical,
                        message,
                        codes::SCRIPT_REFERENCES_MODULE,
                    ));
                }
                self.module_mut(id).referenced_scripts.push(target_id);
            }
        } else if !reference_paths.is_empty() {
            debug!(
                path = %canonical.display(),
                "ignoring reference directives in a module"
            );
        }

        for specifier in &collected.static_specifiers {
            let target = self.resolve_or_fail(canonical, specifier)?;
            let dep_id = self.load(&target, true)?;
            if !self.module(id).dependencies.contains(&dep_id) {
                self.module_mut(id).dependencies.push(dep_id);
            }
        }

        // Dynamic imports are best-effort: resolution or load failures are
        // swallowed here and surface as rejected promises at run time.
        for specifier in &collected.dynamic_specifiers {
            match resolve_specifier(self.host, canonical, specifier) {
                Some(target) => {
                    if let Err(err) = self.load(&target, true) {
                        debug!(
                            specifier,
                            error = %err,
                            "dynamic import failed to load; deferring to runtime"
                        );
                    }
                }
                None => {
                    debug!(specifier, "dynamic import did not resolve; deferring to runtime");
                }
            }
        }
        Ok(())
    }

    fn resolve_or_fail(&self, importer: &Path, specifier: &str) -> Result<PathBuf, LoadError> {
        resolve_specifier(self.host, importer, specifier).ok_or_else(|| {
            let message = format_message(
                messages::CANNOT_RESOLVE_MODULE,
                &[specifier, &importer.display().to_string()],
            );
            LoadError::new(importer, message, codes::CANNOT_RESOLVE_MODULE)
        })
    }

    /// Post-order DFS over the graph: script references first (they feed the
    /// global scope), then dependencies, then the module itself. The output
    /// is duplicate-free and is a valid topological sort because the load
    /// phase already rejected cycles.
    pub fn ordered_modules(&self, entry: ModuleId) -> Vec<ModuleId> {
        let mut order = Vec::new();
        let mut visited = FxHashSet::default();
        self.visit_post_order(entry, &mut visited, &mut order);
        order
    }

    fn visit_post_order(
        &self,
        id: ModuleId,
        visited: &mut FxHashSet<ModuleId>,
        order: &mut Vec<ModuleId>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let module = self.module(id);
        for &reference in &module.referenced_scripts {
            self.visit_post_order(reference, visited, order);
        }
        for &dep in &module.dependencies {
            self.visit_post_order(dep, visited, order);
        }
        order.push(id);
    }
}

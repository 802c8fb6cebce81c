//! Loader tests against an in-memory host: the parser is external to this
//! workspace, so the host hands back pre-built trees.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tsr_ast::{
    expr::{Expr, ExprKind, Literal},
    stmt::{ExportDecl, ImportDecl, Stmt, StmtKind},
    SourceFile,
};
use tsr_common::{Diagnostic, Span};
use tsr_modules::{CompileHost, ModuleKind, ModuleLoader, BUILTIN_PREFIX};

#[derive(Default)]
struct MemoryHost {
    files: RefCell<FxHashMap<PathBuf, SourceFile>>,
}

impl MemoryHost {
    fn add(&self, path: &str, file: SourceFile) {
        self.files.borrow_mut().insert(PathBuf::from(path), file);
    }
}

impl CompileHost for MemoryHost {
    fn read_file(&self, path: &Path) -> anyhow::Result<String> {
        if self.files.borrow().contains_key(path) {
            Ok(String::new())
        } else {
            anyhow::bail!("no such file: {}", path.display())
        }
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn parse(&self, path: &Path, _source: &str) -> Result<SourceFile, Diagnostic> {
        Ok(self.files.borrow().get(path).cloned().expect("parse of unknown file"))
    }
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, Span::dummy(), 1)
}

fn import_stmt(specifier: &str) -> Stmt {
    stmt(StmtKind::Import(ImportDecl {
        specifier: specifier.into(),
        default_binding: None,
        named_bindings: vec![("x".into(), "x".into())],
        namespace_binding: None,
    }))
}

fn reexport_stmt(specifier: &str) -> Stmt {
    stmt(StmtKind::Export(ExportDecl {
        declaration: None,
        named: vec![("y".into(), "y".into())],
        from_module_path: Some(specifier.into()),
        default_expr: None,
    }))
}

fn dynamic_import_stmt(specifier: &str) -> Stmt {
    let arg = Expr::new(
        ExprKind::Literal(Literal::String(specifier.into())),
        Span::dummy(),
        1,
    );
    stmt(StmtKind::Expression(Expr::new(
        ExprKind::DynamicImport(Box::new(arg)),
        Span::dummy(),
        1,
    )))
}

fn module_file(path: &str, statements: Vec<Stmt>) -> SourceFile {
    SourceFile::new(path.into(), statements)
}

fn script_file(path: &str, references: Vec<&str>) -> SourceFile {
    let mut file = SourceFile::new(path.into(), vec![]);
    file.reference_paths = references.into_iter().map(String::from).collect();
    file
}

#[test]
fn import_cycle_is_a_hard_error_naming_the_chain() {
    let host = MemoryHost::default();
    host.add("/p/a.ts", module_file("/p/a.ts", vec![import_stmt("./b")]));
    host.add("/p/b.ts", module_file("/p/b.ts", vec![import_stmt("./a")]));

    let mut loader = ModuleLoader::new(&host);
    let err = loader.load_entry(Path::new("/p/a.ts")).unwrap_err();
    assert!(err.diagnostic.message_text.contains("Circular dependency"));
    assert!(err.diagnostic.message_text.contains("/p/b.ts"));
}

#[test]
fn diamond_dependency_loads_each_file_once() {
    let host = MemoryHost::default();
    host.add(
        "/p/main.ts",
        module_file("/p/main.ts", vec![import_stmt("./left"), import_stmt("./right")]),
    );
    host.add(
        "/p/left.ts",
        module_file("/p/left.ts", vec![import_stmt("./shared")]),
    );
    host.add(
        "/p/right.ts",
        module_file("/p/right.ts", vec![import_stmt("./shared")]),
    );
    host.add("/p/shared.ts", module_file("/p/shared.ts", vec![]));

    let mut loader = ModuleLoader::new(&host);
    let entry = loader.load_entry(Path::new("/p/main.ts")).unwrap();
    assert_eq!(loader.modules().count(), 4);

    let order = loader.ordered_modules(entry);
    assert_eq!(order.len(), 4);
    // Topological: every dependency precedes its importer.
    let position = |path: &str| {
        order
            .iter()
            .position(|&id| loader.module(id).path == Path::new(path))
            .unwrap()
    };
    assert!(position("/p/shared.ts") < position("/p/left.ts"));
    assert!(position("/p/shared.ts") < position("/p/right.ts"));
    assert!(position("/p/left.ts") < position("/p/main.ts"));
    assert!(position("/p/right.ts") < position("/p/main.ts"));
}

#[test]
fn imported_script_shaped_file_becomes_a_module() {
    let host = MemoryHost::default();
    host.add("/p/a.ts", module_file("/p/a.ts", vec![import_stmt("./plain")]));
    // plain.ts has no imports or exports: script-shaped.
    host.add("/p/plain.ts", module_file("/p/plain.ts", vec![]));

    let mut loader = ModuleLoader::new(&host);
    loader.load_entry(Path::new("/p/a.ts")).unwrap();
    let plain = loader.by_path(Path::new("/p/plain.ts")).unwrap();
    assert_eq!(loader.module(plain).kind, ModuleKind::Module);
}

#[test]
fn entry_without_module_syntax_stays_a_script() {
    let host = MemoryHost::default();
    host.add("/p/main.ts", script_file("/p/main.ts", vec![]));
    let mut loader = ModuleLoader::new(&host);
    let entry = loader.load_entry(Path::new("/p/main.ts")).unwrap();
    assert_eq!(loader.module(entry).kind, ModuleKind::Script);
}

#[test]
fn script_referencing_a_module_is_an_error() {
    let host = MemoryHost::default();
    host.add("/p/main.ts", script_file("/p/main.ts", vec!["./lib.ts"]));
    host.add(
        "/p/lib.ts",
        module_file("/p/lib.ts", vec![reexport_stmt("./other")]),
    );
    host.add("/p/other.ts", module_file("/p/other.ts", vec![]));

    let mut loader = ModuleLoader::new(&host);
    let err = loader.load_entry(Path::new("/p/main.ts")).unwrap_err();
    assert!(err.diagnostic.message_text.contains("/p/lib.ts"));
    assert!(err.diagnostic.message_text.contains("module"));
}

#[test]
fn script_references_precede_dependencies_in_the_order() {
    let host = MemoryHost::default();
    let mut main = script_file("/p/main.ts", vec!["./globals.ts"]);
    main.statements = vec![];
    host.add("/p/main.ts", main);
    host.add("/p/globals.ts", script_file("/p/globals.ts", vec![]));

    let mut loader = ModuleLoader::new(&host);
    let entry = loader.load_entry(Path::new("/p/main.ts")).unwrap();
    let order = loader.ordered_modules(entry);
    assert_eq!(loader.module(order[0]).path, Path::new("/p/globals.ts"));
    assert_eq!(loader.module(order[1]).path, Path::new("/p/main.ts"));
    // The referenced file stays a script.
    assert_eq!(loader.module(order[0]).kind, ModuleKind::Script);
}

#[test]
fn extension_completion_tries_ts_then_index() {
    let host = MemoryHost::default();
    host.add(
        "/p/main.ts",
        module_file("/p/main.ts", vec![import_stmt("./dir"), import_stmt("./file")]),
    );
    host.add("/p/dir/index.ts", module_file("/p/dir/index.ts", vec![]));
    host.add("/p/file.ts", module_file("/p/file.ts", vec![]));

    let mut loader = ModuleLoader::new(&host);
    loader.load_entry(Path::new("/p/main.ts")).unwrap();
    assert!(loader.by_path(Path::new("/p/dir/index.ts")).is_some());
    assert!(loader.by_path(Path::new("/p/file.ts")).is_some());
}

#[test]
fn package_specifier_walks_up_node_modules() {
    let host = MemoryHost::default();
    host.add(
        "/p/src/deep/main.ts",
        module_file("/p/src/deep/main.ts", vec![import_stmt("leftpad")]),
    );
    host.add(
        "/p/node_modules/leftpad/index.ts",
        module_file("/p/node_modules/leftpad/index.ts", vec![]),
    );

    let mut loader = ModuleLoader::new(&host);
    loader.load_entry(Path::new("/p/src/deep/main.ts")).unwrap();
    assert!(loader
        .by_path(Path::new("/p/node_modules/leftpad/index.ts"))
        .is_some());
}

#[test]
fn builtin_specifier_resolves_to_synthetic_module() {
    let host = MemoryHost::default();
    host.add("/p/main.ts", module_file("/p/main.ts", vec![import_stmt("fs")]));

    let mut loader = ModuleLoader::new(&host);
    let entry = loader.load_entry(Path::new("/p/main.ts")).unwrap();
    let deps = &loader.module(entry).dependencies;
    assert_eq!(deps.len(), 1);
    let fs = loader.module(deps[0]);
    assert!(fs.is_builtin);
    assert!(fs.is_type_checked);
    assert!(fs.source.is_none());
    assert!(fs.path.to_string_lossy().starts_with(BUILTIN_PREFIX));
}

#[test]
fn unresolvable_import_names_specifier_and_importer() {
    let host = MemoryHost::default();
    host.add(
        "/p/main.ts",
        module_file("/p/main.ts", vec![import_stmt("./missing")]),
    );
    let mut loader = ModuleLoader::new(&host);
    let err = loader.load_entry(Path::new("/p/main.ts")).unwrap_err();
    assert!(err.diagnostic.message_text.contains("./missing"));
    assert!(err.diagnostic.message_text.contains("/p/main.ts"));
}

#[test]
fn unresolvable_dynamic_import_is_swallowed() {
    let host = MemoryHost::default();
    host.add(
        "/p/main.ts",
        module_file("/p/main.ts", vec![dynamic_import_stmt("./nowhere")]),
    );
    let mut loader = ModuleLoader::new(&host);
    assert!(loader.load_entry(Path::new("/p/main.ts")).is_ok());
}

#[test]
fn resolvable_dynamic_import_is_loaded() {
    let host = MemoryHost::default();
    host.add(
        "/p/main.ts",
        module_file("/p/main.ts", vec![dynamic_import_stmt("./lazy")]),
    );
    host.add("/p/lazy.ts", module_file("/p/lazy.ts", vec![]));
    let mut loader = ModuleLoader::new(&host);
    let entry = loader.load_entry(Path::new("/p/main.ts")).unwrap();
    // Loaded, but not a static dependency.
    assert!(loader.by_path(Path::new("/p/lazy.ts")).is_some());
    assert!(loader.module(entry).dependencies.is_empty());
}

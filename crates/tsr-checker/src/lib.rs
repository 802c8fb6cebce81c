//! Type checker for tsr syntax trees.
//!
//! The checker is bidirectional (annotations push expected types into
//! initializers) and flow-sensitive: each function body gets a control-flow
//! graph whose block contexts are narrowed to a fixed point.
//!
//! Organization:
//! - `context` - `CheckerContext`: interner, diagnostics, scope stack
//! - `type_node` - annotation resolution to `TypeId`
//! - `declarations` - functions (incl. overload grouping), classes, enums
//! - `expr` - expression checking
//! - `call_checker` - call-site checking and diagnostics
//! - `statements` - statement checking with branch narrowing
//! - `destructuring` - pattern binding against a source type
//! - `flow_graph` - basic blocks and tagged edges
//! - `flow_narrowing` - worklist fixed point over block contexts
//!
//! Entry point: [`check_module`] (or [`Checker::check`] for a loaded graph).

pub mod call_checker;
pub mod context;
pub mod declarations;
pub mod destructuring;
pub mod expr;
pub mod flow_graph;
pub mod flow_narrowing;
pub mod statements;
pub mod type_node;

pub use context::CheckerContext;
pub use flow_graph::{BasicBlock, BlockId, Edge, EdgeKind, FlowGraph, FlowGraphBuilder};
pub use flow_narrowing::{narrow, FlowContext};

use tsr_ast::stmt::StmtKind;
use tsr_ast::SourceFile;
use tsr_common::Diagnostic;
use tsr_types::{TypeId, TypeInterner};

/// Check one module in isolation; returns its diagnostics.
pub fn check_module(db: &TypeInterner, file: &SourceFile) -> Vec<Diagnostic> {
    check_module_full(db, file).diagnostics
}

/// Full result of checking a module: diagnostics plus the export surface
/// the loader's module table records.
pub struct ModuleCheckResult {
    pub diagnostics: Vec<Diagnostic>,
    pub exports: Vec<(String, TypeId)>,
    pub default_export: Option<TypeId>,
}

pub fn check_module_full(db: &TypeInterner, file: &SourceFile) -> ModuleCheckResult {
    let mut ctx = CheckerContext::new(db, file.path.clone());
    declarations::hoist_declarations(&mut ctx, &file.statements);
    for stmt in &file.statements {
        statements::check_stmt(&mut ctx, stmt);
    }

    let mut exports = Vec::new();
    let mut default_export = None;
    for stmt in &file.statements {
        let StmtKind::Export(export) = &stmt.kind else {
            continue;
        };
        if let Some(declaration) = &export.declaration {
            for name in declared_names(declaration) {
                if let Some(type_id) = ctx.lookup_type(&name) {
                    exports.push((name, type_id));
                }
            }
        }
        for (local, exported) in &export.named {
            if let Some(type_id) = ctx.lookup_type(local) {
                exports.push((exported.clone(), type_id));
            }
        }
        if let Some(default_expr) = &export.default_expr {
            ctx.quiet = true;
            default_export = Some(expr::check_expr(&mut ctx, default_expr, None));
            ctx.quiet = false;
        }
    }

    ModuleCheckResult {
        diagnostics: ctx.take_diagnostics(),
        exports,
        default_export,
    }
}

/// Top-level names a declaration statement introduces.
fn declared_names(stmt: &tsr_ast::Stmt) -> Vec<String> {
    match &stmt.kind {
        StmtKind::Var { name, .. } => name
            .bound_names()
            .into_iter()
            .map(String::from)
            .collect(),
        StmtKind::Function(func) => vec![func.name.clone()],
        StmtKind::Class(class) => vec![class.name.clone()],
        StmtKind::Enum { name, .. } => vec![name.clone()],
        _ => Vec::new(),
    }
}

//! Syntax tree for the tsr pipeline.
//!
//! The lexer and parser live outside this workspace; an embedding host
//! produces these trees through the `CompileHost` seam in `tsr-modules`.
//! Every node carries a `Span` and the 1-based source line it starts on.
//!
//! This crate is organized by node family:
//! - `stmt` - statements and declarations
//! - `expr` - expressions
//! - `pattern` - destructuring patterns
//! - `type_node` - type annotations
//! - `ops` - operator kinds

pub mod expr;
pub mod ops;
pub mod pattern;
pub mod stmt;
pub mod type_node;

pub use expr::{Expr, ExprKind, ObjectProperty, TemplatePart};
pub use ops::{AssignOp, BinaryOp, LogicalOp, UnaryOp};
pub use pattern::{ArrayElement, ObjectPatternProperty, Pattern};
pub use stmt::{
    CatchClause, ClassDecl, ClassMember, ClassMemberKind, ExportDecl, FunctionDecl, ImportDecl,
    Param, Stmt, StmtKind, SwitchCase, VarKind,
};
pub use type_node::TypeNode;

use tsr_common::Span;

/// A parsed source file, before module-graph processing.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path of the file on disk (or a reserved builtin path).
    pub path: String,
    pub statements: Vec<Stmt>,
    /// Targets of `/// <reference path="..." />` directives, in order.
    pub reference_paths: Vec<String>,
    pub span: Span,
}

impl SourceFile {
    pub fn new(path: String, statements: Vec<Stmt>) -> Self {
        SourceFile {
            path,
            statements,
            reference_paths: Vec::new(),
            span: Span::dummy(),
        }
    }

    /// True if any statement is an import or export: the file is a module.
    pub fn has_module_syntax(&self) -> bool {
        self.statements.iter().any(|stmt| {
            matches!(
                stmt.kind,
                StmtKind::Import(_) | StmtKind::Export(_) | StmtKind::ImportRequire { .. }
            )
        })
    }
}

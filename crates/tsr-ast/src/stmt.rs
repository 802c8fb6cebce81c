//! Statement and declaration nodes.

use tsr_common::Span;

use crate::expr::Expr;
use crate::pattern::Pattern;
use crate::type_node::TypeNode;

/// A statement node. Carries its span and the 1-based line it starts on.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
    pub line: u32,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span, line: u32) -> Self {
        Stmt { kind, span, line }
    }
}

/// Declaration keyword of a variable statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `let x: T = init`; the name may be a destructuring pattern.
    Var {
        kind: VarKind,
        name: Pattern,
        type_annotation: Option<TypeNode>,
        initializer: Option<Expr>,
    },
    Block(Vec<Stmt>),
    /// Comma-sequenced statements produced by desugaring.
    Sequence(Vec<Stmt>),
    Expression(Expr),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        initializer: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    ForOf {
        binding: Pattern,
        iterable: Expr,
        body: Box<Stmt>,
    },
    ForIn {
        binding: Pattern,
        object: Expr,
        body: Box<Stmt>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    TryCatch {
        try_block: Vec<Stmt>,
        catch_clause: Option<CatchClause>,
        finally_block: Option<Vec<Stmt>>,
    },
    Break {
        label: Option<String>,
    },
    Continue {
        label: Option<String>,
    },
    Return {
        value: Option<Expr>,
    },
    Throw(Expr),
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
    Function(FunctionDecl),
    Class(ClassDecl),
    Enum {
        name: String,
        members: Vec<(String, Option<Expr>)>,
    },
    Import(ImportDecl),
    Export(ExportDecl),
    /// `import x = require("...")`
    ImportRequire {
        name: String,
        specifier: String,
    },
}

/// One `case value:` (or `default:`) arm of a switch.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// `None` for the default clause.
    pub value: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    /// `None` for a bare `catch { ... }`.
    pub binding: Option<String>,
    pub body: Vec<Stmt>,
}

/// A function parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub pattern: Pattern,
    pub type_annotation: Option<TypeNode>,
    pub optional: bool,
    pub is_rest: bool,
}

impl Param {
    /// The parameter's binding name when it is a plain identifier.
    pub fn simple_name(&self) -> Option<&str> {
        match &self.pattern {
            Pattern::Identifier { name, .. } | Pattern::Rest { name } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeNode>,
    /// `None` for an overload signature with no body.
    pub body: Option<Vec<Stmt>>,
    pub is_async: bool,
    pub is_generator: bool,
    pub span: Span,
    pub line: u32,
}

impl FunctionDecl {
    /// True for a bodyless overload signature declaration.
    pub fn is_signature_only(&self) -> bool {
        self.body.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub superclass: Option<String>,
    pub members: Vec<ClassMember>,
    pub span: Span,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub name: String,
    pub kind: ClassMemberKind,
    pub is_static: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ClassMemberKind {
    Field {
        type_annotation: Option<TypeNode>,
        initializer: Option<Expr>,
    },
    Method(FunctionDecl),
    Getter(FunctionDecl),
    Setter(FunctionDecl),
    Constructor(FunctionDecl),
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    /// Module specifier as written.
    pub specifier: String,
    /// `import d from "..."`.
    pub default_binding: Option<String>,
    /// `import { a, b as c } from "..."` as (exported, local) pairs.
    pub named_bindings: Vec<(String, String)>,
    /// `import * as ns from "..."`.
    pub namespace_binding: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExportDecl {
    /// Exported declaration (`export const x = ...`, `export function f`, ...).
    pub declaration: Option<Box<Stmt>>,
    /// `export { a, b as c }` as (local, exported) pairs.
    pub named: Vec<(String, String)>,
    /// Re-export source: `export { a } from "./mod"`.
    pub from_module_path: Option<String>,
    /// `export default expr`.
    pub default_expr: Option<Expr>,
}

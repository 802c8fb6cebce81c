//! Specifier collection from a parsed tree.
//!
//! Static imports (import declarations, re-exports, require-style imports)
//! drive eager loading; dynamic-import string literals are collected
//! separately for best-effort loading at the end.

use tsr_ast::{
    expr::{ExprKind, Literal, ObjectProperty, TemplatePart},
    Expr, SourceFile, Stmt, StmtKind,
};

#[derive(Debug, Default)]
pub struct CollectedImports {
    /// Specifiers that must load, in source order.
    pub static_specifiers: Vec<String>,
    /// `import("...")` string literals, loaded best-effort.
    pub dynamic_specifiers: Vec<String>,
}

pub fn collect_imports(file: &SourceFile) -> CollectedImports {
    let mut out = CollectedImports::default();
    for stmt in &file.statements {
        collect_stmt(stmt, &mut out);
    }
    out
}

fn push_static(out: &mut CollectedImports, specifier: &str) {
    if !out.static_specifiers.iter().any(|s| s == specifier) {
        out.static_specifiers.push(specifier.to_string());
    }
}

fn collect_stmt(stmt: &Stmt, out: &mut CollectedImports) {
    match &stmt.kind {
        StmtKind::Import(decl) => push_static(out, &decl.specifier),
        StmtKind::ImportRequire { specifier, .. } => push_static(out, specifier),
        StmtKind::Export(decl) => {
            if let Some(from) = &decl.from_module_path {
                push_static(out, from);
            }
            if let Some(inner) = &decl.declaration {
                collect_stmt(inner, out);
            }
            if let Some(expr) = &decl.default_expr {
                collect_expr(expr, out);
            }
        }
        StmtKind::Var { initializer, .. } => {
            if let Some(init) = initializer {
                collect_expr(init, out);
            }
        }
        StmtKind::Block(stmts) | StmtKind::Sequence(stmts) => {
            for s in stmts {
                collect_stmt(s, out);
            }
        }
        StmtKind::Expression(expr) | StmtKind::Throw(expr) => collect_expr(expr, out),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            collect_expr(condition, out);
            collect_stmt(then_branch, out);
            if let Some(e) = else_branch {
                collect_stmt(e, out);
            }
        }
        StmtKind::While { condition, body } | StmtKind::DoWhile { body, condition } => {
            collect_expr(condition, out);
            collect_stmt(body, out);
        }
        StmtKind::For {
            initializer,
            condition,
            increment,
            body,
        } => {
            if let Some(init) = initializer {
                collect_stmt(init, out);
            }
            if let Some(c) = condition {
                collect_expr(c, out);
            }
            if let Some(i) = increment {
                collect_expr(i, out);
            }
            collect_stmt(body, out);
        }
        StmtKind::ForOf { iterable, body, .. } => {
            collect_expr(iterable, out);
            collect_stmt(body, out);
        }
        StmtKind::ForIn { object, body, .. } => {
            collect_expr(object, out);
            collect_stmt(body, out);
        }
        StmtKind::Switch { discriminant, cases } => {
            collect_expr(discriminant, out);
            for case in cases {
                if let Some(v) = &case.value {
                    collect_expr(v, out);
                }
                for s in &case.body {
                    collect_stmt(s, out);
                }
            }
        }
        StmtKind::TryCatch {
            try_block,
            catch_clause,
            finally_block,
        } => {
            for s in try_block {
                collect_stmt(s, out);
            }
            if let Some(catch) = catch_clause {
                for s in &catch.body {
                    collect_stmt(s, out);
                }
            }
            if let Some(finally) = finally_block {
                for s in finally {
                    collect_stmt(s, out);
                }
            }
        }
        StmtKind::Labeled { body, .. } => collect_stmt(body, out),
        StmtKind::Return { value } => {
            if let Some(v) = value {
                collect_expr(v, out);
            }
        }
        StmtKind::Function(func) => {
            if let Some(body) = &func.body {
                for s in body {
                    collect_stmt(s, out);
                }
            }
        }
        StmtKind::Class(class) => {
            for member in &class.members {
                use tsr_ast::ClassMemberKind::*;
                match &member.kind {
                    Field { initializer, .. } => {
                        if let Some(init) = initializer {
                            collect_expr(init, out);
                        }
                    }
                    Method(f) | Getter(f) | Setter(f) | Constructor(f) => {
                        if let Some(body) = &f.body {
                            for s in body {
                                collect_stmt(s, out);
                            }
                        }
                    }
                }
            }
        }
        StmtKind::Enum { .. } | StmtKind::Break { .. } | StmtKind::Continue { .. } => {}
    }
}

fn collect_expr(expr: &Expr, out: &mut CollectedImports) {
    match &expr.kind {
        ExprKind::DynamicImport(inner) => {
            if let ExprKind::Literal(Literal::String(s)) = &inner.kind {
                out.dynamic_specifiers.push(s.clone());
            }
            collect_expr(inner, out);
        }
        ExprKind::Literal(_)
        | ExprKind::Variable(_)
        | ExprKind::This
        | ExprKind::Super => {}
        ExprKind::Grouping(e)
        | ExprKind::Unary { operand: e, .. }
        | ExprKind::Spread(e)
        | ExprKind::Await(e)
        | ExprKind::PrefixIncrement { operand: e, .. }
        | ExprKind::PostfixIncrement { operand: e, .. } => collect_expr(e, out),
        ExprKind::Binary { left, right, .. }
        | ExprKind::Logical { left, right, .. }
        | ExprKind::NullishCoalescing { left, right } => {
            collect_expr(left, out);
            collect_expr(right, out);
        }
        ExprKind::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            collect_expr(condition, out);
            collect_expr(then_branch, out);
            collect_expr(else_branch, out);
        }
        ExprKind::Assign { value, .. } | ExprKind::CompoundAssign { value, .. } => {
            collect_expr(value, out);
        }
        ExprKind::Get { object, .. } => collect_expr(object, out),
        ExprKind::Set { object, value, .. } => {
            collect_expr(object, out);
            collect_expr(value, out);
        }
        ExprKind::GetIndex { object, index, .. } => {
            collect_expr(object, out);
            collect_expr(index, out);
        }
        ExprKind::SetIndex {
            object,
            index,
            value,
        }
        | ExprKind::CompoundSetIndex {
            object,
            index,
            value,
            ..
        } => {
            collect_expr(object, out);
            collect_expr(index, out);
            collect_expr(value, out);
        }
        ExprKind::CompoundSet { object, value, .. } => {
            collect_expr(object, out);
            collect_expr(value, out);
        }
        ExprKind::Call {
            callee, arguments, ..
        }
        | ExprKind::New {
            callee, arguments, ..
        } => {
            collect_expr(callee, out);
            for arg in arguments {
                collect_expr(arg, out);
            }
        }
        ExprKind::ArrayLiteral { elements } => {
            for e in elements {
                collect_expr(e, out);
            }
        }
        ExprKind::ObjectLiteral { properties } => {
            for p in properties {
                match p {
                    ObjectProperty::KeyValue { value, .. } => collect_expr(value, out),
                    ObjectProperty::Spread { value } => collect_expr(value, out),
                    ObjectProperty::Shorthand { .. } => {}
                }
            }
        }
        ExprKind::TemplateLiteral { parts } => {
            for part in parts {
                if let TemplatePart::Expr(e) = part {
                    collect_expr(e, out);
                }
            }
        }
        ExprKind::ArrowFunction { body, .. } => {
            for s in body {
                collect_stmt(s, out);
            }
        }
        ExprKind::Yield { value, .. } => {
            if let Some(v) = value {
                collect_expr(v, out);
            }
        }
    }
}

//! Statement checking with branch-local narrowing.
//!
//! Conditions narrow the scope seen by their branches; the two branch
//! outcomes merge member-wise with union at the join. Function bodies also
//! get a control-flow graph whose block contexts are computed to a fixed
//! point (`flow_narrowing::narrow`), which loop-carried narrowing relies on.

use rustc_hash::FxHashMap;
use tracing::trace;
use tsr_ast::stmt::{ClassMemberKind, FunctionDecl, Stmt, StmtKind, VarKind};
use tsr_ast::{Expr, Pattern};
use tsr_common::diagnostics::{codes, messages};
use tsr_types::{is_compatible, TypeId, TypeKind};

use crate::context::CheckerContext;
use crate::declarations::function_shape;
use crate::destructuring::bind_pattern;
use crate::expr::check_expr;
use crate::flow_graph::FlowGraphBuilder;
use crate::flow_narrowing::{apply_predicate, narrow, FlowContext, NarrowEnv};
use crate::type_node::resolve_type_node;

pub fn check_stmt(ctx: &mut CheckerContext<'_>, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Var {
            kind,
            name,
            type_annotation,
            initializer,
        } => check_var(ctx, stmt, *kind, name, type_annotation.as_ref(), initializer.as_ref()),
        StmtKind::Expression(expr) => {
            check_expr(ctx, expr, None);
        }
        StmtKind::Block(stmts) | StmtKind::Sequence(stmts) => {
            ctx.push_scope();
            for s in stmts {
                check_stmt(ctx, s);
            }
            ctx.pop_scope();
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            check_expr(ctx, condition, None);
            let before = ctx.narrowing_snapshot();

            apply_condition(ctx, condition, true);
            check_stmt(ctx, then_branch);
            let after_then = ctx.narrowing_snapshot();

            ctx.restore_narrowing(&before);
            apply_condition(ctx, condition, false);
            if let Some(else_stmt) = else_branch {
                check_stmt(ctx, else_stmt);
            }
            let after_else = ctx.narrowing_snapshot();

            ctx.merge_narrowing(&after_then, &after_else);
        }
        StmtKind::While { condition, body } => {
            check_expr(ctx, condition, None);
            let before = ctx.narrowing_snapshot();
            apply_condition(ctx, condition, true);
            check_stmt(ctx, body);
            // The loop may run zero times: fall back to the pre-loop view,
            // refined by the condition being false.
            ctx.restore_narrowing(&before);
            apply_condition(ctx, condition, false);
        }
        StmtKind::DoWhile { body, condition } => {
            check_stmt(ctx, body);
            check_expr(ctx, condition, None);
            apply_condition(ctx, condition, false);
        }
        StmtKind::For {
            initializer,
            condition,
            increment,
            body,
        } => {
            ctx.push_scope();
            if let Some(init) = initializer {
                check_stmt(ctx, init);
            }
            if let Some(cond) = condition {
                check_expr(ctx, cond, None);
                apply_condition(ctx, cond, true);
            }
            check_stmt(ctx, body);
            if let Some(incr) = increment {
                check_expr(ctx, incr, None);
            }
            ctx.pop_scope();
        }
        StmtKind::ForOf {
            binding,
            iterable,
            body,
        } => {
            let iterable_type = check_expr(ctx, iterable, None);
            let element = match ctx.db.lookup(iterable_type) {
                TypeKind::Array(element) => element,
                TypeKind::Tuple { elements, .. } => ctx.db.union(elements),
                TypeKind::String | TypeKind::StringLiteral(_) => TypeId::STRING,
                _ => TypeId::ANY,
            };
            ctx.push_scope();
            bind_pattern(ctx, binding, element, false);
            check_stmt(ctx, body);
            ctx.pop_scope();
        }
        StmtKind::ForIn {
            binding,
            object,
            body,
        } => {
            check_expr(ctx, object, None);
            ctx.push_scope();
            // for-in enumerates string keys.
            bind_pattern(ctx, binding, TypeId::STRING, false);
            check_stmt(ctx, body);
            ctx.pop_scope();
        }
        StmtKind::Switch {
            discriminant,
            cases,
        } => {
            check_expr(ctx, discriminant, None);
            let before = ctx.narrowing_snapshot();
            for case in cases {
                ctx.restore_narrowing(&before);
                if let Some(value) = &case.value {
                    check_expr(ctx, value, None);
                    apply_case_narrowing(ctx, discriminant, value);
                }
                ctx.push_scope();
                for s in &case.body {
                    check_stmt(ctx, s);
                }
                ctx.pop_scope();
            }
            ctx.restore_narrowing(&before);
        }
        StmtKind::TryCatch {
            try_block,
            catch_clause,
            finally_block,
        } => {
            ctx.push_scope();
            for s in try_block {
                check_stmt(ctx, s);
            }
            ctx.pop_scope();
            if let Some(catch) = catch_clause {
                ctx.push_scope();
                if let Some(binding) = &catch.binding {
                    // The thrown value can be anything.
                    ctx.declare(binding, TypeId::ANY, false);
                }
                for s in &catch.body {
                    check_stmt(ctx, s);
                }
                ctx.pop_scope();
            }
            if let Some(finally) = finally_block {
                ctx.push_scope();
                for s in finally {
                    check_stmt(ctx, s);
                }
                ctx.pop_scope();
            }
        }
        StmtKind::Return { value } => {
            let expected_return = ctx.return_type;
            let value_type = match value {
                Some(expr) => check_expr(ctx, expr, expected_return),
                None => TypeId::UNDEFINED,
            };
            if let Some(expected) = ctx.return_type {
                if expected != TypeId::ANY
                    && expected != TypeId::VOID
                    && !is_compatible(ctx.db, expected, value_type)
                {
                    let span = value.as_ref().map(|v| v.span).unwrap_or(stmt.span);
                    ctx.error(
                        span,
                        codes::TYPE_NOT_ASSIGNABLE,
                        messages::TYPE_NOT_ASSIGNABLE,
                        &[&ctx.db.display(value_type), &ctx.db.display(expected)],
                    );
                }
            }
        }
        StmtKind::Throw(expr) => {
            check_expr(ctx, expr, None);
        }
        StmtKind::Labeled { body, .. } => check_stmt(ctx, body),
        StmtKind::Break { .. } | StmtKind::Continue { .. } => {}
        StmtKind::Function(func) => check_function_decl(ctx, func),
        StmtKind::Class(class) => check_class_bodies(ctx, class),
        StmtKind::Enum { .. } => {}
        StmtKind::Import(_) | StmtKind::ImportRequire { .. } => {}
        StmtKind::Export(export) => {
            if let Some(declaration) = &export.declaration {
                check_stmt(ctx, declaration);
            }
            if let Some(default_expr) = &export.default_expr {
                check_expr(ctx, default_expr, None);
            }
        }
    }
}

fn check_var(
    ctx: &mut CheckerContext<'_>,
    stmt: &Stmt,
    kind: VarKind,
    name: &Pattern,
    type_annotation: Option<&tsr_ast::TypeNode>,
    initializer: Option<&Expr>,
) {
    let annotated = type_annotation.map(|node| resolve_type_node(ctx, node, stmt.span));

    let declared = match (annotated, initializer) {
        (Some(expected), Some(init)) => {
            // Bidirectional: the annotation flows into the initializer.
            let init_type = check_expr(ctx, init, Some(expected));
            if !is_compatible(ctx.db, expected, init_type) {
                ctx.error(
                    init.span,
                    codes::TYPE_NOT_ASSIGNABLE,
                    messages::TYPE_NOT_ASSIGNABLE,
                    &[&ctx.db.display(init_type), &ctx.db.display(expected)],
                );
            }
            expected
        }
        (Some(expected), None) => expected,
        (None, Some(init)) => {
            let init_type = check_expr(ctx, init, None);
            // let/var widen literal initializers; const keeps them.
            if kind == VarKind::Const {
                init_type
            } else {
                ctx.db.widen_literal(init_type)
            }
        }
        (None, None) => TypeId::ANY,
    };

    bind_pattern(ctx, name, declared, kind == VarKind::Const);
}

/// Apply a condition to the current scope's narrowed types.
fn apply_condition(ctx: &mut CheckerContext<'_>, condition: &Expr, assume: bool) {
    let classes = ctx.classes.clone();
    let env = NarrowEnv {
        db: ctx.db,
        classes: &classes,
    };
    let mut context = FlowContext::default();
    for (name, type_id) in ctx.narrowing_snapshot() {
        context.set(&name, type_id);
    }
    let narrowed = apply_predicate(&env, &context, condition, assume);
    for (name, type_id) in narrowed.vars {
        ctx.set_narrowed(&name, type_id);
    }
}

/// `case value:` narrows the discriminant like `disc === value`.
fn apply_case_narrowing(ctx: &mut CheckerContext<'_>, discriminant: &Expr, value: &Expr) {
    let predicate = Expr::new(
        tsr_ast::expr::ExprKind::Binary {
            op: tsr_ast::BinaryOp::StrictEqual,
            left: Box::new(discriminant.clone()),
            right: Box::new(value.clone()),
        },
        discriminant.span.merge(value.span),
        discriminant.line,
    );
    apply_condition(ctx, &predicate, true);
}

/// Union of the types flowing out of `return` statements; `void` when none
/// return a value.
pub fn infer_return_type(ctx: &mut CheckerContext<'_>, body: &[Stmt]) -> TypeId {
    let mut returns = Vec::new();
    collect_return_types(ctx, body, &mut returns);
    if returns.is_empty() {
        TypeId::VOID
    } else {
        ctx.db.union(returns)
    }
}

fn collect_return_types(ctx: &mut CheckerContext<'_>, body: &[Stmt], out: &mut Vec<TypeId>) {
    for stmt in body {
        match &stmt.kind {
            StmtKind::Return { value } => {
                let type_id = match value {
                    Some(expr) => {
                        ctx.quiet = true;
                        let t = check_expr(ctx, expr, None);
                        ctx.quiet = false;
                        t
                    }
                    None => TypeId::UNDEFINED,
                };
                out.push(type_id);
            }
            StmtKind::Block(stmts) | StmtKind::Sequence(stmts) => {
                collect_return_types(ctx, stmts, out)
            }
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                collect_return_types(ctx, std::slice::from_ref(then_branch.as_ref()), out);
                if let Some(else_stmt) = else_branch {
                    collect_return_types(ctx, std::slice::from_ref(else_stmt.as_ref()), out);
                }
            }
            StmtKind::While { body, .. }
            | StmtKind::DoWhile { body, .. }
            | StmtKind::For { body, .. }
            | StmtKind::ForOf { body, .. }
            | StmtKind::ForIn { body, .. }
            | StmtKind::Labeled { body, .. } => {
                collect_return_types(ctx, std::slice::from_ref(body.as_ref()), out)
            }
            StmtKind::Switch { cases, .. } => {
                for case in cases {
                    collect_return_types(ctx, &case.body, out);
                }
            }
            StmtKind::TryCatch {
                try_block,
                catch_clause,
                finally_block,
            } => {
                collect_return_types(ctx, try_block, out);
                if let Some(catch) = catch_clause {
                    collect_return_types(ctx, &catch.body, out);
                }
                if let Some(finally) = finally_block {
                    collect_return_types(ctx, finally, out);
                }
            }
            _ => {}
        }
    }
}

/// Check a function declaration's body, then run the CFG fixed point over
/// it. Graphs are throwaway; only their contexts matter here.
pub fn check_function_decl(ctx: &mut CheckerContext<'_>, func: &FunctionDecl) {
    let Some(body) = &func.body else {
        // Overload signatures have no body to check.
        return;
    };

    // Annotations were resolved at hoist time; re-resolve quietly.
    ctx.quiet = true;
    let shape = function_shape(ctx, func);
    ctx.quiet = false;

    if !func.type_params.is_empty() {
        ctx.push_type_params(&func.type_params);
    }
    ctx.push_scope();
    for (param, info) in func.params.iter().zip(&shape.params) {
        let declared = if param.optional {
            ctx.db.union(vec![info.type_id, TypeId::UNDEFINED])
        } else {
            info.type_id
        };
        bind_pattern(ctx, &param.pattern, declared, false);
    }
    // Nested declarations are visible throughout the body.
    crate::declarations::hoist_declarations(ctx, body);

    let saved_return = ctx.return_type;
    let saved_async = ctx.in_async;
    let saved_generator = ctx.in_generator;
    ctx.return_type = func.return_type.as_ref().map(|node| {
        ctx.quiet = true;
        let t = resolve_type_node(ctx, node, func.span);
        ctx.quiet = false;
        t
    });
    ctx.in_async = func.is_async;
    ctx.in_generator = func.is_generator;

    for stmt in body {
        check_stmt(ctx, stmt);
    }

    run_flow_analysis(ctx, func, body);

    ctx.return_type = saved_return;
    ctx.in_async = saved_async;
    ctx.in_generator = saved_generator;
    ctx.pop_scope();
    if !func.type_params.is_empty() {
        ctx.pop_type_params();
    }
}

/// Build the function's CFG and narrow its block contexts to a fixed point.
fn run_flow_analysis(ctx: &mut CheckerContext<'_>, func: &FunctionDecl, body: &[Stmt]) {
    let initial = {
        let mut context = FlowContext::default();
        for (name, type_id) in ctx.narrowing_snapshot() {
            context.set(&name, type_id);
        }
        context
    };

    ctx.quiet = true;
    let graph = {
        let mut typer = |expr: &Expr| check_expr(ctx, expr, None);
        FlowGraphBuilder::new(&mut typer).build(body)
    };
    ctx.quiet = false;

    let mut graph = graph;
    let classes: FxHashMap<String, tsr_types::ClassId> = ctx.classes.clone();
    let env = NarrowEnv {
        db: ctx.db,
        classes: &classes,
    };
    narrow(&mut graph, &env, &initial);
    trace!(
        function = func.name,
        blocks = graph.blocks.len(),
        edges = graph.edges.len(),
        "flow analysis complete"
    );
}

fn check_class_bodies(ctx: &mut CheckerContext<'_>, class: &tsr_ast::ClassDecl) {
    let this_type = ctx
        .classes
        .get(&class.name)
        .map(|&id| ctx.db.instance_type(id));
    let saved_this = ctx.this_type;
    ctx.this_type = this_type;

    for member in &class.members {
        match &member.kind {
            ClassMemberKind::Field { initializer, .. } => {
                if let Some(init) = initializer {
                    check_expr(ctx, init, None);
                }
            }
            ClassMemberKind::Method(func)
            | ClassMemberKind::Getter(func)
            | ClassMemberKind::Setter(func)
            | ClassMemberKind::Constructor(func) => check_function_decl(ctx, func),
        }
    }

    ctx.this_type = saved_this;
}

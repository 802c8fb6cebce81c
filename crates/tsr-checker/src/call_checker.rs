//! Call-site checking: argument typing, spread handling, and diagnostics
//! for every `CallError` the resolver can produce.

use tsr_ast::expr::ExprKind;
use tsr_ast::Expr;
use tsr_common::diagnostics::{codes, messages};
use tsr_types::{resolve_call, CallArg, CallError, TypeId, TypeKind};

use crate::context::CheckerContext;
use crate::expr::check_expr;
use crate::type_node::resolve_type_node;

pub fn check_call(
    ctx: &mut CheckerContext<'_>,
    call: &Expr,
    callee: &Expr,
    arguments: &[Expr],
    type_args: &[tsr_ast::TypeNode],
) -> TypeId {
    let callee_type = check_expr(ctx, callee, None);
    let args = check_arguments(ctx, arguments);
    let resolved_type_args: Vec<TypeId> = type_args
        .iter()
        .map(|node| resolve_type_node(ctx, node, call.span))
        .collect();

    match resolve_call(ctx.db, callee_type, &args, &resolved_type_args) {
        Ok(result) => result,
        Err(error) => {
            report_call_error(ctx, call, &error);
            TypeId::ERROR
        }
    }
}

/// `new C(...)`: resolve the class, check constructor arguments, produce the
/// instance type.
pub fn check_new(
    ctx: &mut CheckerContext<'_>,
    call: &Expr,
    callee: &Expr,
    arguments: &[Expr],
    _type_args: &[tsr_ast::TypeNode],
) -> TypeId {
    // Collection builtins (Map, Set, ...) have no class declarations here;
    // their construction is typed as any.
    if let ExprKind::Variable(name) = &callee.kind {
        if let Some(&class_id) = ctx.classes.get(name) {
            let args = check_arguments(ctx, arguments);
            let info = ctx.db.class_info(class_id);
            if let Some(constructor) = &info.constructor {
                if let Err(error) =
                    tsr_types::overload::check_signature(ctx.db, constructor, &args)
                {
                    report_call_error(ctx, call, &error);
                }
            }
            return ctx.db.instance_type(class_id);
        }
        if ctx.lookup(name).is_none() && !is_builtin_constructor(name) {
            ctx.error(
                call.span,
                codes::UNKNOWN_IDENTIFIER,
                messages::UNKNOWN_IDENTIFIER,
                &[name],
            );
            return TypeId::ERROR;
        }
        for argument in arguments {
            check_expr(ctx, argument, None);
        }
        return TypeId::ANY;
    }

    let callee_type = check_expr(ctx, callee, None);
    for argument in arguments {
        check_expr(ctx, argument, None);
    }
    match ctx.db.lookup(callee_type) {
        TypeKind::Class(class_id) => ctx.db.instance_type(class_id),
        TypeKind::Any | TypeKind::Error => TypeId::ANY,
        _ => {
            ctx.error(
                call.span,
                codes::NOT_A_CLASS,
                "Type '{0}' is not a constructor.",
                &[&ctx.db.display(callee_type)],
            );
            TypeId::ERROR
        }
    }
}

fn is_builtin_constructor(name: &str) -> bool {
    matches!(
        name,
        "Map" | "Set" | "WeakMap" | "WeakSet" | "Promise" | "Date" | "RegExp" | "Error"
            | "TypeError" | "Array" | "Object" | "Buffer"
    )
}

fn check_arguments(ctx: &mut CheckerContext<'_>, arguments: &[Expr]) -> Vec<CallArg> {
    arguments
        .iter()
        .map(|argument| match &argument.kind {
            ExprKind::Spread(inner) => {
                let spread_type = check_expr(ctx, inner, None);
                let element = match ctx.db.lookup(spread_type) {
                    TypeKind::Array(element) => element,
                    TypeKind::Tuple { elements, .. } => ctx.db.union(elements),
                    _ => TypeId::ANY,
                };
                CallArg::spread(element)
            }
            _ => CallArg::positional(check_expr(ctx, argument, None)),
        })
        .collect()
}

fn report_call_error(ctx: &mut CheckerContext<'_>, call: &Expr, error: &CallError) {
    match error {
        CallError::NotCallable(callee) => {
            ctx.error(
                call.span,
                codes::NOT_CALLABLE,
                messages::NOT_CALLABLE,
                &[&ctx.db.display(*callee)],
            );
        }
        CallError::ArityMismatch { min, max, got } => {
            let expected = match max {
                Some(max) if max == min => min.to_string(),
                Some(max) => format!("{min}-{max}"),
                None => format!("at least {min}"),
            };
            ctx.error(
                call.span,
                codes::ARGUMENT_COUNT_MISMATCH,
                messages::ARGUMENT_COUNT_MISMATCH,
                &[&expected, &got.to_string()],
            );
        }
        CallError::ArgumentMismatch {
            expected, actual, ..
        } => {
            ctx.error(
                call.span,
                codes::TYPE_NOT_ASSIGNABLE,
                messages::TYPE_NOT_ASSIGNABLE,
                &[&ctx.db.display(*actual), &ctx.db.display(*expected)],
            );
        }
        CallError::NoOverload { arg_types } => {
            let rendered: Vec<String> =
                arg_types.iter().map(|&t| ctx.db.display(t)).collect();
            ctx.error(
                call.span,
                codes::NO_OVERLOAD_MATCHES,
                messages::NO_OVERLOAD_MATCHES,
                &[&rendered.join(", ")],
            );
        }
        CallError::TypeArgumentCount { expected, got } => {
            ctx.error(
                call.span,
                codes::TYPE_ARGUMENT_COUNT_MISMATCH,
                "Expected {0} type arguments, but got {1}.",
                &[&expected.to_string(), &got.to_string()],
            );
        }
    }
}

//! Expression checking.
//!
//! Bidirectional: when an expected type is supplied, it propagates into
//! literals. Notably, an array literal checked against a tuple expectation
//! is checked positionally against the tuple elements, not as a homogeneous
//! array.

use tsr_ast::expr::{ExprKind, Literal, ObjectProperty, TemplatePart};
use tsr_ast::ops::{BinaryOp, LogicalOp, UnaryOp};
use tsr_ast::pattern::Pattern;
use tsr_ast::stmt::{Param, Stmt};
use tsr_ast::Expr;
use tsr_common::diagnostics::{codes, messages};
use tsr_types::{is_compatible, FunctionShape, NarrowingContext, ParamInfo, PropertyInfo, TypeId, TypeKind};

use crate::call_checker;
use crate::context::CheckerContext;
use crate::statements;
use crate::type_node::resolve_type_node;

/// Check an expression, optionally against an expected type (the caller
/// reports the mismatch; this function only shapes the checking).
pub fn check_expr(ctx: &mut CheckerContext<'_>, expr: &Expr, expected: Option<TypeId>) -> TypeId {
    match &expr.kind {
        ExprKind::Literal(literal) => check_literal(ctx, literal),
        ExprKind::Variable(name) => match ctx.lookup_type(name) {
            Some(type_id) => type_id,
            None => {
                ctx.error(
                    expr.span,
                    codes::UNKNOWN_IDENTIFIER,
                    messages::UNKNOWN_IDENTIFIER,
                    &[name],
                );
                TypeId::ERROR
            }
        },
        ExprKind::This => ctx.this_type.unwrap_or(TypeId::ANY),
        ExprKind::Super => TypeId::ANY,
        ExprKind::Grouping(inner) => check_expr(ctx, inner, expected),
        ExprKind::Unary { op, operand } => {
            let operand_type = check_expr(ctx, operand, None);
            match op {
                UnaryOp::Not | UnaryOp::Delete => TypeId::BOOLEAN,
                UnaryOp::Typeof => TypeId::STRING,
                UnaryOp::Void => TypeId::UNDEFINED,
                UnaryOp::Minus | UnaryOp::Plus | UnaryOp::BitNot => {
                    if operand_type == TypeId::BIGINT {
                        TypeId::BIGINT
                    } else {
                        TypeId::NUMBER
                    }
                }
            }
        }
        ExprKind::Binary { op, left, right } => {
            let left_type = check_expr(ctx, left, None);
            let right_type = check_expr(ctx, right, None);
            check_binary(ctx, *op, left_type, right_type)
        }
        ExprKind::Logical { op, left, right } => {
            let left_type = check_expr(ctx, left, None);
            let right_type = check_expr(ctx, right, None);
            let narrowing = NarrowingContext::new(ctx.db);
            match op {
                // `a && b`: b, or a's falsy remainder.
                LogicalOp::And => ctx.db.union(vec![right_type, left_type]),
                // `a || b`: a's truthy remainder, or b.
                LogicalOp::Or => {
                    let truthy_left = narrowing.narrow_truthy(left_type, true);
                    ctx.db.union(vec![truthy_left, right_type])
                }
            }
        }
        ExprKind::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            check_expr(ctx, condition, None);
            let then_type = check_expr(ctx, then_branch, expected);
            let else_type = check_expr(ctx, else_branch, expected);
            ctx.db.union(vec![then_type, else_type])
        }
        ExprKind::NullishCoalescing { left, right } => {
            let left_type = check_expr(ctx, left, None);
            let right_type = check_expr(ctx, right, None);
            let narrowing = NarrowingContext::new(ctx.db);
            let non_nullish = narrowing.narrow_by_nullish(left_type, false);
            ctx.db.union(vec![non_nullish, right_type])
        }
        ExprKind::Assign { target, value } => check_assign(ctx, expr, target, value),
        ExprKind::CompoundAssign { name, value, .. } => {
            let value_type = check_expr(ctx, value, None);
            match ctx.lookup_type(name) {
                Some(current) => ctx.db.union(vec![current, value_type]),
                None => {
                    ctx.error(
                        expr.span,
                        codes::UNKNOWN_IDENTIFIER,
                        messages::UNKNOWN_IDENTIFIER,
                        &[name],
                    );
                    TypeId::ERROR
                }
            }
        }
        ExprKind::PrefixIncrement { operand, .. }
        | ExprKind::PostfixIncrement { operand, .. } => {
            check_expr(ctx, operand, None);
            TypeId::NUMBER
        }
        ExprKind::Get {
            object,
            name,
            optional,
        } => {
            let object_type = check_expr(ctx, object, None);
            let member = check_member_access(ctx, expr, object_type, name);
            if *optional {
                ctx.db.union(vec![member, TypeId::UNDEFINED])
            } else {
                member
            }
        }
        ExprKind::Set {
            object,
            name,
            value,
        } => {
            let object_type = check_expr(ctx, object, None);
            let member = member_type(ctx, object_type, name).unwrap_or(TypeId::ANY);
            let value_type = check_expr(ctx, value, Some(member));
            if member != TypeId::ANY && !is_compatible(ctx.db, member, value_type) {
                ctx.error(
                    expr.span,
                    codes::TYPE_NOT_ASSIGNABLE,
                    messages::TYPE_NOT_ASSIGNABLE,
                    &[&ctx.db.display(value_type), &ctx.db.display(member)],
                );
            }
            value_type
        }
        ExprKind::GetIndex {
            object,
            index,
            optional,
        } => {
            let object_type = check_expr(ctx, object, None);
            let index_type = check_expr(ctx, index, None);
            let element = check_index_access(ctx, expr, object_type, index, index_type);
            if *optional {
                ctx.db.union(vec![element, TypeId::UNDEFINED])
            } else {
                element
            }
        }
        ExprKind::SetIndex {
            object,
            index,
            value,
        } => {
            let object_type = check_expr(ctx, object, None);
            let index_type = check_expr(ctx, index, None);
            let element = check_index_access(ctx, expr, object_type, index, index_type);
            let value_type = check_expr(ctx, value, Some(element));
            if element != TypeId::ANY && !is_compatible(ctx.db, element, value_type) {
                ctx.error(
                    expr.span,
                    codes::TYPE_NOT_ASSIGNABLE,
                    messages::TYPE_NOT_ASSIGNABLE,
                    &[&ctx.db.display(value_type), &ctx.db.display(element)],
                );
            }
            value_type
        }
        ExprKind::CompoundSet { object, value, .. }
        | ExprKind::CompoundSetIndex { object, value, .. } => {
            check_expr(ctx, object, None);
            check_expr(ctx, value, None);
            TypeId::ANY
        }
        ExprKind::Call {
            callee,
            arguments,
            type_args,
            ..
        } => call_checker::check_call(ctx, expr, callee, arguments, type_args),
        ExprKind::New {
            callee,
            arguments,
            type_args,
        } => call_checker::check_new(ctx, expr, callee, arguments, type_args),
        ExprKind::ArrayLiteral { elements } => check_array_literal(ctx, elements, expected),
        ExprKind::ObjectLiteral { properties } => check_object_literal(ctx, properties, expected),
        ExprKind::Spread(inner) => check_expr(ctx, inner, None),
        ExprKind::TemplateLiteral { parts } => {
            for part in parts {
                if let TemplatePart::Expr(e) = part {
                    check_expr(ctx, e, None);
                }
            }
            TypeId::STRING
        }
        ExprKind::ArrowFunction {
            params,
            body,
            is_expression_body,
            is_async,
        } => check_arrow(ctx, params, body, *is_expression_body, *is_async, expected),
        ExprKind::Await(operand) => {
            if !ctx.in_async {
                ctx.error(
                    expr.span,
                    codes::AWAIT_OUTSIDE_ASYNC,
                    "'await' is only allowed inside async functions.",
                    &[],
                );
            }
            // The unwrap of a promise-typed operand is not modeled; the
            // operand type flows through.
            check_expr(ctx, operand, None)
        }
        ExprKind::Yield { value, .. } => {
            if !ctx.in_generator {
                ctx.error(
                    expr.span,
                    codes::YIELD_OUTSIDE_GENERATOR,
                    "'yield' is only allowed inside generator functions.",
                    &[],
                );
            }
            if let Some(v) = value {
                check_expr(ctx, v, None);
            }
            TypeId::ANY
        }
        ExprKind::DynamicImport(specifier) => {
            check_expr(ctx, specifier, None);
            TypeId::ANY
        }
    }
}

fn check_literal(ctx: &mut CheckerContext<'_>, literal: &Literal) -> TypeId {
    match literal {
        Literal::Null => TypeId::NULL,
        Literal::Undefined => TypeId::UNDEFINED,
        Literal::Boolean(b) => ctx.db.boolean_literal(*b),
        Literal::Number(n) => ctx.db.number_literal(*n),
        Literal::String(s) => ctx.db.string_literal(s),
        Literal::BigInt(_) => TypeId::BIGINT,
        Literal::Regex { .. } => TypeId::ANY,
    }
}

fn check_binary(
    ctx: &mut CheckerContext<'_>,
    op: BinaryOp,
    left: TypeId,
    right: TypeId,
) -> TypeId {
    match op {
        BinaryOp::Add => {
            let left_wide = ctx.db.widen_literal(left);
            let right_wide = ctx.db.widen_literal(right);
            if left_wide == TypeId::STRING || right_wide == TypeId::STRING {
                TypeId::STRING
            } else if left_wide == TypeId::BIGINT && right_wide == TypeId::BIGINT {
                TypeId::BIGINT
            } else if left == TypeId::ANY || right == TypeId::ANY {
                TypeId::ANY
            } else {
                TypeId::NUMBER
            }
        }
        BinaryOp::Equal
        | BinaryOp::NotEqual
        | BinaryOp::StrictEqual
        | BinaryOp::StrictNotEqual
        | BinaryOp::Less
        | BinaryOp::LessEqual
        | BinaryOp::Greater
        | BinaryOp::GreaterEqual
        | BinaryOp::Instanceof
        | BinaryOp::In => TypeId::BOOLEAN,
        _ => TypeId::NUMBER,
    }
}

fn check_assign(
    ctx: &mut CheckerContext<'_>,
    expr: &Expr,
    target: &Pattern,
    value: &Expr,
) -> TypeId {
    match target {
        Pattern::Identifier { name, .. } => {
            let declared = ctx.lookup(name).map(|b| b.declared);
            let value_type = check_expr(ctx, value, declared);
            match declared {
                Some(declared) => {
                    if !is_compatible(ctx.db, declared, value_type) {
                        ctx.error(
                            expr.span,
                            codes::TYPE_NOT_ASSIGNABLE,
                            messages::TYPE_NOT_ASSIGNABLE,
                            &[&ctx.db.display(value_type), &ctx.db.display(declared)],
                        );
                    }
                    // Killing definition for the narrowed view.
                    let narrowing = NarrowingContext::new(ctx.db);
                    let narrowed = narrowing.narrow_by_assignment(declared, value_type);
                    ctx.set_narrowed(name, narrowed);
                }
                None => {
                    ctx.error(
                        expr.span,
                        codes::UNKNOWN_IDENTIFIER,
                        messages::UNKNOWN_IDENTIFIER,
                        &[name],
                    );
                }
            }
            value_type
        }
        pattern => {
            let value_type = check_expr(ctx, value, None);
            // Destructuring assignment re-narrows every bound name.
            crate::destructuring::assign_pattern(ctx, pattern, value_type, expr.span);
            value_type
        }
    }
}

/// Member access with a diagnostic on unknown members of known shapes.
fn check_member_access(
    ctx: &mut CheckerContext<'_>,
    expr: &Expr,
    object_type: TypeId,
    name: &str,
) -> TypeId {
    match member_type(ctx, object_type, name) {
        Some(member) => member,
        None => {
            ctx.error(
                expr.span,
                codes::UNKNOWN_PROPERTY,
                messages::UNKNOWN_PROPERTY,
                &[name, &ctx.db.display(object_type)],
            );
            TypeId::ERROR
        }
    }
}

/// The type of `object.name`, or `None` when the shape is known and lacks
/// the member. Shapes the checker cannot see into yield `any`.
pub fn member_type(ctx: &CheckerContext<'_>, object_type: TypeId, name: &str) -> Option<TypeId> {
    match ctx.db.lookup(object_type) {
        TypeKind::Any | TypeKind::Error | TypeKind::Unknown => Some(TypeId::ANY),
        TypeKind::Record(fields) => fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| {
                if f.optional {
                    ctx.db.union(vec![f.type_id, TypeId::UNDEFINED])
                } else {
                    f.type_id
                }
            }),
        TypeKind::Instance(class_id) => {
            ctx.db.instance_member(class_id, name).map(|m| m.type_id)
        }
        TypeKind::Class(class_id) => {
            let info = ctx.db.class_info(class_id);
            info.statics
                .iter()
                .find(|m| m.name == name)
                .map(|m| m.type_id)
        }
        TypeKind::Array(_) | TypeKind::Tuple { .. } => {
            if name == "length" {
                Some(TypeId::NUMBER)
            } else {
                // Array methods are not modeled member-by-member.
                Some(TypeId::ANY)
            }
        }
        TypeKind::String | TypeKind::StringLiteral(_) => {
            if name == "length" {
                Some(TypeId::NUMBER)
            } else {
                Some(TypeId::ANY)
            }
        }
        TypeKind::Union(members) => {
            // Every member must expose the property; the access unions.
            let mut types = Vec::with_capacity(members.len());
            for member in members {
                types.push(member_type(ctx, member, name)?);
            }
            Some(ctx.db.union(types))
        }
        TypeKind::Enum { .. } => Some(TypeId::NUMBER),
        _ => Some(TypeId::ANY),
    }
}

fn check_index_access(
    ctx: &mut CheckerContext<'_>,
    expr: &Expr,
    object_type: TypeId,
    index: &Expr,
    _index_type: TypeId,
) -> TypeId {
    match ctx.db.lookup(object_type) {
        TypeKind::Array(element) => element,
        TypeKind::Tuple { elements, rest_index } => {
            // A literal index selects the element type.
            if let ExprKind::Literal(Literal::Number(n)) = &index.kind {
                let idx = *n as usize;
                if idx < elements.len() {
                    return elements[idx];
                }
                if let Some(rest) = rest_index {
                    return elements[rest];
                }
                ctx.error(
                    expr.span,
                    codes::UNKNOWN_PROPERTY,
                    messages::UNKNOWN_PROPERTY,
                    &[&idx.to_string(), &ctx.db.display(object_type)],
                );
                return TypeId::ERROR;
            }
            ctx.db.union(elements)
        }
        TypeKind::String | TypeKind::StringLiteral(_) => TypeId::STRING,
        _ => TypeId::ANY,
    }
}

fn check_array_literal(
    ctx: &mut CheckerContext<'_>,
    elements: &[Expr],
    expected: Option<TypeId>,
) -> TypeId {
    // Contextual typing against a tuple expectation checks positionally.
    if let Some(expected) = expected {
        if let TypeKind::Tuple {
            elements: expected_elems,
            rest_index,
        } = ctx.db.lookup(expected)
        {
            let mut actual = Vec::with_capacity(elements.len());
            for (i, element) in elements.iter().enumerate() {
                let positional_expected = if i < expected_elems.len() && rest_index != Some(i) {
                    Some(expected_elems[i])
                } else {
                    rest_index.map(|r| expected_elems[r])
                };
                actual.push(check_expr(ctx, element, positional_expected));
            }
            return ctx.db.tuple(actual);
        }
        if let TypeKind::Array(expected_elem) = ctx.db.lookup(expected) {
            for element in elements {
                check_expr(ctx, element, Some(expected_elem));
            }
            return expected;
        }
    }

    if elements.is_empty() {
        return ctx.db.array(TypeId::ANY);
    }
    let mut element_types = Vec::with_capacity(elements.len());
    for element in elements {
        let element_type = match &element.kind {
            ExprKind::Spread(inner) => {
                let spread_type = check_expr(ctx, inner, None);
                match ctx.db.lookup(spread_type) {
                    TypeKind::Array(elem) => elem,
                    TypeKind::Tuple { elements, .. } => ctx.db.union(elements),
                    _ => TypeId::ANY,
                }
            }
            _ => check_expr(ctx, element, None),
        };
        // Mutable array literals widen their literal elements.
        element_types.push(ctx.db.widen_literal(element_type));
    }
    let element_union = ctx.db.union(element_types);
    ctx.db.array(element_union)
}

fn check_object_literal(
    ctx: &mut CheckerContext<'_>,
    properties: &[ObjectProperty],
    expected: Option<TypeId>,
) -> TypeId {
    let expected_fields = expected.and_then(|e| match ctx.db.lookup(e) {
        TypeKind::Record(fields) => Some(fields),
        _ => None,
    });

    let mut fields = Vec::with_capacity(properties.len());
    for property in properties {
        match property {
            ObjectProperty::KeyValue { key, value } => {
                let field_expected = expected_fields
                    .as_ref()
                    .and_then(|fs| fs.iter().find(|f| &f.name == key))
                    .map(|f| f.type_id);
                let value_type = check_expr(ctx, value, field_expected);
                let value_type = if field_expected.is_some() {
                    value_type
                } else {
                    ctx.db.widen_literal(value_type)
                };
                fields.push(PropertyInfo::new(key.clone(), value_type));
            }
            ObjectProperty::Shorthand { name } => {
                let value_type = ctx.lookup_type(name).unwrap_or_else(|| {
                    ctx.error(
                        tsr_common::Span::dummy(),
                        codes::UNKNOWN_IDENTIFIER,
                        messages::UNKNOWN_IDENTIFIER,
                        &[name],
                    );
                    TypeId::ERROR
                });
                fields.push(PropertyInfo::new(name.clone(), value_type));
            }
            ObjectProperty::Spread { value } => {
                let spread_type = check_expr(ctx, value, None);
                if let TypeKind::Record(spread_fields) = ctx.db.lookup(spread_type) {
                    for field in spread_fields {
                        fields.retain(|f: &PropertyInfo| f.name != field.name);
                        fields.push(field);
                    }
                }
            }
        }
    }
    ctx.db.object(fields)
}

fn check_arrow(
    ctx: &mut CheckerContext<'_>,
    params: &[Param],
    body: &[Stmt],
    is_expression_body: bool,
    is_async: bool,
    expected: Option<TypeId>,
) -> TypeId {
    // Contextual parameter types from an expected function shape.
    let expected_shape = expected.and_then(|e| match ctx.db.lookup(e) {
        TypeKind::Function(shape) => Some(shape),
        _ => None,
    });

    ctx.push_scope();
    let mut param_infos = Vec::with_capacity(params.len());
    for (i, param) in params.iter().enumerate() {
        let declared = match &param.type_annotation {
            Some(annotation) => resolve_type_node(ctx, annotation, tsr_common::Span::dummy()),
            None => expected_shape
                .as_ref()
                .and_then(|s| s.params.get(i))
                .map(|p| p.type_id)
                .unwrap_or(TypeId::ANY),
        };
        crate::destructuring::bind_pattern(ctx, &param.pattern, declared, false);
        param_infos.push(ParamInfo {
            name: param.simple_name().map(String::from),
            type_id: declared,
            optional: param.optional,
        });
    }

    let saved_async = ctx.in_async;
    ctx.in_async = is_async;
    if !is_expression_body {
        crate::declarations::hoist_declarations(ctx, body);
    }
    let return_type = if is_expression_body {
        // A bare-expression body was synthesized into a single return.
        match body.first().map(|s| &s.kind) {
            Some(tsr_ast::StmtKind::Return { value: Some(value) }) => {
                check_expr(ctx, value, None)
            }
            _ => {
                for stmt in body {
                    statements::check_stmt(ctx, stmt);
                }
                TypeId::VOID
            }
        }
    } else {
        for stmt in body {
            statements::check_stmt(ctx, stmt);
        }
        statements::infer_return_type(ctx, body)
    };
    ctx.in_async = saved_async;
    ctx.pop_scope();

    let has_rest = params.last().is_some_and(|p| p.is_rest);
    let mut shape = FunctionShape::new(param_infos, return_type);
    if has_rest {
        shape = shape.with_rest();
    }
    ctx.db.function(shape)
}

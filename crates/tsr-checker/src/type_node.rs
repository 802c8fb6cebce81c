//! Resolution of syntactic type annotations to interned `TypeId`s.

use tsr_ast::type_node::{FunctionTypeParam, ObjectTypeField, TypeNode};
use tsr_common::diagnostics::{codes, messages};
use tsr_common::Span;
use tsr_types::{FunctionShape, ParamInfo, PropertyInfo, TypeId};

use crate::context::CheckerContext;

/// Resolve an annotation. Unknown names produce a diagnostic and `error`.
pub fn resolve_type_node(ctx: &mut CheckerContext<'_>, node: &TypeNode, span: Span) -> TypeId {
    match node {
        TypeNode::Named { name, type_args } => resolve_named(ctx, name, type_args, span),
        TypeNode::Union(members) => {
            let resolved = members
                .iter()
                .map(|m| resolve_type_node(ctx, m, span))
                .collect();
            ctx.db.union(resolved)
        }
        TypeNode::Intersection(members) => {
            let resolved = members
                .iter()
                .map(|m| resolve_type_node(ctx, m, span))
                .collect();
            ctx.db.intersection(resolved)
        }
        TypeNode::Array(element) => {
            let element = resolve_type_node(ctx, element, span);
            ctx.db.array(element)
        }
        TypeNode::Tuple {
            elements,
            rest_index,
        } => {
            let resolved: Vec<TypeId> = elements
                .iter()
                .map(|e| resolve_type_node(ctx, e, span))
                .collect();
            match rest_index {
                Some(idx) => ctx.db.tuple_with_rest(resolved, *idx),
                None => ctx.db.tuple(resolved),
            }
        }
        TypeNode::Object(fields) => {
            let properties = fields
                .iter()
                .map(|ObjectTypeField { name, type_node, optional }| PropertyInfo {
                    name: name.clone(),
                    type_id: resolve_type_node(ctx, type_node, span),
                    optional: *optional,
                    readonly: false,
                })
                .collect();
            ctx.db.object(properties)
        }
        TypeNode::Function {
            params,
            return_type,
        } => {
            let resolved_params: Vec<ParamInfo> = params
                .iter()
                .map(
                    |FunctionTypeParam { name, type_node, optional, .. }| ParamInfo {
                        name: Some(name.clone()),
                        type_id: resolve_type_node(ctx, type_node, span),
                        optional: *optional,
                    },
                )
                .collect();
            let has_rest = params.last().is_some_and(|p| p.is_rest);
            let return_type = resolve_type_node(ctx, return_type, span);
            let mut shape = FunctionShape::new(resolved_params, return_type);
            if has_rest {
                shape = shape.with_rest();
            }
            ctx.db.function(shape)
        }
        TypeNode::StringLiteral(s) => ctx.db.string_literal(s),
        TypeNode::NumberLiteral(n) => ctx.db.number_literal(*n),
        TypeNode::BooleanLiteral(b) => ctx.db.boolean_literal(*b),
    }
}

fn resolve_named(
    ctx: &mut CheckerContext<'_>,
    name: &str,
    type_args: &[TypeNode],
    span: Span,
) -> TypeId {
    // Keywords first.
    let keyword = match name {
        "string" => Some(TypeId::STRING),
        "number" => Some(TypeId::NUMBER),
        "boolean" => Some(TypeId::BOOLEAN),
        "bigint" => Some(TypeId::BIGINT),
        "symbol" => Some(TypeId::SYMBOL),
        "null" => Some(TypeId::NULL),
        "undefined" => Some(TypeId::UNDEFINED),
        "void" => Some(TypeId::VOID),
        "never" => Some(TypeId::NEVER),
        "any" => Some(TypeId::ANY),
        "unknown" => Some(TypeId::UNKNOWN),
        _ => None,
    };
    if let Some(id) = keyword {
        return id;
    }

    if name == "Array" {
        let element = type_args
            .first()
            .map(|arg| resolve_type_node(ctx, arg, span))
            .unwrap_or(TypeId::ANY);
        return ctx.db.array(element);
    }

    if let Some(type_param) = ctx.lookup_type_param(name) {
        return type_param;
    }

    if let Some(&class_id) = ctx.classes.get(name) {
        return ctx.db.instance_type(class_id);
    }

    ctx.error(span, codes::UNKNOWN_TYPE_NAME, messages::UNKNOWN_TYPE_NAME, &[name]);
    TypeId::ERROR
}

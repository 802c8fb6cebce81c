//! Pattern binding against a source type.
//!
//! Identifier patterns bind with nullish-coalesced defaults (the binding
//! type drops `undefined` and admits the default's type); nested patterns
//! recurse; an array rest takes the tail from its position; an object rest
//! binds a record excluding all previously-named keys.

use tsr_ast::pattern::{ArrayElement, ObjectPatternProperty, Pattern};
use tsr_common::diagnostics::{codes, messages};
use tsr_common::Span;
use tsr_types::{NarrowingContext, PropertyInfo, TypeId, TypeKind};

use crate::context::CheckerContext;
use crate::expr::check_expr;

/// Declare every name a pattern binds, typed from the source type.
pub fn bind_pattern(
    ctx: &mut CheckerContext<'_>,
    pattern: &Pattern,
    source: TypeId,
    is_const: bool,
) {
    match pattern {
        Pattern::Identifier { name, default } => {
            let bound = apply_default(ctx, source, default.as_deref());
            ctx.declare(name, bound, is_const);
        }
        Pattern::Rest { name } => {
            // A bare rest binds the remaining source as an array.
            let bound = match ctx.db.lookup(source) {
                TypeKind::Array(_) | TypeKind::Tuple { .. } => source,
                _ => ctx.db.array(source),
            };
            ctx.declare(name, bound, is_const);
        }
        Pattern::Array { elements } => bind_array_pattern(ctx, elements, source, is_const),
        Pattern::Object { properties } => bind_object_pattern(ctx, properties, source, is_const),
    }
}

/// Re-narrow already-declared names from a destructuring assignment.
pub fn assign_pattern(
    ctx: &mut CheckerContext<'_>,
    pattern: &Pattern,
    source: TypeId,
    span: Span,
) {
    for name in pattern.bound_names() {
        if ctx.lookup(name).is_none() {
            ctx.error(
                span,
                codes::UNKNOWN_IDENTIFIER,
                messages::UNKNOWN_IDENTIFIER,
                &[name],
            );
            continue;
        }
        // Assignment destructuring widens literals.
        let widened = ctx.db.widen_literal(source);
        let element = element_type_for(ctx, widened);
        ctx.set_narrowed(name, element);
    }
}

fn element_type_for(ctx: &CheckerContext<'_>, source: TypeId) -> TypeId {
    match ctx.db.lookup(source) {
        TypeKind::Array(element) => element,
        _ => TypeId::ANY,
    }
}

fn apply_default(
    ctx: &mut CheckerContext<'_>,
    source: TypeId,
    default: Option<&tsr_ast::Expr>,
) -> TypeId {
    match default {
        None => source,
        Some(default_expr) => {
            let default_type = check_expr(ctx, default_expr, None);
            // The default replaces undefined, so the binding never sees it.
            let narrowing = NarrowingContext::new(ctx.db);
            let without_undefined = narrowing.narrow_by_nullish(source, false);
            ctx.db.union(vec![without_undefined, default_type])
        }
    }
}

fn bind_array_pattern(
    ctx: &mut CheckerContext<'_>,
    elements: &[ArrayElement],
    source: TypeId,
    is_const: bool,
) {
    let source_kind = ctx.db.lookup(source);
    for (index, element) in elements.iter().enumerate() {
        match element {
            ArrayElement::Hole => {}
            ArrayElement::Pattern(Pattern::Rest { name }) => {
                // The rest takes the tail starting at its position.
                let rest_type = match &source_kind {
                    TypeKind::Array(element) => ctx.db.array(*element),
                    TypeKind::Tuple { elements: elems, .. } => {
                        let tail: Vec<TypeId> = elems.iter().copied().skip(index).collect();
                        if tail.is_empty() {
                            // Destructuring an exhausted tuple: empty tail.
                            ctx.db.tuple(vec![])
                        } else {
                            ctx.db.array(ctx.db.union(tail))
                        }
                    }
                    _ => ctx.db.array(TypeId::ANY),
                };
                ctx.declare(name, rest_type, is_const);
            }
            ArrayElement::Pattern(pattern) => {
                let element_type = match &source_kind {
                    TypeKind::Array(element) => *element,
                    TypeKind::Tuple { elements: elems, rest_index } => {
                        if index < elems.len() && *rest_index != Some(index) {
                            elems[index]
                        } else if let Some(rest) = rest_index {
                            elems[*rest]
                        } else {
                            TypeId::UNDEFINED
                        }
                    }
                    TypeKind::Any | TypeKind::Error => TypeId::ANY,
                    _ => TypeId::ANY,
                };
                bind_pattern(ctx, pattern, element_type, is_const);
            }
        }
    }
}

fn bind_object_pattern(
    ctx: &mut CheckerContext<'_>,
    properties: &[ObjectPatternProperty],
    source: TypeId,
    is_const: bool,
) {
    let mut named_keys: Vec<String> = Vec::new();
    for property in properties {
        match property {
            ObjectPatternProperty::Named {
                key,
                value,
                default,
            } => {
                named_keys.push(key.clone());
                let field_type = field_type(ctx, source, key);
                let field_type = apply_default(ctx, field_type, default.as_deref());
                bind_pattern(ctx, value, field_type, is_const);
            }
            ObjectPatternProperty::Rest { name } => {
                // Everything except the previously-named keys.
                let rest_type = match ctx.db.lookup(source) {
                    TypeKind::Record(fields) => {
                        let remaining: Vec<PropertyInfo> = fields
                            .into_iter()
                            .filter(|f| !named_keys.contains(&f.name))
                            .collect();
                        ctx.db.object(remaining)
                    }
                    _ => ctx.db.object(vec![]),
                };
                ctx.declare(name, rest_type, is_const);
            }
        }
    }
}

fn field_type(ctx: &mut CheckerContext<'_>, source: TypeId, key: &str) -> TypeId {
    match ctx.db.lookup(source) {
        TypeKind::Any | TypeKind::Error | TypeKind::Unknown => TypeId::ANY,
        TypeKind::Record(fields) => match fields.iter().find(|f| f.name == key) {
            Some(field) => {
                if field.optional {
                    ctx.db.union(vec![field.type_id, TypeId::UNDEFINED])
                } else {
                    field.type_id
                }
            }
            None => {
                ctx.error(
                    Span::dummy(),
                    codes::UNKNOWN_PROPERTY,
                    messages::UNKNOWN_PROPERTY,
                    &[key, &ctx.db.display(source)],
                );
                TypeId::ERROR
            }
        },
        TypeKind::Instance(class_id) => ctx
            .db
            .instance_member(class_id, key)
            .map(|m| m.type_id)
            .unwrap_or(TypeId::ANY),
        _ => TypeId::ANY,
    }
}

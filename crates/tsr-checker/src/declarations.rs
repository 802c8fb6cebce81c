//! Declaration hoisting: classes, functions (with overload grouping), and
//! enums become visible before any statement is checked.
//!
//! Classes register in two phases so members and superclasses may refer to
//! classes declared later in the file: names first, member shapes second.

use tsr_ast::stmt::{ClassDecl, ClassMemberKind, FunctionDecl, Stmt, StmtKind};
use tsr_common::diagnostics::{codes, messages};
use tsr_types::{
    ClassInfo, EnumMember, FunctionShape, ParamInfo, PropertyInfo, TypeId, TypeParamInfo,
};

use crate::context::CheckerContext;
use crate::type_node::resolve_type_node;

pub fn hoist_declarations(ctx: &mut CheckerContext<'_>, statements: &[Stmt]) {
    // Phase 1: class names get placeholder entries.
    for stmt in statements {
        if let Some(class) = as_class(stmt) {
            let class_id = ctx.db.register_class(ClassInfo {
                name: class.name.clone(),
                superclass: None,
                type_params: class.type_params.clone(),
                members: Vec::new(),
                statics: Vec::new(),
                constructor: None,
            });
            ctx.classes.insert(class.name.clone(), class_id);
        }
    }

    // Phase 2: fill class shapes, group function overloads, declare enums.
    let mut pending_signatures: Vec<(String, FunctionShape)> = Vec::new();
    for stmt in statements {
        match unwrap_export(stmt) {
            StmtKind::Class(class) => hoist_class(ctx, class),
            StmtKind::Function(func) => {
                let shape = function_shape(ctx, func);
                if func.is_signature_only() {
                    pending_signatures.push((func.name.clone(), shape));
                } else {
                    declare_function(ctx, func, shape, &mut pending_signatures);
                }
            }
            StmtKind::Enum { name, members } => {
                let mut enum_members = Vec::with_capacity(members.len());
                let mut next_value = 0.0f64;
                for (member_name, initializer) in members {
                    if let Some(tsr_ast::expr::ExprKind::Literal(
                        tsr_ast::expr::Literal::Number(n),
                    )) = initializer.as_ref().map(|e| &e.kind)
                    {
                        next_value = *n;
                    }
                    enum_members.push(EnumMember {
                        name: member_name.clone(),
                        value: tsr_types::FloatBits::new(next_value),
                    });
                    next_value += 1.0;
                }
                let enum_type = ctx.db.enum_type(name, enum_members);
                ctx.declare(name, enum_type, true);
            }
            _ => {}
        }
    }

    // Signatures with no implementation still declare the name.
    let leftovers = std::mem::take(&mut pending_signatures);
    for (name, shape) in group_by_name(leftovers) {
        let type_id = if shape.len() == 1 {
            ctx.db.function(shape.into_iter().next().expect("one shape"))
        } else {
            ctx.db.overloaded(shape, None)
        };
        ctx.declare(&name, type_id, true);
    }
}

fn as_class(stmt: &Stmt) -> Option<&ClassDecl> {
    match unwrap_export(stmt) {
        StmtKind::Class(class) => Some(class),
        _ => None,
    }
}

/// Exported declarations hoist exactly like local ones.
fn unwrap_export(stmt: &Stmt) -> &StmtKind {
    match &stmt.kind {
        StmtKind::Export(export) => match &export.declaration {
            Some(inner) => &inner.kind,
            None => &stmt.kind,
        },
        other => other,
    }
}

fn group_by_name(signatures: Vec<(String, FunctionShape)>) -> Vec<(String, Vec<FunctionShape>)> {
    let mut grouped: Vec<(String, Vec<FunctionShape>)> = Vec::new();
    for (name, shape) in signatures {
        match grouped.iter_mut().find(|(n, _)| *n == name) {
            Some((_, shapes)) => shapes.push(shape),
            None => grouped.push((name, vec![shape])),
        }
    }
    grouped
}

fn declare_function(
    ctx: &mut CheckerContext<'_>,
    func: &FunctionDecl,
    implementation: FunctionShape,
    pending_signatures: &mut Vec<(String, FunctionShape)>,
) {
    let signatures: Vec<FunctionShape> = pending_signatures
        .iter()
        .filter(|(name, _)| name == &func.name)
        .map(|(_, shape)| shape.clone())
        .collect();
    pending_signatures.retain(|(name, _)| name != &func.name);

    let base_type = if signatures.is_empty() {
        ctx.db.function(implementation)
    } else {
        // Calls resolve against the declared signatures, never the
        // implementation signature.
        ctx.db.overloaded(signatures, Some(implementation))
    };

    let type_id = if func.type_params.is_empty() {
        base_type
    } else {
        let params: Vec<TypeParamInfo> = func
            .type_params
            .iter()
            .map(|name| TypeParamInfo {
                name: name.clone(),
                constraint: None,
            })
            .collect();
        ctx.db.generic(params, base_type)
    };
    ctx.declare(&func.name, type_id, true);
}

/// The declared signature of a function, resolved in a fresh type-parameter
/// scope when the function is generic.
pub fn function_shape(ctx: &mut CheckerContext<'_>, func: &FunctionDecl) -> FunctionShape {
    if !func.type_params.is_empty() {
        ctx.push_type_params(&func.type_params);
    }

    let mut params = Vec::with_capacity(func.params.len());
    for param in &func.params {
        let type_id = match &param.type_annotation {
            Some(annotation) => resolve_type_node(ctx, annotation, func.span),
            None => TypeId::ANY,
        };
        params.push(ParamInfo {
            name: param.simple_name().map(String::from),
            type_id,
            optional: param.optional,
        });
    }
    let has_rest = func.params.last().is_some_and(|p| p.is_rest);
    let return_type = match &func.return_type {
        Some(annotation) => resolve_type_node(ctx, annotation, func.span),
        None => TypeId::ANY,
    };

    if !func.type_params.is_empty() {
        ctx.pop_type_params();
    }

    let mut shape = FunctionShape::new(params, return_type);
    if has_rest {
        shape = shape.with_rest();
    }
    shape
}

fn hoist_class(ctx: &mut CheckerContext<'_>, class: &ClassDecl) {
    let Some(&class_id) = ctx.classes.get(&class.name) else {
        return;
    };

    let superclass = match &class.superclass {
        Some(name) => match ctx.classes.get(name) {
            Some(&super_id) => Some(super_id),
            None => {
                ctx.error(
                    class.span,
                    codes::NOT_A_CLASS,
                    messages::UNKNOWN_TYPE_NAME,
                    &[name],
                );
                None
            }
        },
        None => None,
    };

    if !class.type_params.is_empty() {
        ctx.push_type_params(&class.type_params);
    }

    let mut members = Vec::new();
    let mut statics = Vec::new();
    let mut constructor = None;
    for member in &class.members {
        let (name, type_id) = match &member.kind {
            ClassMemberKind::Field {
                type_annotation, ..
            } => {
                let type_id = match type_annotation {
                    Some(annotation) => resolve_type_node(ctx, annotation, member.span),
                    None => TypeId::ANY,
                };
                (member.name.clone(), type_id)
            }
            ClassMemberKind::Method(func) => {
                let shape = function_shape(ctx, func);
                (member.name.clone(), ctx.db.function(shape))
            }
            ClassMemberKind::Getter(func) => {
                let shape = function_shape(ctx, func);
                (member.name.clone(), shape.return_type)
            }
            ClassMemberKind::Setter(func) => {
                let shape = function_shape(ctx, func);
                let value_type = shape
                    .params
                    .first()
                    .map(|p| p.type_id)
                    .unwrap_or(TypeId::ANY);
                (member.name.clone(), value_type)
            }
            ClassMemberKind::Constructor(func) => {
                constructor = Some(function_shape(ctx, func));
                continue;
            }
        };
        let info = PropertyInfo::new(name, type_id);
        if member.is_static {
            statics.push(info);
        } else {
            members.push(info);
        }
    }

    if !class.type_params.is_empty() {
        ctx.pop_type_params();
    }

    ctx.db.update_class(
        class_id,
        ClassInfo {
            name: class.name.clone(),
            superclass,
            type_params: class.type_params.clone(),
            members,
            statics,
            constructor,
        },
    );
    let class_type = ctx.db.class_type(class_id);
    ctx.declare(&class.name, class_type, true);
}

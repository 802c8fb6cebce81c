//! Call resolution: plain, overloaded, and generic functions.
//!
//! Overload selection collects every signature the argument list satisfies,
//! then ranks candidates pairwise with the specificity order
//! (literal over primitive, primitive over a union containing it,
//! non-nullable over nullable, derived class over base class). Ties break
//! toward declaration order.

use crate::compat::is_compatible;
use crate::infer::InferenceContext;
use crate::interner::TypeInterner;
use crate::types::{FunctionShape, TypeId, TypeKind};

/// One argument at a call site.
#[derive(Clone, Copy, Debug)]
pub struct CallArg {
    pub type_id: TypeId,
    /// Set for `...expr`; `type_id` is then the spread's *element* type.
    pub spread: bool,
}

impl CallArg {
    pub fn positional(type_id: TypeId) -> Self {
        CallArg {
            type_id,
            spread: false,
        }
    }

    pub fn spread(element_type: TypeId) -> Self {
        CallArg {
            type_id: element_type,
            spread: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CallError {
    NotCallable(TypeId),
    ArityMismatch {
        min: usize,
        max: Option<usize>,
        got: usize,
    },
    ArgumentMismatch {
        index: usize,
        expected: TypeId,
        actual: TypeId,
    },
    NoOverload {
        arg_types: Vec<TypeId>,
    },
    TypeArgumentCount {
        expected: usize,
        got: usize,
    },
}

/// Resolve a call against a callee type, producing the result type.
pub fn resolve_call(
    db: &TypeInterner,
    callee: TypeId,
    args: &[CallArg],
    type_args: &[TypeId],
) -> Result<TypeId, CallError> {
    match db.lookup(callee) {
        TypeKind::Any | TypeKind::Error => Ok(TypeId::ANY),
        TypeKind::Function(shape) => {
            check_signature(db, &shape, args)?;
            Ok(shape.return_type)
        }
        TypeKind::Overloaded { signatures, .. } => {
            resolve_overloaded(db, &signatures, args)
        }
        TypeKind::Generic { type_params, inner } => {
            let mut ctx = InferenceContext::new(db);
            if !type_args.is_empty() {
                if type_args.len() != type_params.len() {
                    return Err(CallError::TypeArgumentCount {
                        expected: type_params.len(),
                        got: type_args.len(),
                    });
                }
                for (param, &arg) in type_params.iter().zip(type_args) {
                    ctx.bind(&param.name, arg);
                }
            } else if let TypeKind::Function(shape) = db.lookup(inner) {
                // Unify each declared parameter against the matching argument.
                for (param, arg) in shape.positional().iter().zip(args) {
                    if !arg.spread {
                        ctx.infer(param.type_id, arg.type_id);
                    }
                }
                if let Some(rest_elem) = shape.rest_element() {
                    for arg in args.iter().skip(shape.positional().len()) {
                        ctx.infer(rest_elem, arg.type_id);
                    }
                }
            }
            let instantiated = ctx.substitute(inner);
            resolve_call(db, instantiated, args, &[])
        }
        _ => Err(CallError::NotCallable(callee)),
    }
}

/// Verify an argument list against a single signature.
pub fn check_signature(
    db: &TypeInterner,
    shape: &FunctionShape,
    args: &[CallArg],
) -> Result<(), CallError> {
    let has_spread = args.iter().any(|a| a.spread);
    let positional_params = shape.positional();

    // Arity: spreads supply an unknown number of values, so only fixed
    // argument lists are held to the declared bounds.
    if !has_spread {
        if args.len() < shape.min_arity {
            return Err(CallError::ArityMismatch {
                min: shape.min_arity,
                max: if shape.has_rest {
                    None
                } else {
                    Some(shape.params.len())
                },
                got: args.len(),
            });
        }
        if !shape.has_rest && args.len() > shape.params.len() {
            return Err(CallError::ArityMismatch {
                min: shape.min_arity,
                max: Some(shape.params.len()),
                got: args.len(),
            });
        }
    }

    let mut position = 0usize;
    for (index, arg) in args.iter().enumerate() {
        if arg.spread {
            if let Some(rest_elem) = shape.rest_element() {
                if !is_compatible(db, rest_elem, arg.type_id) {
                    return Err(CallError::ArgumentMismatch {
                        index,
                        expected: rest_elem,
                        actual: arg.type_id,
                    });
                }
            } else {
                // No rest parameter: the spread's elements feed the
                // remaining positional parameters, then positional
                // checking stops.
                for param in positional_params.iter().skip(position) {
                    if !is_compatible(db, param.type_id, arg.type_id) {
                        return Err(CallError::ArgumentMismatch {
                            index,
                            expected: param.type_id,
                            actual: arg.type_id,
                        });
                    }
                }
                return Ok(());
            }
            continue;
        }

        let expected = if position < positional_params.len() {
            positional_params[position].type_id
        } else if let Some(rest_elem) = shape.rest_element() {
            rest_elem
        } else {
            // Over-arity was rejected above unless a spread appeared.
            break;
        };
        if !is_compatible(db, expected, arg.type_id) {
            return Err(CallError::ArgumentMismatch {
                index,
                expected,
                actual: arg.type_id,
            });
        }
        position += 1;
    }
    Ok(())
}

fn resolve_overloaded(
    db: &TypeInterner,
    signatures: &[FunctionShape],
    args: &[CallArg],
) -> Result<TypeId, CallError> {
    let matches: Vec<(usize, &FunctionShape)> = signatures
        .iter()
        .enumerate()
        .filter(|(_, sig)| check_signature(db, sig, args).is_ok())
        .collect();

    match matches.len() {
        0 => Err(CallError::NoOverload {
            arg_types: args.iter().map(|a| a.type_id).collect(),
        }),
        1 => Ok(matches[0].1.return_type),
        _ => {
            // Keep the earliest declaration unless a later one is strictly
            // more specific.
            let mut best = matches[0];
            for &candidate in &matches[1..] {
                if signature_more_specific(db, candidate.1, best.1) {
                    best = candidate;
                }
            }
            Ok(best.1.return_type)
        }
    }
}

/// True when `a` is strictly more specific than `b` under the pairwise
/// parameter order.
fn signature_more_specific(db: &TypeInterner, a: &FunctionShape, b: &FunctionShape) -> bool {
    let mut a_wins = 0usize;
    let mut b_wins = 0usize;
    for (pa, pb) in a.params.iter().zip(&b.params) {
        if param_more_specific(db, pa.type_id, pb.type_id) {
            a_wins += 1;
        }
        if param_more_specific(db, pb.type_id, pa.type_id) {
            b_wins += 1;
        }
    }
    a_wins > b_wins
}

/// The specificity partial order on parameter types.
fn param_more_specific(db: &TypeInterner, a: TypeId, b: TypeId) -> bool {
    if a == b {
        return false;
    }
    // Anything beats any.
    if b == TypeId::ANY && a != TypeId::ANY {
        return true;
    }
    if a == TypeId::ANY {
        return false;
    }

    let a_kind = db.lookup(a);
    let b_kind = db.lookup(b);

    // Literal over its base primitive.
    let literal_over_primitive = matches!(
        (&a_kind, &b_kind),
        (TypeKind::StringLiteral(_), TypeKind::String)
            | (TypeKind::NumberLiteral(_), TypeKind::Number)
            | (TypeKind::BooleanLiteral(_), TypeKind::Boolean)
    );
    if literal_over_primitive {
        return true;
    }

    // A member over a union containing it.
    if let TypeKind::Union(members) = &b_kind {
        if members.contains(&a) {
            return true;
        }
        // Non-nullable over nullable: `T` beats `T | null | undefined`.
        let stripped: Vec<TypeId> = members
            .iter()
            .copied()
            .filter(|&m| m != TypeId::NULL && m != TypeId::UNDEFINED)
            .collect();
        if stripped.len() < members.len() && db.union(stripped) == a {
            return true;
        }
    }

    // Derived class over base class.
    if let (TypeKind::Instance(a_class), TypeKind::Instance(b_class)) = (&a_kind, &b_kind) {
        return a_class != b_class && db.is_subclass_of(*a_class, *b_class);
    }

    false
}

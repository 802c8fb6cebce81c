//! The assignability relation: `is_compatible(expected, actual)`.
//!
//! Gradual typing: `any` (and the checker's `error` poison) permits
//! assignment on either side. The relation is otherwise directional:
//! "a value of type `actual` may be used where `expected` is required".

use crate::interner::TypeInterner;
use crate::types::{FunctionShape, TypeId, TypeKind};

/// Whether `actual` is assignable to `expected`.
pub fn is_compatible(db: &TypeInterner, expected: TypeId, actual: TypeId) -> bool {
    if expected == actual {
        return true;
    }
    if expected == TypeId::ANY
        || actual == TypeId::ANY
        || expected == TypeId::ERROR
        || actual == TypeId::ERROR
    {
        return true;
    }
    if expected == TypeId::UNKNOWN {
        return true;
    }
    if actual == TypeId::NEVER {
        return true;
    }

    let actual_kind = db.lookup(actual);

    // A union actual must be compatible member-wise, regardless of the
    // expected side's shape.
    if let TypeKind::Union(members) = &actual_kind {
        return members.iter().all(|&m| is_compatible(db, expected, m));
    }

    let expected_kind = db.lookup(expected);

    // A union expected admits anything compatible with one member.
    if let TypeKind::Union(members) = &expected_kind {
        return members.iter().any(|&m| is_compatible(db, m, actual));
    }

    // An intersection expected requires all members to admit the actual.
    if let TypeKind::Intersection(members) = &expected_kind {
        return members.iter().all(|&m| is_compatible(db, m, actual));
    }
    // An intersection actual satisfies anything one of its members does.
    if let TypeKind::Intersection(members) = &actual_kind {
        return members.iter().any(|&m| is_compatible(db, expected, m));
    }

    match (&expected_kind, &actual_kind) {
        // Literal actual against its base primitive.
        (TypeKind::String, TypeKind::StringLiteral(_))
        | (TypeKind::Number, TypeKind::NumberLiteral(_))
        | (TypeKind::Boolean, TypeKind::BooleanLiteral(_)) => true,

        // Enums are number-backed.
        (TypeKind::Number, TypeKind::Enum { .. }) => true,
        (TypeKind::Enum { .. }, TypeKind::NumberLiteral(_)) => true,

        // Void accepts undefined (function returning nothing).
        (TypeKind::Void, TypeKind::Undefined) => true,

        (TypeKind::Array(expected_elem), TypeKind::Array(actual_elem)) => {
            is_compatible(db, *expected_elem, *actual_elem)
        }

        // A fixed-length tuple is assignable to an array of a compatible
        // element type.
        (TypeKind::Array(expected_elem), TypeKind::Tuple { elements, .. }) => elements
            .iter()
            .all(|&e| is_compatible(db, *expected_elem, e)),

        (
            TypeKind::Tuple {
                elements: expected_elems,
                rest_index,
            },
            TypeKind::Tuple {
                elements: actual_elems,
                rest_index: actual_rest,
            },
        ) => tuple_compatible(
            db,
            expected_elems,
            *rest_index,
            actual_elems,
            *actual_rest,
        ),

        (TypeKind::Record(expected_fields), TypeKind::Record(actual_fields)) => {
            expected_fields.iter().all(|field| {
                match actual_fields.iter().find(|f| f.name == field.name) {
                    Some(actual_field) => {
                        is_compatible(db, field.type_id, actual_field.type_id)
                    }
                    None => field.optional,
                }
            })
        }

        // Nominal: instance-to-instance through the superclass chain.
        (TypeKind::Instance(expected_class), TypeKind::Instance(actual_class)) => {
            db.is_subclass_of(*actual_class, *expected_class)
        }
        (TypeKind::Class(expected_class), TypeKind::Class(actual_class)) => {
            db.is_subclass_of(*actual_class, *expected_class)
        }

        (TypeKind::Function(expected_shape), TypeKind::Function(actual_shape)) => {
            function_compatible(db, expected_shape, actual_shape)
        }
        // An overloaded function satisfies a plain function expectation if
        // any signature does.
        (TypeKind::Function(expected_shape), TypeKind::Overloaded { signatures, .. }) => {
            signatures
                .iter()
                .any(|sig| function_compatible(db, expected_shape, sig))
        }

        (
            TypeKind::TypeVar {
                bound: Some(bound), ..
            },
            _,
        ) => is_compatible(db, *bound, actual),
        (_, TypeKind::TypeVar { bound, .. }) => match bound {
            Some(bound) => is_compatible(db, expected, *bound),
            None => false,
        },

        _ => false,
    }
}

fn tuple_compatible(
    db: &TypeInterner,
    expected_elems: &[TypeId],
    expected_rest: Option<usize>,
    actual_elems: &[TypeId],
    actual_rest: Option<usize>,
) -> bool {
    // An open (rest) actual can never satisfy a fixed expected length.
    if expected_rest.is_none() && actual_rest.is_some() {
        return false;
    }
    match expected_rest {
        None => {
            actual_elems.len() == expected_elems.len()
                && expected_elems
                    .iter()
                    .zip(actual_elems)
                    .all(|(&e, &a)| is_compatible(db, e, a))
        }
        Some(rest_index) => {
            // Fixed prefix must be present and match; the tail matches the
            // rest element type.
            if actual_elems.len() < rest_index {
                return false;
            }
            let rest_type = expected_elems[rest_index];
            for (i, &actual_elem) in actual_elems.iter().enumerate() {
                let expected_elem = if i < rest_index {
                    expected_elems[i]
                } else {
                    rest_type
                };
                if !is_compatible(db, expected_elem, actual_elem) {
                    return false;
                }
            }
            true
        }
    }
}

/// Function assignability: the actual may require no more parameters than
/// the expected supplies; parameter and return types are checked pairwise.
/// Parameters are compared bivariantly, matching the gradual discipline.
fn function_compatible(
    db: &TypeInterner,
    expected: &FunctionShape,
    actual: &FunctionShape,
) -> bool {
    if actual.min_arity > expected.params.len() && !expected.has_rest {
        return false;
    }
    for (expected_param, actual_param) in expected.positional().iter().zip(actual.positional()) {
        let forward = is_compatible(db, expected_param.type_id, actual_param.type_id);
        let backward = is_compatible(db, actual_param.type_id, expected_param.type_id);
        if !forward && !backward {
            return false;
        }
    }
    is_compatible(db, expected.return_type, actual.return_type)
}

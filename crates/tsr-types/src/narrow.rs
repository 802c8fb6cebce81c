//! Narrowing primitives applied by the checker's flow pass.
//!
//! Each guard takes the type flowing into an edge and the edge's truth
//! assumption, and returns the refined type. Guards never invent members:
//! they filter unions, or refine `any`/`unknown` to the guarded type on the
//! true edge.

use crate::interner::TypeInterner;
use crate::types::{ClassId, TypeId, TypeKind};

pub struct NarrowingContext<'a> {
    db: &'a TypeInterner,
}

impl<'a> NarrowingContext<'a> {
    pub fn new(db: &'a TypeInterner) -> Self {
        NarrowingContext { db }
    }

    /// `typeof x === name`: keep matching members on the true edge, remove
    /// them on the false edge.
    pub fn narrow_by_typeof(&self, type_id: TypeId, name: &str, assume_true: bool) -> TypeId {
        // `any`/`unknown` refine to the guarded primitive on the true edge.
        if assume_true && (type_id == TypeId::ANY || type_id == TypeId::UNKNOWN) {
            if let Some(guarded) = typeof_primitive(name) {
                return guarded;
            }
        }
        self.filter_members(type_id, |db, member| {
            let matches = typeof_matches(db, member, name);
            if assume_true { matches } else { !matches }
        })
    }

    /// `x === null` / `x == null`: `Null | Undefined` on the true edge,
    /// both removed on the false edge.
    pub fn narrow_by_nullish(&self, type_id: TypeId, assume_true: bool) -> TypeId {
        if assume_true {
            if type_id == TypeId::ANY || type_id == TypeId::UNKNOWN {
                return self.db.union(vec![TypeId::NULL, TypeId::UNDEFINED]);
            }
            self.filter_members(type_id, |_, member| {
                member == TypeId::NULL || member == TypeId::UNDEFINED
            })
        } else {
            self.filter_members(type_id, |_, member| {
                member != TypeId::NULL && member != TypeId::UNDEFINED
            })
        }
    }

    /// `x instanceof C`: members that are instances of `C` (or a subclass)
    /// on the true edge.
    pub fn narrow_by_instanceof(
        &self,
        type_id: TypeId,
        class: ClassId,
        assume_true: bool,
    ) -> TypeId {
        if assume_true && (type_id == TypeId::ANY || type_id == TypeId::UNKNOWN) {
            return self.db.instance_type(class);
        }
        let narrowed = self.filter_members(type_id, |db, member| {
            let is_instance = match db.lookup(member) {
                TypeKind::Instance(member_class) => db.is_subclass_of(member_class, class),
                _ => false,
            };
            if assume_true { is_instance } else { !is_instance }
        });
        // No union member matched but the guard still succeeded at run time:
        // the value is an instance of C.
        if assume_true && narrowed == TypeId::NEVER {
            return self.db.instance_type(class);
        }
        narrowed
    }

    /// Truthiness: the true edge removes `null`, `undefined`, `0`, `""`,
    /// and `false`. The false edge is left unrefined (a falsy `string` is
    /// still a `string`).
    pub fn narrow_truthy(&self, type_id: TypeId, assume_true: bool) -> TypeId {
        if !assume_true {
            return type_id;
        }
        self.filter_members(type_id, |db, member| !is_always_falsy(db, member))
    }

    /// `x === lit` for a literal discriminant: the literal on the true edge,
    /// the literal removed on the false edge.
    pub fn narrow_by_literal(
        &self,
        type_id: TypeId,
        literal: TypeId,
        assume_true: bool,
    ) -> TypeId {
        if assume_true {
            let members = self.db.union_members(type_id);
            if members.contains(&literal) {
                return literal;
            }
            // A primitive member admits its literal.
            let base = self.db.widen_literal(literal);
            if members.contains(&base) {
                return literal;
            }
            if type_id == TypeId::ANY || type_id == TypeId::UNKNOWN {
                return literal;
            }
            type_id
        } else {
            self.filter_members(type_id, |_, member| member != literal)
        }
    }

    /// An assignment is a killing definition: the narrowed type becomes the
    /// assigned type (unless the declared type is `any`, which absorbs).
    pub fn narrow_by_assignment(&self, declared: TypeId, assigned: TypeId) -> TypeId {
        if declared == TypeId::ANY || declared == TypeId::ERROR {
            return declared;
        }
        assigned
    }

    fn filter_members(
        &self,
        type_id: TypeId,
        keep: impl Fn(&TypeInterner, TypeId) -> bool,
    ) -> TypeId {
        let members = self.db.union_members(type_id);
        let kept: Vec<TypeId> = members
            .into_iter()
            .filter(|&m| keep(self.db, m))
            .collect();
        self.db.union(kept)
    }
}

/// The primitive a `typeof` string names, when it names exactly one.
fn typeof_primitive(name: &str) -> Option<TypeId> {
    Some(match name {
        "string" => TypeId::STRING,
        "number" => TypeId::NUMBER,
        "boolean" => TypeId::BOOLEAN,
        "bigint" => TypeId::BIGINT,
        "symbol" => TypeId::SYMBOL,
        "undefined" => TypeId::UNDEFINED,
        _ => return None,
    })
}

fn typeof_matches(db: &TypeInterner, member: TypeId, name: &str) -> bool {
    let kind = db.lookup(member);
    match name {
        "string" => matches!(kind, TypeKind::String | TypeKind::StringLiteral(_)),
        "number" => matches!(
            kind,
            TypeKind::Number | TypeKind::NumberLiteral(_) | TypeKind::Enum { .. }
        ),
        "boolean" => matches!(kind, TypeKind::Boolean | TypeKind::BooleanLiteral(_)),
        "bigint" => matches!(kind, TypeKind::BigInt),
        "symbol" => matches!(kind, TypeKind::Symbol),
        "undefined" => matches!(kind, TypeKind::Undefined | TypeKind::Void),
        "function" => matches!(
            kind,
            TypeKind::Function(_) | TypeKind::Overloaded { .. } | TypeKind::Generic { .. }
                | TypeKind::Class(_)
        ),
        "object" => matches!(
            kind,
            TypeKind::Null
                | TypeKind::Array(_)
                | TypeKind::Tuple { .. }
                | TypeKind::Record(_)
                | TypeKind::Instance(_)
        ),
        _ => false,
    }
}

/// True for types whose every value is falsy.
fn is_always_falsy(db: &TypeInterner, member: TypeId) -> bool {
    match db.lookup(member) {
        TypeKind::Null | TypeKind::Undefined | TypeKind::Void | TypeKind::Never => true,
        TypeKind::BooleanLiteral(false) => true,
        TypeKind::NumberLiteral(bits) => bits.value() == 0.0 || bits.value().is_nan(),
        TypeKind::StringLiteral(s) => s.is_empty(),
        _ => false,
    }
}

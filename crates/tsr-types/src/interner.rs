//! The `TypeInterner`: owner of all `TypeKind` values and the class table.
//!
//! Interning uses interior mutability so the interner can be shared immutably
//! across the checker. `union()` is the only constructor with non-trivial
//! normalization: it flattens nested unions, drops `never`, absorbs into
//! `any`/`unknown`, and deduplicates members. Equality of unions is
//! order-insensitive (the dedup key is the sorted member list) while the
//! stored member order is first-seen, which display preserves.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::types::{
    ClassId, ClassInfo, EnumMember, FloatBits, FunctionShape, PropertyInfo, TypeId, TypeKind,
    TypeParamInfo,
};

pub struct TypeInterner {
    types: RefCell<Vec<TypeKind>>,
    dedup: RefCell<FxHashMap<TypeKind, TypeId>>,
    /// Canonical union lookup: sorted member ids -> existing union id.
    union_dedup: RefCell<FxHashMap<Vec<TypeId>, TypeId>>,
    classes: RefCell<Vec<ClassInfo>>,
}

impl TypeInterner {
    pub fn new() -> Self {
        let interner = TypeInterner {
            types: RefCell::new(Vec::new()),
            dedup: RefCell::new(FxHashMap::default()),
            union_dedup: RefCell::new(FxHashMap::default()),
            classes: RefCell::new(Vec::new()),
        };
        // Pre-intern primitives at their fixed ids, in TypeId order.
        let primitives = [
            TypeKind::Any,
            TypeKind::Unknown,
            TypeKind::Never,
            TypeKind::Void,
            TypeKind::Null,
            TypeKind::Undefined,
            TypeKind::Boolean,
            TypeKind::Number,
            TypeKind::String,
            TypeKind::BigInt,
            TypeKind::Symbol,
            TypeKind::Error,
        ];
        for kind in primitives {
            let id = TypeId(interner.types.borrow().len() as u32);
            interner.dedup.borrow_mut().insert(kind.clone(), id);
            interner.types.borrow_mut().push(kind);
        }
        debug_assert_eq!(
            interner.types.borrow().len() as u32,
            TypeId::FIRST_DYNAMIC
        );
        interner
    }

    /// Intern a kind, returning its id. Structurally identical kinds share
    /// one id.
    pub fn intern(&self, kind: TypeKind) -> TypeId {
        if let Some(id) = kind.primitive_id() {
            return id;
        }
        if let Some(&id) = self.dedup.borrow().get(&kind) {
            return id;
        }
        let id = TypeId(self.types.borrow().len() as u32);
        self.dedup.borrow_mut().insert(kind.clone(), id);
        self.types.borrow_mut().push(kind);
        id
    }

    /// Look up the kind of an id. Clones: kinds are small and immutable.
    pub fn lookup(&self, id: TypeId) -> TypeKind {
        self.types.borrow()[id.0 as usize].clone()
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    pub fn string_literal(&self, value: &str) -> TypeId {
        self.intern(TypeKind::StringLiteral(value.to_string()))
    }

    pub fn number_literal(&self, value: f64) -> TypeId {
        self.intern(TypeKind::NumberLiteral(FloatBits::new(value)))
    }

    pub fn boolean_literal(&self, value: bool) -> TypeId {
        self.intern(TypeKind::BooleanLiteral(value))
    }

    pub fn array(&self, element: TypeId) -> TypeId {
        self.intern(TypeKind::Array(element))
    }

    pub fn tuple(&self, elements: Vec<TypeId>) -> TypeId {
        self.intern(TypeKind::Tuple {
            elements,
            rest_index: None,
        })
    }

    pub fn tuple_with_rest(&self, elements: Vec<TypeId>, rest_index: usize) -> TypeId {
        self.intern(TypeKind::Tuple {
            elements,
            rest_index: Some(rest_index),
        })
    }

    pub fn object(&self, mut fields: Vec<PropertyInfo>) -> TypeId {
        // Record field order is display-only; canonicalize for sharing.
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        self.intern(TypeKind::Record(fields))
    }

    pub fn function(&self, shape: FunctionShape) -> TypeId {
        self.intern(TypeKind::Function(shape))
    }

    pub fn overloaded(
        &self,
        signatures: Vec<FunctionShape>,
        implementation: Option<FunctionShape>,
    ) -> TypeId {
        self.intern(TypeKind::Overloaded {
            signatures,
            implementation,
        })
    }

    pub fn generic(&self, type_params: Vec<TypeParamInfo>, inner: TypeId) -> TypeId {
        self.intern(TypeKind::Generic { type_params, inner })
    }

    pub fn type_var(&self, name: &str, bound: Option<TypeId>) -> TypeId {
        self.intern(TypeKind::TypeVar {
            name: name.to_string(),
            bound,
        })
    }

    pub fn enum_type(&self, name: &str, members: Vec<EnumMember>) -> TypeId {
        self.intern(TypeKind::Enum {
            name: name.to_string(),
            members,
        })
    }

    /// Build a union with flattening, deduplication, and absorption.
    pub fn union(&self, members: Vec<TypeId>) -> TypeId {
        let mut flat: Vec<TypeId> = Vec::with_capacity(members.len());
        let mut seen: Vec<TypeId> = Vec::with_capacity(members.len());

        let mut push = |id: TypeId, flat: &mut Vec<TypeId>, seen: &mut Vec<TypeId>| {
            if id == TypeId::NEVER {
                return;
            }
            if !seen.contains(&id) {
                seen.push(id);
                flat.push(id);
            }
        };

        for member in members {
            if member == TypeId::ANY {
                return TypeId::ANY;
            }
            match self.lookup(member) {
                TypeKind::Union(inner) => {
                    for id in inner {
                        if id == TypeId::ANY {
                            return TypeId::ANY;
                        }
                        push(id, &mut flat, &mut seen);
                    }
                }
                _ => push(member, &mut flat, &mut seen),
            }
        }

        if flat.contains(&TypeId::UNKNOWN) {
            return TypeId::UNKNOWN;
        }
        match flat.len() {
            0 => TypeId::NEVER,
            1 => flat[0],
            _ => {
                let mut key = flat.clone();
                key.sort();
                if let Some(&existing) = self.union_dedup.borrow().get(&key) {
                    return existing;
                }
                let id = self.intern(TypeKind::Union(flat));
                self.union_dedup.borrow_mut().insert(key, id);
                id
            }
        }
    }

    pub fn intersection(&self, members: Vec<TypeId>) -> TypeId {
        let mut flat: Vec<TypeId> = Vec::new();
        for member in members {
            match self.lookup(member) {
                TypeKind::Intersection(inner) => {
                    for id in inner {
                        if !flat.contains(&id) {
                            flat.push(id);
                        }
                    }
                }
                _ => {
                    if !flat.contains(&member) {
                        flat.push(member);
                    }
                }
            }
        }
        match flat.len() {
            0 => TypeId::UNKNOWN,
            1 => flat[0],
            _ => self.intern(TypeKind::Intersection(flat)),
        }
    }

    /// Shorthand for `T | null | undefined`.
    pub fn nullable(&self, inner: TypeId) -> TypeId {
        self.union(vec![inner, TypeId::NULL, TypeId::UNDEFINED])
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// Register a class and return its table id.
    pub fn register_class(&self, info: ClassInfo) -> ClassId {
        let id = ClassId(self.classes.borrow().len() as u32);
        self.classes.borrow_mut().push(info);
        id
    }

    /// Replace a previously-registered class (used when member checking
    /// completes after the class id was needed for self-references).
    pub fn update_class(&self, id: ClassId, info: ClassInfo) {
        self.classes.borrow_mut()[id.0 as usize] = info;
    }

    pub fn class_info(&self, id: ClassId) -> ClassInfo {
        self.classes.borrow()[id.0 as usize].clone()
    }

    pub fn class_type(&self, id: ClassId) -> TypeId {
        self.intern(TypeKind::Class(id))
    }

    pub fn instance_type(&self, id: ClassId) -> TypeId {
        self.intern(TypeKind::Instance(id))
    }

    /// Walk the superclass chain looking for an instance member.
    pub fn instance_member(&self, class: ClassId, name: &str) -> Option<PropertyInfo> {
        let mut current = Some(class);
        while let Some(id) = current {
            let info = self.class_info(id);
            if let Some(member) = info.members.iter().find(|m| m.name == name) {
                return Some(member.clone());
            }
            current = info.superclass;
        }
        None
    }

    /// True when `sub` is `sup` or transitively derives from it.
    pub fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool {
        let mut current = Some(sub);
        while let Some(id) = current {
            if id == sup {
                return true;
            }
            current = self.class_info(id).superclass;
        }
        false
    }

    /// Depth of the superclass chain, for derived-over-base specificity.
    pub fn inheritance_depth(&self, class: ClassId) -> usize {
        let mut depth = 0;
        let mut current = self.class_info(class).superclass;
        while let Some(id) = current {
            depth += 1;
            current = self.class_info(id).superclass;
        }
        depth
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Widen a literal type to its base primitive; other types are returned
    /// unchanged.
    pub fn widen_literal(&self, id: TypeId) -> TypeId {
        match self.lookup(id) {
            TypeKind::StringLiteral(_) => TypeId::STRING,
            TypeKind::NumberLiteral(_) => TypeId::NUMBER,
            TypeKind::BooleanLiteral(_) => TypeId::BOOLEAN,
            TypeKind::Union(members) => {
                let widened = members.iter().map(|&m| self.widen_literal(m)).collect();
                self.union(widened)
            }
            _ => id,
        }
    }

    /// True when the type admits `null` or `undefined`.
    pub fn is_nullable(&self, id: TypeId) -> bool {
        match self.lookup(id) {
            TypeKind::Null | TypeKind::Undefined => true,
            TypeKind::Union(members) => members
                .iter()
                .any(|&m| matches!(self.lookup(m), TypeKind::Null | TypeKind::Undefined)),
            _ => false,
        }
    }

    /// Union members, or a single-element view of a non-union type.
    pub fn union_members(&self, id: TypeId) -> Vec<TypeId> {
        match self.lookup(id) {
            TypeKind::Union(members) => members,
            _ => vec![id],
        }
    }

    /// True when `id` contains a type variable anywhere in its structure.
    pub fn contains_type_vars(&self, id: TypeId) -> bool {
        match self.lookup(id) {
            TypeKind::TypeVar { .. } => true,
            TypeKind::Array(element) => self.contains_type_vars(element),
            TypeKind::Tuple { elements, .. } => {
                elements.iter().any(|&e| self.contains_type_vars(e))
            }
            TypeKind::Union(members) | TypeKind::Intersection(members) => {
                members.iter().any(|&m| self.contains_type_vars(m))
            }
            TypeKind::Record(fields) => fields.iter().any(|f| self.contains_type_vars(f.type_id)),
            TypeKind::Function(shape) => {
                shape.params.iter().any(|p| self.contains_type_vars(p.type_id))
                    || self.contains_type_vars(shape.return_type)
            }
            TypeKind::Generic { inner, .. } => self.contains_type_vars(inner),
            _ => false,
        }
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_structural() {
        let db = TypeInterner::new();
        let a = db.array(TypeId::STRING);
        let b = db.array(TypeId::STRING);
        assert_eq!(a, b);
        assert_ne!(a, db.array(TypeId::NUMBER));
    }

    #[test]
    fn union_flattens_nested_unions() {
        let db = TypeInterner::new();
        let inner = db.union(vec![TypeId::STRING, TypeId::NUMBER]);
        let outer = db.union(vec![inner, TypeId::BOOLEAN]);
        match db.lookup(outer) {
            TypeKind::Union(members) => {
                assert_eq!(members, vec![TypeId::STRING, TypeId::NUMBER, TypeId::BOOLEAN]);
            }
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn union_equality_is_order_insensitive() {
        let db = TypeInterner::new();
        let a = db.union(vec![TypeId::STRING, TypeId::NUMBER]);
        let b = db.union(vec![TypeId::NUMBER, TypeId::STRING]);
        assert_eq!(a, b);
        // Display order is first-materialization order of `a`.
        match db.lookup(a) {
            TypeKind::Union(members) => assert_eq!(members[0], TypeId::STRING),
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn union_absorbs_any_and_drops_never() {
        let db = TypeInterner::new();
        assert_eq!(db.union(vec![TypeId::STRING, TypeId::ANY]), TypeId::ANY);
        assert_eq!(db.union(vec![TypeId::STRING, TypeId::NEVER]), TypeId::STRING);
        assert_eq!(db.union(vec![]), TypeId::NEVER);
    }

    #[test]
    fn subclass_chain_walks_to_root() {
        let db = TypeInterner::new();
        let animal = db.register_class(ClassInfo {
            name: "Animal".into(),
            superclass: None,
            type_params: vec![],
            members: vec![PropertyInfo::new("name", TypeId::STRING)],
            statics: vec![],
            constructor: None,
        });
        let dog = db.register_class(ClassInfo {
            name: "Dog".into(),
            superclass: Some(animal),
            type_params: vec![],
            members: vec![PropertyInfo::new("breed", TypeId::STRING)],
            statics: vec![],
            constructor: None,
        });
        assert!(db.is_subclass_of(dog, animal));
        assert!(!db.is_subclass_of(animal, dog));
        assert_eq!(db.instance_member(dog, "name").unwrap().type_id, TypeId::STRING);
        assert_eq!(db.inheritance_depth(dog), 1);
    }
}

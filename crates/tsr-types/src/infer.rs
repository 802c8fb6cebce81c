//! Generic type-argument inference.
//!
//! A simple first-binding collector: unifying a parameter type against an
//! argument type records the first binding seen for each type variable;
//! a later conflicting binding widens that variable to `any`. Substitution
//! then rewrites the signature with the collected bindings.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::compat::is_compatible;
use crate::interner::TypeInterner;
use crate::types::{FunctionShape, ParamInfo, PropertyInfo, TypeId, TypeKind};

pub struct InferenceContext<'a> {
    db: &'a TypeInterner,
    bindings: FxHashMap<String, TypeId>,
    widened: FxHashSet<String>,
}

impl<'a> InferenceContext<'a> {
    pub fn new(db: &'a TypeInterner) -> Self {
        InferenceContext {
            db,
            bindings: FxHashMap::default(),
            widened: FxHashSet::default(),
        }
    }

    /// Pre-seed a binding from an explicit type argument.
    pub fn bind(&mut self, name: &str, type_id: TypeId) {
        self.bindings.insert(name.to_string(), type_id);
    }

    pub fn binding(&self, name: &str) -> Option<TypeId> {
        self.bindings.get(name).copied()
    }

    /// Unify a declared parameter type against an argument type, collecting
    /// type-variable bindings.
    pub fn infer(&mut self, param_type: TypeId, arg_type: TypeId) {
        match self.db.lookup(param_type) {
            TypeKind::TypeVar { name, bound } => {
                if self.widened.contains(&name) {
                    return;
                }
                // Literal arguments infer their widened primitive, matching
                // the usual call-site expectation (`identity(1)` is
                // `identity<number>`, not `identity<1>`).
                let candidate = self.db.widen_literal(arg_type);
                if let Some(bound) = bound {
                    if !is_compatible(self.db, bound, candidate) {
                        return;
                    }
                }
                match self.bindings.get(&name).copied() {
                    None => {
                        self.bindings.insert(name, candidate);
                    }
                    Some(existing) if existing == candidate => {}
                    Some(_) => {
                        // Conflicting evidence: widen to any.
                        self.bindings.insert(name.clone(), TypeId::ANY);
                        self.widened.insert(name);
                    }
                }
            }
            TypeKind::Array(param_elem) => {
                match self.db.lookup(arg_type) {
                    TypeKind::Array(arg_elem) => self.infer(param_elem, arg_elem),
                    TypeKind::Tuple { elements, .. } => {
                        let elem_union = self.db.union(elements);
                        self.infer(param_elem, elem_union);
                    }
                    _ => {}
                }
            }
            TypeKind::Tuple { elements, .. } => {
                if let TypeKind::Tuple {
                    elements: arg_elements,
                    ..
                } = self.db.lookup(arg_type)
                {
                    for (&p, &a) in elements.iter().zip(&arg_elements) {
                        self.infer(p, a);
                    }
                }
            }
            TypeKind::Union(members) => {
                // Only an unambiguous variable member collects from a union
                // parameter (e.g. `T | undefined` against `string`).
                let vars: Vec<TypeId> = members
                    .iter()
                    .copied()
                    .filter(|&m| matches!(self.db.lookup(m), TypeKind::TypeVar { .. }))
                    .collect();
                if vars.len() == 1 {
                    let non_vars: Vec<TypeId> =
                        members.iter().copied().filter(|&m| m != vars[0]).collect();
                    let already_satisfied = non_vars
                        .iter()
                        .any(|&m| is_compatible(self.db, m, arg_type));
                    if !already_satisfied {
                        self.infer(vars[0], arg_type);
                    }
                }
            }
            TypeKind::Record(fields) => {
                if let TypeKind::Record(arg_fields) = self.db.lookup(arg_type) {
                    for field in &fields {
                        if let Some(arg_field) =
                            arg_fields.iter().find(|f| f.name == field.name)
                        {
                            self.infer(field.type_id, arg_field.type_id);
                        }
                    }
                }
            }
            TypeKind::Function(param_shape) => {
                if let TypeKind::Function(arg_shape) = self.db.lookup(arg_type) {
                    for (p, a) in param_shape.params.iter().zip(&arg_shape.params) {
                        self.infer(p.type_id, a.type_id);
                    }
                    self.infer(param_shape.return_type, arg_shape.return_type);
                }
            }
            _ => {}
        }
    }

    /// Rewrite `type_id`, replacing bound type variables. Unbound variables
    /// become `any`.
    pub fn substitute(&self, type_id: TypeId) -> TypeId {
        substitute_with(self.db, type_id, &self.bindings)
    }

    /// Apply substitution across a whole signature.
    pub fn substitute_shape(&self, shape: &FunctionShape) -> FunctionShape {
        FunctionShape {
            params: shape
                .params
                .iter()
                .map(|p| ParamInfo {
                    name: p.name.clone(),
                    type_id: self.substitute(p.type_id),
                    optional: p.optional,
                })
                .collect(),
            min_arity: shape.min_arity,
            has_rest: shape.has_rest,
            return_type: self.substitute(shape.return_type),
        }
    }
}

fn substitute_with(
    db: &TypeInterner,
    type_id: TypeId,
    bindings: &FxHashMap<String, TypeId>,
) -> TypeId {
    match db.lookup(type_id) {
        TypeKind::TypeVar { name, .. } => bindings.get(&name).copied().unwrap_or(TypeId::ANY),
        TypeKind::Array(element) => db.array(substitute_with(db, element, bindings)),
        TypeKind::Tuple {
            elements,
            rest_index,
        } => {
            let elements = elements
                .iter()
                .map(|&e| substitute_with(db, e, bindings))
                .collect();
            match rest_index {
                Some(idx) => db.tuple_with_rest(elements, idx),
                None => db.tuple(elements),
            }
        }
        TypeKind::Union(members) => {
            let members = members
                .iter()
                .map(|&m| substitute_with(db, m, bindings))
                .collect();
            db.union(members)
        }
        TypeKind::Intersection(members) => {
            let members = members
                .iter()
                .map(|&m| substitute_with(db, m, bindings))
                .collect();
            db.intersection(members)
        }
        TypeKind::Record(fields) => {
            let fields = fields
                .iter()
                .map(|f| PropertyInfo {
                    name: f.name.clone(),
                    type_id: substitute_with(db, f.type_id, bindings),
                    optional: f.optional,
                    readonly: f.readonly,
                })
                .collect();
            db.object(fields)
        }
        TypeKind::Function(shape) => {
            let params = shape
                .params
                .iter()
                .map(|p| ParamInfo {
                    name: p.name.clone(),
                    type_id: substitute_with(db, p.type_id, bindings),
                    optional: p.optional,
                })
                .collect();
            db.function(FunctionShape {
                params,
                min_arity: shape.min_arity,
                has_rest: shape.has_rest,
                return_type: substitute_with(db, shape.return_type, bindings),
            })
        }
        _ => type_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_binding_wins_and_conflict_widens() {
        let db = TypeInterner::new();
        let t = db.type_var("T", None);
        let mut ctx = InferenceContext::new(&db);
        ctx.infer(t, TypeId::STRING);
        assert_eq!(ctx.binding("T"), Some(TypeId::STRING));
        ctx.infer(t, TypeId::NUMBER);
        assert_eq!(ctx.binding("T"), Some(TypeId::ANY));
    }

    #[test]
    fn literal_arguments_infer_widened_primitives() {
        let db = TypeInterner::new();
        let t = db.type_var("T", None);
        let mut ctx = InferenceContext::new(&db);
        ctx.infer(t, db.number_literal(1.0));
        assert_eq!(ctx.binding("T"), Some(TypeId::NUMBER));
    }

    #[test]
    fn array_parameter_collects_element() {
        let db = TypeInterner::new();
        let t = db.type_var("T", None);
        let param = db.array(t);
        let mut ctx = InferenceContext::new(&db);
        ctx.infer(param, db.array(TypeId::BOOLEAN));
        assert_eq!(ctx.binding("T"), Some(TypeId::BOOLEAN));
    }

    #[test]
    fn substitute_rewrites_nested_structure() {
        let db = TypeInterner::new();
        let t = db.type_var("T", None);
        let mut ctx = InferenceContext::new(&db);
        ctx.bind("T", TypeId::STRING);
        let nested = db.array(db.union(vec![t, TypeId::NULL]));
        let result = ctx.substitute(nested);
        assert_eq!(result, db.array(db.union(vec![TypeId::STRING, TypeId::NULL])));
    }
}

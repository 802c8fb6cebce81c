//! Human-readable type formatting for diagnostics.

use crate::interner::TypeInterner;
use crate::types::{TypeId, TypeKind};

impl TypeInterner {
    /// Format a type the way it appears in diagnostics.
    pub fn display(&self, id: TypeId) -> String {
        match self.lookup(id) {
            TypeKind::Any => "any".into(),
            TypeKind::Unknown => "unknown".into(),
            TypeKind::Never => "never".into(),
            TypeKind::Void => "void".into(),
            TypeKind::Null => "null".into(),
            TypeKind::Undefined => "undefined".into(),
            TypeKind::Boolean => "boolean".into(),
            TypeKind::Number => "number".into(),
            TypeKind::String => "string".into(),
            TypeKind::BigInt => "bigint".into(),
            TypeKind::Symbol => "symbol".into(),
            TypeKind::Error => "error".into(),
            TypeKind::StringLiteral(s) => format!("\"{s}\""),
            TypeKind::NumberLiteral(bits) => format_number(bits.value()),
            TypeKind::BooleanLiteral(b) => b.to_string(),
            TypeKind::Array(element) => {
                let inner = self.display(element);
                if needs_parens(&self.lookup(element)) {
                    format!("({inner})[]")
                } else {
                    format!("{inner}[]")
                }
            }
            TypeKind::Tuple {
                elements,
                rest_index,
            } => {
                let parts: Vec<String> = elements
                    .iter()
                    .enumerate()
                    .map(|(i, &e)| {
                        if rest_index == Some(i) {
                            format!("...{}[]", self.display(e))
                        } else {
                            self.display(e)
                        }
                    })
                    .collect();
                format!("[{}]", parts.join(", "))
            }
            TypeKind::Record(fields) => {
                if fields.is_empty() {
                    return "{}".into();
                }
                let parts: Vec<String> = fields
                    .iter()
                    .map(|f| {
                        let opt = if f.optional { "?" } else { "" };
                        format!("{}{}: {}", f.name, opt, self.display(f.type_id))
                    })
                    .collect();
                format!("{{ {} }}", parts.join("; "))
            }
            TypeKind::Union(members) => members
                .iter()
                .map(|&m| self.display(m))
                .collect::<Vec<_>>()
                .join(" | "),
            TypeKind::Intersection(members) => members
                .iter()
                .map(|&m| self.display(m))
                .collect::<Vec<_>>()
                .join(" & "),
            TypeKind::Class(class_id) => format!("typeof {}", self.class_info(class_id).name),
            TypeKind::Instance(class_id) => self.class_info(class_id).name,
            TypeKind::Enum { name, .. } => name,
            TypeKind::Function(shape) => {
                let params: Vec<String> = shape
                    .params
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let name = p.name.clone().unwrap_or_else(|| format!("arg{i}"));
                        let rest = if shape.has_rest && i == shape.params.len() - 1 {
                            "..."
                        } else {
                            ""
                        };
                        let opt = if p.optional { "?" } else { "" };
                        format!("{rest}{name}{opt}: {}", self.display(p.type_id))
                    })
                    .collect();
                format!("({}) => {}", params.join(", "), self.display(shape.return_type))
            }
            TypeKind::Overloaded { signatures, .. } => {
                format!("{{ {} overloads }}", signatures.len())
            }
            TypeKind::Generic { type_params, inner } => {
                let names: Vec<&str> = type_params.iter().map(|p| p.name.as_str()).collect();
                format!("<{}>{}", names.join(", "), self.display(inner))
            }
            TypeKind::TypeVar { name, .. } => name,
        }
    }
}

/// Integer-looking doubles format without a decimal point.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e21 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn needs_parens(kind: &TypeKind) -> bool {
    matches!(kind, TypeKind::Union(_) | TypeKind::Intersection(_) | TypeKind::Function(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unions_display_in_materialization_order() {
        let db = TypeInterner::new();
        let u = db.union(vec![TypeId::NUMBER, TypeId::STRING, TypeId::NULL]);
        assert_eq!(db.display(u), "number | string | null");
    }

    #[test]
    fn union_arrays_are_parenthesized() {
        let db = TypeInterner::new();
        let u = db.union(vec![TypeId::STRING, TypeId::NUMBER]);
        assert_eq!(db.display(db.array(u)), "(string | number)[]");
    }

    #[test]
    fn number_literals_format_like_the_runtime() {
        let db = TypeInterner::new();
        assert_eq!(db.display(db.number_literal(3.0)), "3");
        assert_eq!(db.display(db.number_literal(3.5)), "3.5");
    }
}

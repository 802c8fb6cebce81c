//! Type annotation nodes.
//!
//! These are the syntactic types the checker resolves against its
//! environment; they are distinct from the semantic `TypeId` lattice in
//! `tsr-types`.

#[derive(Debug, Clone)]
pub enum TypeNode {
    /// A named type: `string`, `Foo`, `Map<K, V>`.
    Named {
        name: String,
        type_args: Vec<TypeNode>,
    },
    /// `A | B`
    Union(Vec<TypeNode>),
    /// `A & B`
    Intersection(Vec<TypeNode>),
    /// `T[]`
    Array(Box<TypeNode>),
    /// `[A, B, ...C[]]`; `rest_index` marks the position of a rest element.
    Tuple {
        elements: Vec<TypeNode>,
        rest_index: Option<usize>,
    },
    /// `{ a: T; b?: U }`
    Object(Vec<ObjectTypeField>),
    /// `(a: A, b?: B) => R`
    Function {
        params: Vec<FunctionTypeParam>,
        return_type: Box<TypeNode>,
    },
    /// `"lit"`
    StringLiteral(String),
    /// `42`
    NumberLiteral(f64),
    /// `true` / `false`
    BooleanLiteral(bool),
}

#[derive(Debug, Clone)]
pub struct ObjectTypeField {
    pub name: String,
    pub type_node: TypeNode,
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub struct FunctionTypeParam {
    pub name: String,
    pub type_node: TypeNode,
    pub optional: bool,
    pub is_rest: bool,
}

impl TypeNode {
    /// Shorthand for a bare named type with no arguments.
    pub fn named(name: impl Into<String>) -> Self {
        TypeNode::Named {
            name: name.into(),
            type_args: Vec::new(),
        }
    }
}

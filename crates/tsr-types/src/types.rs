//! Type representation: `TypeId`, `TypeKind`, and the shapes they reference.
//!
//! `TypeKind` values are immutable once interned. Everything is `Hash + Eq`
//! so the interner can deduplicate; floating-point literals go through
//! `FloatBits` to get a total equality (NaN is representable and equal to
//! itself, matching the runtime's equality discipline).

/// An interned type. Ids below `TypeId::FIRST_DYNAMIC` are pre-interned
/// primitives with fixed values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const ANY: TypeId = TypeId(0);
    pub const UNKNOWN: TypeId = TypeId(1);
    pub const NEVER: TypeId = TypeId(2);
    pub const VOID: TypeId = TypeId(3);
    pub const NULL: TypeId = TypeId(4);
    pub const UNDEFINED: TypeId = TypeId(5);
    pub const BOOLEAN: TypeId = TypeId(6);
    pub const NUMBER: TypeId = TypeId(7);
    pub const STRING: TypeId = TypeId(8);
    pub const BIGINT: TypeId = TypeId(9);
    pub const SYMBOL: TypeId = TypeId(10);
    /// Poison type produced after an error diagnostic; compatible with
    /// everything so one mistake does not cascade.
    pub const ERROR: TypeId = TypeId(11);

    pub const FIRST_DYNAMIC: u32 = 12;

    pub fn is_primitive_id(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }
}

/// An index into the interner's class table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// `f64` bit pattern with total equality, for number-literal types.
///
/// `-0.0` and `0.0` are distinct bit patterns; callers that want them merged
/// normalize before constructing. All NaN payloads are canonicalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FloatBits(u64);

impl FloatBits {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            FloatBits(f64::NAN.to_bits())
        } else {
            FloatBits(value.to_bits())
        }
    }

    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// One parameter of a function shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    pub name: Option<String>,
    pub type_id: TypeId,
    pub optional: bool,
}

impl ParamInfo {
    pub fn required(name: impl Into<String>, type_id: TypeId) -> Self {
        ParamInfo {
            name: Some(name.into()),
            type_id,
            optional: false,
        }
    }
}

/// A callable signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionShape {
    pub params: Vec<ParamInfo>,
    /// Number of parameters that must be supplied.
    pub min_arity: usize,
    /// When set, the final parameter is a rest parameter whose `type_id` is
    /// the *element* type.
    pub has_rest: bool,
    pub return_type: TypeId,
}

impl FunctionShape {
    pub fn new(params: Vec<ParamInfo>, return_type: TypeId) -> Self {
        let min_arity = params.iter().filter(|p| !p.optional).count();
        FunctionShape {
            params,
            min_arity,
            has_rest: false,
            return_type,
        }
    }

    pub fn with_rest(mut self) -> Self {
        self.has_rest = true;
        // The rest parameter itself is never required.
        self.min_arity = self
            .params
            .iter()
            .take(self.params.len().saturating_sub(1))
            .filter(|p| !p.optional)
            .count();
        self
    }

    /// The rest parameter's element type, if this shape has one.
    pub fn rest_element(&self) -> Option<TypeId> {
        if self.has_rest {
            self.params.last().map(|p| p.type_id)
        } else {
            None
        }
    }

    /// Positional (non-rest) parameters.
    pub fn positional(&self) -> &[ParamInfo] {
        if self.has_rest {
            &self.params[..self.params.len() - 1]
        } else {
            &self.params
        }
    }
}

/// A named field of a record type or class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyInfo {
    pub name: String,
    pub type_id: TypeId,
    pub optional: bool,
    pub readonly: bool,
}

impl PropertyInfo {
    pub fn new(name: impl Into<String>, type_id: TypeId) -> Self {
        PropertyInfo {
            name: name.into(),
            type_id,
            optional: false,
            readonly: false,
        }
    }
}

/// A generic type parameter with an optional constraint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParamInfo {
    pub name: String,
    pub constraint: Option<TypeId>,
}

/// One member of an enum type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumMember {
    pub name: String,
    pub value: FloatBits,
}

/// A class entry in the interner's class table.
///
/// The superclass is a `ClassId` reference resolved through the table, never
/// a direct pointer, so hierarchies cannot form reference cycles.
#[derive(Clone, Debug)]
pub struct ClassInfo {
    pub name: String,
    pub superclass: Option<ClassId>,
    pub type_params: Vec<String>,
    /// Instance members (fields, methods, accessors).
    pub members: Vec<PropertyInfo>,
    /// Static members, resolved on the class value itself.
    pub statics: Vec<PropertyInfo>,
    pub constructor: Option<FunctionShape>,
}

/// The sum of all type forms. Interned and immutable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    // Primitives (pre-interned; `TypeId` constants)
    Any,
    Unknown,
    Never,
    Void,
    Null,
    Undefined,
    Boolean,
    Number,
    String,
    BigInt,
    Symbol,
    Error,

    // Literals
    StringLiteral(String),
    NumberLiteral(FloatBits),
    BooleanLiteral(bool),

    // Structural
    Array(TypeId),
    Tuple {
        elements: Vec<TypeId>,
        /// Index of a trailing rest element, whose entry in `elements` is the
        /// element type of the open tail.
        rest_index: Option<usize>,
    },
    Record(Vec<PropertyInfo>),
    /// Flattened: members are never themselves unions. Member order is the
    /// first-materialization order; equality is canonicalized by the interner.
    Union(Vec<TypeId>),
    Intersection(Vec<TypeId>),

    // Nominal
    Class(ClassId),
    Instance(ClassId),
    Enum {
        name: String,
        members: Vec<EnumMember>,
    },

    // Callable
    Function(FunctionShape),
    Overloaded {
        signatures: Vec<FunctionShape>,
        implementation: Option<FunctionShape>,
    },
    Generic {
        type_params: Vec<TypeParamInfo>,
        inner: TypeId,
    },

    // Type variables
    TypeVar {
        name: String,
        bound: Option<TypeId>,
    },
}

impl TypeKind {
    /// The pre-interned id for primitive kinds, if this is one.
    pub fn primitive_id(&self) -> Option<TypeId> {
        Some(match self {
            TypeKind::Any => TypeId::ANY,
            TypeKind::Unknown => TypeId::UNKNOWN,
            TypeKind::Never => TypeId::NEVER,
            TypeKind::Void => TypeId::VOID,
            TypeKind::Null => TypeId::NULL,
            TypeKind::Undefined => TypeId::UNDEFINED,
            TypeKind::Boolean => TypeId::BOOLEAN,
            TypeKind::Number => TypeId::NUMBER,
            TypeKind::String => TypeId::STRING,
            TypeKind::BigInt => TypeId::BIGINT,
            TypeKind::Symbol => TypeId::SYMBOL,
            TypeKind::Error => TypeId::ERROR,
            _ => return None,
        })
    }
}

//! The tagged value universe.
//!
//! Reference tags hold `Rc` payloads; identity is the `Rc` allocation.
//! The tag is total and disjoint: one value has exactly one tag.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use num_bigint::BigInt;
use rustc_hash::FxHashMap;
use tsr_ast::stmt::Param;
use tsr_ast::Stmt;

use crate::control::Thrown;
use crate::equality::ValueKey;

/// Opaque symbol identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u64);

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

impl SymbolId {
    pub fn fresh() -> Self {
        SymbolId(NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed))
    }
}

/// A runtime value. Exactly one tag per value.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Undefined,
    Boolean(bool),
    Number(f64),
    /// UTF-8 storage; `.length` and indexing use UTF-16 code-unit semantics
    /// (see `convert::utf16_length`).
    String(Rc<str>),
    BigInt(Rc<BigInt>),
    Symbol {
        id: SymbolId,
        description: Option<Rc<str>>,
    },
    Array(Rc<RefCell<ArrayData>>),
    Object(Rc<RefCell<ObjectData>>),
    Function(Rc<FunctionData>),
    Class(Rc<ClassData>),
    Instance(Rc<RefCell<InstanceData>>),
    RegExp(Rc<RegExpData>),
    /// Milliseconds since the epoch; mutable via setter methods.
    Date(Rc<RefCell<f64>>),
    Map(Rc<RefCell<MapData>>),
    Set(Rc<RefCell<SetData>>),
    WeakMap(Rc<RefCell<MapData>>),
    WeakSet(Rc<RefCell<SetData>>),
    Promise(Rc<RefCell<PromiseData>>),
    Buffer(Rc<RefCell<Vec<u8>>>),
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn symbol(description: Option<&str>) -> Self {
        Value::Symbol {
            id: SymbolId::fresh(),
            description: description.map(Rc::from),
        }
    }

    /// The `typeof` tag for this value.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Null => "object",
            Value::Undefined => "undefined",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::BigInt(_) => "bigint",
            Value::Symbol { .. } => "symbol",
            Value::Function(_) | Value::Class(_) => "function",
            Value::Array(_)
            | Value::Object(_)
            | Value::Instance(_)
            | Value::RegExp(_)
            | Value::Date(_)
            | Value::Map(_)
            | Value::Set(_)
            | Value::WeakMap(_)
            | Value::WeakSet(_)
            | Value::Promise(_)
            | Value::Buffer(_) => "object",
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Value::Array(_)
                | Value::Object(_)
                | Value::Function(_)
                | Value::Class(_)
                | Value::Instance(_)
                | Value::RegExp(_)
                | Value::Date(_)
                | Value::Map(_)
                | Value::Set(_)
                | Value::WeakMap(_)
                | Value::WeakSet(_)
                | Value::Promise(_)
                | Value::Buffer(_)
        )
    }
}

/// Ordered sequence of values; `None` entries are holes, distinct from
/// stored `undefined`.
#[derive(Debug, Default)]
pub struct ArrayData {
    pub elements: Vec<Option<Value>>,
}

impl ArrayData {
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Rc<RefCell<ArrayData>> {
        Rc::new(RefCell::new(ArrayData {
            elements: values.into_iter().map(Some).collect(),
        }))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Ordered string-keyed properties plus a separate symbol-key table.
#[derive(Debug, Default)]
pub struct ObjectData {
    pub properties: IndexMap<String, Value>,
    pub symbols: FxHashMap<SymbolId, Value>,
}

impl ObjectData {
    pub fn with_properties(
        entries: impl IntoIterator<Item = (String, Value)>,
    ) -> Rc<RefCell<ObjectData>> {
        Rc::new(RefCell::new(ObjectData {
            properties: entries.into_iter().collect(),
            symbols: FxHashMap::default(),
        }))
    }
}

/// A closure: parameters, a body reference, the captured environment, and
/// an optional bound receiver.
#[derive(Debug)]
pub struct FunctionData {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Rc<Vec<Stmt>>,
    pub env: Option<Rc<RefCell<Scope>>>,
    pub bound_this: Option<Value>,
    pub is_async: bool,
    pub is_generator: bool,
}

impl FunctionData {
    /// A copy of a function with `this` bound to the receiver. Used by
    /// object-method shorthand retrieval.
    pub fn bind(this: &Rc<Self>, receiver: Value) -> Rc<FunctionData> {
        Rc::new(FunctionData {
            name: this.name.clone(),
            params: this.params.clone(),
            body: Rc::clone(&this.body),
            env: this.env.clone(),
            bound_this: Some(receiver),
            is_async: this.is_async,
            is_generator: this.is_generator,
        })
    }
}

/// A lexical scope for closures. The executor owns scope construction; the
/// value model only needs the shape.
#[derive(Debug, Default)]
pub struct Scope {
    pub vars: FxHashMap<String, Value>,
    pub parent: Option<Rc<RefCell<Scope>>>,
}

/// Class metadata. The superclass is a *name* resolved through the
/// `ClassTable` at lookup time, so prototype chains cannot form pointer
/// cycles.
#[derive(Debug)]
pub struct ClassData {
    pub name: String,
    pub superclass: Option<String>,
    pub constructor: Option<Rc<FunctionData>>,
    pub methods: FxHashMap<String, Rc<FunctionData>>,
    pub getters: FxHashMap<String, Rc<FunctionData>>,
    pub setters: FxHashMap<String, Rc<FunctionData>>,
    /// Static properties, initialized once and then read-only.
    pub statics: RefCell<FxHashMap<String, Value>>,
}

/// Name-keyed class registry used for prototype-chain walks.
#[derive(Debug, Default)]
pub struct ClassTable {
    classes: FxHashMap<String, Rc<ClassData>>,
}

impl ClassTable {
    pub fn new() -> Self {
        ClassTable::default()
    }

    pub fn register(&mut self, class: Rc<ClassData>) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn get(&self, name: &str) -> Option<&Rc<ClassData>> {
        self.classes.get(name)
    }

    /// Walk the superclass chain from `class`, yielding `class` first.
    pub fn chain<'a>(&'a self, class: &'a Rc<ClassData>) -> ClassChain<'a> {
        ClassChain {
            table: self,
            current: Some(class),
        }
    }
}

pub struct ClassChain<'a> {
    table: &'a ClassTable,
    current: Option<&'a Rc<ClassData>>,
}

impl<'a> Iterator for ClassChain<'a> {
    type Item = &'a Rc<ClassData>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = current
            .superclass
            .as_deref()
            .and_then(|name| self.table.get(name));
        Some(current)
    }
}

/// An object created by `new`: its class plus a per-instance field map.
#[derive(Debug)]
pub struct InstanceData {
    pub class: Rc<ClassData>,
    pub fields: IndexMap<String, Value>,
}

#[derive(Debug)]
pub struct RegExpData {
    pub pattern: String,
    pub flags: String,
}

/// Insertion-ordered map keyed by the equality discipline. The stored key
/// value is kept alongside for iteration.
#[derive(Debug, Default)]
pub struct MapData {
    pub entries: IndexMap<ValueKey, (Value, Value)>,
}

impl MapData {
    pub fn set(&mut self, key: Value, value: Value) {
        self.entries.insert(ValueKey::of(&key), (key, value));
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(&ValueKey::of(key)).map(|(_, v)| v)
    }

    pub fn has(&self, key: &Value) -> bool {
        self.entries.contains_key(&ValueKey::of(key))
    }

    pub fn delete(&mut self, key: &Value) -> bool {
        self.entries.shift_remove(&ValueKey::of(key)).is_some()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Default)]
pub struct SetData {
    pub entries: IndexMap<ValueKey, Value>,
}

impl SetData {
    /// Construct by copying the given values; later mutation of the source
    /// does not affect the set.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Rc<RefCell<SetData>> {
        let mut data = SetData::default();
        for value in values {
            data.add(value);
        }
        Rc::new(RefCell::new(data))
    }

    pub fn add(&mut self, value: Value) {
        self.entries.insert(ValueKey::of(&value), value);
    }

    pub fn has(&self, value: &Value) -> bool {
        self.entries.contains_key(&ValueKey::of(value))
    }

    pub fn delete(&mut self, value: &Value) -> bool {
        self.entries.shift_remove(&ValueKey::of(value)).is_some()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone)]
pub enum PromiseState {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

#[derive(Debug)]
pub struct PromiseData {
    pub state: PromiseState,
}

impl PromiseData {
    pub fn pending() -> Rc<RefCell<PromiseData>> {
        Rc::new(RefCell::new(PromiseData {
            state: PromiseState::Pending,
        }))
    }

    pub fn fulfilled(value: Value) -> Rc<RefCell<PromiseData>> {
        Rc::new(RefCell::new(PromiseData {
            state: PromiseState::Fulfilled(value),
        }))
    }

    pub fn rejected(reason: Value) -> Rc<RefCell<PromiseData>> {
        Rc::new(RefCell::new(PromiseData {
            state: PromiseState::Rejected(reason),
        }))
    }
}

/// Callback seam letting the value model invoke user functions (needed by
/// `toJSON`, replacers, and revivers) without owning an executor.
pub trait CallHook {
    fn call(&self, func: &Rc<FunctionData>, this: &Value, args: &[Value])
        -> Result<Value, Thrown>;
}

/// A hook for contexts where no user function can legally appear.
pub struct NoCalls;

impl CallHook for NoCalls {
    fn call(
        &self,
        _func: &Rc<FunctionData>,
        _this: &Value,
        _args: &[Value],
    ) -> Result<Value, Thrown> {
        Err(Thrown(crate::control::type_error(
            "function invocation is not available in this context",
        )))
    }
}

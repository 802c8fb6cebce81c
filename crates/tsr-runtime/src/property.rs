//! The property access contract.
//!
//! - `length` on an Array is its element count; on a String its UTF-16
//!   code-unit count.
//! - Reading a function-valued property off an object binds `this` to the
//!   object for that retrieval.
//! - On an Instance, resolution walks the class's getter table, then the
//!   instance field map, then inherited methods through the class table,
//!   finally yielding `undefined`.
//! - Numeric string keys and symbol keys are distinct storage namespaces.

use std::rc::Rc;

use crate::convert::{to_string, utf16_at, utf16_length};
use crate::value::{ClassTable, FunctionData, SymbolId, Value};

/// Outcome of a named read: a plain value, or an accessor the executor must
/// invoke with the receiver.
#[derive(Debug, Clone)]
pub enum ResolvedProperty {
    Value(Value),
    Accessor(Rc<FunctionData>),
}

impl ResolvedProperty {
    /// The value, when no accessor call is needed.
    pub fn into_value(self) -> Option<Value> {
        match self {
            ResolvedProperty::Value(v) => Some(v),
            ResolvedProperty::Accessor(_) => None,
        }
    }
}

/// `target.name`.
pub fn get_named(target: &Value, name: &str, classes: &ClassTable) -> ResolvedProperty {
    match target {
        Value::Array(data) => {
            if name == "length" {
                return ResolvedProperty::Value(Value::Number(data.borrow().len() as f64));
            }
            ResolvedProperty::Value(Value::Undefined)
        }
        Value::String(s) => {
            if name == "length" {
                return ResolvedProperty::Value(Value::Number(utf16_length(s) as f64));
            }
            ResolvedProperty::Value(Value::Undefined)
        }
        Value::Map(data) | Value::WeakMap(data) => {
            if name == "size" {
                return ResolvedProperty::Value(Value::Number(data.borrow().size() as f64));
            }
            ResolvedProperty::Value(Value::Undefined)
        }
        Value::Set(data) | Value::WeakSet(data) => {
            if name == "size" {
                return ResolvedProperty::Value(Value::Number(data.borrow().size() as f64));
            }
            ResolvedProperty::Value(Value::Undefined)
        }
        Value::Object(data) => match data.borrow().properties.get(name) {
            // Method shorthand: retrieval binds the receiver.
            Some(Value::Function(func)) => {
                ResolvedProperty::Value(Value::Function(FunctionData::bind(
                    func,
                    target.clone(),
                )))
            }
            Some(value) => ResolvedProperty::Value(value.clone()),
            None => ResolvedProperty::Value(Value::Undefined),
        },
        Value::Instance(data) => {
            let instance = data.borrow();
            // Getter table first, through the whole chain.
            for class in classes.chain(&instance.class) {
                if let Some(getter) = class.getters.get(name) {
                    return ResolvedProperty::Accessor(Rc::clone(getter));
                }
            }
            if let Some(field) = instance.fields.get(name) {
                return ResolvedProperty::Value(field.clone());
            }
            for class in classes.chain(&instance.class) {
                if let Some(method) = class.methods.get(name) {
                    return ResolvedProperty::Value(Value::Function(FunctionData::bind(
                        method,
                        target.clone(),
                    )));
                }
            }
            ResolvedProperty::Value(Value::Undefined)
        }
        Value::Class(class) => {
            for entry in classes.chain(class) {
                if let Some(value) = entry.statics.borrow().get(name) {
                    return ResolvedProperty::Value(value.clone());
                }
            }
            ResolvedProperty::Value(Value::Undefined)
        }
        _ => ResolvedProperty::Value(Value::Undefined),
    }
}

/// `target.name = value`. Returns the setter when the write must go through
/// one.
pub fn set_named(
    target: &Value,
    name: &str,
    value: Value,
    classes: &ClassTable,
) -> Option<Rc<FunctionData>> {
    match target {
        Value::Object(data) => {
            data.borrow_mut().properties.insert(name.to_string(), value);
            None
        }
        Value::Instance(data) => {
            {
                let instance = data.borrow();
                for class in classes.chain(&instance.class) {
                    if let Some(setter) = class.setters.get(name) {
                        return Some(Rc::clone(setter));
                    }
                }
            }
            data.borrow_mut().fields.insert(name.to_string(), value);
            None
        }
        _ => None,
    }
}

/// `target[index]`.
pub fn get_index(target: &Value, index: &Value) -> Value {
    match target {
        Value::Array(data) => {
            let idx = crate::convert::to_number(index);
            if idx < 0.0 || idx.fract() != 0.0 || idx.is_nan() {
                return Value::Undefined;
            }
            match data.borrow().elements.get(idx as usize) {
                // Holes read as undefined.
                Some(Some(value)) => value.clone(),
                _ => Value::Undefined,
            }
        }
        Value::String(s) => {
            let idx = crate::convert::to_number(index);
            if idx < 0.0 || idx.fract() != 0.0 || idx.is_nan() {
                return Value::Undefined;
            }
            match utf16_at(s, idx as usize) {
                Some(unit) => Value::string(unit.as_str()),
                None => Value::Undefined,
            }
        }
        // Index keys on objects live in the string namespace.
        Value::Object(data) => data
            .borrow()
            .properties
            .get(&to_string(index))
            .cloned()
            .unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    }
}

/// `target[index] = value`.
pub fn set_index(target: &Value, index: &Value, value: Value) {
    match target {
        Value::Array(data) => {
            let idx = crate::convert::to_number(index);
            if idx < 0.0 || idx.fract() != 0.0 || idx.is_nan() {
                return;
            }
            let idx = idx as usize;
            let mut array = data.borrow_mut();
            if idx >= array.elements.len() {
                // Writing past the end creates holes, not undefineds.
                array.elements.resize(idx + 1, None);
            }
            array.elements[idx] = Some(value);
        }
        Value::Object(data) => {
            data.borrow_mut()
                .properties
                .insert(to_string(index), value);
        }
        _ => {}
    }
}

/// Symbol-keyed read: objects only, separate namespace from string keys.
pub fn get_symbol(target: &Value, symbol: SymbolId) -> Value {
    match target {
        Value::Object(data) => data
            .borrow()
            .symbols
            .get(&symbol)
            .cloned()
            .unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    }
}

pub fn set_symbol(target: &Value, symbol: SymbolId, value: Value) {
    if let Value::Object(data) = target {
        data.borrow_mut().symbols.insert(symbol, value);
    }
}

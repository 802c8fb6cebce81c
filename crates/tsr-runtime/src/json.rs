//! `JSON.stringify` and `JSON.parse` over runtime values.
//!
//! Stringify honors a `toJSON` method, a replacer (function or key
//! allow-list), and a numeric or string space argument capped at 10
//! characters. Serializing a BigInt throws a type error; function-valued
//! properties are skipped and a function at the top level serializes to
//! nothing. Parse goes through `serde_json` (object key order preserved)
//! and applies an optional reviver bottom-up, where returning `undefined`
//! removes the property.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use tsr_common::limits::MAX_JSON_INDENT;

use crate::control::{type_error, Thrown};
use crate::convert::format_number;
use crate::equality::ValueKey;
use crate::property::{get_named, ResolvedProperty};
use crate::value::{ArrayData, CallHook, ClassTable, FunctionData, ObjectData, Value};

/// The replacer argument of `JSON.stringify`.
pub enum Replacer<'a> {
    Function(&'a Rc<FunctionData>),
    AllowList(Vec<String>),
}

/// Serialize a value. `Ok(None)` means the value serializes to nothing
/// (a function, symbol, or `undefined` at the top level).
pub fn stringify(
    value: &Value,
    replacer: Option<&Replacer<'_>>,
    space: &Value,
    hook: &dyn CallHook,
) -> Result<Option<String>, Thrown> {
    let indent = indent_from_space(space);
    let mut serializer = Serializer {
        replacer,
        indent,
        hook,
        classes: ClassTable::new(),
        active: FxHashSet::default(),
    };
    serializer.serialize("", value, 0)
}

fn indent_from_space(space: &Value) -> Option<String> {
    match space {
        Value::Number(n) => {
            let count = (*n as isize).clamp(0, MAX_JSON_INDENT as isize) as usize;
            if count == 0 {
                None
            } else {
                Some(" ".repeat(count))
            }
        }
        Value::String(s) => {
            if s.is_empty() {
                None
            } else {
                Some(s.chars().take(MAX_JSON_INDENT).collect())
            }
        }
        _ => None,
    }
}

struct Serializer<'a> {
    replacer: Option<&'a Replacer<'a>>,
    indent: Option<String>,
    hook: &'a dyn CallHook,
    classes: ClassTable,
    /// Reference identities currently on the serialization stack.
    active: FxHashSet<ValueKey>,
}

impl<'a> Serializer<'a> {
    fn serialize(
        &mut self,
        key: &str,
        value: &Value,
        depth: usize,
    ) -> Result<Option<String>, Thrown> {
        let mut value = value.clone();

        // toJSON first, then the replacer sees its result.
        if let Some(to_json) = self.to_json_method(&value) {
            value = self.hook.call(&to_json, &value, &[Value::string(key)])?;
        }
        if let Some(Replacer::Function(replacer)) = self.replacer {
            value = self.hook.call(
                replacer,
                &Value::Undefined,
                &[Value::string(key), value.clone()],
            )?;
        }

        match &value {
            Value::Null => Ok(Some("null".into())),
            Value::Undefined | Value::Function(_) | Value::Class(_) | Value::Symbol { .. } => {
                Ok(None)
            }
            Value::Boolean(b) => Ok(Some(b.to_string())),
            Value::Number(n) => {
                if n.is_finite() {
                    Ok(Some(format_number(*n)))
                } else {
                    Ok(Some("null".into()))
                }
            }
            Value::String(s) => Ok(Some(quote(s))),
            Value::BigInt(_) => Err(Thrown(type_error(
                "Do not know how to serialize a BigInt",
            ))),
            Value::Array(data) => {
                self.enter(&value)?;
                let elements: Vec<Option<Value>> = data.borrow().elements.clone();
                let mut parts = Vec::with_capacity(elements.len());
                for element in &elements {
                    let rendered = match element {
                        // Holes and unserializable elements read as null.
                        None => None,
                        Some(v) => self.serialize("", v, depth + 1)?,
                    };
                    parts.push(rendered.unwrap_or_else(|| "null".into()));
                }
                self.leave(&value);
                Ok(Some(self.wrap_sequence('[', ']', &parts, depth)))
            }
            Value::Object(data) => {
                self.enter(&value)?;
                let entries = self.object_entries(data);
                let mut parts = Vec::new();
                for (name, member) in entries {
                    if let Some(rendered) = self.serialize(&name, &member, depth + 1)? {
                        parts.push(self.entry(&name, &rendered));
                    }
                }
                self.leave(&value);
                Ok(Some(self.wrap_sequence('{', '}', &parts, depth)))
            }
            Value::Instance(data) => {
                self.enter(&value)?;
                let fields: Vec<(String, Value)> = data
                    .borrow()
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                let mut parts = Vec::new();
                for (name, member) in fields {
                    if let Some(rendered) = self.serialize(&name, &member, depth + 1)? {
                        parts.push(self.entry(&name, &rendered));
                    }
                }
                self.leave(&value);
                Ok(Some(self.wrap_sequence('{', '}', &parts, depth)))
            }
            Value::Buffer(data) => {
                // Matches Buffer#toJSON: { type: "Buffer", data: [...] }.
                let bytes: Vec<String> = data
                    .borrow()
                    .iter()
                    .map(|b| b.to_string())
                    .collect();
                Ok(Some(format!(
                    "{{\"type\":\"Buffer\",\"data\":[{}]}}",
                    bytes.join(",")
                )))
            }
            // Map, Set, RegExp, Date, promises: no enumerable properties.
            _ => Ok(Some("{}".into())),
        }
    }

    fn object_entries(
        &self,
        data: &Rc<std::cell::RefCell<ObjectData>>,
    ) -> Vec<(String, Value)> {
        match self.replacer {
            Some(Replacer::AllowList(keys)) => keys
                .iter()
                .filter_map(|k| {
                    data.borrow()
                        .properties
                        .get(k)
                        .map(|v| (k.clone(), v.clone()))
                })
                .collect(),
            _ => data
                .borrow()
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    fn to_json_method(&self, value: &Value) -> Option<Rc<FunctionData>> {
        match value {
            Value::Object(_) | Value::Instance(_) => {
                match get_named(value, "toJSON", &self.classes) {
                    ResolvedProperty::Value(Value::Function(func)) => Some(func),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn enter(&mut self, value: &Value) -> Result<(), Thrown> {
        if !self.active.insert(ValueKey::of(value)) {
            return Err(Thrown(type_error("Converting circular structure to JSON")));
        }
        Ok(())
    }

    fn leave(&mut self, value: &Value) {
        self.active.remove(&ValueKey::of(value));
    }

    fn entry(&self, name: &str, rendered: &str) -> String {
        if self.indent.is_some() {
            format!("{}: {rendered}", quote(name))
        } else {
            format!("{}:{rendered}", quote(name))
        }
    }

    fn wrap_sequence(&self, open: char, close: char, parts: &[String], depth: usize) -> String {
        if parts.is_empty() {
            return format!("{open}{close}");
        }
        match &self.indent {
            None => format!("{open}{}{close}", parts.join(",")),
            Some(unit) => {
                let inner_pad = unit.repeat(depth + 1);
                let outer_pad = unit.repeat(depth);
                let body = parts
                    .iter()
                    .map(|p| format!("{inner_pad}{p}"))
                    .collect::<Vec<_>>()
                    .join(",\n");
                format!("{open}\n{body}\n{outer_pad}{close}")
            }
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Parse JSON text into a runtime value, applying an optional reviver
/// bottom-up. A reviver returning `undefined` removes the property.
pub fn parse(
    text: &str,
    reviver: Option<&Rc<FunctionData>>,
    hook: &dyn CallHook,
) -> Result<Value, Thrown> {
    let parsed: serde_json::Value = serde_json::from_str(text).map_err(|err| {
        Thrown(syntax_error(&format!("Unexpected token in JSON: {err}")))
    })?;
    let root = convert(&parsed);
    match reviver {
        None => Ok(root),
        Some(reviver) => {
            let holder = Value::Object(ObjectData::with_properties([(
                String::new(),
                root,
            )]));
            revive(&holder, "", reviver, hook)
        }
    }
}

fn syntax_error(message: &str) -> Value {
    Value::Object(ObjectData::with_properties([
        ("name".to_string(), Value::string("SyntaxError")),
        ("message".to_string(), Value::string(message)),
    ]))
}

fn convert(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::string(s.as_str()),
        serde_json::Value::Array(items) => {
            Value::Array(ArrayData::from_values(items.iter().map(convert)))
        }
        serde_json::Value::Object(entries) => Value::Object(ObjectData::with_properties(
            entries.iter().map(|(k, v)| (k.clone(), convert(v))),
        )),
    }
}

/// Bottom-up reviver walk over `holder[key]`.
fn revive(
    holder: &Value,
    key: &str,
    reviver: &Rc<FunctionData>,
    hook: &dyn CallHook,
) -> Result<Value, Thrown> {
    let value = match holder {
        Value::Object(data) => data
            .borrow()
            .properties
            .get(key)
            .cloned()
            .unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    };

    match &value {
        Value::Object(data) => {
            let keys: Vec<String> = data.borrow().properties.keys().cloned().collect();
            for child_key in keys {
                let revived = revive(&value, &child_key, reviver, hook)?;
                let mut borrowed = data.borrow_mut();
                match revived {
                    Value::Undefined => {
                        borrowed.properties.shift_remove(&child_key);
                    }
                    other => {
                        borrowed.properties.insert(child_key, other);
                    }
                }
            }
        }
        Value::Array(data) => {
            let len = data.borrow().len();
            for index in 0..len {
                let element = data.borrow().elements[index]
                    .clone()
                    .unwrap_or(Value::Undefined);
                let revived = revive_element(&element, index, reviver, hook)?;
                data.borrow_mut().elements[index] = match revived {
                    Value::Undefined => None,
                    other => Some(other),
                };
            }
        }
        _ => {}
    }

    hook.call(reviver, holder, &[Value::string(key), value])
}

fn revive_element(
    element: &Value,
    index: usize,
    reviver: &Rc<FunctionData>,
    hook: &dyn CallHook,
) -> Result<Value, Thrown> {
    // Wrap the element so nested structures revive before the call.
    let holder = Value::Object(ObjectData::with_properties([(
        index.to_string(),
        element.clone(),
    )]));
    revive(&holder, &index.to_string(), reviver, hook)
}

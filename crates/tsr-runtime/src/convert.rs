//! Conversion functions: `ToBoolean`, `ToNumber`, `ToString`.

use num_bigint::BigInt;

use crate::value::Value;

/// Falsy: `null`, `undefined`, `false`, `0`, `NaN`, `""`, `0n`.
pub fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Null | Value::Undefined => false,
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::BigInt(b) => **b != BigInt::from(0),
        _ => true,
    }
}

pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Undefined => f64::NAN,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::BigInt(b) => {
            // Lossy: beyond 2^53 the nearest double wins.
            let s = b.to_string();
            s.parse::<f64>().unwrap_or(f64::NAN)
        }
        Value::Date(millis) => *millis.borrow(),
        _ => f64::NAN,
    }
}

pub fn to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Undefined => "undefined".into(),
        Value::Boolean(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.to_string(),
        Value::BigInt(b) => b.to_string(),
        Value::Symbol { description, .. } => match description {
            Some(d) => format!("Symbol({d})"),
            None => "Symbol()".into(),
        },
        Value::Array(data) => {
            let parts: Vec<String> = data
                .borrow()
                .elements
                .iter()
                .map(|e| match e {
                    Some(Value::Null) | Some(Value::Undefined) | None => String::new(),
                    Some(v) => to_string(v),
                })
                .collect();
            parts.join(",")
        }
        Value::Object(_) => "[object Object]".into(),
        Value::Function(f) => match &f.name {
            Some(name) => format!("function {name}() {{ [native code] }}"),
            None => "function () { [native code] }".into(),
        },
        Value::Class(c) => format!("class {}", c.name),
        Value::Instance(data) => format!("[object {}]", data.borrow().class.name),
        Value::RegExp(r) => format!("/{}/{}", r.pattern, r.flags),
        Value::Date(millis) => format!("[Date {}]", format_number(*millis.borrow())),
        Value::Map(_) => "[object Map]".into(),
        Value::Set(_) => "[object Set]".into(),
        Value::WeakMap(_) => "[object WeakMap]".into(),
        Value::WeakSet(_) => "[object WeakSet]".into(),
        Value::Promise(_) => "[object Promise]".into(),
        Value::Buffer(data) => {
            let bytes = data.borrow();
            let hex: Vec<String> = bytes.iter().take(16).map(|b| format!("{b:02x}")).collect();
            let ellipsis = if bytes.len() > 16 { " ..." } else { "" };
            format!("<Buffer {}{}>", hex.join(" "), ellipsis)
        }
    }
}

/// Integer-looking doubles format as integers; `-0` formats as `0`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n == 0.0 {
        "0".into()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// `.length` in UTF-16 code units.
pub fn utf16_length(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Indexing by UTF-16 code unit: a one-code-unit string, or `None` out of
/// range. A lone surrogate half of an astral character round-trips via the
/// replacement behavior of `from_utf16_lossy`.
pub fn utf16_at(s: &str, index: usize) -> Option<String> {
    let unit = s.encode_utf16().nth(index)?;
    Some(String::from_utf16_lossy(&[unit]))
}

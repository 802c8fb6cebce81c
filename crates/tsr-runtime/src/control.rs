//! Control-flow completions and builtin error shapes.
//!
//! `break`/`continue`/`return` are internal signals, never values user code
//! can observe. A thrown value is any `Value`, wrapped in `Thrown` at the
//! control-flow boundary so executors can tell user throws from internal
//! invariants.

use crate::value::{ObjectData, Value};

/// Result of executing a statement.
#[derive(Clone, Debug)]
pub enum Completion {
    Normal(Value),
    Return(Value),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Value),
}

impl Completion {
    /// True for completions that abruptly exit the enclosing construct.
    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }
}

/// A user-thrown value crossing an executor boundary.
#[derive(Clone, Debug)]
pub struct Thrown(pub Value);

/// A `TypeError`-shaped object whose message is the given text.
pub fn type_error(message: &str) -> Value {
    Value::Object(ObjectData::with_properties([
        ("name".to_string(), Value::string("TypeError")),
        ("message".to_string(), Value::string(message)),
    ]))
}

/// Filesystem-style builtin errors carry a code, the syscall name, and the
/// offending path; the message leads with the code.
pub fn fs_error(code: &str, syscall: &str, path: &str) -> Value {
    let message = format!("{code}: {}, {syscall} '{path}'", describe_code(code));
    Value::Object(ObjectData::with_properties([
        ("name".to_string(), Value::string("Error")),
        ("message".to_string(), Value::string(message.as_str())),
        ("code".to_string(), Value::string(code)),
        ("syscall".to_string(), Value::string(syscall)),
        ("path".to_string(), Value::string(path)),
    ]))
}

fn describe_code(code: &str) -> &'static str {
    match code {
        "ENOENT" => "no such file or directory",
        "EACCES" => "permission denied",
        "EEXIST" => "file already exists",
        "EISDIR" => "illegal operation on a directory",
        "ENOTDIR" => "not a directory",
        _ => "operation failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(obj: &Value, name: &str) -> Value {
        match obj {
            Value::Object(data) => data.borrow().properties.get(name).cloned().unwrap(),
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn fs_error_shape() {
        let err = fs_error("ENOENT", "open", "/tmp/missing.txt");
        assert_eq!(
            crate::convert::to_string(&get(&err, "code")),
            "ENOENT"
        );
        assert_eq!(crate::convert::to_string(&get(&err, "syscall")), "open");
        assert_eq!(
            crate::convert::to_string(&get(&err, "path")),
            "/tmp/missing.txt"
        );
        let message = crate::convert::to_string(&get(&err, "message"));
        assert!(message.contains("ENOENT"));
        assert!(message.contains("/tmp/missing.txt"));
    }

    #[test]
    fn type_error_carries_name_and_message() {
        let err = type_error("boom");
        assert_eq!(crate::convert::to_string(&get(&err, "name")), "TypeError");
        assert_eq!(crate::convert::to_string(&get(&err, "message")), "boom");
    }
}

//! Diagnostic types for the loader, checker, and lowering passes.
//!
//! Diagnostics accumulate in a buffer owned by whoever runs a phase; a phase
//! finishes gathering sibling diagnostics before an `Error` aborts it. The
//! checker never throws on user errors.

use serde::Serialize;

use crate::span::Span;

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
}

/// A diagnostic message with a source range and stable code.
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub span: Span,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(file: String, span: Span, message: String, code: u32) -> Self {
        Self {
            file,
            span,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
        }
    }

    /// Create a new warning diagnostic.
    #[must_use]
    pub const fn warning(file: String, span: Span, message: String, code: u32) -> Self {
        Self {
            file,
            span,
            message_text: message,
            category: DiagnosticCategory::Warning,
            code,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Stable diagnostic codes grouped by phase.
pub mod codes {
    // Module graph (1000-1099)
    pub const CANNOT_RESOLVE_MODULE: u32 = 1001;
    pub const CIRCULAR_DEPENDENCY: u32 = 1002;
    pub const SCRIPT_REFERENCES_MODULE: u32 = 1003;
    pub const PARSE_ERROR: u32 = 1004;

    // Type checker (2000-2199)
    pub const TYPE_NOT_ASSIGNABLE: u32 = 2001;
    pub const UNKNOWN_IDENTIFIER: u32 = 2002;
    pub const NOT_CALLABLE: u32 = 2003;
    pub const ARGUMENT_COUNT_MISMATCH: u32 = 2004;
    pub const NO_OVERLOAD_MATCHES: u32 = 2005;
    pub const UNKNOWN_PROPERTY: u32 = 2006;
    pub const TUPLE_LENGTH_MISMATCH: u32 = 2007;
    pub const UNKNOWN_TYPE_NAME: u32 = 2008;
    pub const TYPE_ARGUMENT_COUNT_MISMATCH: u32 = 2009;
    pub const NOT_A_CLASS: u32 = 2010;

    // Lowering (3000-3099)
    pub const AWAIT_OUTSIDE_ASYNC: u32 = 3001;
    pub const YIELD_OUTSIDE_GENERATOR: u32 = 3002;
}

/// Message templates for diagnostic codes.
pub mod messages {
    pub const CANNOT_RESOLVE_MODULE: &str = "Cannot resolve module '{0}' imported from '{1}'.";
    pub const CIRCULAR_DEPENDENCY: &str = "Circular dependency detected while loading '{0}'.";
    pub const SCRIPT_REFERENCES_MODULE: &str =
        "Script '{0}' references '{1}', which is a module. Scripts may only reference scripts.";
    pub const TYPE_NOT_ASSIGNABLE: &str = "Type '{0}' is not assignable to type '{1}'.";
    pub const UNKNOWN_IDENTIFIER: &str = "Cannot find name '{0}'.";
    pub const NOT_CALLABLE: &str = "Type '{0}' is not callable.";
    pub const ARGUMENT_COUNT_MISMATCH: &str = "Expected {0} arguments, but got {1}.";
    pub const NO_OVERLOAD_MATCHES: &str = "No overload matches this call with arguments ({0}).";
    pub const UNKNOWN_PROPERTY: &str = "Property '{0}' does not exist on type '{1}'.";
    pub const TUPLE_LENGTH_MISMATCH: &str = "Tuple of length {0} cannot be assigned to tuple of length {1}.";
    pub const UNKNOWN_TYPE_NAME: &str = "Cannot find type name '{0}'.";
}

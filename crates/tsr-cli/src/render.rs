//! Human-readable diagnostic rendering.
//!
//! Format: `file:line:col - error TSR1234: message`, with the severity
//! colored for terminals and plain for machine consumption.

use colored::Colorize;
use tsr_common::{Diagnostic, DiagnosticCategory, LineMap};

/// Render one diagnostic. `source` supplies line/column positions; without
/// it only the file name is shown.
pub fn render_diagnostic(diagnostic: &Diagnostic, source: Option<&str>, pretty: bool) -> String {
    let location = match source {
        Some(text) if !diagnostic.span.is_dummy() => {
            let map = LineMap::new(text);
            let position = map.position(diagnostic.span.start);
            format!("{}:{}:{}", diagnostic.file, position.line, position.column)
        }
        _ => diagnostic.file.clone(),
    };

    let severity = match diagnostic.category {
        DiagnosticCategory::Error => "error",
        DiagnosticCategory::Warning => "warning",
    };
    let severity_text = if pretty {
        match diagnostic.category {
            DiagnosticCategory::Error => severity.red().bold().to_string(),
            DiagnosticCategory::Warning => severity.yellow().bold().to_string(),
        }
    } else {
        severity.to_string()
    };

    format!(
        "{location} - {severity_text} TSR{}: {}",
        diagnostic.code, diagnostic.message_text
    )
}

/// Render a batch with a trailing summary line.
pub fn render_all(diagnostics: &[Diagnostic], pretty: bool) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        out.push_str(&render_diagnostic(diagnostic, None, pretty));
        out.push('\n');
    }
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        out.push_str(&format!("Found {errors} error(s).\n"));
    }
    out
}

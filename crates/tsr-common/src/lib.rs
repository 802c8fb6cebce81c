//! Common types and utilities for the tsr TypeScript toolchain.
//!
//! This crate provides foundational types used across all tsr crates:
//! - Source spans (`Span`, `Spanned`)
//! - Position/line mapping (`LineMap`, `Position`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, code tables)
//! - Centralized limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::{Span, Spanned};

// Position/line mapping for human-readable locations
pub mod position;
pub use position::{LineMap, Position};

// Diagnostics
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, format_message};

// Centralized limits and thresholds
pub mod limits;

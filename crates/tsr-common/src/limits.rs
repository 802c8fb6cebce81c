//! Centralized limits and thresholds.

/// Maximum fixed-point iterations for loop narrowing before conservative
/// widening kicks in.
pub const MAX_NARROWING_ITERATIONS: usize = 50;

/// Maximum module dependency depth before the loader reports a pathological
/// graph instead of recursing further.
pub const MAX_MODULE_DEPTH: usize = 1024;

/// Maximum nesting of async arrow functions the lowering analysis follows.
pub const MAX_ASYNC_NESTING: usize = 256;

/// JSON.stringify indentation is capped at this many characters.
pub const MAX_JSON_INDENT: usize = 10;

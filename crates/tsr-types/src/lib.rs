//! Semantic type system for tsr.
//!
//! Types are interned: a `TypeId` names an immutable `TypeKind` stored in a
//! `TypeInterner`, so structurally identical types share one id and
//! comparisons are cheap. The lattice, compatibility relation, call
//! resolution, generic inference, and the narrowing primitives the checker's
//! flow pass applies all live here.
//!
//! Module map:
//! - `types` - `TypeId`, `TypeKind`, function/class shapes
//! - `interner` - the `TypeInterner` and its constructor methods
//! - `display` - human-readable type formatting
//! - `compat` - the `is_compatible` assignability relation
//! - `infer` - generic type-argument inference
//! - `overload` - call resolution and overload specificity
//! - `narrow` - `NarrowingContext` guard primitives

pub mod compat;
pub mod display;
pub mod infer;
pub mod interner;
pub mod narrow;
pub mod overload;
pub mod types;

pub use compat::is_compatible;
pub use infer::InferenceContext;
pub use interner::TypeInterner;
pub use narrow::NarrowingContext;
pub use overload::{resolve_call, CallArg, CallError};
pub use types::{
    ClassId, ClassInfo, EnumMember, FloatBits, FunctionShape, ParamInfo, PropertyInfo,
    TypeId, TypeKind, TypeParamInfo,
};

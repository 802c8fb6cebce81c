//! Runtime value model shared by the interpreter and generated code.
//!
//! Both execution backends agree on this one tagged universe and one
//! equality discipline. Operations are written as exhaustive matches over
//! the tag so a new tag surfaces every place it must be handled.
//!
//! - `value` - the `Value` sum and its heap payloads
//! - `equality` - `===`, `==`, and the `ValueKey` map/set discipline
//! - `convert` - `to_boolean` / `to_number` / `to_string`
//! - `property` - the property access contract
//! - `json` - `JSON.stringify` / `JSON.parse`
//! - `control` - completions, thrown values, builtin error shapes
//! - `scheduler` - the cooperative event loop's queue discipline

pub mod control;
pub mod convert;
pub mod equality;
pub mod json;
pub mod property;
pub mod scheduler;
pub mod value;

pub use control::{fs_error, type_error, Completion, Thrown};
pub use convert::{to_boolean, to_number, to_string};
pub use equality::{loose_equals, strict_equals, ValueKey};
pub use property::{get_index, get_named, set_index, set_named, ResolvedProperty};
pub use value::{
    ArrayData, CallHook, ClassData, ClassTable, FunctionData, InstanceData, MapData, ObjectData,
    PromiseData, PromiseState, SetData, SymbolId, Value,
};

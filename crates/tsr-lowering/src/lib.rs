//! Async and generator lowering.
//!
//! Every async function, async generator, and sync generator is analyzed
//! into an [`AsyncMachine`]: sequential state ids for its suspension points,
//! the hoist set of variables that must live in the machine frame, the
//! try-region table with per-region suspension flags, and the result
//! channel. Backends consume the description; no code is emitted here.
//!
//! - `machine` - the state-machine description types
//! - `analysis` - the single-pass body walk producing them

pub mod analysis;
pub mod machine;

pub use analysis::{analyze_function, lower_module};
pub use machine::{
    AsyncMachine, FrameSlot, ResultChannel, SuspensionKind, SuspensionPoint, TryRegionInfo,
    TryRegionRef, TryRole, STATE_DONE, STATE_INITIAL,
};

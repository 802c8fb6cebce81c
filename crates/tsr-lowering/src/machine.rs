//! State-machine description types.
//!
//! The step routine dispatches on an integer state field: `-1` before the
//! first run, `0..N-1` after the matching suspension, `-2` once complete.
//! `-2` is terminal; the field never transitions again.

use tsr_types::TypeId;

/// State field value before the first step.
pub const STATE_INITIAL: i32 = -1;
/// Terminal state field value.
pub const STATE_DONE: i32 = -2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuspensionKind {
    Await,
    Yield { delegate: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TryRole {
    Try,
    Catch,
    Finally,
}

/// The innermost try region a suspension sits in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TryRegionRef {
    pub region_id: u32,
    pub role: TryRole,
}

#[derive(Clone, Debug)]
pub struct SuspensionPoint {
    /// Sequential id, `0..N-1` in source order.
    pub state_id: u32,
    pub kind: SuspensionKind,
    pub line: u32,
    /// Declared-in-scope variables referenced after this point; they must
    /// be hoisted into the frame.
    pub live_across: Vec<String>,
    pub try_region: Option<TryRegionRef>,
}

/// One try/catch/finally statement, with flags recording which of its
/// regions contain suspensions (this decides whether the backend generates
/// try-scaffolding dispatch states for that region).
#[derive(Clone, Debug, Default)]
pub struct TryRegionInfo {
    pub id: u32,
    pub parent: Option<u32>,
    pub suspends_in_try: bool,
    pub suspends_in_catch: bool,
    pub suspends_in_finally: bool,
}

/// One slot of the machine frame, typed by the checker.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSlot {
    pub name: String,
    pub type_id: TypeId,
}

/// How completion reaches the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultChannel {
    /// Async function: a promise fulfilled or rejected at completion.
    Promise,
    /// Async generator: a promise of `{value, done}` per step.
    AsyncIterator,
    /// Sync generator: a synchronous iterator surface.
    Iterator,
}

/// The per-function lowering output the backends consume.
#[derive(Clone, Debug)]
pub struct AsyncMachine {
    pub function_name: Option<String>,
    /// Hoisted variables, in first-hoist order. The backend adds the state
    /// field and the resumed-value slot.
    pub frame: Vec<FrameSlot>,
    pub suspension_points: Vec<SuspensionPoint>,
    pub try_regions: Vec<TryRegionInfo>,
    pub captures_this: bool,
    pub result: ResultChannel,
    /// Machines for nested async arrows, in source order.
    pub nested: Vec<AsyncMachine>,
}

impl AsyncMachine {
    pub fn state_count(&self) -> u32 {
        self.suspension_points.len() as u32
    }

    /// Every value the state field may take over the machine's lifetime.
    pub fn state_domain(&self) -> Vec<i32> {
        let mut domain = vec![STATE_INITIAL];
        domain.extend((0..self.state_count()).map(|s| s as i32));
        domain.push(STATE_DONE);
        domain
    }

    pub fn frame_slot(&self, name: &str) -> Option<&FrameSlot> {
        self.frame.iter().find(|slot| slot.name == name)
    }
}

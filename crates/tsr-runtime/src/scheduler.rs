//! The cooperative event loop's queue discipline.
//!
//! Single-threaded: all user code runs on one loop, suspending only at
//! `await`, `yield`, timers, and I/O completions. Microtasks drain before
//! the next macrotask and are FIFO among themselves. `setImmediate`
//! callbacks run in registration order after the current turn.
//! `setTimeout(_, 0)` is a macrotask for the next turn, never a microtask.
//! Clearing a handle removes a pending callback; a callback that already
//! began executing is not interrupted, and a cancelled interval stops
//! rescheduling after its current tick.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use tracing::trace;

type Task = Box<dyn FnOnce(&mut EventLoop)>;

/// Handle returned by the timer registration calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

struct TimerEntry {
    handle: TimerHandle,
    due: u64,
    /// Rescheduling period for intervals.
    interval: Option<u64>,
    sequence: u64,
    task: Task,
}

pub struct EventLoop {
    /// Virtual clock in milliseconds.
    now: u64,
    next_handle: u64,
    sequence: u64,
    microtasks: VecDeque<Task>,
    immediates: VecDeque<(TimerHandle, Task)>,
    timers: Vec<TimerEntry>,
    cancelled: FxHashSet<TimerHandle>,
}

impl EventLoop {
    pub fn new() -> Self {
        EventLoop {
            now: 0,
            next_handle: 1,
            sequence: 0,
            microtasks: VecDeque::new(),
            immediates: VecDeque::new(),
            timers: Vec::new(),
            cancelled: FxHashSet::default(),
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    fn fresh_handle(&mut self) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Enqueue a promise continuation.
    pub fn queue_microtask(&mut self, task: impl FnOnce(&mut EventLoop) + 'static) {
        self.microtasks.push_back(Box::new(task));
    }

    /// `setImmediate`: runs after the current turn, in registration order.
    pub fn set_immediate(
        &mut self,
        task: impl FnOnce(&mut EventLoop) + 'static,
    ) -> TimerHandle {
        let handle = self.fresh_handle();
        self.immediates.push_back((handle, Box::new(task)));
        handle
    }

    /// `setTimeout`: a macrotask due no earlier than `delay_ms` from now.
    pub fn set_timeout(
        &mut self,
        task: impl FnOnce(&mut EventLoop) + 'static,
        delay_ms: u64,
    ) -> TimerHandle {
        let handle = self.fresh_handle();
        self.sequence += 1;
        self.timers.push(TimerEntry {
            handle,
            due: self.now + delay_ms,
            interval: None,
            sequence: self.sequence,
            task: Box::new(task),
        });
        handle
    }

    /// `setInterval`: reschedules itself after each tick until cleared.
    pub fn set_interval(
        &mut self,
        task: impl Fn(&mut EventLoop) + Clone + 'static,
        period_ms: u64,
    ) -> TimerHandle {
        let handle = self.fresh_handle();
        self.schedule_interval_tick(handle, task, period_ms);
        handle
    }

    fn schedule_interval_tick(
        &mut self,
        handle: TimerHandle,
        task: impl Fn(&mut EventLoop) + Clone + 'static,
        period_ms: u64,
    ) {
        self.sequence += 1;
        let rearm = task.clone();
        self.timers.push(TimerEntry {
            handle,
            due: self.now + period_ms,
            interval: Some(period_ms),
            sequence: self.sequence,
            task: Box::new(move |ev| {
                rearm(ev);
                // Cancellation during the tick stops rescheduling here.
                if !ev.cancelled.contains(&handle) {
                    ev.schedule_interval_tick(handle, rearm.clone(), period_ms);
                }
            }),
        });
    }

    /// `clearTimeout` / `clearInterval` / `clearImmediate`. No effect on a
    /// callback that has already been dispatched.
    pub fn clear(&mut self, handle: TimerHandle) {
        trace!(handle = handle.0, "clearing timer handle");
        self.cancelled.insert(handle);
        self.timers.retain(|t| t.handle != handle);
        self.immediates.retain(|(h, _)| *h != handle);
    }

    /// Drain microtasks FIFO until none remain, including those queued by
    /// earlier microtasks this turn.
    pub fn drain_microtasks(&mut self) {
        while let Some(task) = self.microtasks.pop_front() {
            task(self);
        }
    }

    /// Run one turn: drain microtasks, then run the immediates registered
    /// before this turn, then dispatch the earliest due timer (if any).
    /// Returns false when nothing remains.
    pub fn run_turn(&mut self) -> bool {
        self.drain_microtasks();

        if let Some((_, task)) = self.immediates.pop_front() {
            task(self);
            self.drain_microtasks();
            return true;
        }

        // Earliest due timer; registration order breaks ties.
        let next = self
            .timers
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (t.due, t.sequence))
            .map(|(i, _)| i);
        if let Some(index) = next {
            let entry = self.timers.remove(index);
            // Advance the virtual clock to the timer's due time.
            self.now = self.now.max(entry.due);
            (entry.task)(self);
            self.drain_microtasks();
            return true;
        }

        false
    }

    /// Run turns until all queues are empty.
    pub fn run_until_idle(&mut self) {
        while self.run_turn() {}
    }

    pub fn is_idle(&self) -> bool {
        self.microtasks.is_empty() && self.immediates.is_empty() && self.timers.is_empty()
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) + Clone) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let log = Rc::clone(&log);
            move |entry| log.borrow_mut().push(entry)
        };
        (log, sink)
    }

    #[test]
    fn microtasks_drain_before_macrotasks() {
        let (log, sink) = recorder();
        let mut ev = EventLoop::new();
        {
            let sink = sink.clone();
            ev.set_timeout(move |_| sink("timeout"), 0);
        }
        {
            let sink = sink.clone();
            ev.queue_microtask(move |_| sink("micro-1"));
        }
        {
            let sink = sink.clone();
            ev.queue_microtask(move |_| sink("micro-2"));
        }
        ev.run_until_idle();
        assert_eq!(*log.borrow(), vec!["micro-1", "micro-2", "timeout"]);
    }

    #[test]
    fn immediates_run_in_registration_order_before_timers() {
        let (log, sink) = recorder();
        let mut ev = EventLoop::new();
        {
            let sink = sink.clone();
            ev.set_timeout(move |_| sink("timeout"), 0);
        }
        {
            let sink = sink.clone();
            ev.set_immediate(move |_| sink("immediate-1"));
        }
        {
            let sink = sink.clone();
            ev.set_immediate(move |_| sink("immediate-2"));
        }
        ev.run_until_idle();
        assert_eq!(*log.borrow(), vec!["immediate-1", "immediate-2", "timeout"]);
    }

    #[test]
    fn zero_delay_timeout_is_not_a_microtask() {
        let (log, sink) = recorder();
        let mut ev = EventLoop::new();
        {
            let sink = sink.clone();
            ev.set_timeout(move |_| sink("timeout-0"), 0);
        }
        {
            let sink = sink.clone();
            ev.queue_microtask(move |_| sink("micro"));
        }
        // One turn: microtasks, then the first macrotask.
        ev.run_turn();
        assert_eq!(*log.borrow(), vec!["micro", "timeout-0"]);
    }

    #[test]
    fn cleared_timeout_never_fires() {
        let (log, sink) = recorder();
        let mut ev = EventLoop::new();
        let handle = {
            let sink = sink.clone();
            ev.set_timeout(move |_| sink("nope"), 5)
        };
        ev.clear(handle);
        ev.run_until_idle();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn cancelled_interval_stops_rescheduling_after_current_tick() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut ev = EventLoop::new();
        let handle_cell = Rc::new(RefCell::new(TimerHandle(0)));
        let handle = {
            let log = Rc::clone(&log);
            let handle_cell = Rc::clone(&handle_cell);
            ev.set_interval(
                move |ev: &mut EventLoop| {
                    log.borrow_mut().push(ev.now());
                    if log.borrow().len() == 2 {
                        let h = *handle_cell.borrow();
                        ev.clear(h);
                    }
                },
                10,
            )
        };
        *handle_cell.borrow_mut() = handle;
        ev.run_until_idle();
        // Fired at 10 and 20, then the clear inside the second tick stopped it.
        assert_eq!(*log.borrow(), vec![10, 20]);
    }

    #[test]
    fn timers_fire_in_due_time_order() {
        let (log, sink) = recorder();
        let mut ev = EventLoop::new();
        {
            let sink = sink.clone();
            ev.set_timeout(move |_| sink("late"), 20);
        }
        {
            let sink = sink.clone();
            ev.set_timeout(move |_| sink("early"), 5);
        }
        ev.run_until_idle();
        assert_eq!(*log.borrow(), vec!["early", "late"]);
    }

    #[test]
    fn microtasks_queued_by_macrotasks_run_same_turn() {
        let (log, sink) = recorder();
        let mut ev = EventLoop::new();
        {
            let sink = sink.clone();
            ev.set_timeout(
                move |ev: &mut EventLoop| {
                    sink("macro");
                    let sink = sink.clone();
                    ev.queue_microtask(move |_| sink("micro-after"));
                },
                0,
            );
        }
        {
            let sink = sink.clone();
            ev.set_timeout(move |_| sink("macro-2"), 1);
        }
        ev.run_until_idle();
        assert_eq!(*log.borrow(), vec!["macro", "micro-after", "macro-2"]);
    }
}

//! Await/try/catch interaction at the runtime level.
//!
//! Drives a two-state machine by hand through the event loop, the way a
//! backend's step routine would: state -1 runs until the await, the
//! rejection settles through a microtask, the catch receives the reason,
//! the finally runs, and the state field ends at -2 and never moves again.

use std::cell::RefCell;
use std::rc::Rc;

use tsr_runtime::scheduler::EventLoop;
use tsr_runtime::value::{PromiseData, PromiseState};
use tsr_runtime::{strict_equals, to_string, Value};

const STATE_INITIAL: i32 = -1;
const STATE_DONE: i32 = -2;

#[derive(Default)]
struct MachineFrame {
    state: i32,
    caught: Option<Value>,
    finally_ran: bool,
    result: Option<Value>,
    transitions: Vec<i32>,
}

#[test]
fn rejected_await_reaches_catch_then_finally_then_done() {
    let mut ev = EventLoop::new();
    let frame = Rc::new(RefCell::new(MachineFrame {
        state: STATE_INITIAL,
        ..MachineFrame::default()
    }));

    // p(x) rejects with an error carrying message "boom".
    let reason = tsr_runtime::type_error("boom");
    let promise = PromiseData::rejected(reason);

    // Step 0: run from state -1 up to the await inside the try, then
    // register the continuation as a microtask (promise reactions are
    // microtasks).
    {
        let frame = Rc::clone(&frame);
        let promise = Rc::clone(&promise);
        ev.queue_microtask(move |_| {
            let mut machine = frame.borrow_mut();
            let state = machine.state;
            machine.transitions.push(state);
            machine.state = 0;
            match &promise.borrow().state {
                PromiseState::Rejected(reason) => {
                    // The throw searches the state's try region: a catch
                    // exists, so control transfers with the reason bound.
                    machine.caught = Some(reason.clone());
                }
                PromiseState::Fulfilled(value) => {
                    machine.result = Some(value.clone());
                }
                PromiseState::Pending => {}
            }
            // catch body: return e.message; the finally region runs after it.
            let message = machine.caught.as_ref().map(|caught| {
                tsr_runtime::get_named(caught, "message", &tsr_runtime::ClassTable::new())
                    .into_value()
                    .unwrap()
            });
            machine.finally_ran = true;
            machine.result = message;
            let state = machine.state;
            machine.transitions.push(state);
            machine.state = STATE_DONE;
        });
    }

    ev.run_until_idle();

    let machine = frame.borrow();
    // The catch binding received the rejection reason.
    assert!(machine.caught.is_some());
    // The finally ran, and the returned promise would fulfill with "boom".
    assert!(machine.finally_ran);
    assert!(strict_equals(
        machine.result.as_ref().unwrap(),
        &Value::string("boom")
    ));
    assert_eq!(to_string(machine.result.as_ref().unwrap()), "boom");
    // The state advanced past the await and ended terminal.
    assert_eq!(machine.transitions, vec![STATE_INITIAL, 0]);
    assert_eq!(machine.state, STATE_DONE);
}

#[test]
fn done_state_never_transitions_again() {
    let mut ev = EventLoop::new();
    let state = Rc::new(RefCell::new(STATE_DONE));

    // A stray late completion must observe the terminal state and leave it.
    {
        let state = Rc::clone(&state);
        ev.set_timeout(
            move |_| {
                let mut s = state.borrow_mut();
                if *s != STATE_DONE {
                    *s = 0;
                }
            },
            5,
        );
    }
    ev.run_until_idle();
    assert_eq!(*state.borrow(), STATE_DONE);
}

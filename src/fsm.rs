use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use crate::telemetry::{self, channel};

// ---------------------------------------------------------------------------
// Event state machine engine
// ---------------------------------------------------------------------------
//
// Every controller in the stack is one of these: an enum of states, an enum
// of events, a transition table kept as data, and per-state
// enter/handle/leave hooks operating on the controller's data core `C`.
// Hooks are plain fn pointers so the tables stay inspectable and testable.

pub type Hook<C> = fn(&mut C);

/// Per-state hook set. `handle` is the continuous handler re-run every tick
/// while the state is active.
pub struct Hooks<C> {
    pub enter: Option<Hook<C>>,
    pub handle: Option<Hook<C>>,
    pub leave: Option<Hook<C>>,
}

impl<C> Hooks<C> {
    pub const NONE: Hooks<C> = Hooks { enter: None, handle: None, leave: None };
}

// Manual impls: fn pointers are Copy no matter what C is, and a derive
// would put a spurious bound on C.
impl<C> Clone for Hooks<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Hooks<C> {}

/// Source of follow-up events emitted by hooks while a drain is in
/// progress. The data core of each controller implements this over a small
/// FIFO so a handler's `sendEvent` lands in the same `process` pass.
pub trait EventSource<E> {
    fn next_event(&mut self) -> Option<E>;
}

impl<E> EventSource<E> for VecDeque<E> {
    fn next_event(&mut self) -> Option<E> {
        self.pop_front()
    }
}

pub struct Machine<S, E, C> {
    tag: &'static str,
    state: S,
    queue: VecDeque<E>,
    transitions: HashMap<(S, E), (S, Option<Hook<C>>)>,
    hooks: HashMap<S, Hooks<C>>,
    active_leave: Option<Hook<C>>,
    active_handle: Option<Hook<C>>,
    first_tick: bool,
}

impl<S, E, C> Machine<S, E, C>
where
    S: Copy + Eq + Hash + Debug,
    E: Copy + Eq + Hash + Debug,
    C: EventSource<E>,
{
    /// Build a machine from its transition and hook tables.
    ///
    /// Panics if `initial` has no hook entry: a state outside the hook table
    /// is a structural defect, not a runtime condition.
    pub fn new(
        tag: &'static str,
        initial: S,
        transitions: &[(S, E, S, Option<Hook<C>>)],
        hooks: &[(S, Hooks<C>)],
    ) -> Self {
        let transitions: HashMap<_, _> = transitions
            .iter()
            .map(|&(from, evt, to, action)| ((from, evt), (to, action)))
            .collect();
        let hooks: HashMap<_, _> = hooks.iter().map(|&(st, h)| (st, h)).collect();
        assert!(
            hooks.contains_key(&initial),
            "{tag}: initial state {initial:?} missing from hook table"
        );
        Self {
            tag,
            state: initial,
            queue: VecDeque::new(),
            transitions,
            hooks,
            active_leave: None,
            active_handle: None,
            first_tick: true,
        }
    }

    pub fn state(&self) -> S {
        self.state
    }

    /// Enqueue an event. Never blocks, never drops.
    pub fn send(&mut self, evt: E) {
        self.queue.push_back(evt);
    }

    /// Invoke the continuous handler of the current state, if any.
    pub fn run_handle(&self, ctx: &mut C) {
        if let Some(handle) = self.active_handle {
            handle(ctx);
        }
    }

    /// Drain the event queue to empty, taking transitions as the table
    /// dictates. Events with no entry for the current state are no-ops.
    /// Events emitted by hooks through `ctx` are drained in the same pass.
    pub fn process(&mut self, ctx: &mut C) {
        loop {
            while let Some(evt) = ctx.next_event() {
                self.queue.push_back(evt);
            }
            let Some(evt) = self.queue.pop_front() else { break };
            let Some(&(next, action)) = self.transitions.get(&(self.state, evt)) else {
                continue;
            };
            let hooks = *self
                .hooks
                .get(&next)
                .unwrap_or_else(|| panic!("{}: state {next:?} missing from hook table", self.tag));
            if next != self.state || self.first_tick {
                telemetry::dbg(
                    self.tag,
                    channel::FSM,
                    format_args!("state tx: {:?} --{evt:?}--> {next:?}", self.state),
                );
                if let Some(leave) = self.active_leave {
                    leave(ctx);
                }
                if let Some(action) = action {
                    action(ctx);
                }
                self.active_leave = hooks.leave;
                if let Some(enter) = hooks.enter {
                    enter(ctx);
                }
                self.state = next;
            }
            if let Some(handle) = hooks.handle {
                handle(ctx);
            }
            self.active_handle = hooks.handle;
            self.first_tick = false;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

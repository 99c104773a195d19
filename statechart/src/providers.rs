//! Context providers (§4.9): listeners the interpreter pre-attaches to its
//! own observer bus so that guard contexts (and, for the default
//! evaluator, host code) can query entry/idle times and per-step event
//! activity without the step engine exposing its internal queues directly.
//!
//! Both providers are ordinary `Listener` implementations built from the
//! meta-event stream alone — there is no special-cased provider interface.

use std::cell::RefCell;
use std::collections::HashMap;

use statechart_core::{Event, Listener, MetaEvent, MetaEventKind};

#[derive(Default)]
struct TimeProviderState {
    time: f64,
    entry_time: HashMap<String, f64>,
    idle_time: HashMap<String, f64>,
    configuration: HashMap<String, ()>,
}

/// Tracks, purely from the meta-event stream, the clock time the
/// interpreter last observed and the entry/idle timestamps `after`/`idle`
/// guards are measured against.
///
/// The interpreter attaches one of these at construction; guard contexts
/// hold a shared reference to it rather than re-deriving timestamps from
/// the queues.
#[derive(Default)]
pub struct TimeProvider {
    inner: RefCell<TimeProviderState>,
}

impl TimeProvider {
    pub fn new() -> Self {
        TimeProvider::default()
    }

    /// The time recorded on the most recent `step started`.
    pub fn time(&self) -> f64 {
        self.inner.borrow().time
    }

    /// When `state` was last entered, if it ever has been.
    pub fn entry_time(&self, state: &str) -> Option<f64> {
        self.inner.borrow().entry_time.get(state).copied()
    }

    /// When `state` last entered or fired a transition, whichever is more
    /// recent — the baseline `idle(seconds)` guards measure against.
    pub fn idle_time(&self, state: &str) -> Option<f64> {
        self.inner.borrow().idle_time.get(state).copied()
    }

    /// Whether `state` is active, per this provider's own mirror of the
    /// configuration (kept in sync via `state entered`/`state exited`).
    pub fn is_active(&self, state: &str) -> bool {
        self.inner.borrow().configuration.contains_key(state)
    }
}

impl Listener for TimeProvider {
    fn on_meta_event(&self, event: &MetaEvent) {
        let mut inner = self.inner.borrow_mut();
        match event.kind {
            MetaEventKind::StepStarted => inner.time = event.time,
            MetaEventKind::StateEntered => {
                if let Some(state) = &event.state {
                    inner.entry_time.insert(state.clone(), event.time);
                    inner.idle_time.insert(state.clone(), event.time);
                    inner.configuration.insert(state.clone(), ());
                }
            }
            MetaEventKind::StateExited => {
                if let Some(state) = &event.state {
                    inner.configuration.remove(state);
                }
            }
            MetaEventKind::TransitionProcessed => {
                if let Some(source) = &event.source {
                    inner.idle_time.insert(source.clone(), event.time);
                }
            }
            _ => {}
        }
    }
}

#[derive(Default)]
struct EventProviderState {
    pending: Vec<Event>,
    sent: Vec<Event>,
    consumed: Option<Event>,
}

/// Tracks consumed/sent/pending events for the current macro step, cleared
/// on every `step started`. `DefaultEvaluator` owns one and hands it back
/// through `Evaluator::listeners()`, which the interpreter attaches to its
/// bus at construction alongside the built-in time provider — only the
/// default evaluator's registry style needs this kind of introspection
/// wired through to user code.
#[derive(Default)]
pub struct EventProvider {
    inner: RefCell<EventProviderState>,
}

impl EventProvider {
    pub fn new() -> Self {
        EventProvider::default()
    }

    /// Events sent this step that have not yet been reported consumed.
    pub fn pending(&self) -> Vec<Event> {
        self.inner.borrow().pending.clone()
    }

    /// Every event sent (via `send`) so far this step, in emission order.
    pub fn sent(&self) -> Vec<Event> {
        self.inner.borrow().sent.clone()
    }

    /// The event consumed to trigger this step, if any.
    pub fn consumed(&self) -> Option<Event> {
        self.inner.borrow().consumed.clone()
    }
}

impl Listener for EventProvider {
    fn on_meta_event(&self, event: &MetaEvent) {
        let mut inner = self.inner.borrow_mut();
        match event.kind {
            MetaEventKind::StepStarted => {
                inner.pending.clear();
                inner.sent.clear();
                inner.consumed = None;
            }
            MetaEventKind::EventSent => {
                if let Some(sent) = &event.event {
                    inner.sent.push((**sent).clone());
                    inner.pending.push((**sent).clone());
                }
            }
            MetaEventKind::EventConsumed => {
                if let Some(consumed) = &event.event {
                    inner.consumed = Some((**consumed).clone());
                    if let Some(position) = inner
                        .pending
                        .iter()
                        .position(|pending| pending.name == consumed.name)
                    {
                        inner.pending.remove(position);
                    }
                }
            }
            _ => {}
        }
    }
}

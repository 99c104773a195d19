//! A ready-to-use, registry-based `Evaluator` (§6): guard/action/entry/exit
//! names are resolved to closures registered over a host type `H`, so a
//! caller can wire up a chart without hand-writing an `Evaluator` impl.
//! Any other type implementing `Evaluator` works just as well — this is a
//! convenience, not a requirement.

use std::collections::HashMap;
use std::rc::Rc;

use statechart_core::{
    ActionContext, EntryExitContext, Evaluator, GuardContext, Listener, SentEvent, State,
    StatechartError, Transition,
};

use crate::providers::EventProvider;

type PreambleFn<H> = Box<dyn FnMut(&mut H)>;
type GuardFn<H> = Box<dyn Fn(&H, &dyn GuardContext) -> bool>;
type ActionFn<H> = Box<dyn FnMut(&mut H, &dyn ActionContext) -> Vec<SentEvent>>;
type EntryExitFn<H> = Box<dyn FnMut(&mut H, &dyn EntryExitContext) -> Vec<SentEvent>>;

/// Dispatches guard/action/entry/exit/preamble names to closures registered
/// over a host value `H`.
///
/// Unregistered names panic rather than silently no-op: a transition or
/// state referencing a name nothing registered is a wiring mistake caught
/// once during testing, not a runtime condition the engine should paper
/// over (§7's "Domain error" — there is no `Result` channel on the
/// `Evaluator` trait's guard/action/entry/exit methods to report it
/// through instead).
pub struct DefaultEvaluator<H> {
    host: H,
    preambles: HashMap<String, PreambleFn<H>>,
    guards: HashMap<String, GuardFn<H>>,
    actions: HashMap<String, ActionFn<H>>,
    on_entries: HashMap<String, EntryExitFn<H>>,
    on_exits: HashMap<String, EntryExitFn<H>>,
    events: Rc<EventProvider>,
}

impl<H> DefaultEvaluator<H> {
    pub fn new(host: H) -> Self {
        DefaultEvaluator {
            host,
            preambles: HashMap::new(),
            guards: HashMap::new(),
            actions: HashMap::new(),
            on_entries: HashMap::new(),
            on_exits: HashMap::new(),
            events: Rc::new(EventProvider::new()),
        }
    }

    /// A handle to the consumed/sent/pending event tracker for the step
    /// currently (or most recently) executing. Clone it before handing the
    /// evaluator to an `Interpreter` to keep reading it afterwards — the
    /// same `Rc` the interpreter attaches to its observer bus.
    pub fn events(&self) -> Rc<EventProvider> {
        self.events.clone()
    }

    pub fn with_preamble(mut self, name: impl Into<String>, f: impl FnMut(&mut H) + 'static) -> Self {
        self.preambles.insert(name.into(), Box::new(f));
        self
    }

    pub fn with_guard(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&H, &dyn GuardContext) -> bool + 'static,
    ) -> Self {
        self.guards.insert(name.into(), Box::new(f));
        self
    }

    pub fn with_action(
        mut self,
        name: impl Into<String>,
        f: impl FnMut(&mut H, &dyn ActionContext) -> Vec<SentEvent> + 'static,
    ) -> Self {
        self.actions.insert(name.into(), Box::new(f));
        self
    }

    pub fn with_on_entry(
        mut self,
        name: impl Into<String>,
        f: impl FnMut(&mut H, &dyn EntryExitContext) -> Vec<SentEvent> + 'static,
    ) -> Self {
        self.on_entries.insert(name.into(), Box::new(f));
        self
    }

    pub fn with_on_exit(
        mut self,
        name: impl Into<String>,
        f: impl FnMut(&mut H, &dyn EntryExitContext) -> Vec<SentEvent> + 'static,
    ) -> Self {
        self.on_exits.insert(name.into(), Box::new(f));
        self
    }
}

impl<H> Evaluator for DefaultEvaluator<H> {
    type Host = H;

    fn execute_statechart(&mut self, preamble: Option<&str>) {
        let Some(name) = preamble else { return };
        let Some(f) = self.preambles.get_mut(name) else {
            panic!(
                "{}",
                StatechartError::domain(format!("unregistered preamble '{name}'"))
            );
        };
        f(&mut self.host);
    }

    fn evaluate_guard(&self, transition: &Transition, ctx: &dyn GuardContext) -> bool {
        match &transition.guard {
            None => true,
            Some(name) => match self.guards.get(name) {
                Some(f) => f(&self.host, ctx),
                None => panic!(
                    "{}",
                    StatechartError::domain(format!("unregistered guard '{name}'"))
                ),
            },
        }
    }

    fn execute_action(
        &mut self,
        transition: &Transition,
        ctx: &mut dyn ActionContext,
    ) -> Vec<SentEvent> {
        let Some(name) = &transition.action else {
            return Vec::new();
        };
        match self.actions.get_mut(name) {
            Some(f) => f(&mut self.host, ctx),
            None => panic!(
                "{}",
                StatechartError::domain(format!("unregistered action '{name}'"))
            ),
        }
    }

    fn execute_on_entry(&mut self, state: &State, ctx: &mut dyn EntryExitContext) -> Vec<SentEvent> {
        let Some(name) = &state.on_entry else {
            return Vec::new();
        };
        match self.on_entries.get_mut(name) {
            Some(f) => f(&mut self.host, ctx),
            None => panic!(
                "{}",
                StatechartError::domain(format!("unregistered on_entry '{name}'"))
            ),
        }
    }

    fn execute_on_exit(&mut self, state: &State, ctx: &mut dyn EntryExitContext) -> Vec<SentEvent> {
        let Some(name) = &state.on_exit else {
            return Vec::new();
        };
        match self.on_exits.get_mut(name) {
            Some(f) => f(&mut self.host, ctx),
            None => panic!(
                "{}",
                StatechartError::domain(format!("unregistered on_exit '{name}'"))
            ),
        }
    }

    fn host(&mut self) -> &mut H {
        &mut self.host
    }

    fn listeners(&self) -> Vec<Rc<dyn Listener>> {
        vec![self.events.clone()]
    }
}

#[cfg(test)]
mod tests {
    use statechart_core::{SimulatedClock, State, StateKind, Transition};

    use crate::chart::StateChart;
    use crate::interpreter::Interpreter;

    use super::*;

    #[test]
    fn event_provider_is_attached_and_tracks_the_consumed_event() {
        let mut chart = StateChart::new("default-evaluator-events");
        chart
            .add_state(State::new("root", StateKind::Compound { initial: "0".into() }), None)
            .unwrap();
        chart.add_state(State::new("0", StateKind::Basic), Some("root")).unwrap();
        chart.add_state(State::new("1", StateKind::Basic), Some("root")).unwrap();
        chart
            .add_transition(Transition::new("0").with_target("1").with_event("go!"))
            .unwrap();
        chart.validate().unwrap();

        let evaluator = DefaultEvaluator::new(());
        let events = evaluator.events();
        assert!(events.consumed().is_none());

        let mut interp: Interpreter<DefaultEvaluator<()>, SimulatedClock> =
            Interpreter::with_clock(chart, evaluator, SimulatedClock::new());
        interp.execute();
        interp.queue("go!");
        interp.execute();

        assert_eq!(events.consumed().map(|event| event.name), Some("go!".to_string()));
    }
}

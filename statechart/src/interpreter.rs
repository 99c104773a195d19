//! The macro-step orchestrator (§4.8): wires the statechart, the clock, the
//! event queues and the observer bus together and drives them against an
//! injected `Evaluator`.

use std::collections::HashMap;
use std::rc::Rc;

use statechart_core::{
    ActionContext, Clock, EntryExitContext, Evaluator, Event, GuardContext, History, Listener,
    ListenerHandle, MetaEvent, MetaEventKind, ObserverBus, SentEvent, StateKind, SystemClock,
    Transition,
};

use crate::chart::StateChart;
use crate::providers::TimeProvider;
use crate::queue::EventQueue;
use crate::selection;
use crate::step::{self, MacroStep, MicroStep};

/// Drives a [`StateChart`] through macro steps against an injected
/// [`Evaluator`].
///
/// Generic over the clock (`C`) as well as the evaluator (`E`) so tests can
/// swap in [`statechart_core::SimulatedClock`] while production code
/// defaults to [`SystemClock`]. Single-threaded and non-re-entrant (§5): no
/// method other than the callback context's `send`/`notify` may be called
/// from within a guard/action/entry/exit body.
pub struct Interpreter<E: Evaluator, C: Clock = SystemClock> {
    chart: StateChart,
    evaluator: E,
    clock: C,
    configuration: Vec<String>,
    memory: HashMap<String, Vec<String>>,
    internal_queue: EventQueue,
    external_queue: EventQueue,
    initialized: bool,
    bus: ObserverBus,
    time_provider: Rc<TimeProvider>,
    eventless_first: bool,
    inner_first: bool,
}

impl<E: Evaluator, C: Clock + Default> Interpreter<E, C> {
    /// Builds an interpreter with a default-constructed clock. Runs the
    /// chart's preamble (if any) against the evaluator's host context, then
    /// attaches the built-in time provider.
    pub fn new(chart: StateChart, evaluator: E) -> Self {
        Interpreter::with_clock(chart, evaluator, C::default())
    }
}

impl<E: Evaluator, C: Clock> Interpreter<E, C> {
    /// Builds an interpreter with an explicit clock, e.g. a
    /// `SimulatedClock` under test.
    pub fn with_clock(chart: StateChart, mut evaluator: E, clock: C) -> Self {
        evaluator.execute_statechart(chart.preamble.as_deref());

        let time_provider = Rc::new(TimeProvider::new());
        let mut bus = ObserverBus::new();
        bus.attach(time_provider.clone());
        for listener in evaluator.listeners() {
            bus.attach(listener);
        }

        Interpreter {
            chart,
            evaluator,
            clock,
            configuration: Vec::new(),
            memory: HashMap::new(),
            internal_queue: EventQueue::new(),
            external_queue: EventQueue::new(),
            initialized: false,
            bus,
            time_provider,
            eventless_first: true,
            inner_first: true,
        }
    }

    /// Attaches a listener, returning a handle usable with `detach`.
    pub fn attach(&mut self, listener: Rc<dyn Listener>) -> ListenerHandle {
        self.bus.attach(listener)
    }

    pub fn detach(&mut self, handle: ListenerHandle) {
        self.bus.detach(handle)
    }

    /// Queues an externally supplied event (or bare name) for a future
    /// macro step. Chainable.
    pub fn queue(&mut self, event: impl Into<Event>) -> &mut Self {
        let event = event.into();
        let scheduled_time = self.clock.now() + event.delay;
        self.external_queue.push(event, scheduled_time);
        self
    }

    /// Mutable access to the clock, so tests can `advance`/`set_time` a
    /// `SimulatedClock`.
    pub fn clock(&mut self) -> &mut C {
        &mut self.clock
    }

    /// The chart this interpreter is driving.
    pub fn chart(&self) -> &StateChart {
        &self.chart
    }

    /// The active configuration, sorted by `(depth, name)`.
    pub fn get_configuration(&self) -> Vec<String> {
        let mut configuration = self.configuration.clone();
        configuration.sort_by(|a, b| {
            self.chart
                .depth_for(a)
                .cmp(&self.chart.depth_for(b))
                .then_with(|| a.cmp(b))
        });
        configuration
    }

    pub fn is_in_final(&self) -> bool {
        self.initialized && self.configuration.is_empty()
    }

    /// Runs one macro step (§4.8). `None` means nothing happened: the
    /// interpreter was already initialized and no transition (eventless or
    /// event-triggered) was eligible.
    pub fn execute_once(&mut self) -> Option<MacroStep> {
        let time = self.clock.now();
        self.emit(MetaEvent::new(MetaEventKind::StepStarted, time));

        let mut steps = Vec::new();

        if !self.initialized {
            self.initialized = true;
            let root = self
                .chart
                .root()
                .expect("statechart must have a root")
                .to_string();
            let entry_step = MicroStep {
                event: None,
                transition: None,
                exited_states: Vec::new(),
                entered_states: vec![root],
            };
            self.apply_step(entry_step.clone());
            steps.push(entry_step);
            self.stabilize(&mut steps);
            self.emit(MetaEvent::new(MetaEventKind::StepEnded, self.clock.now()));
            return Some(MacroStep { time, steps });
        }

        let ordered = self.select_ordered_transitions();
        if ordered.is_empty() {
            self.emit(MetaEvent::new(MetaEventKind::StepEnded, self.clock.now()));
            return None;
        }

        let event_triggered = ordered[0].event.is_some();
        let consumed_event = if event_triggered {
            let event = self.pop_candidate_event();
            if let Some(event) = &event {
                self.emit(
                    MetaEvent::new(MetaEventKind::EventConsumed, self.clock.now())
                        .with_event(Rc::new(event.clone())),
                );
            }
            event
        } else {
            None
        };

        for transition in ordered {
            let micro_step = if transition.is_internal() {
                step::build_internal_step(transition, consumed_event.clone())
            } else {
                step::build_external_step(
                    &self.chart,
                    &self.configuration,
                    transition,
                    consumed_event.clone(),
                )
            };
            self.apply_step(micro_step.clone());
            steps.push(micro_step);
            self.stabilize(&mut steps);
        }

        self.emit(MetaEvent::new(MetaEventKind::StepEnded, self.clock.now()));
        Some(MacroStep { time, steps })
    }

    /// Runs macro steps until `execute_once` returns `None`.
    pub fn execute(&mut self) -> Vec<MacroStep> {
        let mut macro_steps = Vec::new();
        while let Some(macro_step) = self.execute_once() {
            macro_steps.push(macro_step);
        }
        macro_steps
    }

    fn stabilize(&mut self, steps: &mut Vec<MicroStep>) {
        while let Some(stabilization_step) =
            step::compute_stabilization_step(&self.chart, &self.configuration, &self.memory)
        {
            self.apply_step(stabilization_step.clone());
            steps.push(stabilization_step);
        }
    }

    fn select_ordered_transitions(&self) -> Vec<Transition> {
        let now = self.clock.now();
        let candidate = self
            .internal_queue
            .peek(now)
            .or_else(|| self.external_queue.peek(now))
            .cloned();

        let selected = selection::select_transitions(
            &self.chart,
            &self.configuration,
            candidate.as_ref(),
            self.eventless_first,
            self.inner_first,
            self.chart.transitions(),
            |transition, exposed_event| self.guard_holds(transition, exposed_event),
        );

        selection::sort_transitions(&self.chart, selected)
            .into_iter()
            .cloned()
            .collect()
    }

    fn guard_holds(&self, transition: &Transition, exposed_event: Option<&Event>) -> bool {
        if transition.guard.is_none() {
            return true;
        }
        let ctx = InterpreterGuardContext {
            configuration: &self.configuration,
            time: self.clock.now(),
            time_provider: &self.time_provider,
            source: &transition.source,
            event: exposed_event,
        };
        self.evaluator.evaluate_guard(transition, &ctx)
    }

    fn pop_candidate_event(&mut self) -> Option<Event> {
        let now = self.clock.now();
        self.internal_queue
            .pop(now)
            .or_else(|| self.external_queue.pop(now))
    }

    /// Applies one micro step in the strict order set out by §4.6.
    fn apply_step(&mut self, step: MicroStep) {
        let time = self.clock.now();
        let snapshot = self.configuration.clone();
        let mut sent_events: Vec<SentEvent> = Vec::new();

        for state_name in &step.exited_states {
            let state = self
                .chart
                .state_for(state_name)
                .expect("exited state must exist in the chart")
                .clone();

            if state.on_exit.is_some() {
                let configuration = self.configuration.clone();
                let mut ctx = InterpreterEntryExitContext {
                    configuration: &configuration,
                    time,
                    sent: &mut sent_events,
                };
                let events = self.evaluator.execute_on_exit(&state, &mut ctx);
                sent_events.extend(events);
            }

            if state.is_compound_state() {
                let descendants = self.chart.descendants_for(state_name);
                for child_name in self.chart.children_for(state_name).to_vec() {
                    let Some(child) = self.chart.state_for(&child_name) else {
                        continue;
                    };
                    if let StateKind::History { kind, .. } = &child.kind {
                        let recorded: Vec<String> = match kind {
                            History::Deep => snapshot
                                .iter()
                                .filter(|&name| descendants.contains(name))
                                .cloned()
                                .collect(),
                            History::Shallow => snapshot
                                .iter()
                                .filter(|&name| self.chart.children_for(state_name).contains(name))
                                .cloned()
                                .collect(),
                        };
                        self.memory.insert(child_name, recorded);
                    }
                }
            }

            self.configuration.retain(|name| name != state_name);
            self.emit(MetaEvent::new(MetaEventKind::StateExited, time).with_state(state_name.clone()));
        }

        if let Some(transition) = &step.transition {
            if transition.action.is_some() {
                let configuration = self.configuration.clone();
                let mut ctx = InterpreterActionContext {
                    configuration: &configuration,
                    time,
                    sent: &mut sent_events,
                    event: step.event.as_ref(),
                };
                let events = self.evaluator.execute_action(transition, &mut ctx);
                sent_events.extend(events);
            }
            self.emit(
                MetaEvent::new(MetaEventKind::TransitionProcessed, time).with_transition(
                    transition.source.clone(),
                    transition.target.clone(),
                    step.event.as_ref().map(|event| event.name.clone()),
                ),
            );
        }

        for state_name in &step.entered_states {
            let state = self
                .chart
                .state_for(state_name)
                .expect("entered state must exist in the chart")
                .clone();

            if state.on_entry.is_some() {
                let configuration = self.configuration.clone();
                let mut ctx = InterpreterEntryExitContext {
                    configuration: &configuration,
                    time,
                    sent: &mut sent_events,
                };
                let events = self.evaluator.execute_on_entry(&state, &mut ctx);
                sent_events.extend(events);
            }

            self.configuration.push(state_name.clone());
            self.emit(MetaEvent::new(MetaEventKind::StateEntered, time).with_state(state_name.clone()));
        }

        for sent in sent_events {
            match sent {
                SentEvent::Internal(event) => {
                    let now = self.clock.now();
                    let scheduled_time = now + event.delay;
                    self.emit(MetaEvent::new(MetaEventKind::EventSent, now).with_event(Rc::new(event.clone())));
                    self.internal_queue.push(event, scheduled_time);
                }
                SentEvent::Meta(meta) => self.emit(meta),
            }
        }
    }

    fn emit(&self, event: MetaEvent) {
        self.bus.dispatch(&event);
    }
}

struct InterpreterEntryExitContext<'a> {
    configuration: &'a [String],
    time: f64,
    sent: &'a mut Vec<SentEvent>,
}

impl EntryExitContext for InterpreterEntryExitContext<'_> {
    fn active(&self, name: &str) -> bool {
        self.configuration.iter().any(|state| state == name)
    }

    fn get_time(&self) -> f64 {
        self.time
    }

    fn send(&mut self, event: Event) {
        self.sent.push(SentEvent::Internal(event));
    }

    fn notify(&mut self, event: MetaEvent) {
        self.sent.push(SentEvent::Meta(event));
    }
}

struct InterpreterActionContext<'a> {
    configuration: &'a [String],
    time: f64,
    sent: &'a mut Vec<SentEvent>,
    event: Option<&'a Event>,
}

impl ActionContext for InterpreterActionContext<'_> {
    fn active(&self, name: &str) -> bool {
        self.configuration.iter().any(|state| state == name)
    }

    fn get_time(&self) -> f64 {
        self.time
    }

    fn send(&mut self, event: Event) {
        self.sent.push(SentEvent::Internal(event));
    }

    fn notify(&mut self, event: MetaEvent) {
        self.sent.push(SentEvent::Meta(event));
    }

    fn event(&self) -> Option<&Event> {
        self.event
    }
}

struct InterpreterGuardContext<'a> {
    configuration: &'a [String],
    time: f64,
    time_provider: &'a TimeProvider,
    source: &'a str,
    event: Option<&'a Event>,
}

impl GuardContext for InterpreterGuardContext<'_> {
    fn active(&self, name: &str) -> bool {
        self.configuration.iter().any(|state| state == name)
    }

    fn get_time(&self) -> f64 {
        self.time
    }

    fn after(&self, seconds: f64) -> bool {
        self.time_provider
            .entry_time(self.source)
            .map(|entered_at| self.time >= entered_at + seconds)
            .unwrap_or(false)
    }

    fn idle(&self, seconds: f64) -> bool {
        self.time_provider
            .idle_time(self.source)
            .map(|idle_since| self.time >= idle_since + seconds)
            .unwrap_or(false)
    }

    fn event(&self) -> Option<&Event> {
        self.event
    }
}

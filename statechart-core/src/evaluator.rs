use std::rc::Rc;

use crate::event::{Event, MetaEvent};
use crate::listener::Listener;
use crate::model::{State, Transition};

/// The read/write surface handed to an entry or exit body.
pub trait EntryExitContext {
    fn active(&self, name: &str) -> bool;
    fn get_time(&self) -> f64;
    fn send(&mut self, event: Event);
    fn notify(&mut self, event: MetaEvent);
}

/// The read/write surface handed to a transition's action body. Like
/// `EntryExitContext`, plus the event that triggered the transition, if any.
pub trait ActionContext {
    fn active(&self, name: &str) -> bool;
    fn get_time(&self) -> f64;
    fn send(&mut self, event: Event);
    fn notify(&mut self, event: MetaEvent);
    fn event(&self) -> Option<&Event>;
}

/// The read-only surface handed to a guard. `after`/`idle` are measured
/// against the transition's source state's recorded entry/idle time.
pub trait GuardContext {
    fn active(&self, name: &str) -> bool;
    fn get_time(&self) -> f64;
    fn after(&self, seconds: f64) -> bool;
    fn idle(&self, seconds: f64) -> bool;
    fn event(&self) -> Option<&Event>;
}

/// The boundary through which the step engine calls into host code.
///
/// `Host` is the opaque data context the evaluator carries; the engine
/// never inspects it, only threads a mutable reference through to guard,
/// action, and entry/exit bodies.
pub trait Evaluator {
    type Host;

    /// Called once, right after construction, with the chart's preamble
    /// action name (if any) so the evaluator can run it against the host
    /// context before the first macro step.
    fn execute_statechart(&mut self, preamble: Option<&str>);

    fn evaluate_guard(&self, transition: &Transition, ctx: &dyn GuardContext) -> bool;

    fn execute_action(
        &mut self,
        transition: &Transition,
        ctx: &mut dyn ActionContext,
    ) -> Vec<crate::event::SentEvent>;

    fn execute_on_entry(
        &mut self,
        state: &State,
        ctx: &mut dyn EntryExitContext,
    ) -> Vec<crate::event::SentEvent>;

    fn execute_on_exit(
        &mut self,
        state: &State,
        ctx: &mut dyn EntryExitContext,
    ) -> Vec<crate::event::SentEvent>;

    /// The opaque host data context, exposed for callers that need direct
    /// access outside of a callback (e.g. to seed initial data).
    fn host(&mut self) -> &mut Self::Host;

    /// Listeners the interpreter should attach to its observer bus at
    /// construction time, alongside its own built-in time provider (§4.9).
    /// Most evaluators have none; `DefaultEvaluator` uses this to wire up
    /// its event provider.
    fn listeners(&self) -> Vec<Rc<dyn Listener>> {
        Vec::new()
    }
}

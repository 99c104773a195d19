//! The statechart step engine: state graph (`StateChart`), transition
//! selection and ordering, micro/macro step construction, stabilization,
//! and the `Interpreter` that drives all of it against an injected
//! `Evaluator`.
//!
//! The vocabulary this crate builds on — events, the clock capability, the
//! observer bus, and the `Evaluator` boundary itself — lives one layer
//! down in `statechart_core`, re-exported here under `core` (and
//! selectively at the top level) so most callers never need to depend on
//! it directly.

mod chart;
mod default_evaluator;
mod interpreter;
mod providers;
mod queue;
mod selection;
mod step;

pub use chart::StateChart;
pub use default_evaluator::DefaultEvaluator;
pub use interpreter::Interpreter;
pub use providers::{EventProvider, TimeProvider};
pub use step::{MacroStep, MicroStep};

pub mod core {
    pub use statechart_core::*;
}

pub use statechart_core::{
    ActionContext, Clock, EntryExitContext, Evaluator, Event, EventData, GuardContext, History,
    InternalEvent, Listener, ListenerHandle, MetaEvent, MetaEventKind, ObserverBus, SentEvent,
    SimulatedClock, State, StateKind, StatechartError, SystemClock, Transition,
};

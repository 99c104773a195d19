//! Core types shared between the statechart step engine and any evaluator that
//! plugs into it.
//!
//! This crate has no opinion on *how* a statechart is built or executed; it
//! only fixes the vocabulary at the boundary: events, meta-events, the clock
//! capability, the observer bus, and the `Evaluator` trait through which the
//! engine calls into host code. The engine itself (state graph, step
//! selection, application, stabilization) lives in the `statechart` crate.

mod clock;
mod error;
mod evaluator;
mod event;
mod listener;
mod model;

pub use clock::{Clock, SimulatedClock, SystemClock};
pub use error::StatechartError;
pub use evaluator::{ActionContext, Evaluator, EntryExitContext, GuardContext};
pub use event::{Event, EventData, InternalEvent, MetaEvent, MetaEventKind, SentEvent};
pub use listener::{ListenerHandle, Listener, ObserverBus};
pub use model::{History, State, StateKind, Transition};

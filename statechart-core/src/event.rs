use std::fmt;
use std::rc::Rc;

/// A small closed set of payload shapes an event can carry.
///
/// The engine never inspects `data` itself — it only threads it through to
/// guards and actions via the callback contexts — so this stays a flat enum
/// rather than something generic over an arbitrary host payload type.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    Text(String),
    Number(f64),
    Flag(bool),
}

/// An event queued for the interpreter, either supplied externally or sent
/// by an action/entry/exit body via `send`.
///
/// `Event` and `InternalEvent` intentionally share this one struct rather
/// than forming an inheritance chain: `InternalEvent` is a newtype wrapper
/// that only exists to route the event to the internal queue and to mark it
/// as dispatched ahead of external events at equal scheduled time.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub delay: f64,
    pub data: Option<EventData>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Event {
            name: name.into(),
            delay: 0.0,
            data: None,
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_data(mut self, data: EventData) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        Event::new(name)
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        Event::new(name)
    }
}

/// An event raised internally, either by an action sending a follow-up
/// event or by the engine itself. Always dispatched before external events
/// scheduled at the same time.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalEvent(pub Event);

/// The fixed set of life-cycle notifications the engine emits, bit-exact in
/// name because context providers and tests match on them by string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaEventKind {
    StepStarted,
    StepEnded,
    StateEntered,
    StateExited,
    TransitionProcessed,
    EventSent,
    EventConsumed,
}

impl MetaEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaEventKind::StepStarted => "step started",
            MetaEventKind::StepEnded => "step ended",
            MetaEventKind::StateEntered => "state entered",
            MetaEventKind::StateExited => "state exited",
            MetaEventKind::TransitionProcessed => "transition processed",
            MetaEventKind::EventSent => "event sent",
            MetaEventKind::EventConsumed => "event consumed",
        }
    }
}

impl fmt::Display for MetaEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A life-cycle notification delivered to every attached listener, in
/// attachment order, synchronously as the engine produces it.
#[derive(Debug, Clone)]
pub struct MetaEvent {
    pub kind: MetaEventKind,
    pub time: f64,
    pub state: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub event: Option<Rc<Event>>,
}

impl MetaEvent {
    pub fn new(kind: MetaEventKind, time: f64) -> Self {
        MetaEvent {
            kind,
            time,
            state: None,
            source: None,
            target: None,
            event: None,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_transition(
        mut self,
        source: impl Into<String>,
        target: Option<String>,
        event: Option<String>,
    ) -> Self {
        self.source = Some(source.into());
        self.target = target;
        self.event = event.map(|name| Rc::new(Event::new(name)));
        self
    }

    pub fn with_event(mut self, event: Rc<Event>) -> Self {
        self.event = Some(event);
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// An event emitted by an entry/exit/action callback during a micro step,
/// routed either back into the internal queue (`send`) or straight to the
/// observer bus (`notify`).
#[derive(Debug, Clone)]
pub enum SentEvent {
    Internal(Event),
    Meta(MetaEvent),
}

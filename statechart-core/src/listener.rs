use std::rc::Rc;

use crate::event::MetaEvent;

/// Something that wants to observe the interpreter's life-cycle
/// notifications. Implementations typically keep their own state in a
/// `Cell`/`RefCell` behind the shared `Rc` the bus holds, since `on_meta_event`
/// takes `&self`.
pub trait Listener {
    fn on_meta_event(&self, event: &MetaEvent);
}

/// An opaque handle returned by `ObserverBus::attach`, used to `detach`
/// later without the caller holding a raw back-reference into the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerHandle(u64);

/// An ordered collection of listeners, dispatched to in attachment order.
///
/// Re-entrant `attach`/`detach` from inside a listener's `on_meta_event` is
/// not supported — the contract assumes dispatch runs to completion before
/// the set of listeners changes again.
#[derive(Default)]
pub struct ObserverBus {
    listeners: Vec<(ListenerHandle, Rc<dyn Listener>)>,
    next_handle: u64,
}

impl ObserverBus {
    pub fn new() -> Self {
        ObserverBus {
            listeners: Vec::new(),
            next_handle: 0,
        }
    }

    pub fn attach(&mut self, listener: Rc<dyn Listener>) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle);
        self.next_handle += 1;
        self.listeners.push((handle, listener));
        handle
    }

    pub fn detach(&mut self, handle: ListenerHandle) {
        self.listeners.retain(|(existing, _)| *existing != handle);
    }

    pub fn dispatch(&self, event: &MetaEvent) {
        for (_, listener) in &self.listeners {
            listener.on_meta_event(event);
        }
    }
}

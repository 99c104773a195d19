//! The scheduled event queue the interpreter keeps one of for internal
//! events and one of for external events (§4.2).

use statechart_core::Event;

/// A time-ordered, stably-sorted queue of pending events.
///
/// Insertion is an upper-bound insert on scheduled time: ties keep existing
/// entries ahead of the new one, so equal-time events preserve FIFO order.
#[derive(Debug, Default)]
pub struct EventQueue {
    entries: Vec<(Event, f64)>,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue { entries: Vec::new() }
    }

    pub fn push(&mut self, event: Event, scheduled_time: f64) {
        let index = self
            .entries
            .partition_point(|(_, time)| *time <= scheduled_time);
        self.entries.insert(index, (event, scheduled_time));
    }

    /// Peeks the head without consuming it, per the non-consuming
    /// `select_event` variant used while computing candidate steps.
    pub fn peek(&self, now: f64) -> Option<&Event> {
        self.entries
            .first()
            .filter(|(_, time)| *time <= now)
            .map(|(event, _)| event)
    }

    pub fn pop(&mut self, now: f64) -> Option<Event> {
        if self.peek(now).is_some() {
            Some(self.entries.remove(0).0)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_admits_events_scheduled_at_or_before_now() {
        let mut queue = EventQueue::new();
        queue.push(Event::new("go"), 1.0);
        assert_eq!(queue.peek(0.9), None);
        assert_eq!(queue.peek(1.0).map(|event| event.name.clone()), Some("go".to_string()));
        assert_eq!(queue.pop(0.9), None);
        assert!(!queue.is_empty());
        assert_eq!(queue.pop(1.0).map(|event| event.name), Some("go".to_string()));
        assert!(queue.is_empty());
    }

    #[test]
    fn equal_time_entries_preserve_fifo_order() {
        let mut queue = EventQueue::new();
        queue.push(Event::new("first"), 1.0);
        queue.push(Event::new("second"), 1.0);
        queue.push(Event::new("third"), 1.0);

        assert_eq!(queue.pop(2.0).map(|event| event.name), Some("first".to_string()));
        assert_eq!(queue.pop(2.0).map(|event| event.name), Some("second".to_string()));
        assert_eq!(queue.pop(2.0).map(|event| event.name), Some("third".to_string()));
    }

    #[test]
    fn earlier_scheduled_time_pops_first_regardless_of_insertion_order() {
        let mut queue = EventQueue::new();
        queue.push(Event::new("later"), 2.0);
        queue.push(Event::new("earlier"), 1.0);

        assert_eq!(queue.pop(3.0).map(|event| event.name), Some("earlier".to_string()));
        assert_eq!(queue.pop(3.0).map(|event| event.name), Some("later".to_string()));
    }
}

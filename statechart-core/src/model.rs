//! The state/transition data model: plain data, no graph structure and no
//! behavior beyond the handful of `is_*` predicates the step engine needs.
//! The graph itself (parent/child maps, queries, validation) lives in
//! `statechart::StateChart`, one level up, since it is the engine's
//! concern rather than a shared vocabulary type.

/// Distinguishes the two history flavors a `StateKind::History` can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    /// Remembers only the direct child that was active when last exited.
    Shallow,
    /// Remembers the full set of active descendants when last exited.
    Deep,
}

/// The closed set of state kinds. Modeled as one tagged enum rather than a
/// class hierarchy with virtual `is_*` predicates — `State::is_*` below
/// pattern-matches on this instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateKind {
    Basic,
    Compound { initial: String },
    Orthogonal,
    History { kind: History, memory: Option<String> },
    Final,
}

/// A single node in the statechart: a name, optional entry/exit action
/// references (resolved by name through the `Evaluator`), and a kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub name: String,
    pub on_entry: Option<String>,
    pub on_exit: Option<String>,
    pub kind: StateKind,
}

impl State {
    pub fn new(name: impl Into<String>, kind: StateKind) -> Self {
        State {
            name: name.into(),
            on_entry: None,
            on_exit: None,
            kind,
        }
    }

    pub fn with_on_entry(mut self, action: impl Into<String>) -> Self {
        self.on_entry = Some(action.into());
        self
    }

    pub fn with_on_exit(mut self, action: impl Into<String>) -> Self {
        self.on_exit = Some(action.into());
        self
    }

    pub fn is_actions_state(&self) -> bool {
        true
    }

    pub fn is_transitions_state(&self) -> bool {
        matches!(
            self.kind,
            StateKind::Basic | StateKind::Compound { .. } | StateKind::Orthogonal
        )
    }

    pub fn is_compound_state(&self) -> bool {
        matches!(self.kind, StateKind::Compound { .. })
    }

    pub fn is_orthogonal_state(&self) -> bool {
        matches!(self.kind, StateKind::Orthogonal)
    }

    pub fn is_composite_state(&self) -> bool {
        self.is_compound_state() || self.is_orthogonal_state()
    }

    pub fn is_history_state(&self) -> bool {
        matches!(self.kind, StateKind::History { .. })
    }

    pub fn is_shallow_history_state(&self) -> bool {
        matches!(
            self.kind,
            StateKind::History { kind: History::Shallow, .. }
        )
    }

    pub fn is_deep_history_state(&self) -> bool {
        matches!(self.kind, StateKind::History { kind: History::Deep, .. })
    }

    pub fn is_final_state(&self) -> bool {
        matches!(self.kind, StateKind::Final)
    }

    /// The compound's initial child, if this is a compound state.
    pub fn initial(&self) -> Option<&str> {
        match &self.kind {
            StateKind::Compound { initial } => Some(initial.as_str()),
            _ => None,
        }
    }

    /// The history's default memory target, if this is a history state.
    pub fn memory(&self) -> Option<&str> {
        match &self.kind {
            StateKind::History { memory, .. } => memory.as_deref(),
            _ => None,
        }
    }
}

/// An edge between two transitions-capable states, or an internal
/// (no-target) self-edge that only runs an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub source: String,
    pub target: Option<String>,
    pub event: Option<String>,
    pub guard: Option<String>,
    pub action: Option<String>,
    pub priority: i32,
}

impl Transition {
    pub fn new(source: impl Into<String>) -> Self {
        Transition {
            source: source.into(),
            target: None,
            event: None,
            guard: None,
            action: None,
            priority: 0,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_internal(&self) -> bool {
        self.target.is_none()
    }

    pub fn is_eventless(&self) -> bool {
        self.event.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_kind_predicates_match_capability_matrix() {
        let basic = State::new("basic", StateKind::Basic);
        assert!(basic.is_actions_state());
        assert!(basic.is_transitions_state());
        assert!(!basic.is_composite_state());

        let compound = State::new(
            "compound",
            StateKind::Compound { initial: "child".into() },
        );
        assert!(compound.is_compound_state());
        assert!(compound.is_composite_state());
        assert_eq!(compound.initial(), Some("child"));

        let orthogonal = State::new("orthogonal", StateKind::Orthogonal);
        assert!(orthogonal.is_orthogonal_state());
        assert!(orthogonal.is_composite_state());

        let shallow = State::new(
            "history",
            StateKind::History { kind: History::Shallow, memory: Some("sibling".into()) },
        );
        assert!(shallow.is_history_state());
        assert!(shallow.is_shallow_history_state());
        assert!(!shallow.is_deep_history_state());
        assert!(!shallow.is_transitions_state());
        assert_eq!(shallow.memory(), Some("sibling"));

        let deep = State::new("deep", StateKind::History { kind: History::Deep, memory: None });
        assert!(deep.is_deep_history_state());
        assert_eq!(deep.memory(), None);

        let final_state = State::new("done", StateKind::Final);
        assert!(final_state.is_final_state());
        assert!(!final_state.is_transitions_state());
    }

    #[test]
    fn transition_internal_and_eventless_flags() {
        let internal = Transition::new("a");
        assert!(internal.is_internal());
        assert!(internal.is_eventless());

        let external = Transition::new("a").with_target("b").with_event("go");
        assert!(!external.is_internal());
        assert!(!external.is_eventless());
    }
}

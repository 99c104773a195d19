//! The statechart graph: states, parent/child relations, transitions, and
//! the read-only queries the step engine relies on.
//!
//! Construction goes through `add_state`/`add_transition` one state at a
//! time (there is no builder DSL), followed by a `validate()` call that
//! checks the cross-references `add_state` doesn't catch on its own
//! (compound `initial`, history `memory`).

use std::collections::HashMap;

use statechart_core::{State, StateKind, StatechartError, Transition};

/// The full state graph plus its transitions.
///
/// `preamble` names an action the evaluator runs once, against the host
/// context, right after the interpreter is constructed.
#[derive(Debug, Clone)]
pub struct StateChart {
    pub name: String,
    pub preamble: Option<String>,
    states: HashMap<String, State>,
    parent: HashMap<String, Option<String>>,
    children: HashMap<String, Vec<String>>,
    transitions: Vec<Transition>,
    root: Option<String>,
}

impl StateChart {
    pub fn new(name: impl Into<String>) -> Self {
        StateChart {
            name: name.into(),
            preamble: None,
            states: HashMap::new(),
            parent: HashMap::new(),
            children: HashMap::new(),
            transitions: Vec::new(),
            root: None,
        }
    }

    pub fn with_preamble(mut self, action: impl Into<String>) -> Self {
        self.preamble = Some(action.into());
        self
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn state_for(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    pub fn parent_for(&self, name: &str) -> Option<&str> {
        self.parent.get(name).and_then(|p| p.as_deref())
    }

    pub fn children_for(&self, name: &str) -> &[String] {
        self.children
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    /// Adds a state under `parent` (`None` for the root). The parent, if
    /// given, must already exist and be composite; a history child's
    /// parent must additionally be compound.
    pub fn add_state(&mut self, state: State, parent: Option<&str>) -> Result<(), StatechartError> {
        if state.name.is_empty() {
            return Err(StatechartError::structural("state must have a name"));
        }
        if self.states.contains_key(&state.name) {
            return Err(StatechartError::structural(format!(
                "state '{}' already exists",
                state.name
            )));
        }

        match parent {
            None => {
                if self.root.is_some() {
                    return Err(StatechartError::structural(
                        "root already defined; add this state with an existing parent",
                    ));
                }
                self.root = Some(state.name.clone());
                self.parent.insert(state.name.clone(), None);
                self.children.entry(state.name.clone()).or_default();
            }
            Some(parent_name) => {
                let parent_state = self.states.get(parent_name).ok_or_else(|| {
                    StatechartError::structural(format!(
                        "parent '{parent_name}' of '{}' does not exist",
                        state.name
                    ))
                })?;

                if !parent_state.is_composite_state() {
                    return Err(StatechartError::structural(format!(
                        "state '{parent_name}' cannot be used as a parent for '{}'",
                        state.name
                    )));
                }

                if state.is_history_state() && !parent_state.is_compound_state() {
                    return Err(StatechartError::structural(format!(
                        "state '{parent_name}' cannot be used as a parent for '{}'",
                        state.name
                    )));
                }

                self.parent
                    .insert(state.name.clone(), Some(parent_name.to_string()));
                self.children.entry(state.name.clone()).or_default();
                self.children
                    .entry(parent_name.to_string())
                    .or_default()
                    .push(state.name.clone());
            }
        }

        self.states.insert(state.name.clone(), state);
        Ok(())
    }

    pub fn add_transition(&mut self, transition: Transition) -> Result<(), StatechartError> {
        let source = self.states.get(&transition.source).ok_or_else(|| {
            StatechartError::structural(format!(
                "transition source '{}' does not exist",
                transition.source
            ))
        })?;

        if !source.is_transitions_state() {
            return Err(StatechartError::structural(format!(
                "cannot add transition on state '{}'",
                source.name
            )));
        }

        if let Some(target) = &transition.target {
            if !self.states.contains_key(target) {
                return Err(StatechartError::structural(format!(
                    "unknown target state '{target}'"
                )));
            }
        }

        self.transitions.push(transition);
        Ok(())
    }

    /// Cross-reference checks that `add_state`/`add_transition` cannot
    /// perform incrementally: every compound's `initial` must be a direct
    /// child, and every history's `memory` must be a sibling.
    pub fn validate(&self) -> Result<(), StatechartError> {
        for state in self.states.values() {
            if let StateKind::Compound { initial } = &state.kind {
                if !self.states.contains_key(initial) {
                    return Err(StatechartError::structural(format!(
                        "initial state '{initial}' of state '{}' does not exist",
                        state.name
                    )));
                }
                if !self.children_for(&state.name).iter().any(|c| c == initial) {
                    return Err(StatechartError::structural(format!(
                        "initial state '{initial}' of state '{}' must be a child state",
                        state.name
                    )));
                }
            }

            if let StateKind::History { memory: Some(memory), .. } = &state.kind {
                if memory == &state.name {
                    return Err(StatechartError::structural(format!(
                        "memory '{memory}' of state '{}' cannot target itself",
                        state.name
                    )));
                }
                if !self.states.contains_key(memory) {
                    return Err(StatechartError::structural(format!(
                        "memory '{memory}' of state '{}' does not exist",
                        state.name
                    )));
                }
                let parent = self.parent_for(&state.name).unwrap_or("");
                if !self.children_for(parent).iter().any(|c| c == memory) {
                    return Err(StatechartError::structural(format!(
                        "memory '{memory}' of state '{}' must be a sibling",
                        state.name
                    )));
                }
            }
        }

        Ok(())
    }

    // --- read-only queries (§4.1) ---------------------------------------

    pub fn ancestors_for(&self, name: &str) -> Vec<String> {
        let mut ancestors = Vec::new();
        let mut current = self.parent_for(name).map(str::to_string);
        while let Some(parent) = current {
            current = self.parent_for(&parent).map(str::to_string);
            ancestors.push(parent);
        }
        ancestors
    }

    pub fn descendants_for(&self, name: &str) -> Vec<String> {
        let mut descendants = Vec::new();
        let mut queue: Vec<String> = vec![name.to_string()];
        let mut head = 0;
        while head < queue.len() {
            let current = queue[head].clone();
            head += 1;
            for child in self.children_for(&current) {
                queue.push(child.clone());
                descendants.push(child.clone());
            }
        }
        descendants
    }

    pub fn depth_for(&self, name: &str) -> usize {
        1 + self.ancestors_for(name).len()
    }

    pub fn least_common_ancestor(&self, first: &str, second: &str) -> Option<String> {
        let first_ancestors = self.ancestors_for(first);
        let second_ancestors = self.ancestors_for(second);
        first_ancestors
            .into_iter()
            .find(|candidate| second_ancestors.contains(candidate))
    }

    pub fn leaf_for(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter(|name| {
                self.descendants_for(name)
                    .iter()
                    .all(|descendant| !names.contains(descendant))
            })
            .cloned()
            .collect()
    }

    pub fn transitions_from(&self, source: &str) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter(|t| t.source == source)
            .collect()
    }

    pub fn transitions_to(&self, target: &str) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter(|t| {
                t.target.as_deref() == Some(target) || (t.target.is_none() && t.source == target)
            })
            .collect()
    }

    pub fn transitions_with(&self, event: &str) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter(|t| t.event.as_deref() == Some(event))
            .collect()
    }

    pub fn events_for(&self, names: &[String]) -> Vec<String> {
        let mut events = Vec::new();
        for name in names {
            for transition in self.transitions_from(name) {
                if let Some(event) = &transition.event {
                    events.push(event.clone());
                }
            }
        }
        events
    }

    pub fn all_state_names(&self) -> Vec<String> {
        self.states.keys().cloned().collect()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statechart_core::History;

    fn sample_chart() -> StateChart {
        // root -> { a (compound, initial b), d }
        // a -> { b, c }
        let mut chart = StateChart::new("sample");
        chart
            .add_state(State::new("root", StateKind::Compound { initial: "a".into() }), None)
            .unwrap();
        chart
            .add_state(
                State::new("a", StateKind::Compound { initial: "b".into() }),
                Some("root"),
            )
            .unwrap();
        chart.add_state(State::new("b", StateKind::Basic), Some("a")).unwrap();
        chart.add_state(State::new("c", StateKind::Basic), Some("a")).unwrap();
        chart.add_state(State::new("d", StateKind::Basic), Some("root")).unwrap();
        chart
    }

    #[test]
    fn ancestors_and_depth() {
        let chart = sample_chart();
        assert_eq!(chart.ancestors_for("b"), vec!["a".to_string(), "root".to_string()]);
        assert_eq!(chart.ancestors_for("root"), Vec::<String>::new());
        assert_eq!(chart.depth_for("root"), 1);
        assert_eq!(chart.depth_for("a"), 2);
        assert_eq!(chart.depth_for("b"), 3);
    }

    #[test]
    fn descendants_are_breadth_first() {
        let chart = sample_chart();
        assert_eq!(
            chart.descendants_for("root"),
            vec!["a".to_string(), "d".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn least_common_ancestor_of_siblings_is_their_parent() {
        let chart = sample_chart();
        assert_eq!(chart.least_common_ancestor("b", "c"), Some("a".to_string()));
        assert_eq!(chart.least_common_ancestor("b", "d"), Some("root".to_string()));
        assert_eq!(chart.least_common_ancestor("b", "b"), Some("a".to_string()));
    }

    #[test]
    fn leaf_for_excludes_ancestors_present_in_the_set() {
        let chart = sample_chart();
        let names = vec!["root".to_string(), "a".to_string(), "b".to_string(), "d".to_string()];
        let mut leaves = chart.leaf_for(&names);
        leaves.sort();
        assert_eq!(leaves, vec!["b".to_string(), "d".to_string()]);
    }

    #[test]
    fn add_state_rejects_duplicate_names() {
        let mut chart = sample_chart();
        let error = chart
            .add_state(State::new("b", StateKind::Basic), Some("root"))
            .unwrap_err();
        assert!(matches!(error, StatechartError::Structural(_)));
    }

    #[test]
    fn add_state_rejects_non_composite_parent() {
        let mut chart = sample_chart();
        let error = chart
            .add_state(State::new("e", StateKind::Basic), Some("b"))
            .unwrap_err();
        assert!(matches!(error, StatechartError::Structural(_)));
    }

    #[test]
    fn add_transition_rejects_unknown_target() {
        let mut chart = sample_chart();
        let error = chart
            .add_transition(Transition::new("b").with_target("nowhere"))
            .unwrap_err();
        assert!(matches!(error, StatechartError::Structural(_)));
    }

    #[test]
    fn validate_rejects_initial_outside_children() {
        let mut chart = StateChart::new("bad");
        chart
            .add_state(State::new("root", StateKind::Compound { initial: "missing".into() }), None)
            .unwrap();
        chart.add_state(State::new("a", StateKind::Basic), Some("root")).unwrap();
        assert!(chart.validate().is_err());
    }

    #[test]
    fn validate_rejects_history_memory_outside_siblings() {
        let mut chart = StateChart::new("bad");
        chart
            .add_state(State::new("root", StateKind::Compound { initial: "a".into() }), None)
            .unwrap();
        chart.add_state(State::new("a", StateKind::Basic), Some("root")).unwrap();
        chart
            .add_state(
                State::new(
                    "h",
                    StateKind::History { kind: History::Shallow, memory: Some("a".into()) },
                ),
                Some("root"),
            )
            .unwrap();
        // memory references a sibling of root itself, not of `h`'s actual parent scope below
        let mut nested = StateChart::new("bad-nested");
        nested
            .add_state(State::new("root", StateKind::Compound { initial: "a".into() }), None)
            .unwrap();
        nested.add_state(State::new("a", StateKind::Compound { initial: "a1".into() }), Some("root")).unwrap();
        nested.add_state(State::new("a1", StateKind::Basic), Some("a")).unwrap();
        nested
            .add_state(
                State::new(
                    "h",
                    StateKind::History { kind: History::Shallow, memory: Some("d".into()) },
                ),
                Some("a"),
            )
            .unwrap();
        nested.add_state(State::new("d", StateKind::Basic), Some("root")).unwrap();
        assert!(nested.validate().is_err());
        assert!(chart.validate().is_ok());
    }

    #[test]
    fn add_state_rejects_history_under_orthogonal_parent() {
        let mut chart = StateChart::new("bad");
        chart.add_state(State::new("root", StateKind::Orthogonal), None).unwrap();
        let error = chart
            .add_state(
                State::new("h", StateKind::History { kind: History::Deep, memory: None }),
                Some("root"),
            )
            .unwrap_err();
        assert!(matches!(error, StatechartError::Structural(_)));
    }
}

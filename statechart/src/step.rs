//! Micro/macro step types and the purely structural parts of step
//! construction and stabilization (§4.5, §4.7). Nothing here calls into the
//! evaluator — that happens in `interpreter::apply_step`.

use std::collections::HashMap;

use statechart_core::{Event, Transition};

use crate::chart::StateChart;

/// One atomic unit of work within a macro step: either a transition firing
/// (with its computed exit/entry scope) or a stabilization move.
#[derive(Debug, Clone)]
pub struct MicroStep {
    pub event: Option<Event>,
    pub transition: Option<Transition>,
    pub exited_states: Vec<String>,
    pub entered_states: Vec<String>,
}

impl MicroStep {
    pub fn is_internal_transition(&self) -> bool {
        matches!(&self.transition, Some(t) if t.is_internal())
    }
}

/// The ordered record of everything a macro step did.
#[derive(Debug, Clone)]
pub struct MacroStep {
    pub time: f64,
    pub steps: Vec<MicroStep>,
}

/// Builds the micro step for an internal (no-target) transition: no exits,
/// no entries, only the action runs.
pub fn build_internal_step(transition: Transition, event: Option<Event>) -> MicroStep {
    MicroStep {
        event,
        transition: Some(transition),
        exited_states: Vec::new(),
        entered_states: Vec::new(),
    }
}

/// Builds the micro step for an external (targeted) transition via its
/// least-common-ancestor scope.
pub fn build_external_step(
    chart: &StateChart,
    configuration: &[String],
    transition: Transition,
    event: Option<Event>,
) -> MicroStep {
    let source = transition.source.clone();
    let target = transition
        .target
        .clone()
        .expect("external transition must carry a target");

    let lca = chart.least_common_ancestor(&source, &target);

    let mut boundary = source.clone();
    let mut current = chart.parent_for(&source).map(str::to_string);
    while let Some(ancestor) = current {
        if Some(ancestor.as_str()) == lca.as_deref() {
            break;
        }
        boundary = ancestor.clone();
        current = chart.parent_for(&ancestor).map(str::to_string);
    }

    let mut exited: Vec<String> = chart
        .descendants_for(&boundary)
        .into_iter()
        .filter(|descendant| configuration.iter().any(|s| s == descendant))
        .collect();
    exited.reverse();
    if configuration.iter().any(|s| s == &boundary) {
        exited.push(boundary.clone());
    }

    let mut outer_ancestors: Vec<String> = chart
        .ancestors_for(&target)
        .into_iter()
        .take_while(|ancestor| Some(ancestor.as_str()) != lca.as_deref())
        .collect();
    outer_ancestors.reverse();
    outer_ancestors.push(target.clone());

    MicroStep {
        event,
        transition: Some(transition),
        exited_states: exited,
        entered_states: outer_ancestors,
    }
}

/// Finds the next stabilization micro step, if any (§4.7). Returns `None`
/// once the configuration is a fixed point.
pub fn compute_stabilization_step(
    chart: &StateChart,
    configuration: &[String],
    history: &HashMap<String, Vec<String>>,
) -> Option<MicroStep> {
    let mut leaves = chart.leaf_for(configuration);
    leaves.sort_by(|a, b| {
        chart
            .depth_for(b)
            .cmp(&chart.depth_for(a))
            .then_with(|| a.cmp(b))
    });

    for leaf in leaves {
        let state = match chart.state_for(&leaf) {
            Some(state) => state,
            None => continue,
        };

        if state.is_final_state() && chart.parent_for(&leaf) == chart.root() {
            let root = chart.root().expect("final state implies a root").to_string();
            return Some(MicroStep {
                event: None,
                transition: None,
                exited_states: vec![leaf, root],
                entered_states: Vec::new(),
            });
        }

        if state.is_history_state() {
            let mut memory = history.get(&leaf).cloned().unwrap_or_default();
            if memory.is_empty() {
                if let Some(default_target) = state.memory() {
                    memory.push(default_target.to_string());
                }
            }
            memory.sort_by_key(|name| chart.depth_for(name));
            return Some(MicroStep {
                event: None,
                transition: None,
                exited_states: vec![leaf],
                entered_states: memory,
            });
        }

        if state.is_orthogonal_state() {
            let children = chart.children_for(&leaf);
            if !children.is_empty() {
                let mut sorted_children = children.to_vec();
                sorted_children.sort();
                return Some(MicroStep {
                    event: None,
                    transition: None,
                    exited_states: Vec::new(),
                    entered_states: sorted_children,
                });
            }
            continue;
        }

        if let Some(initial) = state.initial() {
            return Some(MicroStep {
                event: None,
                transition: None,
                exited_states: Vec::new(),
                entered_states: vec![initial.to_string()],
            });
        }
    }

    None
}

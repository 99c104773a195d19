//! Transition selection and ordering (§4.3–§4.4): picking which transitions
//! fire for a macro step and the order their micro steps apply in.

use std::collections::HashSet;

use statechart_core::{Event, Transition};

use crate::chart::StateChart;

/// Selects the transitions that fire this macro step.
///
/// `guard_holds` is evaluated only for transitions whose source is in the
/// configuration and whose event matches (or which are eventless); it is
/// passed the transition and the event exposed to its group (the candidate
/// event for an event-triggered group, `None` for an eventless one).
pub fn select_transitions<'a>(
    chart: &StateChart,
    configuration: &[String],
    event: Option<&Event>,
    eventless_first: bool,
    inner_first: bool,
    transitions: &'a [Transition],
    mut guard_holds: impl FnMut(&'a Transition, Option<&Event>) -> bool,
) -> Vec<&'a Transition> {
    let candidates: Vec<&'a Transition> = transitions
        .iter()
        .filter(|t| configuration.iter().any(|s| s == &t.source))
        .filter(|t| match &t.event {
            None => true,
            Some(name) => event.map(|e| &e.name == name).unwrap_or(false),
        })
        .collect();

    let (eventless, has_event): (Vec<&'a Transition>, Vec<&'a Transition>) =
        candidates.into_iter().partition(|t| t.is_eventless());

    let groups: [(Vec<&'a Transition>, Option<&Event>); 2] = if eventless_first {
        [(eventless, None), (has_event, event)]
    } else {
        [(has_event, event), (eventless, None)]
    };

    for (group, exposed_event) in groups {
        if group.is_empty() {
            continue;
        }
        let selected = select_within_group(chart, group, exposed_event, inner_first, &mut guard_holds);
        if !selected.is_empty() {
            return selected;
        }
    }

    Vec::new()
}

fn select_within_group<'a>(
    chart: &StateChart,
    candidates: Vec<&'a Transition>,
    exposed_event: Option<&Event>,
    inner_first: bool,
    guard_holds: &mut impl FnMut(&'a Transition, Option<&Event>) -> bool,
) -> Vec<&'a Transition> {
    let mut sources: Vec<String> = candidates.iter().map(|t| t.source.clone()).collect();
    sources.sort();
    sources.dedup();
    sources.sort_by(|a, b| {
        let depth_order = if inner_first {
            chart.depth_for(b).cmp(&chart.depth_for(a))
        } else {
            chart.depth_for(a).cmp(&chart.depth_for(b))
        };
        depth_order.then_with(|| a.cmp(b))
    });

    let mut ignored: HashSet<String> = HashSet::new();
    let mut result = Vec::new();

    for source in &sources {
        if ignored.contains(source) {
            continue;
        }

        let mut by_source: Vec<&'a Transition> =
            candidates.iter().filter(|t| &t.source == source).cloned().collect();
        by_source.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut index = 0;
        let mut fired = false;
        while index < by_source.len() {
            let priority = by_source[index].priority;
            let tier_end = by_source[index..]
                .iter()
                .position(|t| t.priority != priority)
                .map(|offset| index + offset)
                .unwrap_or(by_source.len());
            let eligible: Vec<&'a Transition> = by_source[index..tier_end]
                .iter()
                .filter(|t| guard_holds(t, exposed_event))
                .cloned()
                .collect();
            if !eligible.is_empty() {
                result.extend(eligible);
                fired = true;
                break;
            }
            index = tier_end;
        }

        if fired {
            ignored.insert(source.clone());
            if inner_first {
                ignored.extend(chart.ancestors_for(source));
            } else {
                ignored.extend(chart.descendants_for(source));
            }
        }
    }

    result
}

/// Orders selected transitions for application: deepest source first, then
/// source name ascending (§4.4).
pub fn sort_transitions<'a>(chart: &StateChart, mut transitions: Vec<&'a Transition>) -> Vec<&'a Transition> {
    transitions.sort_by(|a, b| {
        chart
            .depth_for(&b.source)
            .cmp(&chart.depth_for(&a.source))
            .then_with(|| a.source.cmp(&b.source))
    });
    transitions
}

#[cfg(test)]
mod tests {
    use statechart_core::{State, StateKind};

    use super::*;

    // root (compound, initial outer) -> outer (compound, initial inner) -> inner (basic)
    fn nested_chart() -> StateChart {
        let mut chart = StateChart::new("nested");
        chart
            .add_state(State::new("root", StateKind::Compound { initial: "outer".into() }), None)
            .unwrap();
        chart
            .add_state(
                State::new("outer", StateKind::Compound { initial: "inner".into() }),
                Some("root"),
            )
            .unwrap();
        chart.add_state(State::new("inner", StateKind::Basic), Some("outer")).unwrap();
        chart
    }

    #[test]
    fn inner_state_transition_preempts_outer_on_same_event() {
        let mut chart = nested_chart();
        chart
            .add_transition(Transition::new("outer").with_target("root").with_event("go"))
            .unwrap();
        chart
            .add_transition(Transition::new("inner").with_target("root").with_event("go"))
            .unwrap();

        let event = Event::new("go");
        let configuration = vec!["root".to_string(), "outer".to_string(), "inner".to_string()];
        let selected = select_transitions(
            &chart,
            &configuration,
            Some(&event),
            true,
            true,
            chart.transitions(),
            |_, _| true,
        );

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].source, "inner");
    }

    #[test]
    fn eventless_group_is_tried_before_event_triggered_when_configured() {
        let mut chart = nested_chart();
        chart.add_transition(Transition::new("inner").with_target("root")).unwrap();
        chart
            .add_transition(Transition::new("inner").with_target("outer").with_event("go"))
            .unwrap();

        let event = Event::new("go");
        let configuration = vec!["root".to_string(), "outer".to_string(), "inner".to_string()];
        let selected = select_transitions(
            &chart,
            &configuration,
            Some(&event),
            true,
            true,
            chart.transitions(),
            |_, _| true,
        );

        assert_eq!(selected.len(), 1);
        assert!(selected[0].is_eventless());
    }

    #[test]
    fn failing_guard_falls_through_to_the_next_priority_tier() {
        let mut chart = nested_chart();
        chart
            .add_transition(
                Transition::new("inner")
                    .with_target("outer")
                    .with_event("go")
                    .with_guard("never")
                    .with_priority(1),
            )
            .unwrap();
        chart
            .add_transition(Transition::new("inner").with_target("root").with_event("go").with_priority(0))
            .unwrap();

        let event = Event::new("go");
        let configuration = vec!["root".to_string(), "outer".to_string(), "inner".to_string()];
        let selected = select_transitions(
            &chart,
            &configuration,
            Some(&event),
            true,
            true,
            chart.transitions(),
            |t, _| t.guard.is_none(),
        );

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].target.as_deref(), Some("root"));
    }

    #[test]
    fn sort_transitions_orders_deepest_source_first() {
        let chart = nested_chart();
        let outer = Transition::new("outer").with_target("root");
        let inner = Transition::new("inner").with_target("root");
        let sorted = sort_transitions(&chart, vec![&outer, &inner]);
        assert_eq!(sorted[0].source, "inner");
        assert_eq!(sorted[1].source, "outer");
    }
}

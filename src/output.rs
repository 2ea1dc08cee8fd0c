//! Printers for rule tables.
//!
//! [`Human`] groups transitions under their state for reading; [`Formal`] writes one
//! `(state, read) -> (write, direction, next_state)` line per transition, in table order, which
//! the rule table parser reads back unchanged.

use crate::types::{Program, State, Transition};

/// Turns transitions, states and whole tables into text.
pub trait Formatter {
    /// Formats one transition.
    fn format_transition(&self, transition: &Transition) -> String;

    /// Formats the transitions of a single state.
    fn format_state(&self, _state: State, transitions: &[&Transition]) -> String {
        transitions
            .iter()
            .map(|t| self.format_transition(t))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats a whole table, state by state in order of first appearance.
    fn format_program(&self, program: &Program) -> String {
        group_by_state(program)
            .into_iter()
            .map(|(state, transitions)| self.format_state(state, &transitions))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Groups transitions by source state, keeping table order inside each group.
fn group_by_state(program: &Program) -> Vec<(State, Vec<&Transition>)> {
    let mut groups: Vec<(State, Vec<&Transition>)> = Vec::new();

    for transition in &program.transitions {
        match groups.iter_mut().find(|(state, _)| *state == transition.state) {
            Some((_, members)) => members.push(transition),
            None => groups.push((transition.state, vec![transition])),
        }
    }

    groups
}

/// A layout meant for people: a header per state and aligned columns.
///
/// ```text
/// 0:
///   a:   "b",   final, 0
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Human;

impl Formatter for Human {
    fn format_transition(&self, t: &Transition) -> String {
        format!(
            "  {:4} {:6} {:6} {}",
            format!("{}:", t.read),
            format!("\"{}\",", t.write),
            format!("{},", t.direction),
            t.next_state
        )
    }

    fn format_state(&self, state: State, transitions: &[&Transition]) -> String {
        std::iter::once(format!("{state}:"))
            .chain(transitions.iter().map(|t| self.format_transition(t)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The rule table syntax itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct Formal;

impl Formatter for Formal {
    fn format_transition(&self, t: &Transition) -> String {
        format!(
            "({}, {}) -> ({}, {}, {})",
            t.state, t.read, t.write, t.direction, t.next_state
        )
    }

    /// Keeps table order so that duplicate keys still resolve the same way once re-parsed.
    fn format_program(&self, program: &Program) -> String {
        program
            .name
            .iter()
            .map(|name| format!("name: {name}"))
            .chain(program.transitions.iter().map(|t| self.format_transition(t)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

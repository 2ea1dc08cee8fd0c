//! This module provides functions for analyzing rule tables to detect common mistakes before
//! execution: a missing initial state, transitions that can never be selected, transitions
//! leading to states without rules, unreachable states and input symbols no rule reads.
//!
//! None of these stop a table from running. Callers decide whether to report them as warnings
//! or to reject the table.

use crate::types::{Direction, Program, State, Symbol, TuringMachineError, INITIAL_STATE};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use thiserror::Error;

/// Represents the findings of the analysis of a rule table.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum AnalysisError {
    /// The table has no transitions at all.
    #[error("Rule table is empty")]
    EmptyProgram,
    /// No transition starts from the initial state.
    #[error("No transition for initial state 0")]
    MissingInitialState,
    /// Transitions whose key is already taken by an earlier transition.
    #[error("Transitions shadowed by earlier ones with the same key: {0:?}")]
    ShadowedTransitions(Vec<usize>),
    /// Non-halting transitions leading to states that have no transitions.
    #[error("Transitions reference states without rules: {}", join(.0))]
    UndefinedNextStates(Vec<String>),
    /// States that cannot be reached from the initial state.
    #[error("Unreachable states detected: {0:?}")]
    UnreachableStates(Vec<State>),
    /// Input symbols that no transition reads.
    #[error("Input contains symbols not handled by any transition: {}", join(.0))]
    InvalidTapeSymbols(Vec<Symbol>),
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<AnalysisError> for TuringMachineError {
    /// Converts an `AnalysisError` into a `TuringMachineError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        TuringMachineError::ValidationError(error.to_string())
    }
}

/// Runs every table check and returns all findings, in a stable order.
pub fn analyze(program: &Program) -> Vec<AnalysisError> {
    if program.is_empty() {
        return vec![AnalysisError::EmptyProgram];
    }

    [
        check_initial_state,
        check_shadowed_transitions,
        check_undefined_next_states,
        check_unreachable_states,
    ]
    .iter()
    .filter_map(|f| f(program).err())
    .collect()
}

/// Fails with the first finding of [`analyze`], if any.
pub fn check(program: &Program) -> Result<(), TuringMachineError> {
    match analyze(program).into_iter().next() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

fn check_initial_state(program: &Program) -> Result<(), AnalysisError> {
    if program.transitions.iter().any(|t| t.state == INITIAL_STATE) {
        Ok(())
    } else {
        Err(AnalysisError::MissingInitialState)
    }
}

/// Flags transitions that can never be selected because an earlier one has the same
/// `(state, read)` key.
fn check_shadowed_transitions(program: &Program) -> Result<(), AnalysisError> {
    let mut seen = HashSet::new();
    let shadowed: Vec<usize> = program
        .transitions
        .iter()
        .enumerate()
        .filter(|(_, t)| !seen.insert((t.state, t.read)))
        .map(|(i, _)| i)
        .collect();

    if shadowed.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::ShadowedTransitions(shadowed))
    }
}

/// Flags non-halting transitions whose next state has no transitions: the run is bound to
/// fail with no matching rule as soon as it gets there.
///
/// The next state of a halting transition is never executed and is not checked.
fn check_undefined_next_states(program: &Program) -> Result<(), AnalysisError> {
    let defined: HashSet<State> = program.transitions.iter().map(|t| t.state).collect();

    let undefined: Vec<String> = program
        .transitions
        .iter()
        .enumerate()
        .filter(|(_, t)| t.direction != Direction::Halt && !defined.contains(&t.next_state))
        .map(|(i, t)| format!("{}[{}] -> {}", t.state, i, t.next_state))
        .collect();

    if undefined.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::UndefinedNextStates(undefined))
    }
}

/// Walks the non-halting transitions from the initial state and flags every state with
/// transitions that the walk never visits.
fn check_unreachable_states(program: &Program) -> Result<(), AnalysisError> {
    let mut visited = HashSet::new();
    let mut queue = vec![INITIAL_STATE];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        queue.extend(
            program
                .transitions
                .iter()
                .filter(|t| t.state == state && t.direction != Direction::Halt)
                .map(|t| t.next_state)
                .filter(|next| !visited.contains(next)),
        );
    }

    let unreachable: Vec<State> = program
        .states()
        .into_iter()
        .filter(|state| !visited.contains(state))
        .collect();

    if unreachable.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::UnreachableStates(unreachable))
    }
}

/// Checks that every symbol of `input` is read by at least one transition.
pub fn check_input_symbols(program: &Program, input: &[Symbol]) -> Result<(), AnalysisError> {
    let handled: HashSet<Symbol> = program.transitions.iter().map(|t| t.read).collect();

    let unhandled: BTreeSet<Symbol> = input
        .iter()
        .copied()
        .filter(|symbol| !handled.contains(symbol))
        .collect();

    if unhandled.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::InvalidTapeSymbols(unhandled.into_iter().collect()))
    }
}

//! Compiles a machine description into a numbered rule table.
//!
//! A description names its states and lists, per state, what to do for each symbol:
//!
//! ```json
//! {
//!   "name": "rotate",
//!   "alphabet": "ab",
//!   "states": {
//!     "start":  { "a": ["x", "right", "carry."], "b": ["x", "right", "carry."] },
//!     "carry.": { "NUL": ["DOT", "final", "SAME"], "ELSE": ["SAME", "right", "SAME"] }
//!   }
//! }
//! ```
//!
//! * `ELSE` stands for every symbol of the alphabet (plus `NUL` and `EOT`) the state does not
//!   list explicitly.
//! * A `SAME` write keeps the symbol that was read; a `SAME` next state stays in the state.
//! * A state whose name ends with `.` is a template. Targeting `carry.` after reading `a`
//!   creates the state `carrya`, in which `DOT` means `a`.
//!
//! The first declared state becomes state 0; other states are numbered as they are first
//! declared or instantiated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::types::{Direction, Program, State, Symbol, Transition, TuringMachineError};

const ELSE: &str = "ELSE";
const SAME: &str = "SAME";
const DOT: &str = "DOT";

/// A machine description as read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub name: Option<String>,
    /// The input symbols; `NUL` and `EOT` are always added.
    #[serde(default)]
    pub alphabet: String,
    /// State name to `{ symbol: [write, direction, next_state] }`, in declaration order.
    pub states: Map<String, Value>,
}

impl Description {
    /// Reads a description from its JSON text.
    pub fn from_json(input: &str) -> Result<Self, TuringMachineError> {
        serde_json::from_str(input).map_err(|e| description_error(format!("invalid JSON: {e}")))
    }
}

/// Parses and compiles a JSON description in one go.
pub fn compile_str(input: &str) -> Result<Program, TuringMachineError> {
    compile(&Description::from_json(input)?)
}

/// Flattens `description` into an ordered rule table with numbered states.
pub fn compile(description: &Description) -> Result<Program, TuringMachineError> {
    let mut compiler = Compiler::new(description)?;

    for name in description.states.keys().filter(|name| !is_template(name)) {
        compiler.reserve(name);
        compiler.expand(name, name, None)?;
    }

    let program = compiler.finish()?;
    let program = match &description.name {
        Some(name) => program.with_name(name.clone()),
        None => program,
    };

    debug!(
        states = program.states().len(),
        transitions = program.len(),
        "description compiled"
    );

    Ok(program)
}

/// A transition whose target is still a state name.
#[derive(Debug)]
struct NamedTransition {
    read: Symbol,
    write: Symbol,
    direction: Direction,
    next: String,
}

struct Compiler<'d> {
    states: &'d Map<String, Value>,
    symbols: BTreeSet<Symbol>,
    order: Vec<String>,
    index: HashMap<String, State>,
    rules: HashMap<String, Vec<NamedTransition>>,
}

impl<'d> Compiler<'d> {
    fn new(description: &'d Description) -> Result<Self, TuringMachineError> {
        if !description.states.keys().any(|name| !is_template(name)) {
            return Err(description_error("no states defined"));
        }

        let mut symbols = BTreeSet::from([Symbol::BLANK, Symbol::BOUNDARY]);
        for c in description.alphabet.chars() {
            let symbol = Symbol::from_char(c).ok_or_else(|| {
                description_error(format!("alphabet symbol {c:?} is not a single ASCII byte"))
            })?;
            symbols.insert(symbol);
        }

        Ok(Self {
            states: &description.states,
            symbols,
            order: Vec::new(),
            index: HashMap::new(),
            rules: HashMap::new(),
        })
    }

    /// Gives `name` the next state number unless it already has one.
    fn reserve(&mut self, name: &str) {
        if !self.index.contains_key(name) {
            let number = self.order.len() as State;
            self.index.insert(name.to_string(), number);
            self.order.push(name.to_string());
        }
    }

    /// Builds the transitions of state `name` from the description entry `source`.
    ///
    /// `source` differs from `name` for template instances, which also carry the symbol they
    /// were instantiated with.
    fn expand(
        &mut self,
        name: &str,
        source: &str,
        instance: Option<Symbol>,
    ) -> Result<(), TuringMachineError> {
        let states = self.states;
        let entries = states
            .get(source)
            .ok_or_else(|| TuringMachineError::UndefinedState(source.to_string()))?
            .as_object()
            .ok_or_else(|| description_error(format!("state {source:?} must be an object")))?;

        let mut explicit = BTreeSet::new();
        let mut fallback = None;
        let mut rules = Vec::new();

        for (key, value) in entries {
            let (write, direction, next) = parse_action(source, key, value)?;
            let next = if next == SAME { name.to_string() } else { next };

            if key == ELSE {
                fallback = Some((write, direction, next));
                continue;
            }

            let read = match instance {
                Some(symbol) if key == DOT => symbol,
                _ => parse_symbol(key)?,
            };
            explicit.insert(read);

            rules.push(NamedTransition {
                read,
                write: resolve_write(&write, read, instance)?,
                direction,
                next,
            });
        }

        if let Some((write, direction, next)) = fallback {
            for &read in self.symbols.difference(&explicit) {
                rules.push(NamedTransition {
                    read,
                    write: resolve_write(&write, read, instance)?,
                    direction,
                    next: next.clone(),
                });
            }
        }

        for rule in &mut rules {
            if is_template(&rule.next) {
                let symbol = instance.unwrap_or(rule.read);
                rule.next = self.instantiate(&rule.next, symbol)?;
            }
        }

        self.rules.insert(name.to_string(), rules);

        Ok(())
    }

    /// Returns the name of `template` instantiated for `symbol`, building it on first use.
    fn instantiate(&mut self, template: &str, symbol: Symbol) -> Result<String, TuringMachineError> {
        let stem = template.strip_suffix('.').unwrap_or(template);
        let name = format!("{stem}{}", symbol_name(symbol));

        // Already built or being built further up the recursion.
        if self.index.contains_key(&name) {
            return Ok(name);
        }

        if !self.states.contains_key(template) {
            return Err(TuringMachineError::UndefinedState(template.to_string()));
        }

        self.reserve(&name);
        self.expand(&name, template, Some(symbol))?;

        Ok(name)
    }

    fn finish(self) -> Result<Program, TuringMachineError> {
        let mut transitions = Vec::new();

        for name in &self.order {
            let state = self.index[name];
            for rule in self.rules.get(name).into_iter().flatten() {
                let next_state = *self
                    .index
                    .get(&rule.next)
                    .ok_or_else(|| TuringMachineError::UndefinedState(rule.next.clone()))?;

                transitions.push(Transition {
                    state,
                    read: rule.read,
                    write: rule.write,
                    direction: rule.direction,
                    next_state,
                });
            }
        }

        Ok(Program::new(transitions))
    }
}

fn is_template(name: &str) -> bool {
    name.ends_with('.')
}

/// Reads `[write, direction, next_state]`.
fn parse_action(
    state: &str,
    key: &str,
    value: &Value,
) -> Result<(String, Direction, String), TuringMachineError> {
    let (write, direction, next): (String, Value, String) = serde_json::from_value(value.clone())
        .map_err(|e| {
            description_error(format!(
                "state {state:?}, symbol {key:?}: expected [write, direction, next_state]: {e}"
            ))
        })?;

    Ok((write, parse_direction(&direction)?, next))
}

/// Accepts `"left"`, `"right"`, `"final"` or the numeric steps `-1`, `1`, `0`.
fn parse_direction(value: &Value) -> Result<Direction, TuringMachineError> {
    match value {
        Value::String(s) => match s.as_str() {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "final" => Ok(Direction::Halt),
            other => Err(description_error(format!("unknown direction {other:?}"))),
        },
        Value::Number(n) => match n.as_i64() {
            Some(-1) => Ok(Direction::Left),
            Some(1) => Ok(Direction::Right),
            Some(0) => Ok(Direction::Halt),
            _ => Err(description_error(format!("direction {n} outside of [-1 .. 1]"))),
        },
        other => Err(description_error(format!("unknown type for direction: {other}"))),
    }
}

fn resolve_write(
    write: &str,
    read: Symbol,
    instance: Option<Symbol>,
) -> Result<Symbol, TuringMachineError> {
    match (write, instance) {
        (SAME, _) => Ok(read),
        (DOT, Some(symbol)) => Ok(symbol),
        _ => parse_symbol(write),
    }
}

fn parse_symbol(text: &str) -> Result<Symbol, TuringMachineError> {
    if let Some(symbol) = Symbol::from_name(text) {
        return Ok(symbol);
    }

    let mut chars = text.chars();
    match (chars.next().and_then(Symbol::from_char), chars.next()) {
        (Some(symbol), None) => Ok(symbol),
        _ if text == DOT => Err(description_error("DOT used outside of a template")),
        _ => Err(description_error(format!(
            "symbol {text:?} is not a single ASCII character"
        ))),
    }
}

/// The suffix a symbol adds to a template name.
fn symbol_name(symbol: Symbol) -> String {
    match symbol.name() {
        Some(name) => name.to_string(),
        None => (symbol.0 as char).to_string(),
    }
}

fn description_error(msg: impl Into<String>) -> TuringMachineError {
    TuringMachineError::DescriptionError(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::execute;
    use crate::types::MachineConfig;

    #[test]
    fn test_compile_simple_description() {
        let program = compile_str(
            r#"{
                "name": "flip",
                "alphabet": "ab",
                "states": {
                    "start": {
                        "a": ["b", "right", "SAME"],
                        "NUL": ["NUL", "final", "SAME"]
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(program.name.as_deref(), Some("flip"));
        assert_eq!(
            program.transitions,
            vec![
                Transition::new(0, b'a', b'b', Direction::Right, 0),
                Transition::new(0, Symbol::BLANK, Symbol::BLANK, Direction::Halt, 0),
            ]
        );
    }

    #[test]
    fn test_else_covers_remaining_symbols() {
        let program = compile_str(
            r#"{
                "alphabet": "ab",
                "states": {
                    "start": {
                        "a": ["SAME", "right", "SAME"],
                        "ELSE": ["SAME", "final", "SAME"]
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            program.transitions,
            vec![
                Transition::new(0, b'a', b'a', Direction::Right, 0),
                Transition::new(0, Symbol::BLANK, Symbol::BLANK, Direction::Halt, 0),
                Transition::new(0, Symbol::BOUNDARY, Symbol::BOUNDARY, Direction::Halt, 0),
                Transition::new(0, b'b', b'b', Direction::Halt, 0),
            ]
        );
    }

    #[test]
    fn test_numeric_directions_and_state_numbering() {
        let program = compile_str(
            r#"{
                "alphabet": "a",
                "states": {
                    "first": { "a": ["a", 1, "second"] },
                    "second": { "NUL": ["a", -1, "third"] },
                    "third": { "a": ["a", 0, "third"] }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            program.transitions,
            vec![
                Transition::new(0, b'a', b'a', Direction::Right, 1),
                Transition::new(1, Symbol::BLANK, b'a', Direction::Left, 2),
                Transition::new(2, b'a', b'a', Direction::Halt, 2),
            ]
        );
    }

    #[test]
    fn test_templates_are_instantiated_per_symbol() {
        let program = compile_str(
            r#"{
                "alphabet": "ab",
                "states": {
                    "start": {
                        "a": ["x", "right", "carry."],
                        "b": ["x", "right", "carry."]
                    },
                    "carry.": {
                        "NUL": ["DOT", "final", "SAME"],
                        "ELSE": ["SAME", "right", "SAME"]
                    }
                }
            }"#,
        )
        .unwrap();

        // start = 0, carrya = 1, carryb = 2
        assert_eq!(program.states(), vec![0, 1, 2]);
        assert_eq!(
            program.transitions[0],
            Transition::new(0, b'a', b'x', Direction::Right, 1)
        );
        assert_eq!(
            program.transitions[1],
            Transition::new(0, b'b', b'x', Direction::Right, 2)
        );
        assert!(program
            .transitions
            .contains(&Transition::new(1, Symbol::BLANK, b'a', Direction::Halt, 1)));
        assert!(program
            .transitions
            .contains(&Transition::new(2, Symbol::BLANK, b'b', Direction::Halt, 2)));
        assert!(program
            .transitions
            .contains(&Transition::new(2, b'a', b'a', Direction::Right, 2)));

        let output = execute(&program, "ab", MachineConfig::default()).unwrap();
        assert_eq!(output.to_string(), "xba");
    }

    #[test]
    fn test_dot_symbol_key_in_template() {
        let program = compile_str(
            r#"{
                "alphabet": "ab",
                "states": {
                    "start": { "a": ["SAME", "right", "find."] },
                    "find.": {
                        "DOT": ["y", "final", "SAME"],
                        "ELSE": ["SAME", "right", "SAME"]
                    }
                }
            }"#,
        )
        .unwrap();

        let output = execute(&program, "aba", MachineConfig::default()).unwrap();
        assert_eq!(output.to_string(), "aby");
    }

    #[test]
    fn test_template_recursion_terminates() {
        let program = compile_str(
            r#"{
                "alphabet": "a",
                "states": {
                    "start": { "a": ["a", "right", "loop."] },
                    "loop.": { "ELSE": ["SAME", "right", "loop."] }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(program.states(), vec![0, 1]);
        assert!(program.transitions.iter().skip(1).all(|t| t.next_state == 1));
    }

    #[test]
    fn test_undefined_state() {
        let result = compile_str(
            r#"{ "alphabet": "a", "states": { "start": { "a": ["a", "right", "nowhere"] } } }"#,
        );
        assert_eq!(
            result,
            Err(TuringMachineError::UndefinedState("nowhere".to_string()))
        );

        let result = compile_str(
            r#"{ "alphabet": "a", "states": { "start": { "a": ["a", "right", "gone."] } } }"#,
        );
        assert_eq!(
            result,
            Err(TuringMachineError::UndefinedState("gone.".to_string()))
        );
    }

    #[test]
    fn test_invalid_descriptions() {
        let cases = [
            r#"{ "states": { "start": { "a": ["a", "up", "start"] } } }"#,
            r#"{ "states": { "start": { "a": ["a", 2, "start"] } } }"#,
            r#"{ "states": { "start": { "a": ["a", "right"] } } }"#,
            r#"{ "states": { "start": { "ab": ["a", "right", "start"] } } }"#,
            r#"{ "states": { "start": { "a": ["DOT", "right", "start"] } } }"#,
            r#"{ "states": { "start": [] } }"#,
            r#"{ "states": { "only.": {} } }"#,
            r#"{ "alphabet": "é", "states": { "start": {} } }"#,
            r#"not json"#,
        ];

        for case in cases {
            assert!(
                matches!(compile_str(case), Err(TuringMachineError::DescriptionError(_))),
                "expected a description error for {case}"
            );
        }
    }
}

//! This module provides the parser for rule tables, utilizing the `pest` crate.
//! It defines the grammar for `.mt` files and functions to parse the input into a `Program`.

use crate::types::{
    Direction, Program, State, Symbol, Transition, TuringMachineError, MAX_PROGRAM_SIZE,
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;

/// Derives a `PestParser` for the rule table grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct RuleTableParser;

/// Parses the given input string into a `Program`.
///
/// Transitions keep the order in which they appear, which is also their matching order.
///
/// # Returns
///
/// * `Ok(Program)` if the input is a well-formed rule table.
/// * `Err(TuringMachineError::ParseError)` if there are any syntax errors.
/// * `Err(TuringMachineError::ValidationError)` if the input is larger than `MAX_PROGRAM_SIZE`.
pub fn parse(input: &str) -> Result<Program, TuringMachineError> {
    if input.len() > MAX_PROGRAM_SIZE {
        return Err(TuringMachineError::ValidationError(format!(
            "Rule table is {} bytes, the limit is {MAX_PROGRAM_SIZE}",
            input.len()
        )));
    }

    let root = RuleTableParser::parse(Rule::program, input)
        .map_err(|e| TuringMachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| TuringMachineError::ValidationError("Empty parse tree".to_string()))?;

    parse_program(root)
}

/// Collects the optional name and the transitions of a `Pair<Rule::program>`.
fn parse_program(pair: Pair<Rule>) -> Result<Program, TuringMachineError> {
    let mut program = Program::default();

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::name => program.name = Some(parse_name(p)?),
            Rule::transition => program.transitions.push(parse_transition(p)?),
            _ => {} // EOI
        }
    }

    Ok(program)
}

fn parse_name(pair: Pair<Rule>) -> Result<String, TuringMachineError> {
    let span = pair.as_span();
    let text = next(&mut pair.into_inner(), span)?;

    Ok(text.as_str().trim().to_string())
}

/// Parses `(state, read) -> (write, direction, next_state)`.
fn parse_transition(pair: Pair<Rule>) -> Result<Transition, TuringMachineError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();

    let state = parse_state(next(&mut pairs, span)?)?;
    let read = parse_symbol(next(&mut pairs, span)?)?;
    let write = parse_symbol(next(&mut pairs, span)?)?;
    let direction = parse_direction(next(&mut pairs, span)?)?;
    let next_state = parse_state(next(&mut pairs, span)?)?;

    Ok(Transition {
        state,
        read,
        write,
        direction,
        next_state,
    })
}

fn parse_state(pair: Pair<Rule>) -> Result<State, TuringMachineError> {
    pair.as_str()
        .parse::<State>()
        .map_err(|_| parse_error(&format!("State out of range: {}", pair.as_str()), pair.as_span()))
}

/// Parses a symbol: `NUL`, `EOT`, `0xHH`, `'c'` or a bare character.
fn parse_symbol(pair: Pair<Rule>) -> Result<Symbol, TuringMachineError> {
    let text = pair.as_str();

    if let Some(symbol) = Symbol::from_name(text) {
        return Ok(symbol);
    }

    if let Some(hex) = text.strip_prefix("0x").filter(|hex| hex.len() == 2) {
        return u8::from_str_radix(hex, 16)
            .map(Symbol)
            .map_err(|_| parse_error(&format!("Invalid hex symbol: {text}"), pair.as_span()));
    }

    let c = text
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .unwrap_or(text)
        .chars()
        .next();

    c.and_then(Symbol::from_char).ok_or_else(|| {
        parse_error(
            &format!("Symbol must be a single ASCII character: {text}"),
            pair.as_span(),
        )
    })
}

/// Parses a single direction from a `Pair<Rule::direction>`.
///
/// Supports `left`/`L`, `right`/`R` and `final`/`halt`/`H`.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, TuringMachineError> {
    match pair.as_str() {
        "left" | "L" => Ok(Direction::Left),
        "right" | "R" => Ok(Direction::Right),
        "final" | "halt" | "H" => Ok(Direction::Halt),
        other => Err(parse_error(
            &format!("Unsupported direction: {other}"),
            pair.as_span(),
        )),
    }
}

/// Takes the next child pair, which the grammar guarantees to be present.
fn next<'i>(pairs: &mut Pairs<'i, Rule>, span: Span<'i>) -> Result<Pair<'i, Rule>, TuringMachineError> {
    pairs
        .next()
        .ok_or_else(|| parse_error("Incomplete transition", span))
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

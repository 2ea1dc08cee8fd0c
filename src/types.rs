//! This module defines the core data structures and types used throughout the machine engine,
//! including symbols, transitions, rule tables, execution results, configuration and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// The default number of cells on the tape, boundary cells included.
pub const DEFAULT_TAPE_LENGTH: usize = 1024;
/// The smallest usable tape: two boundary cells and one working cell.
pub const MIN_TAPE_LENGTH: usize = 3;
/// The maximum allowed size for a rule table source in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// The state every run starts in.
pub const INITIAL_STATE: State = 0;
/// The cell the head starts on, right after the left boundary.
pub const INITIAL_HEAD: usize = 1;

/// A control state of the simulated machine.
pub type State = u32;

/// A single tape cell value.
///
/// Two values are reserved: [`Symbol::BLANK`] is the content of untouched cells and
/// [`Symbol::BOUNDARY`] marks both ends of the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub u8);

impl Symbol {
    /// The blank symbol, `NUL`.
    pub const BLANK: Symbol = Symbol(0x00);
    /// The boundary sentinel, `EOT`.
    pub const BOUNDARY: Symbol = Symbol(0x04);

    /// Returns `true` for the blank and boundary symbols.
    pub fn is_reserved(self) -> bool {
        self == Self::BLANK || self == Self::BOUNDARY
    }

    /// Returns the symbolic name of reserved symbols (`NUL` or `EOT`).
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::BLANK => Some("NUL"),
            Self::BOUNDARY => Some("EOT"),
            _ => None,
        }
    }

    /// Looks a symbol up by its reserved name.
    pub fn from_name(name: &str) -> Option<Symbol> {
        match name {
            "NUL" => Some(Self::BLANK),
            "EOT" => Some(Self::BOUNDARY),
            _ => None,
        }
    }

    /// Converts a character into a symbol if it fits in a single ASCII byte.
    pub fn from_char(c: char) -> Option<Symbol> {
        c.is_ascii().then_some(Symbol(c as u8))
    }
}

impl From<u8> for Symbol {
    fn from(byte: u8) -> Self {
        Symbol(byte)
    }
}

impl From<Symbol> for u8 {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Formats a symbol the way the rule table syntax spells it: reserved names, bare printable
/// characters, quoted separators and whitespace, hexadecimal for everything else.
impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name() {
            return f.write_str(name);
        }

        match self.0 {
            b',' | b'(' | b')' | b'\'' | b'#' | b' ' => write!(f, "'{}'", self.0 as char),
            byte if byte.is_ascii_graphic() => write!(f, "{}", byte as char),
            byte => write!(f, "{byte:#04x}"),
        }
    }
}

impl fmt::LowerHex for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// The head movement carried by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
    /// Stop the machine; the head does not move.
    Halt,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Halt => "final",
        })
    }
}

/// A single transition rule: `(state, read) -> (write, direction, next_state)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// The state this rule applies in.
    pub state: State,
    /// The symbol that must be under the head.
    pub read: Symbol,
    /// The symbol written under the head.
    pub write: Symbol,
    /// Where the head goes afterwards.
    pub direction: Direction,
    /// The state the machine moves to.
    pub next_state: State,
}

impl Transition {
    pub fn new(
        state: State,
        read: impl Into<Symbol>,
        write: impl Into<Symbol>,
        direction: Direction,
        next_state: State,
    ) -> Self {
        Self {
            state,
            read: read.into(),
            write: write.into(),
            direction,
            next_state,
        }
    }
}

/// An ordered, immutable rule table.
///
/// Order is significant: when several transitions share a `(state, read)` key the first one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Optional human readable name of the table.
    #[serde(default)]
    pub name: Option<String>,
    /// The transitions, in matching order.
    pub transitions: Vec<Transition>,
}

impl Program {
    pub fn new(transitions: Vec<Transition>) -> Self {
        Self {
            name: None,
            transitions,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Returns the distinct source states of the table, sorted.
    pub fn states(&self) -> Vec<State> {
        let mut states: Vec<State> = self.transitions.iter().map(|t| t.state).collect();
        states.sort_unstable();
        states.dedup();
        states
    }
}

/// Runtime parameters of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Number of tape cells, both boundary cells included.
    pub tape_length: usize,
    /// Fail after this many steps instead of looping forever. Unbounded when `None`.
    pub max_steps: Option<usize>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tape_length: DEFAULT_TAPE_LENGTH,
            max_steps: None,
        }
    }
}

impl MachineConfig {
    /// Checks that the configuration describes a usable tape.
    pub fn validate(&self) -> Result<(), TuringMachineError> {
        if self.tape_length < MIN_TAPE_LENGTH {
            return Err(TuringMachineError::InvalidConfig(format!(
                "tape length must be at least {MIN_TAPE_LENGTH}, got {}",
                self.tape_length
            )));
        }

        if self.max_steps == Some(0) {
            return Err(TuringMachineError::InvalidConfig(
                "step limit must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// The lifecycle of the engine itself (not of the simulated machine).
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// The machine can take another step.
    Running,
    /// A halting transition has been applied.
    Halted,
    /// A fatal condition stopped the run; the engine cannot resume.
    Failed(TuringMachineError),
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine performed a step and keeps running.
    Continue,
    /// The machine stopped, either normally or with an error.
    Halt(Halt),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    /// A halting transition was applied.
    Ok,

    Err(TuringMachineError),
}

/// The result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// The live tape region starting at index 1.
    pub symbols: Vec<Symbol>,
    /// Number of transitions applied, the halting one included.
    pub steps: usize,
}

impl Output {
    /// Returns the raw bytes of the output region.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.symbols.iter().map(|s| s.0).collect()
    }
}

/// Bytes that are not valid UTF-8 are shown as U+FFFD; [`Output::as_bytes`] keeps them.
impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.as_bytes()))
    }
}

/// Represents the errors that can occur while loading or running a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// No input string was provided to the run.
    #[error("No input given")]
    MissingInput,
    /// No transition matches the current state and the symbol under the head.
    #[error("No matching rule for state {state} and symbol {symbol} ({symbol:#04x})")]
    NoMatchingRule { state: State, symbol: Symbol },
    /// The head moved past the left end of the tape.
    #[error("Head got past the left end of the tape (state {state})")]
    HeadUnderflow { state: State },
    /// The head moved past the right end of the tape.
    #[error("Head got past the right end of the tape (state {state}), increase the tape length?")]
    HeadOverflow { state: State },
    /// The input does not fit between the two boundary cells.
    #[error("Input of {len} symbols does not fit on the tape (at most {max})")]
    InputTooLong { len: usize, max: usize },
    /// The input contains the blank or the boundary symbol.
    #[error("Input contains reserved symbol {symbol} at position {position}")]
    ReservedSymbol { symbol: Symbol, position: usize },
    /// The machine configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The configured step limit was reached before halting.
    #[error("Step limit of {0} exceeded")]
    StepLimitExceeded(usize),
    /// Indicates an error during the parsing of a rule table.
    #[error("Rule table parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a malformed machine description.
    #[error("Description error: {0}")]
    DescriptionError(String),
    /// A description references a state it does not define.
    #[error("Undefined state: {0}")]
    UndefinedState(String),
    /// Indicates an error during the validation of a rule table.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}

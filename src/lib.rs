//! This crate provides the core logic for a single-tape Turing machine.
//! It includes the bounded tape and the execution engine, a parser for formal rule tables,
//! a compiler for named-state machine descriptions, table printers, static analysis, and a
//! small collection of built-in programs.

pub mod analyzer;
pub mod compiler;
pub mod loader;
pub mod machine;
pub mod matcher;
pub mod output;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the analysis entry points and the `AnalysisError` enum.
pub use analyzer::{analyze, check, check_input_symbols, AnalysisError};
/// Re-exports the description compiler.
pub use compiler::{compile, compile_str, Description};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the engine.
pub use machine::{execute, Trace, TuringMachine};
/// Re-exports the table printers.
pub use output::{Formal, Formatter, Human};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the tape.
pub use tape::{Boundary, Tape};
/// Re-exports the data model, configuration and error types.
pub use types::{
    Direction, Halt, MachineConfig, Output, Program, State, Status, Step, Symbol, Transition,
    TuringMachineError, DEFAULT_TAPE_LENGTH, MAX_PROGRAM_SIZE,
};

//! Built-in rule tables, embedded in the library and loaded once on first use.

use crate::loader::ProgramLoader;
use crate::types::{Program, TuringMachineError};
use tracing::error;

// Embedded programs, as formal tables or JSON descriptions
const PROGRAM_TEXTS: [&str; 3] = [
    include_str!("../programs/unary-addition.mt"),
    include_str!("../programs/bit-flip.mt"),
    include_str!("../programs/echo-first.json"),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: Vec<Program> = load_embedded();
}

fn load_embedded() -> Vec<Program> {
    PROGRAM_TEXTS
        .iter()
        .enumerate()
        .filter_map(
            |(index, text)| match ProgramLoader::load_program_from_string(text) {
                Ok(program) => Some(program),
                Err(e) => {
                    error!(index, error = %e, "failed to load built-in program");
                    None
                }
            },
        )
        .collect()
}

/// Summary of a built-in program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub state_count: usize,
    pub transition_count: usize,
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Program, TuringMachineError> {
        PROGRAMS.get(index).cloned().ok_or_else(|| {
            TuringMachineError::ValidationError(format!("Program index {} out of range", index))
        })
    }

    /// Get a program by its name, ignoring case
    pub fn get_program_by_name(name: &str) -> Result<Program, TuringMachineError> {
        PROGRAMS
            .iter()
            .find(|program| {
                program
                    .name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Program '{}' not found", name))
            })
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, TuringMachineError> {
        let program = Self::get_program_by_index(index)?;

        Ok(ProgramInfo {
            index,
            name: program.name.clone().unwrap_or_default(),
            state_count: program.states().len(),
            transition_count: program.len(),
        })
    }

    /// Search programs whose name contains `query`, ignoring case
    pub fn search_programs(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();

        PROGRAMS
            .iter()
            .enumerate()
            .filter(|(_, program)| {
                program
                    .name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&query))
            })
            .map(|(index, _)| index)
            .collect()
    }
}

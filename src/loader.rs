//! This module provides the `ProgramLoader` struct, responsible for loading rule tables from
//! files and strings, either as formal rule tables (`.mt`) or as JSON machine descriptions
//! (`.json`) compiled on the fly.

use crate::compiler::compile_str;
use crate::parser::parse;
use crate::types::{Program, TuringMachineError, MAX_PROGRAM_SIZE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension of formal rule tables.
pub const TABLE_EXTENSION: &str = "mt";
/// File extension of machine descriptions.
pub const DESCRIPTION_EXTENSION: &str = "json";

/// `ProgramLoader` is a utility struct for loading rule tables.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single rule table from the specified file path.
    ///
    /// Files ending in `.json` are compiled as machine descriptions, anything else is parsed as
    /// a formal rule table. A table without a `name` is named after the file.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and turned into a `Program`.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read or is too large.
    /// * `Err(TuringMachineError::ParseError)` or `DescriptionError` if the content is invalid.
    pub fn load_program(path: &Path) -> Result<Program, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        if content.len() > MAX_PROGRAM_SIZE {
            return Err(TuringMachineError::FileError(format!(
                "File {} is larger than {MAX_PROGRAM_SIZE} bytes",
                path.display()
            )));
        }

        let mut program = if is_description(path) {
            compile_str(&content)?
        } else {
            parse(&content)?
        };

        if program.name.is_none() {
            program.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }

        debug!(
            path = %path.display(),
            transitions = program.len(),
            "rule table loaded"
        );

        Ok(program)
    }

    /// Loads a single rule table from the provided string content.
    ///
    /// Content starting with `{` is compiled as a JSON description, anything else is parsed as
    /// a formal rule table.
    pub fn load_program_from_string(content: &str) -> Result<Program, TuringMachineError> {
        if content.trim_start().starts_with('{') {
            compile_str(content)
        } else {
            parse(content)
        }
    }

    /// Loads every rule table (`.mt`) and description (`.json`) found in `directory`.
    ///
    /// Directories and other files are skipped. Each element of the result is either the
    /// loaded program along with its path, or the error that prevented loading it.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), TuringMachineError>> {
        if !directory.exists() {
            return vec![Err(TuringMachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        return Some(Err(TuringMachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let known = path.extension().is_some_and(|ext| {
                    ext == TABLE_EXTENSION || ext == DESCRIPTION_EXTENSION
                });
                if path.is_dir() || !known {
                    return None;
                }

                Some(Self::load_program(&path).map(|program| (path, program)))
            })
            .collect();

        // Directory order is platform dependent.
        results.sort_by_key(|result| result.as_ref().ok().map(|(path, _)| path.clone()));
        results
    }
}

fn is_description(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == DESCRIPTION_EXTENSION)
}

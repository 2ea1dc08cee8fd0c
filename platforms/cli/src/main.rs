mod trace;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use machination::{
    analyze, check_input_symbols, Formal, Formatter, Human, MachineConfig, Program,
    ProgramLoader, ProgramManager, Symbol, TuringMachine, TuringMachineError,
    DEFAULT_TAPE_LENGTH,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Runs a single-tape Turing machine on an input and prints the resulting tape.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  machination --program 'unary addition' 111+11
  machination --rules programs/bit-flip.mt -v 0110
  echo abb | machination --rules programs/echo-first.json")]
struct Cli {
    /// The input written on the tape, one symbol per byte.
    /// Read from stdin when omitted and stdin is not a terminal.
    input: Option<String>,

    /// Rule table to execute: a formal table (.mt) or a machine description (.json)
    #[clap(short, long, conflicts_with = "program")]
    rules: Option<PathBuf>,

    /// Built-in program to execute, by name
    #[clap(short, long)]
    program: Option<String>,

    /// Print every step
    #[clap(short, long)]
    verbose: bool,

    /// Number of tape cells, both boundary cells included
    #[clap(long, default_value_t = DEFAULT_TAPE_LENGTH)]
    tape_length: usize,

    /// Fail after this many steps instead of running forever
    #[clap(long)]
    max_steps: Option<usize>,

    /// Refuse rule tables and inputs the analyzer reports problems for
    #[clap(long)]
    strict: bool,

    /// Print the rule table in the given layout instead of running it
    #[clap(long, value_enum)]
    dump: Option<DumpFormat>,

    /// List the built-in programs
    #[clap(long)]
    list: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DumpFormat {
    Human,
    Formal,
}

impl DumpFormat {
    fn formatter(self) -> Box<dyn Formatter> {
        match self {
            DumpFormat::Human => Box::new(Human),
            DumpFormat::Formal => Box::new(Formal),
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr; stdout only carries the machine output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(
        &cli,
        io::stdin().lock(),
        atty::is(atty::Stream::Stdin),
        &mut io::stdout().lock(),
    );
    if let Err(e) = &result {
        eprintln!("Error: {e:#}");
    }

    ExitCode::from(exit_status(&result))
}

/// Maps the outcome of a run to the process exit status: 0 once the machine halted or the
/// requested listing was printed, 1 on any error.
fn exit_status(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn run(cli: &Cli, stdin: impl BufRead, stdin_is_terminal: bool, out: &mut impl Write) -> Result<()> {
    if cli.list {
        return list_programs(cli.rules.as_deref(), out);
    }

    let program = load_program(cli)?;
    report_findings(&program, cli.strict)?;

    if let Some(format) = cli.dump {
        writeln!(out, "{}", format.formatter().format_program(&program))?;
        return Ok(());
    }

    let input: Vec<Symbol> = read_input(cli.input.as_deref(), stdin, stdin_is_terminal)?
        .bytes()
        .map(Symbol)
        .collect();
    if let Err(finding) = check_input_symbols(&program, &input) {
        warn!(%finding, "input check");
        if cli.strict {
            return Err(TuringMachineError::from(finding).into());
        }
    }

    let config = MachineConfig {
        tape_length: cli.tape_length,
        max_steps: cli.max_steps,
    };
    let mut machine = TuringMachine::new(&program, &input, config)?;

    let output = if cli.verbose {
        let mut written = Ok(());
        let output = machine.run_with(|step| {
            if written.is_ok() {
                written = out.write_all(trace::format_step(step).as_bytes());
            }
        });
        written.context("Failed to write trace")?;
        output?
    } else {
        machine.run()?
    };

    debug!(steps = output.steps, "run finished");

    if cli.verbose {
        out.write_all(b"Output: ")?;
    }
    // Tape symbols are raw bytes and need not be valid UTF-8.
    out.write_all(&output.as_bytes())?;
    out.write_all(b"\n")?;

    Ok(())
}

/// Prints the built-in programs, or the rule tables found in `directory`.
fn list_programs(directory: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let Some(directory) = directory else {
        for index in 0..ProgramManager::get_program_count() {
            let info = ProgramManager::get_program_info(index)?;
            writeln!(
                out,
                "{}: {} ({} states, {} transitions)",
                info.index, info.name, info.state_count, info.transition_count
            )?;
        }
        return Ok(());
    };

    for result in ProgramLoader::load_programs(directory) {
        match result {
            Ok((path, program)) => writeln!(
                out,
                "{}: {} ({} states, {} transitions)",
                path.display(),
                program.name.as_deref().unwrap_or_default(),
                program.states().len(),
                program.len()
            )?,
            Err(e) => {
                warn!(error = %e, "skipping rule table");
            }
        }
    }

    Ok(())
}

/// Loads the rule table from `--rules` or `--program`.
///
/// A `--program` value is looked up by name first, then by index. When neither matches, the
/// error lists the built-in programs whose names contain the value.
fn load_program(cli: &Cli) -> Result<Program> {
    match (&cli.rules, &cli.program) {
        (Some(path), _) => ProgramLoader::load_program(path)
            .with_context(|| format!("Failed to load rule table {}", path.display())),
        (None, Some(name)) => {
            let found = ProgramManager::get_program_by_name(name).or_else(|e| {
                match name.parse::<usize>() {
                    Ok(index) => ProgramManager::get_program_by_index(index),
                    Err(_) => Err(e),
                }
            });

            found.with_context(|| {
                let similar: Vec<String> = ProgramManager::search_programs(name)
                    .into_iter()
                    .filter_map(|index| ProgramManager::get_program_info(index).ok())
                    .map(|info| info.name)
                    .collect();

                if similar.is_empty() {
                    "See --list for the built-in programs".to_string()
                } else {
                    format!("Did you mean: {}", similar.join(", "))
                }
            })
        }
        (None, None) => {
            bail!("No rule table given, use --rules <FILE> or --program <NAME> (see --list)")
        }
    }
}

/// Logs analyzer findings; under `--strict` the first one is an error.
fn report_findings(program: &Program, strict: bool) -> Result<()> {
    let findings = analyze(program);

    for finding in &findings {
        warn!(%finding, "rule table analysis");
    }

    match findings.into_iter().next() {
        Some(finding) if strict => Err(TuringMachineError::from(finding).into()),
        _ => Ok(()),
    }
}

/// Takes the input from the command line, or one line of stdin when it is piped.
fn read_input(input: Option<&str>, mut stdin: impl BufRead, is_terminal: bool) -> Result<String> {
    if let Some(input) = input {
        return Ok(input.to_string());
    }

    if !is_terminal {
        let mut line = String::new();
        let read = stdin
            .read_line(&mut line)
            .context("Failed to read input from stdin")?;

        if read > 0 {
            return Ok(line.trim_end_matches(['\r', '\n']).to_string());
        }
    }

    Err(TuringMachineError::MissingInput).context("See --help")
}

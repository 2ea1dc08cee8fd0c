//! This module defines the `TuringMachine` struct, which runs a single-tape machine over a
//! borrowed rule table. It owns the tape, the current state and the engine status, and drives
//! the read / match / write / move loop until a halting transition or a fatal condition.

use tracing::{debug, trace};

use crate::tape::{Boundary, Tape};
use crate::types::{
    Direction, Halt, MachineConfig, Output, Program, State, Status, Step, Symbol, Transition,
    TuringMachineError, INITIAL_STATE,
};

/// A snapshot handed to trace hooks once per step, taken after the transition lookup and
/// before anything is written or moved.
#[derive(Debug)]
pub struct Trace<'a> {
    /// Zero-based number of the step about to be applied.
    pub step: usize,
    /// The current state.
    pub state: State,
    /// The tape before the transition writes or moves.
    pub tape: &'a Tape,
    /// Index of the matched transition in the rule table, and the transition itself.
    /// `None` when no rule matches and the run is about to fail.
    pub matched: Option<(usize, &'a Transition)>,
}

/// A single-tape Turing machine.
///
/// The rule table is borrowed for the whole run and never mutated. The tape is allocated in
/// [`TuringMachine::new`] and released with the machine, on every exit path.
#[derive(Debug)]
pub struct TuringMachine<'p> {
    program: &'p Program,
    config: MachineConfig,
    tape: Tape,
    state: State,
    status: Status,
    step_count: usize,
}

impl<'p> TuringMachine<'p> {
    /// Creates a machine in state 0 with `input` written on the tape from cell 1.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the input does not fit on the tape.
    pub fn new(
        program: &'p Program,
        input: &[Symbol],
        config: MachineConfig,
    ) -> Result<Self, TuringMachineError> {
        config.validate()?;
        let tape = Tape::new(input, config.tape_length)?;

        debug!(
            program = program.name.as_deref().unwrap_or("<unnamed>"),
            transitions = program.len(),
            input_len = input.len(),
            tape_length = config.tape_length,
            "machine created"
        );

        Ok(Self {
            program,
            config,
            tape,
            state: INITIAL_STATE,
            status: Status::Running,
            step_count: 0,
        })
    }

    /// Creates a machine from a textual input, one symbol per byte.
    pub fn from_input(
        program: &'p Program,
        input: &str,
        config: MachineConfig,
    ) -> Result<Self, TuringMachineError> {
        let input: Vec<Symbol> = input.bytes().map(Symbol).collect();
        Self::new(program, &input, config)
    }

    /// Executes a single step.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if the machine moved and keeps running.
    /// * `Step::Halt(Halt::Ok)` once a halting transition has been applied.
    /// * `Step::Halt(Halt::Err(_))` on a fatal condition.
    ///
    /// Once the machine has stopped, every further call returns the same outcome.
    pub fn step(&mut self) -> Step {
        self.step_with(&mut |_| {})
    }

    fn step_with(&mut self, hook: &mut dyn FnMut(&Trace<'_>)) -> Step {
        match &self.status {
            Status::Running => {}
            Status::Halted => return Step::Halt(Halt::Ok),
            Status::Failed(e) => return Step::Halt(Halt::Err(e.clone())),
        }

        if let Some(limit) = self.config.max_steps {
            if self.step_count >= limit {
                return self.fail(TuringMachineError::StepLimitExceeded(limit));
            }
        }

        let program = self.program;
        let state = self.state;
        let symbol = self.tape.read();

        let matched = program.resolve(state, symbol);

        hook(&Trace {
            step: self.step_count,
            state,
            tape: &self.tape,
            matched,
        });

        let Some((rule, transition)) = matched else {
            return self.fail(TuringMachineError::NoMatchingRule { state, symbol });
        };

        trace!(
            step = self.step_count,
            state,
            head = self.tape.head(),
            rule,
            "applying transition"
        );

        self.tape.write(transition.write);
        self.state = transition.next_state;
        self.step_count += 1;

        // The halting step never moves the head, so it is not bounds checked.
        if transition.direction == Direction::Halt {
            debug!(steps = self.step_count, state = self.state, "machine halted");
            self.status = Status::Halted;
            return Step::Halt(Halt::Ok);
        }

        match self.tape.apply(transition.direction) {
            Ok(()) => Step::Continue,
            Err(Boundary::Left) => self.fail(TuringMachineError::HeadUnderflow { state }),
            Err(Boundary::Right) => self.fail(TuringMachineError::HeadOverflow { state }),
        }
    }

    fn fail(&mut self, error: TuringMachineError) -> Step {
        debug!(steps = self.step_count, %error, "machine failed");
        self.status = Status::Failed(error.clone());
        Step::Halt(Halt::Err(error))
    }

    /// Runs the machine until it halts or fails.
    pub fn run(&mut self) -> Result<Output, TuringMachineError> {
        self.run_with(|_| {})
    }

    /// Runs the machine until it halts or fails, calling `hook` once per step.
    ///
    /// The hook observes the machine; it cannot change how the run proceeds.
    pub fn run_with(
        &mut self,
        mut hook: impl FnMut(&Trace<'_>),
    ) -> Result<Output, TuringMachineError> {
        loop {
            match self.step_with(&mut hook) {
                Step::Continue => continue,
                Step::Halt(Halt::Ok) => break,
                Step::Halt(Halt::Err(e)) => return Err(e),
            }
        }

        Ok(Output {
            symbols: self.tape.output().to_vec(),
            steps: self.step_count,
        })
    }

    /// Returns the output region, available only once the machine has halted.
    pub fn output(&self) -> Option<Output> {
        (self.status == Status::Halted).then(|| Output {
            symbols: self.tape.output().to_vec(),
            steps: self.step_count,
        })
    }

    /// Returns the current state of the simulated machine.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the engine status.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Returns the number of transitions applied so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }
}

/// Runs `program` on `input` from start to finish.
pub fn execute(
    program: &Program,
    input: &str,
    config: MachineConfig,
) -> Result<Output, TuringMachineError> {
    TuringMachine::from_input(program, input, config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(tape_length: usize) -> MachineConfig {
        MachineConfig {
            tape_length,
            ..Default::default()
        }
    }

    #[test]
    fn test_halting_example() {
        let program = Program::new(vec![Transition::new(0, b'a', b'b', Direction::Halt, 0)]);

        let output = execute(&program, "a", MachineConfig::default()).unwrap();
        assert_eq!(output.to_string(), "b");
        assert_eq!(output.steps, 1);
    }

    #[test]
    fn test_multi_step_example() {
        let program = Program::new(vec![
            Transition::new(0, b'a', b'a', Direction::Right, 1),
            Transition::new(1, Symbol::BLANK, b'!', Direction::Halt, 1),
        ]);
        let mut machine = TuringMachine::from_input(&program, "a", MachineConfig::default()).unwrap();

        assert_eq!(machine.step(), Step::Continue);
        assert_eq!(machine.state(), 1);
        assert_eq!(machine.tape().head(), 2);
        assert_eq!(machine.tape().read(), Symbol::BLANK);

        assert_eq!(machine.step(), Step::Halt(Halt::Ok));
        assert_eq!(machine.status(), &Status::Halted);

        let output = machine.output().unwrap();
        assert_eq!(output.to_string(), "a!");
        assert_eq!(output.steps, 2);
    }

    #[test]
    fn test_no_matching_rule() {
        let program = Program::new(vec![Transition::new(0, b'a', b'a', Direction::Halt, 0)]);
        let mut machine = TuringMachine::from_input(&program, "X", MachineConfig::default()).unwrap();

        let error = machine.run().unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::NoMatchingRule {
                state: 0,
                symbol: Symbol(b'X')
            }
        );
        assert!(machine.output().is_none());
        assert_eq!(machine.step_count(), 0);
    }

    #[test]
    fn test_empty_input_halts_on_blank() {
        let program = Program::new(vec![Transition::new(
            0,
            Symbol::BLANK,
            Symbol::BLANK,
            Direction::Halt,
            0,
        )]);

        let output = execute(&program, "", MachineConfig::default()).unwrap();
        assert!(output.symbols.is_empty());
        assert_eq!(output.steps, 1);
    }

    #[test]
    fn test_head_overflow() {
        let program = Program::new(vec![
            Transition::new(0, b'a', b'a', Direction::Right, 0),
            Transition::new(0, Symbol::BLANK, Symbol::BLANK, Direction::Right, 0),
            Transition::new(0, Symbol::BOUNDARY, Symbol::BOUNDARY, Direction::Right, 0),
        ]);
        let mut machine = TuringMachine::from_input(&program, "a", config(6)).unwrap();

        let error = machine.run().unwrap_err();
        assert_eq!(error, TuringMachineError::HeadOverflow { state: 0 });
        // Cells 1 through 5 were each visited once before the move past the end.
        assert_eq!(machine.step_count(), 5);
        assert_eq!(machine.tape().head(), 5);
        assert!(machine.output().is_none());
    }

    #[test]
    fn test_head_underflow_reports_source_state() {
        let program = Program::new(vec![
            Transition::new(0, b'a', b'a', Direction::Left, 3),
            Transition::new(3, Symbol::BOUNDARY, Symbol::BOUNDARY, Direction::Left, 4),
        ]);

        let error = execute(&program, "a", MachineConfig::default()).unwrap_err();
        assert_eq!(error, TuringMachineError::HeadUnderflow { state: 3 });
    }

    #[test]
    fn test_halt_on_boundary_cell() {
        let program = Program::new(vec![
            Transition::new(0, b'a', b'a', Direction::Right, 0),
            Transition::new(0, Symbol::BOUNDARY, Symbol::BOUNDARY, Direction::Halt, 1),
        ]);

        let output = execute(&program, "aaa", config(5)).unwrap();
        assert_eq!(output.to_string(), "aaa");
        assert_eq!(output.steps, 4);
    }

    #[test]
    fn test_stopped_machine_does_not_resume() {
        let program = Program::new(vec![Transition::new(0, b'a', b'b', Direction::Halt, 0)]);
        let mut machine = TuringMachine::from_input(&program, "b", MachineConfig::default()).unwrap();

        let first = machine.step();
        assert!(matches!(first, Step::Halt(Halt::Err(_))));
        assert_eq!(machine.step(), first);
        assert_eq!(machine.step_count(), 0);
    }

    #[test]
    fn test_step_limit() {
        let program = Program::new(vec![
            Transition::new(0, b'a', b'a', Direction::Right, 1),
            Transition::new(1, Symbol::BLANK, Symbol::BLANK, Direction::Left, 0),
        ]);
        let config = MachineConfig {
            max_steps: Some(10),
            ..Default::default()
        };

        let error = execute(&program, "a", config).unwrap_err();
        assert_eq!(error, TuringMachineError::StepLimitExceeded(10));
    }

    #[test]
    fn test_step_limit_allows_halting_on_last_step() {
        let program = Program::new(vec![
            Transition::new(0, b'a', b'a', Direction::Right, 1),
            Transition::new(1, Symbol::BLANK, b'!', Direction::Halt, 1),
        ]);
        let config = MachineConfig {
            max_steps: Some(2),
            ..Default::default()
        };

        assert_eq!(execute(&program, "a", config).unwrap().to_string(), "a!");
    }

    #[test]
    fn test_trace_hook_sees_every_step() {
        let program = Program::new(vec![
            Transition::new(0, b'a', b'a', Direction::Right, 1),
            Transition::new(1, Symbol::BLANK, b'!', Direction::Halt, 1),
        ]);
        let mut machine = TuringMachine::from_input(&program, "a", MachineConfig::default()).unwrap();

        let mut seen = Vec::new();
        let output = machine
            .run_with(|trace| {
                seen.push((
                    trace.step,
                    trace.state,
                    trace.tape.head(),
                    trace.matched.map(|(rule, _)| rule),
                    trace.tape.read(),
                ))
            })
            .unwrap();

        assert_eq!(output.to_string(), "a!");
        assert_eq!(
            seen,
            vec![
                (0, 0, 1, Some(0), Symbol(b'a')),
                (1, 1, 2, Some(1), Symbol::BLANK)
            ]
        );
    }

    #[test]
    fn test_output_keeps_non_utf8_bytes() {
        let program = Program::new(vec![Transition::new(0, b'a', 0xffu8, Direction::Halt, 0)]);
        let output = execute(&program, "a", MachineConfig::default()).unwrap();

        assert_eq!(output.as_bytes(), vec![0xff]);
    }

    #[test]
    fn test_trace_hook_sees_stuck_configuration() {
        let program = Program::new(vec![Transition::new(0, b'a', b'b', Direction::Right, 1)]);
        let mut machine = TuringMachine::from_input(&program, "a", MachineConfig::default()).unwrap();

        let mut seen = Vec::new();
        let result = machine.run_with(|trace| {
            seen.push((trace.state, trace.tape.head(), trace.matched.is_some()))
        });

        assert!(matches!(
            result,
            Err(TuringMachineError::NoMatchingRule { state: 1, .. })
        ));
        assert_eq!(seen, vec![(0, 1, true), (1, 2, false)]);
    }

    #[test]
    fn test_input_too_long() {
        let program = Program::default();
        let result = TuringMachine::from_input(&program, "abcd", config(5));

        assert!(matches!(
            result,
            Err(TuringMachineError::InputTooLong { len: 4, max: 3 })
        ));
    }

    fn symbol_strategy() -> impl Strategy<Value = Symbol> {
        prop_oneof![
            Just(Symbol(b'a')),
            Just(Symbol(b'b')),
            Just(Symbol::BLANK),
            Just(Symbol::BOUNDARY),
        ]
    }

    fn transition_strategy() -> impl Strategy<Value = Transition> {
        let direction = prop_oneof![
            Just(Direction::Left),
            Just(Direction::Right),
            Just(Direction::Halt),
        ];

        (0u32..3, symbol_strategy(), symbol_strategy(), direction, 0u32..3).prop_map(
            |(state, read, write, direction, next_state)| Transition {
                state,
                read,
                write,
                direction,
                next_state,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_runs_are_deterministic(
            transitions in prop::collection::vec(transition_strategy(), 0..12),
            input in "[ab]{0,8}",
        ) {
            let program = Program::new(transitions);
            let config = MachineConfig { tape_length: 12, max_steps: Some(200) };

            let mut first = TuringMachine::from_input(&program, &input, config.clone()).unwrap();
            let mut second = TuringMachine::from_input(&program, &input, config).unwrap();

            prop_assert_eq!(first.run(), second.run());
            prop_assert_eq!(first.step_count(), second.step_count());
            prop_assert_eq!(first.tape(), second.tape());
        }

        #[test]
        fn prop_head_stays_on_tape(
            transitions in prop::collection::vec(transition_strategy(), 0..12),
            input in "[ab]{0,8}",
        ) {
            let program = Program::new(transitions);
            let config = MachineConfig { tape_length: 10, max_steps: Some(200) };
            let mut machine = TuringMachine::from_input(&program, &input, config).unwrap();

            let mut heads = Vec::new();
            let _ = machine.run_with(|trace| heads.push(trace.tape.head()));

            prop_assert!(heads.iter().all(|&head| head < 10));
            prop_assert!(machine.tape().head() < 10);
            prop_assert_eq!(machine.tape().capacity(), 10);
        }
    }
}

//! The bounded tape: a fixed number of cells framed by two boundary sentinels, and the head
//! that walks over it.

use crate::types::{Direction, Symbol, TuringMachineError, INITIAL_HEAD, MIN_TAPE_LENGTH};

/// The end of the tape a head movement ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Left,
    Right,
}

/// A fixed-capacity tape.
///
/// Cells `0` and `capacity - 1` hold [`Symbol::BOUNDARY`], the input occupies the cells right
/// after the left boundary and everything else is blank. The head never leaves
/// `0..capacity`: a move that would cross either end is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<Symbol>,
    head: usize,
    high_water: usize,
}

impl Tape {
    /// Allocates a tape of `capacity` cells and writes `input` starting at cell 1.
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` if `capacity` leaves no room for a working cell, or cannot be allocated.
    /// * `InputTooLong` if the input does not fit between the boundaries.
    /// * `ReservedSymbol` if the input contains the blank or the boundary symbol.
    pub fn new(input: &[Symbol], capacity: usize) -> Result<Self, TuringMachineError> {
        if capacity < MIN_TAPE_LENGTH {
            return Err(TuringMachineError::InvalidConfig(format!(
                "tape length must be at least {MIN_TAPE_LENGTH}, got {capacity}"
            )));
        }

        let max = capacity - 2;
        if input.len() > max {
            return Err(TuringMachineError::InputTooLong {
                len: input.len(),
                max,
            });
        }

        if let Some((position, &symbol)) = input.iter().enumerate().find(|(_, s)| s.is_reserved())
        {
            return Err(TuringMachineError::ReservedSymbol { symbol, position });
        }

        let mut cells = Vec::new();
        cells.try_reserve_exact(capacity).map_err(|e| {
            TuringMachineError::InvalidConfig(format!(
                "Cannot allocate a tape of {capacity} cells: {e}"
            ))
        })?;
        cells.resize(capacity, Symbol::BLANK);
        cells[0] = Symbol::BOUNDARY;
        cells[capacity - 1] = Symbol::BOUNDARY;
        cells[INITIAL_HEAD..INITIAL_HEAD + input.len()].copy_from_slice(input);

        Ok(Self {
            cells,
            head: INITIAL_HEAD,
            high_water: input.len().max(INITIAL_HEAD),
        })
    }

    /// Returns the symbol under the head.
    pub fn read(&self) -> Symbol {
        self.cells[self.head]
    }

    /// Overwrites the symbol under the head. The head does not move.
    pub fn write(&mut self, symbol: Symbol) {
        self.cells[self.head] = symbol;
    }

    /// Moves the head one cell in `direction`; `Halt` leaves it in place.
    ///
    /// A move past either end is refused and reported, the head stays where it was.
    pub fn apply(&mut self, direction: Direction) -> Result<(), Boundary> {
        let head = match direction {
            Direction::Left => self.head.checked_sub(1).ok_or(Boundary::Left)?,
            Direction::Right => Some(self.head + 1)
                .filter(|&next| next < self.cells.len())
                .ok_or(Boundary::Right)?,
            Direction::Halt => return Ok(()),
        };

        self.head = head;
        self.high_water = self.high_water.max(head);

        Ok(())
    }

    /// The live region: from cell 1 up to the first blank or the right boundary cell.
    pub fn output(&self) -> &[Symbol] {
        let region = &self.cells[INITIAL_HEAD..self.cells.len() - 1];
        let end = region
            .iter()
            .position(|&s| s == Symbol::BLANK)
            .unwrap_or(region.len());

        &region[..end]
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn cells(&self) -> &[Symbol] {
        &self.cells
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// The right-most cell the head has visited, or the end of the input if further right.
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}

//! Transition lookup over an ordered rule table.

use crate::types::{Program, State, Symbol, Transition};

impl Program {
    /// Finds the first transition keyed by `(state, symbol)`, in table order.
    ///
    /// Returns its index along with the transition. Later transitions with the same key are
    /// never selected.
    pub fn resolve(&self, state: State, symbol: Symbol) -> Option<(usize, &Transition)> {
        self.transitions
            .iter()
            .enumerate()
            .find(|(_, t)| t.state == state && t.read == symbol)
    }
}

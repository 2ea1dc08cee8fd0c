//! The verbose step printer.

use machination::{Formal, Formatter, Symbol, Trace};

/// Renders the tape up to the furthest visited cell, the head, the state and the rule about to
/// be applied. When no rule matches, the rule line is left out:
///
/// ```text
/// Tape: #ab
/// Head:  ^
/// State: 0
/// Applying rule 0: (0, a) -> (b, final, 0)
/// ```
pub fn format_step(trace: &Trace<'_>) -> String {
    let tape: String = trace.tape.cells()[..=trace.tape.high_water()]
        .iter()
        .map(|&symbol| cell(symbol))
        .collect();

    let mut out = format!(
        "Tape: {tape}\nHead: {}^\nState: {}\n",
        " ".repeat(trace.tape.head()),
        trace.state,
    );

    if let Some((rule, transition)) = trace.matched {
        out.push_str(&format!(
            "Applying rule {rule}: {}\n",
            Formal.format_transition(transition)
        ));
    }

    out
}

fn cell(symbol: Symbol) -> char {
    match symbol {
        Symbol::BLANK => ' ',
        Symbol::BOUNDARY => '#',
        other => other.0 as char,
    }
}

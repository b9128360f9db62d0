//! Text patterns for simulation: one line per pattern, one 0/1 character per input

use std::io::Write;

use crate::network::gate::{SimWord, SIM_WIDTH};
use crate::sim::SimulationError;

/// Parse a pattern line
///
/// Only a trailing carriage return is stripped: blank or padded lines are errors.
/// `line` is the 1-based line number used in errors.
pub fn parse_pattern(text: &str, line: usize, nb_inputs: usize) -> Result<Vec<bool>, SimulationError> {
    let text = text.strip_suffix('\r').unwrap_or(text);
    let found = text.chars().count();
    if found != nb_inputs {
        return Err(SimulationError::Length {
            line,
            expected: nb_inputs,
            found,
        });
    }
    text.chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            _ => Err(SimulationError::Alphabet { line, found: c }),
        })
        .collect()
}

/// Pack up to [`SIM_WIDTH`] patterns into one word per input, pattern `k` in bit `k`
pub fn pack_patterns(patterns: &[Vec<bool>], nb_inputs: usize) -> Vec<SimWord> {
    assert!(patterns.len() <= SIM_WIDTH);
    let mut ret = vec![0; nb_inputs];
    for (k, p) in patterns.iter().enumerate() {
        assert_eq!(p.len(), nb_inputs);
        for (i, b) in p.iter().enumerate() {
            if *b {
                ret[i] |= 1 << k;
            }
        }
    }
    ret
}

/// Text of the values of a single lane of a set of words
pub fn lane_to_string(words: &[SimWord], lane: usize) -> String {
    words
        .iter()
        .map(|w| if (w >> lane) & 1 != 0 { '1' } else { '0' })
        .collect()
}

/// Write the first lanes of a simulation, one `pattern result` line per lane
pub fn write_lanes<W: Write + ?Sized>(
    w: &mut W,
    inputs: &[SimWord],
    outputs: &[SimWord],
    nb_lanes: usize,
) -> std::io::Result<()> {
    for lane in 0..nb_lanes {
        writeln!(
            w,
            "{} {}",
            lane_to_string(inputs, lane),
            lane_to_string(outputs, lane)
        )?;
    }
    Ok(())
}

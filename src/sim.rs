//! Word-parallel simulation of a circuit, used to find candidate equivalences
//!
//! Each simulation word carries 64 independent patterns. After each batch, the groups of
//! candidate-equivalent gates are split according to the simulated values.

pub mod exhaustive;
pub mod fec;

use std::fmt;
use std::io::{BufRead, Write};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::io::patterns;
use crate::network::gate::{SimWord, SIM_WIDTH};
use crate::network::Circuit;

/// Effort spent on random simulation before giving up on further refinement
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Effort {
    /// Stop after 5 unproductive batches
    Low,
    /// Stop after 20 unproductive batches
    #[default]
    Medium,
    /// Stop after 50 unproductive batches
    High,
    /// Stop after 100 unproductive batches
    Unlimited,
}

impl Effort {
    /// Number of consecutive batches without any refinement before stopping
    pub fn surrender(&self) -> usize {
        match self {
            Effort::Low => 5,
            Effort::Medium => 20,
            Effort::High => 50,
            Effort::Unlimited => 100,
        }
    }
}

/// Parameters of random simulation
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Stopping criterion
    pub effort: Effort,
    /// Seed of the pattern generator
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            effort: Effort::default(),
            seed: 1,
        }
    }
}

/// Error in a simulation run
///
/// The circuit structure is never modified by simulation, so it stays usable.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A pattern does not have one character per input
    #[error("pattern at line {line} has length {found}, expected {expected}")]
    Length {
        /// 1-based line of the pattern
        line: usize,
        /// Number of inputs
        expected: usize,
        /// Length of the pattern
        found: usize,
    },
    /// A pattern contains something else than 0 and 1
    #[error("pattern at line {line} contains a non-binary character '{found}'")]
    Alphabet {
        /// 1-based line of the pattern
        line: usize,
        /// Offending character
        found: char,
    },
    /// Reading the patterns or writing the log failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Summary of a simulation run
#[derive(Clone, Debug, Default)]
pub struct SimReport {
    /// Number of patterns simulated
    pub nb_patterns: usize,
    /// Number of groups of candidate-equivalent gates at the end
    pub nb_fec_groups: usize,
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} patterns simulated, {} FEC groups",
            self.nb_patterns, self.nb_fec_groups
        )
    }
}

/// Simulate one batch of 64 patterns, given as one word per input; return the output words
///
/// All live gates are evaluated and their value is added to their history.
pub fn simulate_batch(c: &mut Circuit, inputs: &[SimWord]) -> Vec<SimWord> {
    assert_eq!(inputs.len(), c.nb_inputs());
    for (i, w) in inputs.iter().enumerate() {
        c.set_input_word(i, *w);
    }
    c.reset_simulation();
    let gates: Vec<usize> = c.live_gates().collect();
    for g in gates {
        c.evaluate(g);
    }
    let ret = c.evaluate_outputs();
    for v in c.vars.iter_mut() {
        if !v.removed && !v.dirty {
            v.push_history();
        }
    }
    ret
}

/// Simulate one batch and split the candidate-equivalence groups; return whether they changed
pub fn simulate_and_refine(c: &mut Circuit, inputs: &[SimWord]) -> bool {
    simulate_batch(c, inputs);
    fec::refine_groups(c)
}

/// Simulate random patterns until the candidate-equivalence groups stop being refined
///
/// Each simulated pattern and its output values are written to `sink` if given.
pub fn random_sim(
    c: &mut Circuit,
    config: &SimConfig,
    mut sink: Option<&mut dyn Write>,
) -> Result<SimReport, SimulationError> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let surrender = config.effort.surrender();
    let mut report = SimReport::default();
    let mut nb_stalls = 0;
    loop {
        let inputs: Vec<SimWord> = (0..c.nb_inputs()).map(|_| rng.gen()).collect();
        let outputs = simulate_batch(c, &inputs);
        if let Some(w) = sink.as_deref_mut() {
            patterns::write_lanes(w, &inputs, &outputs, SIM_WIDTH)?;
        }
        report.nb_patterns += SIM_WIDTH;
        if fec::refine_groups(c) {
            nb_stalls = 0;
        } else {
            nb_stalls += 1;
        }
        if nb_stalls >= surrender || c.fec_groups().is_empty() {
            break;
        }
    }
    report.nb_fec_groups = c.fec_groups().len();
    log::info!("Random simulation: {report}");
    Ok(report)
}

/// Simulate a batch of parsed patterns, and log the populated lanes only
fn run_patterns(
    c: &mut Circuit,
    batch: &[Vec<bool>],
    sink: &mut Option<&mut dyn Write>,
    report: &mut SimReport,
) -> Result<(), SimulationError> {
    let inputs = patterns::pack_patterns(batch, c.nb_inputs());
    let outputs = simulate_batch(c, &inputs);
    if let Some(w) = sink.as_deref_mut() {
        patterns::write_lanes(w, &inputs, &outputs, batch.len())?;
    }
    fec::refine_groups(c);
    report.nb_patterns += batch.len();
    Ok(())
}

/// Simulate the patterns of a text file, one 0/1 line per pattern
///
/// On a malformed line, the patterns of the previous lines are still simulated before the
/// error is returned.
pub fn file_sim<R: BufRead>(
    c: &mut Circuit,
    reader: R,
    mut sink: Option<&mut dyn Write>,
) -> Result<SimReport, SimulationError> {
    let mut report = SimReport::default();
    let mut batch = Vec::with_capacity(SIM_WIDTH);
    let mut error = None;
    for (i, line) in reader.lines().enumerate() {
        let parsed = line
            .map_err(SimulationError::from)
            .and_then(|l| patterns::parse_pattern(&l, i + 1, c.nb_inputs()));
        match parsed {
            Ok(p) => batch.push(p),
            Err(e) => {
                error = Some(e);
                break;
            }
        }
        if batch.len() == SIM_WIDTH {
            run_patterns(c, &batch, &mut sink, &mut report)?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        run_patterns(c, &batch, &mut sink, &mut report)?;
    }
    report.nb_fec_groups = c.fec_groups().len();
    log::info!("File simulation: {report}");
    match error {
        Some(e) => Err(e),
        None => Ok(report),
    }
}

/// Simple conversion to 64b format
fn bool_to_multi(values: &[bool]) -> Vec<SimWord> {
    values.iter().map(|b| if *b { !0 } else { 0 }).collect()
}

/// Simulate the circuit for a single pattern; return the output values
pub fn simulate_comb(c: &mut Circuit, input_values: &[bool]) -> Vec<bool> {
    let outputs = simulate_batch(c, &bool_to_multi(input_values));
    outputs.iter().map(|w| *w != 0).collect()
}

/// Simulate the circuit for several patterns; return the output values for each
///
/// Patterns are packed [`SIM_WIDTH`] at a time, one per lane.
pub fn simulate(c: &mut Circuit, input_values: &[Vec<bool>]) -> Vec<Vec<bool>> {
    let mut ret = Vec::with_capacity(input_values.len());
    for chunk in input_values.chunks(SIM_WIDTH) {
        let outputs = simulate_batch(c, &patterns::pack_patterns(chunk, c.nb_inputs()));
        for lane in 0..chunk.len() {
            ret.push(outputs.iter().map(|w| (w >> lane) & 1 != 0).collect());
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_aag_str;
    use crate::network::Lit;

    const AND2: &str = "aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n";

    #[test]
    fn test_basic() {
        let mut c = read_aag_str(AND2, true).unwrap();
        assert_eq!(simulate_comb(&mut c, &[true, true]), vec![true]);
        assert_eq!(simulate_comb(&mut c, &[false, true]), vec![false]);
        assert_eq!(simulate_comb(&mut c, &[false, false]), vec![false]);
        assert_eq!(
            simulate(&mut c, &[vec![true, false], vec![true, true]]),
            vec![vec![false], vec![true]]
        );
    }

    #[test]
    fn test_simulate_packed() {
        let mut c = read_aag_str(AND2, true).unwrap();
        let patterns: Vec<Vec<bool>> = (0..SIM_WIDTH + 6)
            .map(|k| vec![k % 2 == 0, k % 3 == 0])
            .collect();
        let outputs = simulate(&mut c, &patterns);
        assert_eq!(outputs.len(), SIM_WIDTH + 6);
        for (k, o) in outputs.iter().enumerate() {
            assert_eq!(o, &vec![k % 6 == 0]);
        }
        // One batch per word of patterns
        assert_eq!(c.var(3).history().len(), 2);
    }

    #[test]
    fn test_history() {
        let mut c = read_aag_str(AND2, true).unwrap();
        simulate_batch(&mut c, &[0b01, 0b11]);
        simulate_batch(&mut c, &[0b10, 0b11]);
        let h: Vec<SimWord> = c.var(3).history().iter().copied().collect();
        assert_eq!(h, vec![0b01, 0b10]);
    }

    #[test]
    fn test_file_sim() {
        let mut c = read_aag_str(AND2, true).unwrap();
        let mut log = Vec::new();
        let report = file_sim(&mut c, "11\n01\r\n00\n".as_bytes(), Some(&mut log)).unwrap();
        assert_eq!(report.nb_patterns, 3);
        assert_eq!(String::from_utf8(log).unwrap(), "11 1\n01 0\n00 0\n");
    }

    #[test]
    fn test_file_sim_blank_line() {
        let mut c = read_aag_str(AND2, true).unwrap();
        let err = file_sim(&mut c, "11\n\n 01 \n".as_bytes(), None).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Length {
                line: 2,
                expected: 2,
                found: 0
            }
        ));
        let err = file_sim(&mut c, "11\n 0\n".as_bytes(), None).unwrap_err();
        assert!(matches!(err, SimulationError::Alphabet { line: 2, found: ' ' }));
    }

    #[test]
    fn test_file_sim_error() {
        let mut c = read_aag_str(AND2, true).unwrap();
        let mut log = Vec::new();
        let err = file_sim(&mut c, "11\n10\n1a\n00\n".as_bytes(), Some(&mut log)).unwrap_err();
        assert!(matches!(err, SimulationError::Alphabet { line: 3, found: 'a' }));
        // Patterns before the error are simulated
        assert_eq!(String::from_utf8(log).unwrap(), "11 1\n10 0\n");

        let err = file_sim(&mut c, "111\n".as_bytes(), None).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Length {
                line: 1,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn test_file_sim_batches() {
        let mut c = read_aag_str(AND2, true).unwrap();
        let text = "10\n".repeat(SIM_WIDTH + 5);
        let report = file_sim(&mut c, text.as_bytes(), None).unwrap();
        assert_eq!(report.nb_patterns, SIM_WIDTH + 5);
    }

    #[test]
    fn test_random_sim() {
        // 3 = 1 & 2, 4 = 2 & 1, 5 = !1 & 2
        let aag = "aag 5 2 0 3 3\n2\n4\n6\n8\n10\n6 2 4\n8 4 2\n10 3 4\n";
        let mut c = read_aag_str(aag, false).unwrap();
        assert_eq!(c.fec_groups().len(), 1);
        let config = SimConfig {
            effort: Effort::Low,
            seed: 42,
        };
        let report = random_sim(&mut c, &config, None).unwrap();
        assert!(report.nb_patterns >= Effort::Low.surrender() * SIM_WIDTH);
        // 3 and 4 are equivalent, 5 is separated
        assert_eq!(c.fec_groups(), &[vec![Lit::from_var(3), Lit::from_var(4)]]);
        assert!(c.var(5).fec().is_none());
    }

    #[test]
    fn test_random_sim_deterministic() {
        let aag = "aag 5 2 0 3 3\n2\n4\n6\n8\n10\n6 2 4\n8 4 2\n10 3 4\n";
        let mut log1 = Vec::new();
        let mut log2 = Vec::new();
        for log in [&mut log1, &mut log2] {
            let mut c = read_aag_str(aag, false).unwrap();
            random_sim(&mut c, &SimConfig::default(), Some(log)).unwrap();
        }
        assert!(!log1.is_empty());
        assert_eq!(log1, log2);
    }
}

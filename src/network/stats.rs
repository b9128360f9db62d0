//! Compute gate statistics
//!
//! ```
//! # use aigfraig::io::read_aag_str;
//! # let aig = read_aag_str("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n", true).unwrap();
//! use aigfraig::network::stats::stats;
//! let stats = stats(&aig);
//!
//! // Check that there is a single And gate
//! assert_eq!(stats.nb_and, 1);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::fmt;

use crate::network::circuit::Circuit;
use crate::network::gate::Gate;

/// Number of inputs, outputs and gates in a circuit
#[derive(Clone, Debug)]
pub struct CircuitStats {
    /// Number of inputs
    pub nb_inputs: usize,
    /// Number of outputs
    pub nb_outputs: usize,
    /// Number of live And gates
    pub nb_and: usize,
    /// Number of removed And gates
    pub nb_removed: usize,
    /// Number of undefined variables used by a live gate or an output
    pub nb_undefined: usize,
    /// Number of live And gates with an undefined fanin
    pub nb_floating: usize,
    /// Number of live And gates without any user
    pub nb_unused: usize,
    /// Number of groups of candidate-equivalent gates
    pub nb_fec_groups: usize,
    /// Largest number of And gates on a path from an input to an output
    pub depth: usize,
}

impl fmt::Display for CircuitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Outputs: {}", self.nb_outputs)?;
        writeln!(f, "  And: {}", self.nb_and)?;
        writeln!(f, "  Depth: {}", self.depth)?;
        if self.nb_removed != 0 {
            writeln!(f, "  Removed: {}", self.nb_removed)?;
        }
        if self.nb_undefined != 0 {
            writeln!(f, "  Undefined: {}", self.nb_undefined)?;
        }
        if self.nb_floating != 0 {
            writeln!(f, "  Floating: {}", self.nb_floating)?;
        }
        if self.nb_unused != 0 {
            writeln!(f, "  Unused: {}", self.nb_unused)?;
        }
        if self.nb_fec_groups != 0 {
            writeln!(f, "  FEC groups: {}", self.nb_fec_groups)?;
        }
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of the circuit
pub fn stats(c: &Circuit) -> CircuitStats {
    let mut ret = CircuitStats {
        nb_inputs: c.nb_inputs(),
        nb_outputs: c.nb_outputs(),
        nb_and: 0,
        nb_removed: 0,
        nb_undefined: 0,
        nb_floating: 0,
        nb_unused: 0,
        nb_fec_groups: c.fec_groups.len(),
        depth: 0,
    };
    let mut used_undefined = vec![false; c.nb_vars()];
    for &g in c.gate_ids() {
        let v = c.var(g);
        if v.is_removed() {
            ret.nb_removed += 1;
            continue;
        }
        ret.nb_and += 1;
        if v.ref_count() == 0 {
            ret.nb_unused += 1;
        }
        let mut floating = false;
        for s in v.gate().dependencies() {
            if *c.gate(s.var()) == Gate::Undefined {
                used_undefined[s.var()] = true;
                floating = true;
            }
        }
        if floating {
            ret.nb_floating += 1;
        }
    }
    for o in 0..c.nb_outputs() {
        let s = c.output_fanin(o);
        if *c.gate(s.var()) == Gate::Undefined {
            used_undefined[s.var()] = true;
        }
    }
    ret.nb_undefined = used_undefined.iter().filter(|&&u| u).count();

    let mut depth = vec![0usize; c.nb_vars()];
    for v in crate::network::traversal::post_order(c) {
        depth[v] = match c.gate(v) {
            Gate::And([a, b]) => 1 + depth[a.var()].max(depth[b.var()]),
            Gate::Output(a) => depth[a.var()],
            _ => 0,
        };
    }
    ret.depth = c.outputs().iter().map(|&o| depth[o]).max().unwrap_or(0);
    ret
}

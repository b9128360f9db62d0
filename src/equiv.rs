//! Equivalence checking of two combinational circuits
//!
//! Both circuits are encoded in the same SAT problem, sharing their inputs, and the solver
//! looks for an input pattern where any pair of outputs differ.

use rustsat::solvers::{Solve, SolverResult};
use rustsat::types::{Clause, Lit as SatLit, TernaryVal, Var};
use rustsat_kissat::Kissat;
use thiserror::Error;

use crate::network::traversal::post_order;
use crate::network::{Circuit, Gate, Lit};
use crate::sat::SatError;

/// Reason why two circuits are not proven equivalent
#[derive(Debug, Error)]
pub enum EquivError {
    /// The circuits have different numbers of inputs
    #[error("different number of inputs: {0} vs {1}")]
    InputCount(usize, usize),
    /// The circuits have different numbers of outputs
    #[error("different number of outputs: {0} vs {1}")]
    OutputCount(usize, usize),
    /// The circuits differ on this input pattern
    #[error("circuits differ on input pattern {}", pattern_to_string(.0))]
    Different(Vec<bool>),
    /// The solver failed
    #[error(transparent)]
    Sat(#[from] SatError),
}

fn pattern_to_string(p: &[bool]) -> String {
    p.iter().map(|b| if *b { '1' } else { '0' }).collect()
}

/// Clause database for the miter, with its own variable numbering
struct Miter<S> {
    solver: S,
    nb_vars: u32,
    zero: SatLit,
}

impl<S: Solve> Miter<S> {
    fn new(solver: S) -> Result<Miter<S>, SatError> {
        let mut ret = Miter {
            solver,
            nb_vars: 0,
            zero: Var::new(0).pos_lit(),
        };
        ret.zero = ret.new_lit();
        ret.add(&[!ret.zero])?;
        Ok(ret)
    }

    fn new_lit(&mut self) -> SatLit {
        let v = Var::new(self.nb_vars);
        self.nb_vars += 1;
        v.pos_lit()
    }

    fn add(&mut self, lits: &[SatLit]) -> Result<(), SatError> {
        self.solver
            .add_clause(Clause::from(lits))
            .map_err(SatError::from_backend)
    }

    /// Export a circuit to clauses, with the given input literals; return the output literals
    fn encode(&mut self, c: &Circuit, inputs: &[SatLit]) -> Result<Vec<SatLit>, SatError> {
        // Constants and undefined variables keep the false literal
        let mut t = vec![self.zero; c.nb_vars()];
        for (i, &v) in c.inputs().iter().enumerate() {
            t[v] = inputs[i];
        }
        let signal = |t: &[SatLit], l: Lit| {
            if l.is_inverted() {
                !t[l.var()]
            } else {
                t[l.var()]
            }
        };
        for v in post_order(c) {
            match *c.gate(v) {
                Gate::And([a, b]) => {
                    let (a, b) = (signal(&t, a), signal(&t, b));
                    let n = self.new_lit();
                    // 3 clauses, 7 literals
                    self.add(&[a, !n])?;
                    self.add(&[b, !n])?;
                    self.add(&[!a, !b, n])?;
                    t[v] = n;
                }
                Gate::Output(a) => {
                    t[v] = signal(&t, a);
                }
                _ => (),
            }
        }
        Ok(c.outputs().iter().map(|&o| t[o]).collect())
    }

    /// Literal that is true when the two literals differ
    fn xor(&mut self, a: SatLit, b: SatLit) -> Result<SatLit, SatError> {
        let n = self.new_lit();
        self.add(&[a, b, !n])?;
        self.add(&[!a, !b, !n])?;
        self.add(&[!a, b, n])?;
        self.add(&[a, !b, n])?;
        Ok(n)
    }
}

/// Perform equivalence checking on two combinational circuits
///
/// Inputs and outputs are matched by index. Returns an error with a distinguishing input
/// pattern if the circuits are not equivalent.
pub fn check_equivalence_comb(a: &Circuit, b: &Circuit) -> Result<(), EquivError> {
    if a.nb_inputs() != b.nb_inputs() {
        return Err(EquivError::InputCount(a.nb_inputs(), b.nb_inputs()));
    }
    if a.nb_outputs() != b.nb_outputs() {
        return Err(EquivError::OutputCount(a.nb_outputs(), b.nb_outputs()));
    }
    let mut m = Miter::new(Kissat::default())?;
    let inputs: Vec<SatLit> = (0..a.nb_inputs()).map(|_| m.new_lit()).collect();
    let outputs_a = m.encode(a, &inputs)?;
    let outputs_b = m.encode(b, &inputs)?;
    let mut diffs = Vec::with_capacity(outputs_a.len());
    for (oa, ob) in outputs_a.into_iter().zip(outputs_b) {
        diffs.push(m.xor(oa, ob)?);
    }
    // At least one output differs
    m.add(&diffs)?;

    let res = m.solver.solve().map_err(SatError::from_backend)?;
    match res {
        SolverResult::Unsat => Ok(()),
        SolverResult::Sat => {
            let pattern = inputs
                .iter()
                .map(|&l| matches!(m.solver.lit_val(l), Ok(TernaryVal::True)))
                .collect();
            Err(EquivError::Different(pattern))
        }
        SolverResult::Interrupted => Err(SatError("solver interrupted".to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_aag_str;
    use crate::sim::simulate_comb;

    #[test]
    fn test_equiv_and() {
        let a = read_aag_str("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n", true).unwrap();
        let b = read_aag_str("aag 3 2 0 1 1\n2\n4\n6\n6 4 2\n", true).unwrap();
        check_equivalence_comb(&a, &b).unwrap();
    }

    #[test]
    fn test_equiv_xor() {
        // Two encodings of the xor
        let a = read_aag_str("aag 5 2 0 1 3\n2\n4\n10\n6 2 5\n8 3 4\n10 7 9\n", true).unwrap();
        let b = read_aag_str("aag 5 2 0 1 3\n2\n4\n11\n6 2 4\n8 3 5\n10 7 9\n", true).unwrap();
        check_equivalence_comb(&a, &b).unwrap();
    }

    #[test]
    fn test_not_equiv() {
        let mut a = read_aag_str("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n", true).unwrap();
        let mut b = read_aag_str("aag 3 2 0 1 1\n2\n4\n6\n6 2 5\n", true).unwrap();
        match check_equivalence_comb(&a, &b) {
            Err(EquivError::Different(p)) => {
                assert_ne!(simulate_comb(&mut a, &p), simulate_comb(&mut b, &p));
            }
            _ => panic!("Circuits should differ"),
        }
    }

    #[test]
    fn test_constant() {
        // Undefined variable 2 behaves as constant zero
        let a = read_aag_str("aag 2 1 0 1 0\n2\n4\n", true).unwrap();
        let b = read_aag_str("aag 2 1 0 1 0\n2\n0\n", true).unwrap();
        check_equivalence_comb(&a, &b).unwrap();
        let c = read_aag_str("aag 2 1 0 1 0\n2\n1\n", true).unwrap();
        assert!(matches!(
            check_equivalence_comb(&a, &c),
            Err(EquivError::Different(_))
        ));
    }

    #[test]
    fn test_interface() {
        let a = read_aag_str("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n", true).unwrap();
        let b = read_aag_str("aag 1 1 0 1 0\n2\n2\n", true).unwrap();
        assert!(matches!(
            check_equivalence_comb(&a, &b),
            Err(EquivError::InputCount(2, 1))
        ));
    }
}

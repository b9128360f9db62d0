//! Incremental SAT oracle used to prove equivalences
//!
//! The oracle only needs Tseitin clauses for And and Xor gates, and solving under assumptions.

use rustsat::solvers::{SolveIncremental, SolverResult};
use rustsat::types::{Clause, Lit, TernaryVal, Var};
use rustsat_minisat::core::Minisat;
use thiserror::Error;

/// Error reported by the SAT backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("SAT solver error: {0}")]
pub struct SatError(pub String);

impl SatError {
    pub(crate) fn from_backend<E: std::fmt::Display>(e: E) -> SatError {
        SatError(e.to_string())
    }
}

/// Interface of an incremental SAT solver
pub trait SatOracle {
    /// Create a new variable
    fn new_var(&mut self) -> Var;

    /// Add clauses for `out = (a ^ a_inv) & (b ^ b_inv)`
    fn add_and(&mut self, out: Var, a: Var, a_inv: bool, b: Var, b_inv: bool) -> Result<(), SatError>;

    /// Add clauses for `out = (a ^ a_inv) ^ (b ^ b_inv)`
    fn add_xor(&mut self, out: Var, a: Var, a_inv: bool, b: Var, b_inv: bool) -> Result<(), SatError>;

    /// Force a variable to a value in all future queries
    fn add_unit(&mut self, v: Var, value: bool) -> Result<(), SatError>;

    /// Remove all assumptions
    fn clear_assumptions(&mut self);

    /// Assume a variable is true for the next queries
    fn assume(&mut self, v: Var);

    /// Solve under the current assumptions; return whether the problem is satisfiable
    fn solve(&mut self) -> Result<bool, SatError>;

    /// Value of a variable in the last satisfying assignment
    fn value(&self, v: Var) -> bool;
}

fn lit(v: Var, inv: bool) -> Lit {
    if inv {
        v.neg_lit()
    } else {
        v.pos_lit()
    }
}

/// [`SatOracle`] backed by an incremental solver from the rustsat ecosystem
pub struct RustSatOracle<S> {
    solver: S,
    nb_vars: u32,
    assumptions: Vec<Lit>,
}

/// Default oracle, using Minisat
pub type MinisatOracle = RustSatOracle<Minisat>;

impl<S: Default> Default for RustSatOracle<S> {
    fn default() -> Self {
        RustSatOracle {
            solver: S::default(),
            nb_vars: 0,
            assumptions: Vec::new(),
        }
    }
}

impl<S: SolveIncremental> RustSatOracle<S> {
    fn add(&mut self, lits: &[Lit]) -> Result<(), SatError> {
        self.solver
            .add_clause(Clause::from(lits))
            .map_err(SatError::from_backend)
    }
}

impl<S: SolveIncremental> SatOracle for RustSatOracle<S> {
    fn new_var(&mut self) -> Var {
        let v = Var::new(self.nb_vars);
        self.nb_vars += 1;
        v
    }

    fn add_and(&mut self, out: Var, a: Var, a_inv: bool, b: Var, b_inv: bool) -> Result<(), SatError> {
        let (o, a, b) = (out.pos_lit(), lit(a, a_inv), lit(b, b_inv));
        self.add(&[!o, a])?;
        self.add(&[!o, b])?;
        self.add(&[o, !a, !b])
    }

    fn add_xor(&mut self, out: Var, a: Var, a_inv: bool, b: Var, b_inv: bool) -> Result<(), SatError> {
        let (o, a, b) = (out.pos_lit(), lit(a, a_inv), lit(b, b_inv));
        self.add(&[!a, !b, !o])?;
        self.add(&[a, b, !o])?;
        self.add(&[a, !b, o])?;
        self.add(&[!a, b, o])
    }

    fn add_unit(&mut self, v: Var, value: bool) -> Result<(), SatError> {
        self.add(&[lit(v, !value)])
    }

    fn clear_assumptions(&mut self) {
        self.assumptions.clear();
    }

    fn assume(&mut self, v: Var) {
        self.assumptions.push(v.pos_lit());
    }

    fn solve(&mut self) -> Result<bool, SatError> {
        let res = self
            .solver
            .solve_assumps(&self.assumptions)
            .map_err(SatError::from_backend)?;
        match res {
            SolverResult::Sat => Ok(true),
            SolverResult::Unsat => Ok(false),
            SolverResult::Interrupted => Err(SatError("solver interrupted".to_string())),
        }
    }

    fn value(&self, v: Var) -> bool {
        // Variables that appear in no clause are left unassigned by the solver
        matches!(self.solver.lit_val(v.pos_lit()), Ok(TernaryVal::True))
    }
}

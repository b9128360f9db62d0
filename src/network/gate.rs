//! Gates and variables of the circuit arena, and their simulation state

use core::slice;
use std::collections::VecDeque;
use std::fmt;

use crate::network::literal::Lit;

/// Bit-packed simulation value: one independent test pattern per bit
pub type SimWord = u64;

/// Number of patterns simulated together in a [`SimWord`]
pub const SIM_WIDTH: usize = SimWord::BITS as usize;

/// Number of past simulation words kept by each variable
pub const MAX_SIM_HISTORY: usize = 8;

/// Kind of a circuit variable, with its fanins
///
/// The set of kinds is closed: constant, primary input, primary output, And gate,
/// and a placeholder for variables that are referenced but never defined.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Gate {
    /// Referenced but never defined; simulates as constant zero
    Undefined,
    /// The constant false, always variable 0
    Const,
    /// Primary input
    Input,
    /// Primary output, driven by a single literal
    Output(Lit),
    /// 2-input And gate with optionally inverted inputs
    And([Lit; 2]),
}

impl Gate {
    /// Obtain all literals feeding this gate
    pub fn dependencies(&self) -> &[Lit] {
        use Gate::*;
        match self {
            Undefined | Const | Input => &[],
            Output(s) => slice::from_ref(s),
            And(s) => s,
        }
    }

    /// Obtain the fanin at the given index
    ///
    /// Only And gates and primary outputs have fanins.
    pub fn fanin(&self, idx: usize) -> Lit {
        match self {
            Gate::Output(s) => {
                assert_eq!(idx, 0, "Primary outputs have a single fanin");
                *s
            }
            Gate::And(s) => s[idx],
            _ => panic!("Invalid fanin query on {} gate", self.type_str()),
        }
    }

    /// Returns whether the gate is a 2-input And
    pub fn is_and(&self) -> bool {
        matches!(self, Gate::And(_))
    }

    /// Name of the gate kind, as used in reports
    pub fn type_str(&self) -> &'static str {
        match self {
            Gate::Undefined => "UNDEF",
            Gate::Const => "CONST",
            Gate::Input => "PI",
            Gate::Output(_) => "PO",
            Gate::And(_) => "AIG",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Output(s) => write!(f, "PO({s})"),
            Gate::And([a, b]) => write!(f, "AIG({a}, {b})"),
            _ => write!(f, "{}", self.type_str()),
        }
    }
}

/// Membership of a variable in a group of candidate-equivalent variables
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FecTag {
    /// Index of the group in the current partition
    pub group: usize,
    /// Literal recorded for this variable in the group, giving its relative polarity
    pub lit: Lit,
}

/// A circuit variable with its bookkeeping and simulation state
#[derive(Debug, Clone)]
pub struct Variable {
    pub(crate) gate: Gate,
    pub(crate) ref_count: usize,
    pub(crate) removed: bool,
    pub(crate) symbol: Option<String>,
    pub(crate) line: usize,
    pub(crate) symbol_line: usize,
    pub(crate) topo_order: usize,
    pub(crate) fec: Option<FecTag>,
    pub(crate) value: SimWord,
    pub(crate) dirty: bool,
    pub(crate) history: VecDeque<SimWord>,
}

impl Variable {
    pub(crate) fn new(gate: Gate, line: usize) -> Variable {
        Variable {
            gate,
            ref_count: 0,
            removed: false,
            symbol: None,
            line,
            symbol_line: 0,
            topo_order: 0,
            fec: None,
            value: 0,
            dirty: true,
            history: VecDeque::new(),
        }
    }

    /// Gate kind and fanins
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Number of live consumer edges
    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    /// Whether the variable has been removed from the circuit
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Display name, if any
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// Line of the definition in the source file, or 0
    pub fn line(&self) -> usize {
        self.line
    }

    /// Rank in the last topological numbering
    pub fn topo_order(&self) -> usize {
        self.topo_order
    }

    /// Candidate-equivalence group of the variable, if it has any partner
    pub fn fec(&self) -> Option<FecTag> {
        self.fec
    }

    /// Past simulation words, oldest first
    pub fn history(&self) -> &VecDeque<SimWord> {
        &self.history
    }

    /// Invalidate the memoized simulation value
    ///
    /// Fanins are not invalidated: all variables must be reset before a new simulation.
    pub fn reset_state(&mut self) {
        if matches!(self.gate, Gate::And(_) | Gate::Output(_)) {
            self.dirty = true;
        }
    }

    pub(crate) fn push_history(&mut self) {
        self.history.push_back(self.value);
        if self.history.len() > MAX_SIM_HISTORY {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependencies() {
        let a = Lit::from_var(1);
        let b = !Lit::from_var(2);
        assert!(Gate::Const.dependencies().is_empty());
        assert!(Gate::Input.dependencies().is_empty());
        assert!(Gate::Undefined.dependencies().is_empty());
        assert_eq!(Gate::Output(b).dependencies(), &[b]);
        assert_eq!(Gate::And([a, b]).dependencies(), &[a, b]);
        assert_eq!(Gate::And([a, b]).fanin(1), b);
        assert_eq!(Gate::Output(b).fanin(0), b);
        assert!(Gate::And([a, b]).is_and());
        assert!(!Gate::Output(b).is_and());
    }

    #[test]
    #[should_panic]
    fn test_input_has_no_fanin() {
        Gate::Input.fanin(0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut v = Variable::new(Gate::Input, 0);
        for i in 0..(MAX_SIM_HISTORY as u64 + 3) {
            v.value = i;
            v.push_history();
        }
        assert_eq!(v.history().len(), MAX_SIM_HISTORY);
        assert_eq!(v.history().front(), Some(&3));
        assert_eq!(v.history().back(), Some(&(MAX_SIM_HISTORY as u64 + 2)));
    }

    #[test]
    fn test_display() {
        let g = Gate::And([Lit::from_var(1), !Lit::from_var(2)]);
        assert_eq!(format!("{g}"), "AIG(1, !2)");
        assert_eq!(format!("{}", Gate::Output(Lit::one())), "PO(!0)");
        assert_eq!(format!("{}", Gate::Input), "PI");
    }
}

use core::fmt;

use crate::network::error::{IngestError, Result};
use crate::network::gate::{Gate, SimWord, Variable};
use crate::network::literal::Lit;
use crate::network::traversal;
use crate::sim::fec;

/// Largest number of variables, outputs included, that literals can address
pub(crate) const MAX_VARS: usize = (u32::MAX >> 1) as usize + 1;

/// Combinational And-Inverter Graph, used as the context for all operations
///
/// Variables live in an arena indexed by their id: variable 0 is the constant,
/// ids `1..=max_var` are inputs, And gates or undefined placeholders, and the
/// primary outputs follow at `max_var + 1 + i`.
/// Variables are never deleted; removal is a flag that stays set.
#[derive(Debug, Clone)]
pub struct Circuit {
    max_var: usize,
    pub(crate) vars: Vec<Variable>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    gates: Vec<usize>,
    nb_declared_inputs: usize,
    nb_declared_gates: usize,
    nb_added_outputs: usize,
    pub(crate) rev_ref: Vec<Vec<usize>>,
    pub(crate) fec_groups: Vec<Vec<Lit>>,
    pub(crate) simulated: bool,
    comment: Option<String>,
}

impl Circuit {
    /// Create an empty circuit from the header counts
    ///
    /// Fails for sequential circuits, if `max_var` cannot hold all inputs and gates, or if
    /// there are more variables than literals can address.
    pub fn init(
        max_var: usize,
        nb_inputs: usize,
        nb_latches: usize,
        nb_outputs: usize,
        nb_gates: usize,
    ) -> Result<Circuit> {
        if nb_latches != 0 {
            return Err(IngestError::LatchesUnsupported(nb_latches));
        }
        let nb_vars = max_var
            .checked_add(1)
            .and_then(|n| n.checked_add(nb_outputs))
            .filter(|&n| n <= MAX_VARS);
        let Some(nb_vars) = nb_vars else {
            return Err(IngestError::TooManyVariables {
                max_var,
                outputs: nb_outputs,
            });
        };
        if nb_inputs.checked_add(nb_gates).map_or(true, |n| n > max_var) {
            return Err(IngestError::TooFewVariables {
                max_var,
                inputs: nb_inputs,
                gates: nb_gates,
            });
        }
        let mut vars = Vec::with_capacity(nb_vars);
        vars.push(Variable::new(Gate::Const, 0));
        for _ in 0..max_var {
            vars.push(Variable::new(Gate::Undefined, 0));
        }
        for _ in 0..nb_outputs {
            vars.push(Variable::new(Gate::Output(Lit::zero()), 0));
        }
        Ok(Circuit {
            max_var,
            vars,
            inputs: Vec::with_capacity(nb_inputs),
            outputs: (0..nb_outputs).map(|i| max_var + 1 + i).collect(),
            gates: Vec::with_capacity(nb_gates),
            nb_declared_inputs: nb_inputs,
            nb_declared_gates: nb_gates,
            nb_added_outputs: 0,
            rev_ref: Vec::new(),
            fec_groups: Vec::new(),
            simulated: false,
            comment: None,
        })
    }

    /// Check that a literal addresses a valid variable
    fn check_lit(&self, l: Lit) -> Result<()> {
        if l.var() > self.max_var {
            Err(IngestError::LiteralOutOfRange(l.raw(), self.max_var))
        } else {
            Ok(())
        }
    }

    /// Check that a variable can receive a new definition
    fn check_definition(&self, var: usize) -> Result<()> {
        if var == 0 {
            return Err(IngestError::ConstantRedefined);
        }
        self.check_lit(Lit::from_var(var))?;
        let prev = &self.vars[var];
        if prev.gate != Gate::Undefined {
            return Err(IngestError::Redefinition {
                lit: Lit::from_var(var).raw(),
                kind: prev.gate.type_str(),
                line: prev.line,
            });
        }
        Ok(())
    }

    /// Define a new primary input
    pub fn add_input(&mut self, var: usize) -> Result<()> {
        if self.inputs.len() >= self.nb_declared_inputs {
            return Err(IngestError::TooMany("PI"));
        }
        self.check_definition(var)?;
        self.vars[var].gate = Gate::Input;
        self.vars[var].dirty = false;
        self.inputs.push(var);
        Ok(())
    }

    /// Define a new primary output driven by a literal
    pub fn add_output(&mut self, fanin: Lit) -> Result<()> {
        if self.nb_added_outputs >= self.outputs.len() {
            return Err(IngestError::TooMany("PO"));
        }
        self.check_lit(fanin)?;
        let id = self.outputs[self.nb_added_outputs];
        self.vars[id].gate = Gate::Output(fanin);
        self.nb_added_outputs += 1;
        Ok(())
    }

    /// Define a new And gate
    pub fn add_gate(&mut self, var: usize, fanin0: Lit, fanin1: Lit) -> Result<()> {
        if self.gates.len() >= self.nb_declared_gates {
            return Err(IngestError::TooMany("AIG"));
        }
        self.check_definition(var)?;
        self.check_lit(fanin0)?;
        self.check_lit(fanin1)?;
        if fanin0.var() == var || fanin1.var() == var {
            return Err(IngestError::SelfLoop(var));
        }
        self.vars[var].gate = Gate::And([fanin0, fanin1]);
        self.vars[var].dirty = true;
        self.gates.push(var);
        Ok(())
    }

    /// Record the source line of a definition, used in error messages and reports
    pub(crate) fn set_line(&mut self, var: usize, line: usize) {
        self.vars[var].line = line;
    }

    /// Bind a display name to a primary input
    pub fn set_input_symbol(&mut self, index: usize, name: &str, line: usize) -> Result<()> {
        let Some(&var) = self.inputs.get(index) else {
            return Err(IngestError::InvalidSymbolIndex { kind: "PI", index });
        };
        self.set_symbol(var, "PI", index, name, line)
    }

    /// Bind a display name to a primary output
    pub fn set_output_symbol(&mut self, index: usize, name: &str, line: usize) -> Result<()> {
        if index >= self.nb_added_outputs {
            return Err(IngestError::InvalidSymbolIndex { kind: "PO", index });
        }
        self.set_symbol(self.outputs[index], "PO", index, name, line)
    }

    fn set_symbol(
        &mut self,
        var: usize,
        kind: &'static str,
        index: usize,
        name: &str,
        line: usize,
    ) -> Result<()> {
        let v = &mut self.vars[var];
        if v.symbol.is_some() {
            return Err(IngestError::DuplicateSymbol {
                kind,
                index,
                line: v.symbol_line,
            });
        }
        if name.is_empty() || name.chars().any(char::is_control) {
            return Err(IngestError::InvalidSymbolName);
        }
        v.symbol = Some(name.to_string());
        v.symbol_line = line;
        Ok(())
    }

    /// Set the free-text comment exported after the circuit
    pub fn set_comment(&mut self, comment: String) {
        self.comment = Some(comment);
    }

    /// Complete the construction once all definitions are added
    ///
    /// Undefined variables stay as placeholders. Reference counts, the reverse-reference
    /// index and the initial candidate-equivalence group are computed. Trivial gates are
    /// collapsed and unused gates removed if `optimize` is set.
    pub fn finish_ingest(&mut self, optimize: bool) -> Result<()> {
        if self.inputs.len() != self.nb_declared_inputs {
            return Err(IngestError::Missing("PI"));
        }
        if self.nb_added_outputs != self.outputs.len() {
            return Err(IngestError::Missing("PO"));
        }
        if self.gates.len() != self.nb_declared_gates {
            return Err(IngestError::Missing("AIG"));
        }
        self.recompute_ref_counts();
        if optimize {
            self.normalize();
        } else {
            self.build_rev_ref();
        }
        fec::init_groups(self);
        Ok(())
    }

    /// Return the maximum variable index
    pub fn max_var(&self) -> usize {
        self.max_var
    }

    /// Return the number of variables in the arena, outputs included
    pub fn nb_vars(&self) -> usize {
        self.vars.len()
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Return the number of And gates defined, removed ones included
    pub fn nb_gates(&self) -> usize {
        self.gates.len()
    }

    /// Return the number of And gates that are not removed
    pub fn nb_live_gates(&self) -> usize {
        self.live_gates().count()
    }

    /// Variable index of the input at index i
    pub fn input(&self, i: usize) -> usize {
        self.inputs[i]
    }

    /// Variable indices of all primary inputs
    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    /// Variable index of the output at index i
    pub fn output(&self, i: usize) -> usize {
        self.outputs[i]
    }

    /// Variable indices of all primary outputs
    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    /// Literal driving the output at index i
    pub fn output_fanin(&self, i: usize) -> Lit {
        self.gate(self.outputs[i]).fanin(0)
    }

    /// And gates in definition order, removed ones included
    pub fn gate_ids(&self) -> &[usize] {
        &self.gates
    }

    /// And gates that are not removed, in definition order
    pub fn live_gates(&self) -> impl Iterator<Item = usize> + '_ {
        self.gates
            .iter()
            .copied()
            .filter(|&g| !self.vars[g].removed && self.vars[g].gate.is_and())
    }

    /// Get the variable at index i
    pub fn var(&self, i: usize) -> &Variable {
        &self.vars[i]
    }

    /// Get the gate at index i
    pub fn gate(&self, i: usize) -> &Gate {
        &self.vars[i].gate
    }

    /// Returns whether the variable at index i is a live And gate
    pub fn is_live_and(&self, i: usize) -> bool {
        self.vars[i].gate.is_and() && !self.vars[i].removed
    }

    /// Consumers of a variable in the last reverse-reference index
    ///
    /// A consumer appears twice if it uses the variable through both fanins.
    pub fn rev_ref(&self, i: usize) -> &[usize] {
        self.rev_ref.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Comment attached to the circuit, if any
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Replace a fanin of an And gate or primary output
    ///
    /// The memoized simulation value is invalidated and the reverse-reference index,
    /// if built, follows the new edge.
    pub fn set_fanin(&mut self, v: usize, idx: usize, l: Lit) {
        assert!(l.var() <= self.max_var, "Invalid literal {l}");
        let old = match &mut self.vars[v].gate {
            Gate::And(s) => std::mem::replace(&mut s[idx], l),
            Gate::Output(s) => {
                assert_eq!(idx, 0, "Primary outputs have a single fanin");
                std::mem::replace(s, l)
            }
            g => panic!("Invalid fanin update on {} gate", g.type_str()),
        };
        self.vars[v].reset_state();
        if old.var() != l.var() && !self.rev_ref.is_empty() {
            let consumers = &mut self.rev_ref[old.var()];
            if let Some(pos) = consumers.iter().position(|&c| c == v) {
                consumers.swap_remove(pos);
            }
            self.rev_ref[l.var()].push(v);
        }
    }

    /// Make all users of a variable use another literal instead
    ///
    /// Users are found through the reverse-reference index, and the inversion of each use is
    /// kept.
    pub fn replace_uses(&mut self, old: usize, new: Lit) {
        let users = self.rev_ref(old).to_vec();
        for u in users {
            for idx in 0..self.gate(u).dependencies().len() {
                let l = self.gate(u).fanin(idx);
                if l.var() == old {
                    self.set_fanin(u, idx, new ^ l.is_inverted());
                }
            }
        }
    }

    /// Set the simulation word of the input at index i
    pub fn set_input_word(&mut self, i: usize, word: SimWord) {
        let v = self.inputs[i];
        self.vars[v].value = word;
    }

    /// Invalidate all memoized simulation values
    pub fn reset_simulation(&mut self) {
        for v in self.vars.iter_mut() {
            v.reset_state();
        }
    }

    /// Value of a literal, from the memoized value of its variable
    fn lit_word(&self, l: Lit) -> SimWord {
        let w = self.vars[l.var()].value;
        if l.is_inverted() {
            !w
        } else {
            w
        }
    }

    /// Evaluate a variable for the current input words
    ///
    /// Values are memoized until the next [`Circuit::reset_simulation`]; only the
    /// dirty part of the fanin cone is recomputed.
    pub fn evaluate(&mut self, v: usize) -> SimWord {
        let mut stack = vec![v];
        while let Some(&top) = stack.last() {
            if !self.vars[top].dirty {
                stack.pop();
                continue;
            }
            let mut ready = true;
            for s in self.vars[top].gate.dependencies() {
                if self.vars[s.var()].dirty {
                    stack.push(s.var());
                    ready = false;
                }
            }
            if !ready {
                continue;
            }
            let value = match self.vars[top].gate {
                Gate::And([a, b]) => self.lit_word(a) & self.lit_word(b),
                Gate::Output(a) => self.lit_word(a),
                Gate::Input => self.vars[top].value,
                Gate::Const | Gate::Undefined => 0,
            };
            let var = &mut self.vars[top];
            var.value = value;
            var.dirty = false;
            stack.pop();
        }
        self.vars[v].value
    }

    /// Evaluate a literal for the current input words
    pub fn evaluate_lit(&mut self, l: Lit) -> SimWord {
        self.evaluate(l.var());
        self.lit_word(l)
    }

    /// Evaluate all outputs for the current input words
    pub fn evaluate_outputs(&mut self) -> Vec<SimWord> {
        (0..self.nb_outputs())
            .map(|o| self.evaluate(self.outputs[o]))
            .collect()
    }

    /// Check consistency of the datastructure
    ///
    /// Panics if the graph is cyclic, if a literal is out of range, if a removed variable
    /// is still used, or if the reference counts or topological order are stale.
    pub fn check(&self) {
        for v in self.vars.iter() {
            if v.removed {
                continue;
            }
            for s in v.gate.dependencies() {
                assert!(s.var() <= self.max_var, "Invalid literal {s}");
                assert!(!self.vars[s.var()].removed, "Removed variable {} is used", s.var());
            }
        }
        assert!(traversal::is_acyclic(self), "The circuit contains a combinational loop");
        let mut counts = vec![0usize; self.nb_vars()];
        for v in self.vars.iter() {
            if v.removed || !matches!(v.gate, Gate::And(_) | Gate::Output(_)) {
                continue;
            }
            for s in v.gate.dependencies() {
                counts[s.var()] += 1;
            }
        }
        for (i, v) in self.vars.iter().enumerate() {
            if !v.removed {
                assert_eq!(v.ref_count, counts[i], "Invalid reference count for {i}");
            }
        }
        let reachable = traversal::reachable_from_outputs(self);
        for (i, v) in self.vars.iter().enumerate() {
            if !reachable[i] || !v.gate.is_and() {
                continue;
            }
            for s in v.gate.dependencies() {
                assert!(
                    self.vars[s.var()].topo_order < v.topo_order,
                    "Invalid topological order between {} and {i}",
                    s.var()
                );
            }
        }
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit with {} inputs, {} outputs:",
            self.nb_inputs(),
            self.nb_outputs()
        )?;
        for i in self.live_gates() {
            writeln!(f, "\t{} = {}", Lit::from_var(i), self.gate(i))?;
        }
        for i in 0..self.nb_outputs() {
            writeln!(f, "\to{} = {}", i, self.output_fanin(i))?;
        }
        Ok(())
    }
}

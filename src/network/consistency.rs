//! Bookkeeping that keeps the circuit consistent after structural changes

use std::convert::Infallible;

use crate::network::circuit::Circuit;
use crate::network::gate::Gate;
use crate::network::literal::Lit;
use crate::network::traversal::{post_order, PostOrder};

/// Simplified form of an And gate with the given fanins, if it is trivial
fn trivial_replacement(a: Lit, b: Lit) -> Option<Lit> {
    if a == b {
        Some(a)
    } else if a == !b || a == Lit::zero() || b == Lit::zero() {
        Some(Lit::zero())
    } else if a == Lit::one() {
        Some(b)
    } else if b == Lit::one() {
        Some(a)
    } else {
        None
    }
}

impl Circuit {
    /// Recompute the reference count of every variable
    ///
    /// Each live And gate counts once per fanin, so that a gate using the same variable
    /// twice counts twice. Each output counts once.
    pub fn recompute_ref_counts(&mut self) {
        for v in self.vars.iter_mut() {
            v.ref_count = 0;
        }
        for i in 0..self.nb_vars() {
            let v = &self.vars[i];
            if v.removed || !matches!(v.gate, Gate::And(_) | Gate::Output(_)) {
                continue;
            }
            let gate = v.gate;
            for s in gate.dependencies() {
                self.vars[s.var()].ref_count += 1;
            }
        }
    }

    /// Remove And gates that are not used anymore, and return how many were removed
    ///
    /// Removal cascades to fanins whose reference count drops to zero.
    pub fn eliminate_dead_gates(&mut self) -> usize {
        let mut worklist: Vec<usize> = self
            .live_gates()
            .filter(|&g| self.vars[g].ref_count == 0)
            .collect();
        let mut nb_removed = 0;
        while let Some(g) = worklist.pop() {
            if self.vars[g].removed {
                continue;
            }
            log::debug!("Removing unused gate {g}");
            let var = &mut self.vars[g];
            var.removed = true;
            var.fec = None;
            nb_removed += 1;
            let gate = var.gate;
            for s in gate.dependencies() {
                let d = &mut self.vars[s.var()];
                d.ref_count = d.ref_count.saturating_sub(1);
                if d.ref_count == 0 && d.gate.is_and() && !d.removed {
                    worklist.push(s.var());
                }
            }
        }
        nb_removed
    }

    /// Collapse And gates that are trivially constant or equal to one of their fanins
    ///
    /// Collapsed gates are bypassed by all their users, with the inversion of each use
    /// applied to the replacement. They become unused but are not removed. Returns the number
    /// of collapsed gates.
    pub fn collapse_trivial(&mut self) -> usize {
        let mut visit = PostOrder::new(self);
        let mut nb_collapsed = 0;
        let mut on_complete = |c: &mut Circuit, p: &mut PostOrder, v: usize| {
            if let Gate::And([a, b]) = *c.gate(v) {
                if let Some(r) = trivial_replacement(a, b) {
                    log::debug!("Collapsing trivial gate {v} = {} into {r}", c.gate(v));
                    p.redirect(v, r);
                    nb_collapsed += 1;
                }
            }
            Ok::<(), Infallible>(())
        };
        // Unused gates are rewritten too, so that no stale use of a collapsed gate remains
        let roots: Vec<usize> = self
            .outputs()
            .iter()
            .copied()
            .chain(self.live_gates())
            .collect();
        for r in roots {
            if let Err(e) = visit.visit(self, r, &mut on_complete) {
                match e {}
            }
        }
        nb_collapsed
    }

    /// Rebuild the reverse-reference index and the topological order
    ///
    /// Only variables reachable from the outputs are numbered; the others keep order 0.
    pub fn build_rev_ref(&mut self) {
        let order = post_order(self);
        self.rev_ref = vec![Vec::new(); self.nb_vars()];
        for v in self.vars.iter_mut() {
            v.topo_order = 0;
        }
        for (rank, &v) in order.iter().enumerate() {
            self.vars[v].topo_order = rank + 1;
            let gate = self.vars[v].gate;
            for s in gate.dependencies() {
                self.rev_ref[s.var()].push(v);
            }
        }
    }

    /// Restore all invariants after the graph was rewritten
    ///
    /// Collapses trivial gates, removes unused gates, and rebuilds the reference counts,
    /// the reverse-reference index and the topological order. Returns the number of
    /// removed gates.
    pub fn normalize(&mut self) -> usize {
        self.recompute_ref_counts();
        let nb_collapsed = self.collapse_trivial();
        if nb_collapsed != 0 {
            self.recompute_ref_counts();
        }
        let nb_removed = self.eliminate_dead_gates();
        self.build_rev_ref();
        if nb_collapsed != 0 || nb_removed != 0 {
            log::info!("Collapsed {nb_collapsed} trivial gates, removed {nb_removed} unused gates");
        }
        nb_removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(max_var: usize, nb_inputs: usize, outputs: &[u32], gates: &[(usize, u32, u32)]) -> Circuit {
        let mut c = Circuit::init(max_var, nb_inputs, 0, outputs.len(), gates.len()).unwrap();
        for i in 1..=nb_inputs {
            c.add_input(i).unwrap();
        }
        for &o in outputs {
            c.add_output(Lit::from_raw(o)).unwrap();
        }
        for &(v, a, b) in gates {
            c.add_gate(v, Lit::from_raw(a), Lit::from_raw(b)).unwrap();
        }
        c.finish_ingest(false).unwrap();
        c
    }

    #[test]
    fn test_trivial_replacement() {
        let x = Lit::from_var(3);
        assert_eq!(trivial_replacement(x, x), Some(x));
        assert_eq!(trivial_replacement(x, !x), Some(Lit::zero()));
        assert_eq!(trivial_replacement(x, Lit::zero()), Some(Lit::zero()));
        assert_eq!(trivial_replacement(Lit::one(), x), Some(x));
        assert_eq!(trivial_replacement(!x, Lit::one()), Some(!x));
        assert_eq!(trivial_replacement(x, Lit::from_var(4)), None);
    }

    #[test]
    fn test_self_and() {
        // 3 = 1 & 1, output !3
        let mut c = build(3, 2, &[7], &[(3, 2, 2)]);
        assert_eq!(c.nb_live_gates(), 1);
        let removed = c.normalize();
        assert_eq!(removed, 1);
        assert_eq!(c.nb_live_gates(), 0);
        assert_eq!(c.output_fanin(0), !Lit::from_var(1));
        c.check();
    }

    #[test]
    fn test_complementary_and() {
        // 3 = 1 & !1, 4 = 3 & 2, output 4
        let mut c = build(4, 2, &[8], &[(3, 2, 3), (4, 6, 4)]);
        c.normalize();
        assert_eq!(c.nb_live_gates(), 0);
        assert_eq!(c.output_fanin(0), Lit::zero());
        c.check();
    }

    #[test]
    fn test_constant_one() {
        // 3 = !0 & !2, output 3
        let mut c = build(3, 2, &[6], &[(3, 1, 5)]);
        c.normalize();
        assert_eq!(c.output_fanin(0), !Lit::from_var(2));
        assert_eq!(c.var(2).ref_count(), 1);
        c.check();
    }

    #[test]
    fn test_dead_gates() {
        // 3 = 1 & 2, 4 = 3 & !1 unused, 5 = 3 & 2, output 5
        let mut c = build(5, 2, &[10], &[(3, 2, 4), (4, 6, 3), (5, 6, 4)]);
        c.recompute_ref_counts();
        assert_eq!(c.var(3).ref_count(), 2);
        assert_eq!(c.var(2).ref_count(), 2);
        assert_eq!(c.eliminate_dead_gates(), 1);
        assert!(c.var(4).is_removed());
        assert_eq!(c.var(3).ref_count(), 1);
        assert_eq!(c.var(1).ref_count(), 1);
        // No-op once all gates are used
        assert_eq!(c.eliminate_dead_gates(), 0);
        c.build_rev_ref();
        c.check();
        let reachable = crate::network::traversal::reachable_from_outputs(&c);
        assert!(c.live_gates().all(|g| reachable[g]));
    }

    #[test]
    fn test_cascade() {
        // 3 = 1 & 2, 4 = 3 & 1, both unused
        let mut c = build(4, 2, &[2], &[(3, 2, 4), (4, 6, 2)]);
        c.recompute_ref_counts();
        assert_eq!(c.eliminate_dead_gates(), 2);
        assert_eq!(c.nb_live_gates(), 0);
    }

    #[test]
    fn test_topo_order() {
        let mut c = build(5, 2, &[10, 9], &[(3, 2, 4), (4, 6, 3), (5, 6, 4)]);
        c.normalize();
        let order = |v: usize| c.var(v).topo_order();
        assert!(order(1) < order(3));
        assert!(order(2) < order(3));
        assert!(order(3) < order(4));
        assert!(order(3) < order(5));
        assert_eq!(c.rev_ref(3), &[5, 4]);
        assert_eq!(c.rev_ref(1), &[3, 4]);
    }
}

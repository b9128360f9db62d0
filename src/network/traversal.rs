//! Depth-first traversals of the circuit, using explicit stacks

use crate::network::circuit::Circuit;
use crate::network::literal::Lit;

/// Post-order traversal that rewrites fanins as it goes
///
/// Each variable is completed at most once. When a variable completes, the fanins of
/// And gates and outputs are first replaced through the redirections recorded so far,
/// then the callback is called on it. Callbacks may redirect the variable itself,
/// or any variable already completed.
pub(crate) struct PostOrder {
    visited: Vec<bool>,
    mapped: Vec<Lit>,
    stack: Vec<(usize, bool)>,
}

impl PostOrder {
    pub fn new(c: &Circuit) -> PostOrder {
        PostOrder {
            visited: vec![false; c.nb_vars()],
            mapped: (0..c.nb_vars()).map(Lit::from_var).collect(),
            stack: Vec::new(),
        }
    }

    /// Redirect all future references to a variable
    pub fn redirect(&mut self, v: usize, l: Lit) {
        debug_assert_ne!(l.var(), v);
        self.mapped[v] = l;
    }

    /// Returns whether a variable has been redirected
    pub fn is_redirected(&self, v: usize) -> bool {
        self.mapped[v].var() != v
    }

    /// Resolve a literal through the redirections
    ///
    /// Redirections form chains, always ending on a variable that is not redirected.
    pub fn resolve(&self, l: Lit) -> Lit {
        let mut ret = l;
        while self.mapped[ret.var()].var() != ret.var() {
            ret = self.mapped[ret.var()] ^ ret.is_inverted();
        }
        ret
    }

    /// Visit the fanin cone of a variable
    pub fn visit<E, F>(&mut self, c: &mut Circuit, root: usize, on_complete: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut Circuit, &mut PostOrder, usize) -> Result<(), E>,
    {
        self.stack.push((root, false));
        while let Some((v, expanded)) = self.stack.pop() {
            if !expanded {
                if self.visited[v] {
                    continue;
                }
                debug_assert!(!c.var(v).is_removed(), "Removed variable {v} is revisited");
                self.visited[v] = true;
                self.stack.push((v, true));
                // Reversed so that fanin 0 completes first
                for s in c.gate(v).dependencies().iter().rev() {
                    if !self.visited[s.var()] {
                        self.stack.push((s.var(), false));
                    }
                }
                continue;
            }
            let nb_fanins = c.gate(v).dependencies().len();
            for i in 0..nb_fanins {
                let l = c.gate(v).fanin(i);
                let r = self.resolve(l);
                if r != l {
                    c.set_fanin(v, i, r);
                }
            }
            on_complete(c, self, v)?;
        }
        Ok(())
    }

    /// Visit the fanin cones of all outputs, in order
    pub fn visit_outputs<E, F>(&mut self, c: &mut Circuit, on_complete: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut Circuit, &mut PostOrder, usize) -> Result<(), E>,
    {
        for o in 0..c.nb_outputs() {
            let root = c.output(o);
            self.visit(c, root, on_complete)?;
        }
        Ok(())
    }
}

/// Order of completion of a depth-first search from the outputs
///
/// Each variable reachable from an output appears once, after all its fanins.
pub fn post_order(c: &Circuit) -> Vec<usize> {
    let mut visited = vec![false; c.nb_vars()];
    let mut order = Vec::new();
    let mut stack = Vec::new();
    for &root in c.outputs() {
        stack.push((root, false));
        while let Some((v, expanded)) = stack.pop() {
            if expanded {
                order.push(v);
                continue;
            }
            if visited[v] {
                continue;
            }
            visited[v] = true;
            stack.push((v, true));
            for s in c.gate(v).dependencies().iter().rev() {
                if !visited[s.var()] {
                    stack.push((s.var(), false));
                }
            }
        }
    }
    order
}

/// Flags of the variables reachable from the outputs
pub fn reachable_from_outputs(c: &Circuit) -> Vec<bool> {
    let mut ret = vec![false; c.nb_vars()];
    for v in post_order(c) {
        ret[v] = true;
    }
    ret
}

/// Returns whether no variable reachable from an output is its own ancestor
///
/// A variable is on a cycle if it is found again while on the current search path.
pub fn is_acyclic(c: &Circuit) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        New,
        OnPath,
        Done,
    }
    let mut state = vec![State::New; c.nb_vars()];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for &root in c.outputs() {
        if state[root] != State::New {
            continue;
        }
        state[root] = State::OnPath;
        stack.push((root, 0));
        while let Some((v, i)) = stack.pop() {
            let deps = c.gate(v).dependencies();
            if i == deps.len() {
                state[v] = State::Done;
                continue;
            }
            stack.push((v, i + 1));
            let s = deps[i].var();
            match state[s] {
                State::OnPath => return false,
                State::New => {
                    state[s] = State::OnPath;
                    stack.push((s, 0));
                }
                State::Done => (),
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::gate::Gate;

    /// Inputs 1, 2; gates 3 = 1 & 2, 4 = 3 & !1, 5 = 3 & 2; outputs 4 and !5
    fn chain() -> Circuit {
        let mut c = Circuit::init(5, 2, 0, 2, 3).unwrap();
        c.add_input(1).unwrap();
        c.add_input(2).unwrap();
        c.add_output(Lit::from_var(4)).unwrap();
        c.add_output(!Lit::from_var(5)).unwrap();
        c.add_gate(3, Lit::from_var(1), Lit::from_var(2)).unwrap();
        c.add_gate(4, Lit::from_var(3), !Lit::from_var(1)).unwrap();
        c.add_gate(5, Lit::from_var(3), Lit::from_var(2)).unwrap();
        c.finish_ingest(false).unwrap();
        c
    }

    #[test]
    fn test_post_order() {
        let c = chain();
        let order = post_order(&c);
        assert_eq!(order, vec![1, 2, 3, 4, 6, 5, 7]);
        let reachable = reachable_from_outputs(&c);
        assert!(reachable[0..8].iter().skip(1).all(|&r| r));
        assert!(!reachable[0]);
        assert!(is_acyclic(&c));
    }

    #[test]
    fn test_cycle() {
        let mut c = chain();
        c.set_fanin(3, 1, Lit::from_var(5));
        assert!(!is_acyclic(&c));
    }

    #[test]
    fn test_redirect() {
        let mut c = chain();
        let mut visit = PostOrder::new(&c);
        let mut completed = Vec::new();
        visit
            .visit_outputs(&mut c, &mut |c: &mut Circuit, p: &mut PostOrder, v| {
                completed.push(v);
                if v == 4 {
                    // Redirect 5 to !4 before it is completed
                    p.redirect(5, !Lit::from_var(4));
                }
                let ret: Result<(), ()> = Ok(());
                assert!(!c.var(v).is_removed());
                ret
            })
            .unwrap();
        assert_eq!(completed.len(), 7);
        // Output 1 was !5 and is now 4
        assert_eq!(c.output_fanin(1), Lit::from_var(4));
        assert_eq!(visit.resolve(Lit::from_var(5)), !Lit::from_var(4));
        assert_eq!(visit.resolve(!Lit::from_var(5)), Lit::from_var(4));
        assert_eq!(c.gate(5), &Gate::And([Lit::from_var(3), Lit::from_var(2)]));
    }

    #[test]
    fn test_visit_topo_order() {
        // Completion follows the topological order, redirections included
        let mut c = chain();
        let mut visit = PostOrder::new(&c);
        let mut orders = Vec::new();
        visit
            .visit_outputs(&mut c, &mut |c: &mut Circuit, p: &mut PostOrder, v| {
                orders.push(c.var(v).topo_order());
                if v == 3 {
                    p.redirect(4, Lit::from_var(3));
                }
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(orders, (1..=7).collect::<Vec<usize>>());
    }

    #[test]
    fn test_resolve_chain() {
        let c = chain();
        let mut visit = PostOrder::new(&c);
        visit.redirect(5, !Lit::from_var(4));
        visit.redirect(4, Lit::from_var(3));
        assert_eq!(visit.resolve(Lit::from_var(5)), !Lit::from_var(3));
        assert_eq!(visit.resolve(Lit::one()), Lit::one());
    }
}

//! Groups of candidate-equivalent gates, refined by simulation
//!
//! Gates whose simulated values are identical, or complementary, on every pattern seen so far
//! are kept together. Each member is recorded as a literal: two members are candidates for
//! equivalence when their recorded literals have the same polarity, and for complementation
//! otherwise.

use fxhash::FxHashMap;

use crate::network::gate::{FecTag, SimWord};
use crate::network::{Circuit, Lit};

impl Circuit {
    /// Current groups of candidate-equivalent gates
    pub fn fec_groups(&self) -> &[Vec<Lit>] {
        &self.fec_groups
    }

    /// Returns whether the groups were refined by at least one simulation
    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    /// Other members of the group of a variable, with their polarity relative to it
    pub fn fec_partners(&self, v: usize) -> Vec<Lit> {
        let Some(tag) = self.var(v).fec() else {
            return Vec::new();
        };
        self.fec_groups[tag.group]
            .iter()
            .filter(|m| m.var() != v && !self.var(m.var()).is_removed())
            .map(|m| *m ^ tag.lit.is_inverted())
            .collect()
    }

    /// Replace the groups, updating the tag of every variable
    fn set_fec_groups(&mut self, groups: Vec<Vec<Lit>>) {
        for g in self.fec_groups.iter() {
            for m in g {
                self.vars[m.var()].fec = None;
            }
        }
        for (i, g) in groups.iter().enumerate() {
            for m in g {
                self.vars[m.var()].fec = Some(FecTag { group: i, lit: *m });
            }
        }
        self.fec_groups = groups;
    }
}

/// Put all live And gates in a single group
pub(crate) fn init_groups(c: &mut Circuit) {
    let members: Vec<Lit> = c.live_gates().map(Lit::from_var).collect();
    let groups = if members.len() > 1 {
        vec![members]
    } else {
        Vec::new()
    };
    c.set_fec_groups(groups);
    c.simulated = false;
}

/// Split the groups according to the last simulated values
///
/// Members are bucketed by value, a member whose value is the complement of an existing
/// bucket joining it with its polarity flipped. Buckets keep the order in which they are
/// first seen, and buckets with a single member are dropped. Removed members are skipped.
/// Returns whether any group was split or lost a live member.
pub fn refine_groups(c: &mut Circuit) -> bool {
    let nb_groups_before = c.fec_groups.len();
    let nb_members_before = c
        .fec_groups
        .iter()
        .flatten()
        .filter(|m| !c.var(m.var()).is_removed())
        .count();
    let mut new_groups = Vec::new();
    for group in c.fec_groups.iter() {
        let mut buckets: Vec<Vec<Lit>> = Vec::new();
        let mut index: FxHashMap<SimWord, usize> = FxHashMap::default();
        for m in group {
            let var = m.var();
            if c.var(var).is_removed() {
                continue;
            }
            let value = c.var(var).value;
            let l = Lit::from_var(var);
            if let Some(&b) = index.get(&value) {
                buckets[b].push(l);
            } else if let Some(&b) = index.get(&!value) {
                buckets[b].push(!l);
            } else {
                index.insert(value, buckets.len());
                buckets.push(vec![l]);
            }
        }
        new_groups.extend(buckets.into_iter().filter(|b| b.len() > 1));
    }
    let nb_members_after: usize = new_groups.iter().map(Vec::len).sum();
    let changed = new_groups.len() > nb_groups_before || nb_members_after < nb_members_before;
    c.set_fec_groups(new_groups);
    c.simulated = true;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_aag_str;

    #[test]
    fn test_init() {
        // 3 = 1 & 2, 4 = !1 & !2, 5 = 3 & 4
        let aag = "aag 5 2 0 1 3\n2\n4\n10\n6 2 4\n8 3 5\n10 6 8\n";
        let c = read_aag_str(aag, true).unwrap();
        assert_eq!(c.fec_groups().len(), 1);
        assert_eq!(
            c.fec_groups()[0],
            vec![Lit::from_var(3), Lit::from_var(4), Lit::from_var(5)]
        );
        assert_eq!(c.var(4).fec().unwrap().group, 0);
        assert_eq!(c.fec_partners(3), vec![Lit::from_var(4), Lit::from_var(5)]);
    }

    #[test]
    fn test_refine() {
        // 3 = 1 & 2, 4 = !1 & !2, 5 = 3 & 4, 6 = !3 & 2
        let aag = "aag 6 2 0 2 4\n2\n4\n10\n12\n6 2 4\n8 3 5\n10 6 8\n12 7 4\n";
        let mut c = read_aag_str(aag, true).unwrap();
        assert_eq!(c.fec_groups()[0].len(), 4);
        c.set_input_word(0, 0b1100);
        c.set_input_word(1, 0b1010);
        c.reset_simulation();
        for g in [3, 4, 5, 6] {
            c.evaluate(g);
        }
        assert!(refine_groups(&mut c));
        // All values are distinct, even up to complement
        assert!(c.fec_groups().is_empty());
        assert!(c.var(3).fec().is_none());
        // Nothing left to split
        assert!(!refine_groups(&mut c));
    }

    #[test]
    fn test_refine_after_removal() {
        // 3 = 1 & 2, 4 = 2 & 1, 5 = 1 & 2, all equivalent
        let aag = "aag 5 2 0 3 3\n2\n4\n6\n8\n10\n6 2 4\n8 4 2\n10 2 4\n";
        let mut c = read_aag_str(aag, true).unwrap();
        c.set_input_word(0, 0b1100);
        c.set_input_word(1, 0b1010);
        c.reset_simulation();
        for g in [3, 4, 5] {
            c.evaluate(g);
        }
        assert!(!refine_groups(&mut c));
        // A merged member is not a refinement
        c.replace_uses(5, Lit::from_var(3));
        c.normalize();
        assert!(c.var(5).is_removed());
        assert!(!refine_groups(&mut c));
        assert_eq!(c.fec_groups(), &[vec![Lit::from_var(3), Lit::from_var(4)]]);
    }

    #[test]
    fn test_refine_complement() {
        // 3 = 1 & 2, 5 = !1 & 2, 6 = 1 & !2, 7 = !5 & !6 is the xnor of 1 and 2
        let aag = "aag 7 2 0 3 4\n2\n4\n6\n14\n15\n6 2 4\n10 3 4\n12 2 5\n14 11 13\n";
        let mut c = read_aag_str(aag, true).unwrap();
        c.set_input_word(0, 0);
        c.set_input_word(1, !0);
        c.reset_simulation();
        for g in [3, 5, 6, 7] {
            c.evaluate(g);
        }
        refine_groups(&mut c);
        // 3 = 0, 5 = 1, 6 = 0, 7 = 0: 3, 6, 7 equal, 5 is their complement
        assert_eq!(c.fec_groups().len(), 1);
        assert_eq!(
            c.fec_groups()[0],
            vec![
                Lit::from_var(3),
                !Lit::from_var(5),
                Lit::from_var(6),
                Lit::from_var(7)
            ]
        );
        assert_eq!(c.fec_partners(5)[0], !Lit::from_var(3));
    }
}

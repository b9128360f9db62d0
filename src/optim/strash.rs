//! Structural hashing: merge And gates with the same fanins

use std::collections::hash_map::Entry;
use std::convert::Infallible;

use fxhash::FxHashMap;

use crate::network::traversal::PostOrder;
use crate::network::{Circuit, Gate, Lit};

/// Merge And gates that have identical fanins, in any order; return the number of merged gates
///
/// Gates are visited in post-order from the outputs, so that their fanins are already merged.
/// The first gate seen with a given pair of fanins is kept, and the later ones are redirected
/// to it. The circuit is normalized afterwards.
pub fn strash(c: &mut Circuit) -> usize {
    let mut table: FxHashMap<(Lit, Lit), usize> = FxHashMap::default();
    let mut visit = PostOrder::new(c);
    let mut nb_merged = 0;
    let res = visit.visit_outputs(c, &mut |c: &mut Circuit, p: &mut PostOrder, v: usize| {
        if let Gate::And([a, b]) = *c.gate(v) {
            let key = if a <= b { (a, b) } else { (b, a) };
            match table.entry(key) {
                Entry::Occupied(e) => {
                    let survivor = *e.get();
                    log::debug!("strash: merging {v} into {survivor}");
                    p.redirect(v, Lit::from_var(survivor));
                    nb_merged += 1;
                }
                Entry::Vacant(e) => {
                    e.insert(v);
                }
            }
        }
        Ok::<(), Infallible>(())
    });
    if let Err(e) = res {
        match e {}
    }
    let nb_removed = c.normalize();
    log::info!("strash: {nb_merged} gates merged, {nb_removed} gates removed");
    nb_merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_aag_str;
    use crate::sim::exhaustive::output_truth_tables;

    #[test]
    fn test_duplicate() {
        // 3 = 1 & 2, 4 = 2 & 1, outputs 3 and !4
        let aag = "aag 4 2 0 2 2\n2\n4\n6\n9\n6 2 4\n8 4 2\n";
        let mut c = read_aag_str(aag, true).unwrap();
        assert_eq!(strash(&mut c), 1);
        assert_eq!(c.nb_live_gates(), 1);
        assert!(c.var(4).is_removed());
        assert_eq!(c.output_fanin(0), Lit::from_var(3));
        assert_eq!(c.output_fanin(1), !Lit::from_var(3));
        c.check();
        // Idempotent
        assert_eq!(strash(&mut c), 0);
        assert_eq!(c.nb_live_gates(), 1);
    }

    #[test]
    fn test_polarity() {
        // 3 = 1 & !2 and 4 = 1 & 2 are different
        let aag = "aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 5\n8 2 4\n";
        let mut c = read_aag_str(aag, true).unwrap();
        assert_eq!(strash(&mut c), 0);
        assert_eq!(c.nb_live_gates(), 2);
    }

    #[test]
    fn test_cascade() {
        // 3 = 1 & 2, 4 = 1 & 2, 5 = 3 & !2, 6 = 4 & !2, output 5 and 6
        let aag = "aag 6 2 0 2 4\n2\n4\n10\n12\n6 2 4\n8 2 4\n10 6 5\n12 8 5\n";
        let mut c = read_aag_str(aag, true).unwrap();
        let before = output_truth_tables(&c).unwrap();
        assert_eq!(strash(&mut c), 2);
        assert_eq!(c.nb_live_gates(), 2);
        assert_eq!(c.output_fanin(0), c.output_fanin(1));
        assert_eq!(output_truth_tables(&c).unwrap(), before);
        c.check();
    }
}

//! Functional reduction (fraig): prove and merge candidate equivalences with a SAT solver
//!
//! Each pass encodes the circuit into a fresh SAT oracle, in post-order from the outputs.
//! Once a gate is encoded, it is compared with the already-encoded members of its group of
//! candidate-equivalent gates:
//! * if the oracle proves them equivalent, the one with the larger topological order is
//!   replaced by the other, so that the circuit stays acyclic;
//! * otherwise the counterexample is kept as a key pattern. When 64 key patterns are
//!   available, they are simulated to split the groups, and a new pass is started.
//!
//! Passes are repeated until a complete pass merges fewer gates than the merge floor.

use std::fmt;

use crate::io::patterns::pack_patterns;
use crate::network::gate::SIM_WIDTH;
use crate::network::traversal::PostOrder;
use crate::network::{Circuit, Gate, Lit};
use crate::sat::{MinisatOracle, SatError, SatOracle};
use crate::sim::{simulate_and_refine, Effort};

/// Parameters of the fraig engine
#[derive(Clone, Debug)]
pub struct FraigConfig {
    /// A complete pass with fewer merges than this ends the optimization
    ///
    /// A pass also stops querying the oracle once it reaches this number of merges.
    pub merge_floor: usize,
    /// Number of key-pattern batches without any refinement before counterexamples are ignored
    pub effort: Effort,
}

impl Default for FraigConfig {
    fn default() -> Self {
        FraigConfig {
            merge_floor: 64,
            effort: Effort::default(),
        }
    }
}

/// Result of a single pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassResult {
    /// Number of merged gates
    pub nb_merges: usize,
    /// Number of oracle queries
    pub nb_queries: usize,
    /// Whether the pass was interrupted to simulate key patterns
    pub restarted: bool,
}

/// Statistics of a complete run
#[derive(Clone, Debug, Default)]
pub struct FraigStats {
    /// Number of passes
    pub nb_passes: usize,
    /// Number of merged gates
    pub nb_merges: usize,
    /// Number of oracle queries
    pub nb_queries: usize,
    /// Number of counterexamples found
    pub nb_counterexamples: usize,
    /// Number of key-pattern batches simulated
    pub nb_key_batches: usize,
}

impl fmt::Display for FraigStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passes, {} merges, {} SAT queries, {} counterexamples, {} key-pattern batches",
            self.nb_passes,
            self.nb_merges,
            self.nb_queries,
            self.nb_counterexamples,
            self.nb_key_batches
        )
    }
}

/// State of the fraig engine across passes
pub struct Fraig {
    config: FraigConfig,
    stats: FraigStats,
    nb_stalls: usize,
    collecting: bool,
    done: bool,
}

impl Fraig {
    /// Create the engine
    pub fn new(config: FraigConfig) -> Fraig {
        Fraig {
            config,
            stats: FraigStats::default(),
            nb_stalls: 0,
            collecting: true,
            done: false,
        }
    }

    /// Statistics accumulated so far
    pub fn stats(&self) -> &FraigStats {
        &self.stats
    }

    /// Returns whether the last pass reached the fixpoint
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Run a single pass with a fresh oracle of the given type
    pub fn run_pass<O: SatOracle + Default>(&mut self, c: &mut Circuit) -> Result<PassResult, SatError> {
        c.normalize();
        let mut oracle = O::default();
        let sat_vars: Vec<_> = (0..c.nb_vars()).map(|_| oracle.new_var()).collect();
        for v in 0..=c.max_var() {
            if matches!(c.gate(v), Gate::Const | Gate::Undefined) {
                oracle.add_unit(sat_vars[v], false)?;
            }
        }

        let merge_floor = self.config.merge_floor;
        let collecting = self.collecting;
        let mut encoded = vec![false; c.nb_vars()];
        let mut key_patterns: Vec<Vec<bool>> = Vec::new();
        let mut querying = true;
        let mut result = PassResult {
            nb_merges: 0,
            nb_queries: 0,
            restarted: false,
        };
        let mut nb_counterexamples = 0;

        let mut visit = PostOrder::new(c);
        visit.visit_outputs(c, &mut |c: &mut Circuit, p: &mut PostOrder, v: usize| -> Result<(), SatError> {
            let Gate::And([a, b]) = *c.gate(v) else {
                return Ok(());
            };
            oracle.add_and(
                sat_vars[v],
                sat_vars[a.var()],
                a.is_inverted(),
                sat_vars[b.var()],
                b.is_inverted(),
            )?;
            encoded[v] = true;
            if !querying {
                return Ok(());
            }
            let Some(tag) = c.var(v).fec() else {
                return Ok(());
            };
            let siblings = c.fec_groups()[tag.group].clone();
            for m in siblings {
                let s = m.var();
                if s == v || !encoded[s] || p.is_redirected(s) {
                    continue;
                }
                // v is expected to equal s ^ inv
                let inv = m.is_inverted() ^ tag.lit.is_inverted();
                let diff = oracle.new_var();
                oracle.add_xor(diff, sat_vars[v], false, sat_vars[s], inv)?;
                oracle.clear_assumptions();
                oracle.assume(diff);
                result.nb_queries += 1;
                if oracle.solve()? {
                    nb_counterexamples += 1;
                    if collecting {
                        let pattern = c.inputs().iter().map(|&i| oracle.value(sat_vars[i])).collect();
                        key_patterns.push(pattern);
                        if key_patterns.len() == SIM_WIDTH {
                            querying = false;
                            result.restarted = true;
                            break;
                        }
                    }
                } else {
                    // Siblings complete first, so the survivor has the smaller order
                    debug_assert!(c.var(s).topo_order() < c.var(v).topo_order());
                    log::debug!("fraig: merging {v} into {}", Lit::from_var(s) ^ inv);
                    p.redirect(v, Lit::from_var(s) ^ inv);
                    result.nb_merges += 1;
                    if result.nb_merges >= merge_floor {
                        querying = false;
                    }
                    break;
                }
            }
            Ok(())
        })?;

        let nb_removed = c.normalize();
        self.stats.nb_passes += 1;
        self.stats.nb_merges += result.nb_merges;
        self.stats.nb_queries += result.nb_queries;
        self.stats.nb_counterexamples += nb_counterexamples;
        log::info!(
            "fraig pass {}: {} merges, {} queries, {} gates removed",
            self.stats.nb_passes,
            result.nb_merges,
            result.nb_queries,
            nb_removed
        );

        if result.restarted {
            let words = pack_patterns(&key_patterns, c.nb_inputs());
            self.stats.nb_key_batches += 1;
            if simulate_and_refine(c, &words) {
                self.nb_stalls = 0;
            } else {
                self.nb_stalls += 1;
                if self.nb_stalls >= self.config.effort.surrender() {
                    log::info!("fraig: key patterns do not refine anymore, ignoring counterexamples");
                    self.collecting = false;
                }
            }
            log::debug!(
                "fraig: simulated key patterns, {} FEC groups",
                c.fec_groups().len()
            );
        } else if result.nb_merges < merge_floor {
            self.done = true;
        }
        Ok(result)
    }
}

/// Apply fraig passes with the default oracle until the fixpoint
///
/// The groups of candidate-equivalent gates should have been refined by simulation beforehand;
/// otherwise all gates start as candidates and the first passes only gather counterexamples.
pub fn fraig(c: &mut Circuit, config: &FraigConfig) -> Result<FraigStats, SatError> {
    let mut engine = Fraig::new(config.clone());
    while !engine.is_done() {
        engine.run_pass::<MinisatOracle>(c)?;
    }
    log::info!("fraig: {}", engine.stats());
    Ok(engine.stats().clone())
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::equiv::check_equivalence_comb;
    use crate::io::read_aag_str;
    use crate::optim::strash;
    use crate::sim::exhaustive::{output_truth_tables, truth_tables};
    use crate::sim::{random_sim, SimConfig};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Random circuit where each gate uses two earlier variables, with many outputs
    fn random_circuit(seed: u64, nb_inputs: usize, nb_gates: usize) -> Circuit {
        let mut rng = SmallRng::seed_from_u64(seed);
        let max_var = nb_inputs + nb_gates;
        let nb_outputs = 8;
        let mut c = Circuit::init(max_var, nb_inputs, 0, nb_outputs, nb_gates).unwrap();
        for i in 1..=nb_inputs {
            c.add_input(i).unwrap();
        }
        for _ in 0..nb_outputs {
            let v = rng.gen_range(nb_inputs + 1..=max_var);
            c.add_output(Lit::from_var(v) ^ rng.gen::<bool>()).unwrap();
        }
        for v in nb_inputs + 1..=max_var {
            // Favor recent variables to get some depth
            let lo = v.saturating_sub(12).max(1);
            let a = Lit::from_var(rng.gen_range(lo..v)) ^ rng.gen::<bool>();
            let b = Lit::from_var(rng.gen_range(1..v)) ^ rng.gen::<bool>();
            c.add_gate(v, a, b).unwrap();
        }
        c.finish_ingest(true).unwrap();
        c
    }

    /// Check that no two live gates compute the same function, up to complement
    fn check_reduced(c: &Circuit) {
        let tables = truth_tables(c).unwrap();
        let gates: Vec<usize> = c.live_gates().collect();
        for (i, &g1) in gates.iter().enumerate() {
            for &g2 in &gates[i + 1..] {
                let t1 = tables[g1].clone().unwrap();
                let t2 = tables[g2].clone().unwrap();
                assert_ne!(t1, t2, "Gates {g1} and {g2} are equivalent");
                assert_ne!(t1, !t2, "Gates {g1} and {g2} are complementary");
            }
        }
    }

    #[test]
    fn test_associativity() {
        init_logging();
        // 4 = 1 & 2, 5 = 4 & 3, 6 = 2 & 3, 7 = 1 & 6, outputs 5 and 7
        let aag = "aag 7 3 0 2 4\n2\n4\n6\n10\n14\n8 2 4\n10 8 6\n12 4 6\n14 2 12\n";
        let mut c = read_aag_str(aag, true).unwrap();
        let before = output_truth_tables(&c).unwrap();
        let stats = fraig(&mut c, &FraigConfig::default()).unwrap();
        assert_eq!(stats.nb_merges, 1);
        assert_eq!(c.nb_live_gates(), 2);
        assert_eq!(c.output_fanin(0), c.output_fanin(1));
        assert_eq!(output_truth_tables(&c).unwrap(), before);
        c.check();
    }

    #[test]
    fn test_complement() {
        init_logging();
        // 3 = 1 & 2, 4 = !1 & !2, 5 = !3 & !4 is the xor of 1 and 2
        // 6 = 1 & !2, 7 = !1 & 2, 8 = !6 & !7 is the xnor of 1 and 2
        let aag = "aag 8 2 0 2 6\n2\n4\n10\n16\n6 2 4\n8 3 5\n10 7 9\n12 2 5\n14 3 4\n16 13 15\n";
        let mut c = read_aag_str(aag, true).unwrap();
        let before = output_truth_tables(&c).unwrap();
        random_sim(&mut c, &SimConfig::default(), None).unwrap();
        let stats = fraig(&mut c, &FraigConfig::default()).unwrap();
        assert_eq!(stats.nb_merges, 1);
        assert_eq!(c.nb_live_gates(), 3);
        assert_eq!(c.output_fanin(0), !c.output_fanin(1));
        assert_eq!(output_truth_tables(&c).unwrap(), before);
        c.check();
    }

    #[test]
    fn test_no_simulation() {
        init_logging();
        // Without prior simulation, counterexamples split the single initial group
        let mut c = random_circuit(7, 6, 80);
        let before = output_truth_tables(&c).unwrap();
        let config = FraigConfig {
            merge_floor: 4,
            effort: Effort::Low,
        };
        fraig(&mut c, &config).unwrap();
        assert_eq!(output_truth_tables(&c).unwrap(), before);
        c.check();
        check_reduced(&c);
    }

    #[test]
    fn test_random() {
        init_logging();
        for seed in 0..10 {
            let mut c = random_circuit(seed, 8, 120);
            let before = output_truth_tables(&c).unwrap();
            strash(&mut c);
            random_sim(&mut c, &SimConfig::default(), None).unwrap();
            let nb_before = c.nb_live_gates();
            fraig(&mut c, &FraigConfig::default()).unwrap();
            assert!(c.nb_live_gates() <= nb_before);
            assert_eq!(output_truth_tables(&c).unwrap(), before);
            c.check();
            check_reduced(&c);
        }
    }

    #[test]
    fn test_large_random() {
        init_logging();
        // Too many inputs for truth tables: compare with the SAT miter
        let mut c = random_circuit(11, 24, 400);
        let original = c.clone();
        strash(&mut c);
        random_sim(&mut c, &SimConfig::default(), None).unwrap();
        let stats = fraig(&mut c, &FraigConfig::default()).unwrap();
        assert!(stats.nb_passes >= 1);
        c.check();
        check_equivalence_comb(&original, &c).unwrap();
    }

    #[test]
    fn test_pass_by_pass() {
        init_logging();
        let mut c = random_circuit(3, 5, 60);
        let before = output_truth_tables(&c).unwrap();
        let mut engine = Fraig::new(FraigConfig {
            merge_floor: 1,
            effort: Effort::Low,
        });
        let mut nb_passes = 0;
        while !engine.is_done() {
            let res = engine.run_pass::<MinisatOracle>(&mut c).unwrap();
            nb_passes += 1;
            assert!(res.nb_merges <= 1);
            assert_eq!(output_truth_tables(&c).unwrap(), before);
            c.check();
        }
        assert_eq!(engine.stats().nb_passes, nb_passes);
        check_reduced(&c);
    }
}

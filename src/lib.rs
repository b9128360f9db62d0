//! Functional reduction of And-Inverter Graphs
//!
//! This crate reads combinational circuits in the ASCII AIGER format, finds gates that compute
//! the same function, and merges them.
//!
//! # Usage
//!
//! Aigfraig combines [structural hashing](https://en.wikipedia.org/wiki/And-inverter_graph),
//! word-parallel simulation and SAT-based equivalence proofs (fraig).
//! Simulation splits the gates into groups of candidate equivalences, and a SAT solver proves or
//! refutes the candidates; refuted candidates give new simulation patterns.
//!
//! ```bash
//! # Show available commands
//! aigfraig help
//! # Show statistics and the netlist
//! aigfraig show mydesign.aag --netlist
//! # Optimize the circuit
//! aigfraig opt mydesign.aag -o optimized.aag
//! # Check equivalence between the two
//! aigfraig equiv mydesign.aag optimized.aag
//! ```
//!
//! # Development
//!
//! ## Datastructures
//!
//! `Circuit` is an And-Inverter Graph: all gates are 2-input Ands, and inverters are implicit,
//! occupying just one bit in `Lit`. Variables live in an arena indexed by their AIGER variable
//! number, so that the input file can be written back with the same numbering.
//! Gates are never deleted: they are flagged as removed once they are merged or unused.
//!
//! For example, here is how to read a circuit and remove its redundant gates:
//! ```
//! use aigfraig::io::read_aag_str;
//! use aigfraig::optim::{fraig, strash, FraigConfig};
//! use aigfraig::sim::{random_sim, SimConfig};
//!
//! // Outputs (a & b) & c and a & (b & c)
//! let aag = "aag 7 3 0 2 4\n2\n4\n6\n10\n14\n8 2 4\n10 8 6\n12 4 6\n14 2 12\n";
//! let mut c = read_aag_str(aag, true).unwrap();
//! strash(&mut c);
//! random_sim(&mut c, &SimConfig::default(), None).unwrap();
//! fraig(&mut c, &FraigConfig::default()).unwrap();
//! assert_eq!(c.nb_live_gates(), 2);
//! assert_eq!(c.output_fanin(0), c.output_fanin(1));
//! ```
//!
//! ## Library and documentation
//!
//! Aigfraig is distributed as a library as well as a binary program.
//! The library is not stable, and the datastructures may change between versions.

#![warn(missing_docs)]

pub mod equiv;
pub mod io;
pub mod network;
pub mod optim;
pub mod sat;
pub mod sim;

pub use network::{stats, Circuit, Gate, Lit};

//! Representation and handling of And-Inverter Graphs

mod circuit;
mod consistency;
mod error;
pub mod gate;
mod literal;
pub mod report;
pub mod stats;
pub mod traversal;

pub use circuit::Circuit;
pub use error::IngestError;
pub use gate::{FecTag, Gate, SimWord, Variable, SIM_WIDTH};
pub use literal::Lit;

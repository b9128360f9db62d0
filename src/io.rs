//! Read and write circuits and simulation patterns

mod aag;
pub mod patterns;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub use aag::{read_aag, read_aag_str, write_aag, AagError};

use crate::network::Circuit;

/// Read a circuit from an .aag file
pub fn read_aag_file(path: &Path, optimize: bool) -> Result<Circuit, AagError> {
    let f = File::open(path)?;
    read_aag(f, optimize)
}

/// Write a circuit to an .aag file
pub fn write_aag_file(path: &Path, c: &Circuit) -> std::io::Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    write_aag(&mut f, c)
}

//! Optimization of circuits

pub mod fraig;
mod strash;

pub use fraig::{fraig, Fraig, FraigConfig, FraigStats};
pub use strash::strash;

mod rows;
mod runner;

pub use rows::{Mismatch, format_row, random_row, verify_exchange};
pub use runner::{RingReport, run_ring};

//! Heuristics module for the garden layout solver.
//!
//! This module exports the evolutionary search over plant permutations.

pub mod genetic;

pub use genetic::*;

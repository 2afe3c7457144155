//! Garden Layout Solver Library
//!
//! A genetic-algorithm optimizer for companion-planting layouts. Given a set
//! of plants and a pairwise neighbour-compatibility table, the solver
//! searches for the arrangement that maximizes the summed compatibility of
//! adjacent plants — a traveling-salesman-family permutation problem.
//!
//! # Features
//!
//! - Fitness-proportional (roulette wheel) parent selection with elitism
//! - Order-preserving crossover, inversion and exchange mutation
//! - Seeded, reproducible runs with optional parallel fitness evaluation
//! - CSV compatibility-table loading and benchmarking tools
//!
//! # Example
//!
//! ```no_run
//! use garden_layout_solver::instance::GardenInstance;
//! use garden_layout_solver::heuristics::genetic::{GeneticAlgorithm, GAConfig};
//!
//! // Load instance
//! let instance = GardenInstance::from_file("garden.csv").unwrap();
//!
//! // Search for a layout
//! let config = GAConfig::default();
//! let mut ga = GeneticAlgorithm::new(instance, config);
//! let layout = ga.run().unwrap();
//!
//! println!("Best layout score: {:.2}", layout.score);
//! ```

pub mod benchmark;
pub mod error;
pub mod heuristics;
pub mod instance;
pub mod solution;

pub use error::SolverError;
pub use instance::GardenInstance;
pub use solution::Layout;

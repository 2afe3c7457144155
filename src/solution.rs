//! Layout representation for the garden solver.
//!
//! This module provides the data structure for a finished arrangement:
//! the plant order, its score, and metadata about how it was produced.

use crate::instance::GardenInstance;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Represents a solved garden layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    /// The arrangement as a sequence of plant indices into the instance
    pub order: Vec<usize>,
    /// The arrangement resolved to plant names
    pub plants: Vec<String>,
    /// Total neighbour-compatibility score
    pub score: f64,
    /// Algorithm that generated this layout
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of generations run (if applicable)
    pub generations: Option<usize>,
}

impl Layout {
    /// Create a layout from a plant order, scoring it against the instance
    pub fn from_order(instance: &GardenInstance, order: Vec<usize>, algorithm: &str) -> Self {
        let score = instance.layout_score(&order);
        let plants = order.iter().map(|&i| instance.plants[i].clone()).collect();

        Layout {
            order,
            plants,
            score,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            generations: None,
        }
    }

    /// Check that every plant of the instance appears exactly once
    pub fn is_complete(&self, instance: &GardenInstance) -> bool {
        if self.order.len() != instance.dimension() {
            return false;
        }

        let unique: HashSet<usize> = self.order.iter().cloned().collect();
        unique.len() == instance.dimension() && self.order.iter().all(|&i| i < instance.dimension())
    }

    /// Get the position of a plant in the layout
    pub fn position(&self, plant: usize) -> Option<usize> {
        self.order.iter().position(|&p| p == plant)
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Layout ({})", self.algorithm)?;
        writeln!(f, "  Score: {:.2}", self.score)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(gens) = self.generations {
            writeln!(f, "  Generations: {}", gens)?;
        }
        writeln!(f, "  Order: {}", self.plants.join(" -> "))
    }
}

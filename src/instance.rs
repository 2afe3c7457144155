//! Module for parsing and representing garden layout instances.
//!
//! An instance is a list of plant names together with a fully populated
//! pairwise compatibility matrix: `compatibility[a][b]` is the score earned
//! by placing plant `b` directly after plant `a` in the layout. Asymmetric
//! tables are allowed. Instances are loaded from square CSV tables with a
//! header row of plant names and a matching leading name column.

use crate::error::SolverError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How a layout's score is accumulated over the arrangement.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum ScoringMode {
    /// Sum scores over consecutive pairs only; the two endpoints of the
    /// layout have a single neighbour each (a garden row).
    #[default]
    Linear,
    /// Additionally score the pair formed by the last and first plant
    /// (a garden ring).
    Circular,
}

/// Represents a complete garden layout instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GardenInstance {
    /// Name of the instance
    pub name: String,
    /// Plant identifiers, in table order
    pub plants: Vec<String>,
    /// Pairwise compatibility scores, row-major over `plants`
    pub compatibility: Vec<Vec<f64>>,
    /// Selected scoring mode for layout evaluation
    pub scoring: ScoringMode,
}

impl GardenInstance {
    /// Build an instance from caller-supplied parts, validating that the
    /// compatibility table covers every pair of plants.
    pub fn new(
        name: &str,
        plants: Vec<String>,
        compatibility: Vec<Vec<f64>>,
    ) -> Result<Self, SolverError> {
        let n = plants.len();

        for (i, plant) in plants.iter().enumerate() {
            if plants[..i].contains(plant) {
                return Err(SolverError::InvalidConfiguration(format!(
                    "duplicate plant name '{}'",
                    plant
                )));
            }
        }

        if compatibility.len() != n {
            return Err(SolverError::IncompleteScoreTable(format!(
                "expected {} rows, found {}",
                n,
                compatibility.len()
            )));
        }
        for (i, row) in compatibility.iter().enumerate() {
            if row.len() != n {
                return Err(SolverError::IncompleteScoreTable(format!(
                    "row '{}' has {} entries, expected {}",
                    plants[i],
                    row.len(),
                    n
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(SolverError::IncompleteScoreTable(format!(
                    "non-finite score for pair ('{}', '{}')",
                    plants[i], plants[j]
                )));
            }
        }

        Ok(GardenInstance {
            name: name.to_string(),
            plants,
            compatibility,
            scoring: ScoringMode::Linear,
        })
    }

    /// Parse an instance from a CSV compatibility table.
    ///
    /// The header row is `<label>,plant1,plant2,...`; every following record
    /// is `<plant>,score,score,...` with rows in the same order as the
    /// header columns.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SolverError> {
        let name = path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "garden".to_string());
        let file = File::open(&path)?;
        Self::from_csv_reader(&name, file)
    }

    /// Parse a CSV compatibility table from any reader.
    fn from_csv_reader<R: Read>(name: &str, reader: R) -> Result<Self, SolverError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.len() < 2 {
            return Err(SolverError::IncompleteScoreTable(
                "header row must list at least one plant".to_string(),
            ));
        }
        // First header cell is the corner label, the rest are plant names
        let plants: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();
        let n = plants.len();

        let mut compatibility: Vec<Vec<f64>> = Vec::with_capacity(n);

        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            if i >= n {
                return Err(SolverError::IncompleteScoreTable(format!(
                    "more rows than header plants ({})",
                    n
                )));
            }
            let row_name = record.get(0).unwrap_or("");
            if row_name != plants[i] {
                return Err(SolverError::IncompleteScoreTable(format!(
                    "row {} is labeled '{}', expected '{}' (rows must follow header order)",
                    i + 1,
                    row_name,
                    plants[i]
                )));
            }
            if record.len() != n + 1 {
                return Err(SolverError::IncompleteScoreTable(format!(
                    "row '{}' has {} scores, expected {}",
                    row_name,
                    record.len().saturating_sub(1),
                    n
                )));
            }

            let mut row = Vec::with_capacity(n);
            for (j, field) in record.iter().skip(1).enumerate() {
                let value: f64 = field.parse().map_err(|_| {
                    SolverError::IncompleteScoreTable(format!(
                        "non-numeric score '{}' for pair ('{}', '{}')",
                        field, row_name, plants[j]
                    ))
                })?;
                row.push(value);
            }
            compatibility.push(row);
        }

        if compatibility.len() != n {
            return Err(SolverError::IncompleteScoreTable(format!(
                "expected {} rows, found {}",
                n,
                compatibility.len()
            )));
        }

        Self::new(name, plants, compatibility)
    }

    /// Number of plants in the instance
    pub fn dimension(&self) -> usize {
        self.plants.len()
    }

    /// Position of a plant name in the table, if present
    pub fn plant_index(&self, name: &str) -> Option<usize> {
        self.plants.iter().position(|p| p == name)
    }

    /// Compatibility score for placing plant `b` directly after plant `a`
    #[inline]
    pub fn score(&self, a: usize, b: usize) -> f64 {
        self.compatibility[a][b]
    }

    /// Name-based score lookup for external callers
    pub fn score_between(&self, a: &str, b: &str) -> Result<f64, SolverError> {
        let ia = self
            .plant_index(a)
            .ok_or_else(|| SolverError::UnknownPlant(a.to_string()))?;
        let ib = self
            .plant_index(b)
            .ok_or_else(|| SolverError::UnknownPlant(b.to_string()))?;
        Ok(self.score(ia, ib))
    }

    /// Score a layout by summing neighbour compatibilities over consecutive
    /// positions. Layouts with fewer than two plants score 0. In circular
    /// mode the pair formed by the last and first plant is scored as well.
    pub fn layout_score(&self, order: &[usize]) -> f64 {
        if order.len() < 2 {
            return 0.0;
        }

        let mut total = 0.0;
        for i in 0..order.len() - 1 {
            total += self.score(order[i], order[i + 1]);
        }

        if self.scoring == ScoringMode::Circular {
            total += self.score(order[order.len() - 1], order[0]);
        }

        total
    }

    /// Whether the table scores every pair identically in both directions
    pub fn is_symmetric(&self) -> bool {
        let n = self.dimension();
        for i in 0..n {
            for j in i + 1..n {
                if (self.compatibility[i][j] - self.compatibility[j][i]).abs() > 1e-9 {
                    return false;
                }
            }
        }
        true
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.dimension();

        let mut scores: Vec<f64> = Vec::new();
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    scores.push(self.compatibility[i][j]);
                }
            }
        }

        let avg_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };
        let max_score = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min_score = scores.iter().cloned().fold(f64::INFINITY, f64::min);

        InstanceStatistics {
            name: self.name.clone(),
            dimension: n,
            symmetric: self.is_symmetric(),
            num_pairs: scores.len(),
            avg_score,
            min_score,
            max_score,
        }
    }
}

/// Statistics about a garden instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub symmetric: bool,
    pub num_pairs: usize,
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Plants: {}", self.dimension)?;
        writeln!(f, "  Symmetric: {}", self.symmetric)?;
        writeln!(f, "  Scored pairs: {}", self.num_pairs)?;
        writeln!(f, "  Avg score: {:.2}", self.avg_score)?;
        writeln!(f, "  Min score: {:.2}", self.min_score)?;
        writeln!(f, "  Max score: {:.2}", self.max_score)
    }
}

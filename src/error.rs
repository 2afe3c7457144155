//! Error types for the garden layout solver.

use thiserror::Error;

/// Errors produced while loading instances or configuring a search.
#[derive(Debug, Error)]
pub enum SolverError {
    /// A search parameter is out of range, or the instance is too small to
    /// arrange (fewer than 2 plants). Reported before any generation runs.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The compatibility table does not cover every pair of plants in the
    /// instance (wrong shape, mislabeled row, or non-numeric entry).
    #[error("incomplete score table: {0}")]
    IncompleteScoreTable(String),

    /// A score lookup referenced a plant that is not part of the instance.
    #[error("unknown plant: {0}")]
    UnknownPlant(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

use thiserror::Error;

/// Errors produced while building, pivoting, or reading a tableau.
///
/// Callers match on the kind; two errors of the same kind compare equal
/// whenever their payloads do.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimplexError {
    #[error("constraint {constraint} has {found} coefficients, objective has {expected}")]
    DimensionMismatch {
        constraint: usize,
        expected: usize,
        found: usize,
    },
    #[error("LP is unbounded (no pivot row for entering column {column})")]
    Unbounded { column: usize },
    #[error("LP is unsolved")]
    Unsolved,
    #[error("iteration limit of {iterations} reached before the tableau was solved")]
    IterationLimit { iterations: usize },
}

impl SimplexError {
    pub fn is_unbounded(&self) -> bool {
        matches!(self, SimplexError::Unbounded { .. })
    }
}

use crate::error::MotifError;
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use std::fmt;
use std::str::FromStr;

/// Represents a Position Weight Matrix (PWM)
/// Stored as a DataFrame with columns A, C, G, T
pub type PWM = DataFrame;

/// Per-position nucleotide probabilities, one row per position,
/// columns ordered A, C, G, T
pub type ProbabilityMatrix = Array2<f64>;

/// Per-position log-odds scores, same layout as [`ProbabilityMatrix`]
pub type LogOddsMatrix = Array2<f64>;

/// Integer-scaled scoring matrix, same layout as [`ProbabilityMatrix`]
pub type ScoreMatrix = Array2<i64>;

/// Survival function over the achievable integer scores of a motif
pub type PvalueVector = Array1<f64>;

/// Selects one of the matrices a motif carries, for diagnostics and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixKind {
    RawCounts,
    ScoreMatrix,
    PvalMatrix,
}

impl MatrixKind {
    pub const ALL: [MatrixKind; 3] = [
        MatrixKind::RawCounts,
        MatrixKind::ScoreMatrix,
        MatrixKind::PvalMatrix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatrixKind::RawCounts => "raw_counts",
            MatrixKind::ScoreMatrix => "score_matrix",
            MatrixKind::PvalMatrix => "pval_matrix",
        }
    }
}

impl fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatrixKind {
    type Err = MotifError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MatrixKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| MotifError::UnknownMatrixKind(s.to_string()))
    }
}

use crate::alphabet::Background;
use crate::error::{MotifError, Result};
use crate::types::{PvalueVector, ScoreMatrix};
use ndarray::{Array1, Axis};
use polars::prelude::*;

/// Exact distribution of motif scores under a background model.
///
/// Entry `k` holds the probability that a random window scores at least
/// `min_score + k`. The first entry is exactly 1 and the entries never
/// increase.
#[derive(Debug, Clone, PartialEq)]
pub struct PvalueTable {
    min_score: i64,
    values: PvalueVector,
}

impl PvalueTable {
    /// Builds the table by convolving the per-position score distributions.
    ///
    /// Runs in O(width × range) where range is the number of achievable
    /// integer scores.
    ///
    /// The survival function is divided by its first entry, the total mass of
    /// the background. For a background that does not sum to 1 the p-values
    /// are therefore conditional on that total rather than probabilities under
    /// the raw background; [`Background::new`] only warns about such input.
    ///
    /// # Errors
    /// * `MotifError::EmptyDistribution` if the matrix has no positions or the
    ///   distribution carries no probability mass
    pub fn compute(scores: &ScoreMatrix, background: &Background) -> Result<Self> {
        if scores.nrows() == 0 {
            return Err(MotifError::EmptyDistribution(
                "the scoring matrix has no positions".into(),
            ));
        }
        let bg = background.probabilities();

        // mass[k] = P(partial score == low + k)
        let mut low: i64 = 0;
        let mut mass: Vec<f64> = vec![1.0];
        for row in scores.axis_iter(Axis(0)) {
            let row_min = row.iter().copied().fold(i64::MAX, i64::min);
            let row_max = row.iter().copied().fold(i64::MIN, i64::max);

            let mut next = vec![0.0; mass.len() + (row_max - row_min) as usize];
            for (k, &m) in mass.iter().enumerate() {
                if m == 0.0 {
                    continue;
                }
                for (j, &score) in row.iter().enumerate() {
                    next[k + (score - row_min) as usize] += m * bg[j];
                }
            }

            low += row_min;
            mass = next;
        }

        let mut survival = vec![0.0; mass.len()];
        let mut acc = 0.0;
        for k in (0..mass.len()).rev() {
            acc += mass[k];
            survival[k] = acc;
        }

        let total = survival.first().copied().unwrap_or(0.0);
        if !(total > 0.0 && total.is_finite()) {
            return Err(MotifError::EmptyDistribution(format!(
                "score distribution sums to {}",
                total
            )));
        }

        Ok(PvalueTable {
            min_score: low,
            values: Array1::from_iter(survival.into_iter().map(|p| p / total)),
        })
    }

    pub fn min_score(&self) -> i64 {
        self.min_score
    }

    pub fn max_score(&self) -> i64 {
        self.min_score + self.values.len() as i64 - 1
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &PvalueVector {
        &self.values
    }

    /// P-value of an integer score, `None` when the score is not achievable.
    pub fn pvalue(&self, score: i64) -> Option<f64> {
        if score < self.min_score {
            return None;
        }
        self.values.get((score - self.min_score) as usize).copied()
    }

    /// Table as a DataFrame with columns "score" and "pvalue"
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let scores: Vec<i64> = (self.min_score..=self.max_score()).collect();
        DataFrame::new(vec![
            Column::new("score".into(), scores),
            Column::new("pvalue".into(), self.values.to_vec()),
        ])
        .map_err(|e| MotifError::DataError(e.to_string()))
    }
}

use crate::error::{MotifError, Result};
use crate::utils::almost_equal;
use log::warn;
use phf::phf_map;
use std::collections::HashMap;

/// The DNA alphabet, in the column order used by every motif matrix
pub const DNA_ALPHABET: [char; 4] = ['A', 'C', 'G', 'T'];

/// Column of each nucleotide in motif matrices
pub static NUCLEOTIDE_INDEX: phf::Map<char, usize> = phf_map! {
    'A' => 0,
    'C' => 1,
    'G' => 2,
    'T' => 3,
};

/// Looks up the matrix column of a nucleotide, accepting lower case.
pub fn nucleotide_index(nucleotide: char) -> Option<usize> {
    NUCLEOTIDE_INDEX
        .get(&nucleotide.to_ascii_uppercase())
        .copied()
}

/// Background probability of each nucleotide, ordered A, C, G, T.
///
/// Probabilities must be positive and finite. They are expected to sum to
/// one but this is not enforced; a distribution that does not is only
/// reported through a warning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Background {
    probabilities: [f64; 4],
}

impl Background {
    /// Builds a background from probabilities ordered A, C, G, T.
    ///
    /// # Errors
    /// * `MotifError::InvalidBackground` if a probability is not positive and finite
    pub fn new(probabilities: [f64; 4]) -> Result<Self> {
        for (nucleotide, p) in DNA_ALPHABET.iter().zip(probabilities) {
            if !p.is_finite() || p <= 0.0 {
                return Err(MotifError::InvalidBackground(format!(
                    "probability of {} must be positive, got {}",
                    nucleotide, p
                )));
            }
        }

        let total: f64 = probabilities.iter().sum();
        if !almost_equal(total, 1.0, 1e-3) {
            warn!("background probabilities sum to {:.6}, not 1", total);
        }

        Ok(Background { probabilities })
    }

    /// The uniform distribution, 0.25 per nucleotide.
    pub fn uniform() -> Self {
        Background {
            probabilities: [0.25; 4],
        }
    }

    /// Builds a background from a nucleotide -> probability mapping.
    ///
    /// Keys are matched case-insensitively.
    ///
    /// # Errors
    /// * `MotifError::InvalidBackground` if a nucleotide is missing, a key is
    ///   not a nucleotide, or a probability is not positive and finite
    pub fn from_map(mapping: &HashMap<char, f64>) -> Result<Self> {
        let mut probabilities = [f64::NAN; 4];
        for (&symbol, &p) in mapping {
            let idx = nucleotide_index(symbol).ok_or_else(|| {
                MotifError::InvalidBackground(format!("unknown symbol '{}'", symbol))
            })?;
            probabilities[idx] = p;
        }

        if let Some(missing) = DNA_ALPHABET
            .iter()
            .zip(probabilities)
            .find(|(_, p)| p.is_nan())
            .map(|(nucleotide, _)| nucleotide)
        {
            return Err(MotifError::InvalidBackground(format!(
                "no probability given for {}",
                missing
            )));
        }

        Background::new(probabilities)
    }

    pub fn probabilities(&self) -> &[f64; 4] {
        &self.probabilities
    }

    /// Probability of a nucleotide, `None` for symbols outside the alphabet.
    pub fn get(&self, nucleotide: char) -> Option<f64> {
        nucleotide_index(nucleotide).map(|idx| self.probabilities[idx])
    }

    pub fn to_map(&self) -> HashMap<char, f64> {
        DNA_ALPHABET
            .iter()
            .copied()
            .zip(self.probabilities)
            .collect()
    }
}

impl Default for Background {
    fn default() -> Self {
        Background::uniform()
    }
}

//! DNA motifs and their derived scoring artifacts.
//!
//! A motif goes through two phases. [`Motif`] holds the probability matrix
//! handed over by a motif file parser. [`Motif::scale`] consumes it and
//! returns a [`ScaledMotif`], which carries the integer scoring matrix, its
//! bounds, the scaling parameters and, once computed, the p-value table. A
//! scaled motif cannot be scaled again.

use crate::alphabet::{nucleotide_index, Background, DNA_ALPHABET};
use crate::config::ScalingConfig;
use crate::error::{MotifError, Result};
use crate::pvalue::PvalueTable;
use crate::scaling;
use crate::types::{LogOddsMatrix, MatrixKind, ProbabilityMatrix, ScoreMatrix, PWM};
use crate::utils::{almost_equal, is_list_equal};
use log::{debug, warn};
use ndarray::{Array2, Axis};
use polars::prelude::*;
use std::io::{self, Write};

/// Tolerance on the sum of a probability row before a warning is logged
const ROW_SUM_TOLERANCE: f64 = 1e-3;

/// Read access shared by both motif phases.
pub trait MotifInfo {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn width(&self) -> usize;

    /// Probabilities, one row per position, columns ordered A, C, G, T
    fn probability_matrix(&self) -> &ProbabilityMatrix;

    fn is_scaled(&self) -> bool;

    fn alphabet(&self) -> &'static [char; 4] {
        &DNA_ALPHABET
    }

    /// Exports one of the motif matrices as a DataFrame.
    ///
    /// # Errors
    /// * `MotifError::MissingMatrix` if the motif does not hold that matrix yet
    fn to_dataframe(&self, kind: MatrixKind) -> Result<DataFrame>;

    /// Writes one of the motif matrices in tabular form.
    fn write_matrix<W: Write>(&self, kind: MatrixKind, writer: &mut W) -> Result<()> {
        let df = self.to_dataframe(kind)?;
        writeln!(writer, "Motif {} ({}) {}:", self.id(), self.name(), kind)?;
        writeln!(writer, "{}", df)?;
        Ok(())
    }

    /// Prints one of the motif matrices to stdout.
    fn print(&self, kind: MatrixKind) -> Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.write_matrix(kind, &mut handle)
    }
}

/// A DNA motif whose scoring matrix has not been derived yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Motif {
    probability_matrix: ProbabilityMatrix,
    width: usize,
    id: String,
    name: String,
}

fn validate_matrix(matrix: &ProbabilityMatrix) -> Result<()> {
    if matrix.is_empty() {
        return Err(MotifError::invalid_matrix("empty motif probability matrix"));
    }
    if matrix.ncols() != DNA_ALPHABET.len() {
        return Err(MotifError::invalid_matrix(format!(
            "expected {} columns, got {}",
            DNA_ALPHABET.len(),
            matrix.ncols()
        )));
    }
    if let Some(((position, column), value)) = matrix
        .indexed_iter()
        .find(|(_, value)| !value.is_finite() || **value < 0.0)
    {
        return Err(MotifError::invalid_matrix(format!(
            "forbidden value {} at position {}, column {}",
            value, position, column
        )));
    }
    Ok(())
}

fn validate_width(width: usize, matrix: &ProbabilityMatrix) -> Result<()> {
    if width == 0 {
        return Err(MotifError::invalid_width(width, "width must be positive"));
    }
    if width != matrix.nrows() {
        return Err(MotifError::invalid_width(
            width,
            format!("the matrix has {} positions", matrix.nrows()),
        ));
    }
    Ok(())
}

fn warn_on_row_sums(matrix: &ProbabilityMatrix, id: &str) {
    for (position, row) in matrix.axis_iter(Axis(0)).enumerate() {
        let total = row.sum();
        if !almost_equal(total, 1.0, ROW_SUM_TOLERANCE) {
            warn!(
                "motif {}: probabilities at position {} sum to {:.6}",
                id, position, total
            );
        }
    }
}

/// Reorders the columns of `matrix`, labelled by `alphabet`, to A, C, G, T.
fn to_canonical_order(matrix: ProbabilityMatrix, alphabet: &[char]) -> ProbabilityMatrix {
    if alphabet == &DNA_ALPHABET[..] {
        return matrix;
    }
    let mut source = [0usize; 4];
    for (column, &nucleotide) in alphabet.iter().enumerate() {
        if let Some(target) = nucleotide_index(nucleotide) {
            source[target] = column;
        }
    }
    Array2::from_shape_fn(matrix.raw_dim(), |(i, j)| matrix[[i, source[j]]])
}

fn matrix_frame<T>(matrix: &Array2<T>) -> Result<DataFrame>
where
    T: Copy,
    Series: NamedFrom<Vec<T>, [T]>,
{
    let positions: Vec<u32> = (1..=matrix.nrows() as u32).collect();
    let mut columns = vec![Column::new::<Vec<u32>, [u32]>("position".into(), positions)];
    for (j, nucleotide) in DNA_ALPHABET.iter().enumerate() {
        let values: Vec<T> = matrix.column(j).to_vec();
        columns.push(Column::new(nucleotide.to_string().into(), values));
    }
    DataFrame::new(columns).map_err(|e| MotifError::DataError(e.to_string()))
}

impl Motif {
    /// Creates a motif from a probability matrix.
    ///
    /// # Arguments
    /// * `probability_matrix` - One row per position, one column per symbol of `alphabet`
    /// * `width` - Number of motif positions, must match the matrix rows
    /// * `alphabet` - Column labels; any ordering of A, C, G, T (case-insensitive)
    /// * `id` - Motif accession
    /// * `name` - Descriptive motif name
    ///
    /// # Errors
    /// * `MotifError::InvalidMatrix` if the matrix is empty, does not have four
    ///   columns or holds a negative or non-finite value
    /// * `MotifError::InvalidWidth` if `width` is zero or differs from the matrix rows
    /// * `MotifError::InvalidIdentifier` / `MotifError::InvalidName` for empty strings
    /// * `MotifError::InvalidAlphabet` if `alphabet` is not the DNA alphabet
    pub fn new(
        probability_matrix: ProbabilityMatrix,
        width: usize,
        alphabet: &[char],
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        let name = name.into();

        validate_matrix(&probability_matrix)?;
        validate_width(width, &probability_matrix)?;
        if id.is_empty() {
            return Err(MotifError::InvalidIdentifier);
        }
        if name.is_empty() {
            return Err(MotifError::InvalidName);
        }
        let alphabet: Vec<char> = alphabet.iter().map(|c| c.to_ascii_uppercase()).collect();
        if !is_list_equal(&alphabet, &DNA_ALPHABET) {
            return Err(MotifError::InvalidAlphabet(format!("{:?}", alphabet)));
        }

        let probability_matrix = to_canonical_order(probability_matrix, &alphabet);
        warn_on_row_sums(&probability_matrix, &id);

        Ok(Motif {
            probability_matrix,
            width,
            id,
            name,
        })
    }

    /// Creates a motif from a PWM DataFrame with numeric columns A, C, G and T.
    ///
    /// Other columns are ignored; the motif width is the number of rows.
    ///
    /// # Errors
    /// * `MotifError::DataError` if a nucleotide column is missing
    /// * `MotifError::InvalidType` if a nucleotide column is not numeric
    /// * `MotifError::InvalidMatrix` for null cells, plus every error of [`Motif::new`]
    pub fn from_pwm(pwm: &PWM, id: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(DNA_ALPHABET.len());
        for nucleotide in DNA_ALPHABET {
            let label = nucleotide.to_string();
            let column = pwm
                .column(&label)
                .map_err(|e| MotifError::DataError(e.to_string()))?;
            let dtype = column.dtype();
            if !(dtype.is_float() || dtype.is_integer()) {
                return Err(MotifError::invalid_type(label, "numeric column", dtype));
            }
            let cast = column
                .cast(&DataType::Float64)
                .map_err(|e| MotifError::DataError(e.to_string()))?;
            let values = cast
                .f64()
                .map_err(|e| MotifError::DataError(e.to_string()))?
                .into_iter()
                .enumerate()
                .map(|(position, value)| {
                    value.ok_or_else(|| {
                        MotifError::invalid_matrix(format!(
                            "missing {} probability at position {}",
                            nucleotide, position
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            columns.push(values);
        }

        let width = pwm.height();
        let matrix = Array2::from_shape_fn((width, DNA_ALPHABET.len()), |(i, j)| columns[j][i]);
        Motif::new(matrix, width, &DNA_ALPHABET, id, name)
    }

    /// Replaces the probability matrix, columns ordered A, C, G, T.
    ///
    /// The motif width follows the new matrix. On error the motif is left untouched.
    pub fn replace_matrix(&mut self, matrix: ProbabilityMatrix) -> Result<()> {
        validate_matrix(&matrix)?;
        if matrix.nrows() != self.width {
            debug!(
                "motif {} resized from {} to {} positions",
                self.id,
                self.width,
                matrix.nrows()
            );
        }
        warn_on_row_sums(&matrix, &self.id);
        self.width = matrix.nrows();
        self.probability_matrix = matrix;
        Ok(())
    }

    /// Sum over all positions of the smallest probability at that position.
    pub fn compute_min_value(&self) -> f64 {
        self.probability_matrix
            .axis_iter(Axis(0))
            .map(|row| row.iter().copied().fold(f64::INFINITY, f64::min))
            .sum()
    }

    /// Scales the motif with the default [`ScalingConfig`].
    ///
    /// See [`Motif::scale_with`].
    pub fn scale(self, background: &Background, desired_scale: Option<u32>) -> Result<ScaledMotif> {
        self.scale_with(background, desired_scale, &ScalingConfig::default())
    }

    /// Derives the integer scoring matrix of the motif.
    ///
    /// Log-odds values are computed against `background` with [`crate::utils::lg2`],
    /// shifted so the smallest one rounds to a non-negative integer, multiplied
    /// by the scale and rounded. A `desired_scale` is used as given. Without it
    /// the scale spreads the log-odds range over `config.range` integers and is
    /// then doubled until back-converted scores are within `config.tolerance`
    /// (1e-3 by default), never beyond `config.max_scale`.
    ///
    /// The p-value table needs memory linear in `width × scale`, which is why
    /// every scale is bounded by `config.max_scale`.
    ///
    /// # Errors
    /// * `MotifError::InvalidParameter` for a zero `desired_scale`, one above
    ///   `config.max_scale`, or an invalid config
    /// * `MotifError::DegenerateMotif` if every window would get the same score
    pub fn scale_with(
        self,
        background: &Background,
        desired_scale: Option<u32>,
        config: &ScalingConfig,
    ) -> Result<ScaledMotif> {
        config.validate()?;
        if desired_scale == Some(0) {
            return Err(MotifError::invalid_parameter(
                "scale",
                0,
                "scaling factor must be a positive integer",
            ));
        }
        if let Some(scale) = desired_scale.filter(|scale| *scale > config.max_scale) {
            return Err(MotifError::invalid_parameter(
                "scale",
                scale,
                format!("scaling factor must not exceed {}", config.max_scale),
            ));
        }

        let scaled = scaling::scale_matrix(&self.probability_matrix, background, desired_scale, config);
        if scaled.min_value >= scaled.max_value {
            return Err(MotifError::DegenerateMotif(self.id));
        }
        debug!(
            "motif {} scaled by {} (offset {})",
            self.id, scaled.scale, scaled.offset
        );

        Ok(ScaledMotif {
            motif: self,
            log_odds_matrix: scaled.log_odds,
            score_matrix: scaled.scores,
            min_value: scaled.min_value,
            max_value: scaled.max_value,
            scale: scaled.scale,
            offset: scaled.offset,
            background: *background,
            pvalue_table: None,
        })
    }
}

impl MotifInfo for Motif {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> usize {
        self.width
    }

    fn probability_matrix(&self) -> &ProbabilityMatrix {
        &self.probability_matrix
    }

    fn is_scaled(&self) -> bool {
        false
    }

    fn to_dataframe(&self, kind: MatrixKind) -> Result<DataFrame> {
        match kind {
            MatrixKind::RawCounts => matrix_frame(&self.probability_matrix),
            _ => Err(MotifError::MissingMatrix(kind)),
        }
    }
}

/// A motif with its integer scoring matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledMotif {
    motif: Motif,
    log_odds_matrix: LogOddsMatrix,
    score_matrix: ScoreMatrix,
    min_value: i64,
    max_value: i64,
    scale: u32,
    offset: f64,
    background: Background,
    pvalue_table: Option<PvalueTable>,
}

impl ScaledMotif {
    pub fn log_odds_matrix(&self) -> &LogOddsMatrix {
        &self.log_odds_matrix
    }

    pub fn score_matrix(&self) -> &ScoreMatrix {
        &self.score_matrix
    }

    /// Lowest achievable integer score
    pub fn min_value(&self) -> i64 {
        self.min_value
    }

    /// Highest achievable integer score
    pub fn max_value(&self) -> i64 {
        self.max_value
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Computes the p-value table against the background used for scaling.
    ///
    /// # Errors
    /// * `MotifError::StateConflict` if the table was already computed
    /// * `MotifError::EmptyDistribution` if the distribution is degenerate
    pub fn compute_pvalue_table(&mut self) -> Result<&PvalueTable> {
        if self.pvalue_table.is_some() {
            return Err(MotifError::StateConflict(format!(
                "the p-value matrix of motif {} has already been computed",
                self.motif.id
            )));
        }
        let table = PvalueTable::compute(&self.score_matrix, &self.background)?;
        debug!(
            "motif {}: p-value table over {} scores",
            self.motif.id,
            table.len()
        );
        Ok(&*self.pvalue_table.insert(table))
    }

    /// Owned variant of [`ScaledMotif::compute_pvalue_table`].
    pub fn with_pvalue_table(mut self) -> Result<Self> {
        self.compute_pvalue_table()?;
        Ok(self)
    }

    pub fn has_pvalue_table(&self) -> bool {
        self.pvalue_table.is_some()
    }

    /// # Errors
    /// * `MotifError::MissingMatrix` before [`ScaledMotif::compute_pvalue_table`]
    pub fn pvalue_table(&self) -> Result<&PvalueTable> {
        self.pvalue_table
            .as_ref()
            .ok_or(MotifError::MissingMatrix(MatrixKind::PvalMatrix))
    }

    /// P-value of an integer score.
    ///
    /// # Errors
    /// * `MotifError::MissingMatrix` before the table is computed
    /// * `MotifError::InvalidParameter` for a score outside `[min_value, max_value]`
    pub fn pvalue(&self, score: i64) -> Result<f64> {
        self.pvalue_table()?.pvalue(score).ok_or_else(|| {
            MotifError::invalid_parameter(
                "score",
                score,
                format!(
                    "outside the achievable range [{}, {}]",
                    self.min_value, self.max_value
                ),
            )
        })
    }

    /// Integer score of a window of exactly `width` nucleotides.
    pub fn score_sequence(&self, window: &str) -> Result<i64> {
        let length = window.chars().count();
        if length != self.motif.width {
            return Err(MotifError::invalid_parameter(
                "window",
                window,
                format!("expected {} nucleotides, got {}", self.motif.width, length),
            ));
        }
        window
            .chars()
            .enumerate()
            .map(|(position, nucleotide)| {
                nucleotide_index(nucleotide)
                    .map(|column| self.score_matrix[[position, column]])
                    .ok_or_else(|| {
                        MotifError::invalid_sequence(
                            position,
                            format!("unexpected symbol '{}'", nucleotide),
                        )
                    })
            })
            .sum()
    }

    /// Converts an integer score back to a log-odds score.
    pub fn score_to_log_odds(&self, score: i64) -> f64 {
        score as f64 / self.scale as f64 - self.offset
    }

    /// Converts a log-odds score to the nearest integer score.
    pub fn log_odds_to_score(&self, log_odds: f64) -> i64 {
        ((log_odds + self.offset) * self.scale as f64).round() as i64
    }

    /// Largest difference, over every window, between the true log-odds score
    /// and the one recovered from the integer score.
    pub fn worst_case_rounding_error(&self) -> f64 {
        let lower = -self.offset / self.motif.width as f64;
        scaling::worst_case_rounding_error(&self.log_odds_matrix, lower, self.scale)
    }
}

impl MotifInfo for ScaledMotif {
    fn id(&self) -> &str {
        self.motif.id()
    }

    fn name(&self) -> &str {
        self.motif.name()
    }

    fn width(&self) -> usize {
        self.motif.width()
    }

    fn probability_matrix(&self) -> &ProbabilityMatrix {
        self.motif.probability_matrix()
    }

    fn is_scaled(&self) -> bool {
        true
    }

    fn to_dataframe(&self, kind: MatrixKind) -> Result<DataFrame> {
        match kind {
            MatrixKind::RawCounts => self.motif.to_dataframe(kind),
            MatrixKind::ScoreMatrix => matrix_frame(&self.score_matrix),
            MatrixKind::PvalMatrix => self.pvalue_table()?.to_dataframe(),
        }
    }
}

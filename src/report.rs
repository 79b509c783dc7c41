//! Flattening of per-hit result tables into columns for report writers.

use crate::error::{MotifError, Result};
use crate::utils::unique_values;
use polars::prelude::*;

pub const MOTIF_ID: &str = "motif_id";
pub const MOTIF_ALT_ID: &str = "motif_alt_id";
pub const SEQUENCE_NAME: &str = "sequence_name";
pub const START: &str = "start";
pub const STOP: &str = "stop";
pub const STRAND: &str = "strand";
pub const SCORE: &str = "score";
pub const PVALUE: &str = "p-value";
pub const MATCHED_SEQUENCE: &str = "matched_sequence";
pub const HAPLOTYPE_FREQUENCY: &str = "haplotype_frequency";
pub const REFERENCE: &str = "reference";
pub const QVALUE: &str = "q-value";

/// Columns of a results table, in report order.
#[derive(Debug, Clone, PartialEq)]
pub struct HitSummary {
    pub motif_ids: Vec<String>,
    pub motif_names: Vec<String>,
    pub sequence_names: Vec<String>,
    pub starts: Vec<i64>,
    pub stops: Vec<i64>,
    pub strands: Vec<String>,
    pub scores: Vec<f64>,
    pub pvalues: Vec<f64>,
    pub sequences: Vec<String>,
    pub frequencies: Vec<i64>,
    pub references: Vec<String>,
    pub qvalues: Option<Vec<f64>>,
}

fn data_error(e: PolarsError) -> MotifError {
    MotifError::DataError(e.to_string())
}

fn null_cell(name: &str, row: usize) -> MotifError {
    MotifError::DataError(format!("null value in column '{}' at row {}", name, row))
}

fn string_column(data: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = data.column(name).map_err(data_error)?;
    if column.dtype() != &DataType::String {
        return Err(MotifError::invalid_type(name, "string column", column.dtype()));
    }
    column
        .str()
        .map_err(data_error)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| value.map(str::to_string).ok_or_else(|| null_cell(name, row)))
        .collect()
}

fn integer_column(data: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let column = data.column(name).map_err(data_error)?;
    if !column.dtype().is_integer() {
        return Err(MotifError::invalid_type(name, "integer column", column.dtype()));
    }
    let cast = column.cast(&DataType::Int64).map_err(data_error)?;
    cast.i64()
        .map_err(data_error)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| value.ok_or_else(|| null_cell(name, row)))
        .collect()
}

fn float_column(data: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = data.column(name).map_err(data_error)?;
    let dtype = column.dtype();
    if !(dtype.is_float() || dtype.is_integer()) {
        return Err(MotifError::invalid_type(name, "numeric column", dtype));
    }
    let cast = column.cast(&DataType::Float64).map_err(data_error)?;
    cast.f64()
        .map_err(data_error)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| value.ok_or_else(|| null_cell(name, row)))
        .collect()
}

/// Splits a results table into its columns.
///
/// # Arguments
/// * `data` - Results table with 11 columns, or 12 when q-values were computed
/// * `qvalue` - Whether the "q-value" column has to be read
///
/// # Errors
/// * `MotifError::InvalidInput` if the table does not have 11 or 12 columns
/// * `MotifError::DataError` for a missing column or a null cell
/// * `MotifError::InvalidType` for a column of the wrong type
pub fn list_data(data: &DataFrame, qvalue: bool) -> Result<HitSummary> {
    if !(11..=12).contains(&data.width()) {
        return Err(MotifError::InvalidInput(format!(
            "expected 11 or 12 columns, got {}",
            data.width()
        )));
    }

    let summary = HitSummary {
        motif_ids: string_column(data, MOTIF_ID)?,
        motif_names: string_column(data, MOTIF_ALT_ID)?,
        sequence_names: string_column(data, SEQUENCE_NAME)?,
        starts: integer_column(data, START)?,
        stops: integer_column(data, STOP)?,
        strands: string_column(data, STRAND)?,
        scores: float_column(data, SCORE)?,
        pvalues: float_column(data, PVALUE)?,
        sequences: string_column(data, MATCHED_SEQUENCE)?,
        frequencies: integer_column(data, HAPLOTYPE_FREQUENCY)?,
        references: string_column(data, REFERENCE)?,
        qvalues: if qvalue {
            Some(float_column(data, QVALUE)?)
        } else {
            None
        },
    };
    debug_assert_eq!(summary.len(), data.height());

    Ok(summary)
}

impl HitSummary {
    /// Number of hits
    pub fn len(&self) -> usize {
        self.motif_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motif_ids.is_empty()
    }

    /// Number of columns, 11 or 12
    pub fn width(&self) -> usize {
        if self.qvalues.is_some() {
            12
        } else {
            11
        }
    }

    /// Distinct motif IDs in order of first appearance, at most `limit` of them.
    pub fn distinct_motifs(&self, limit: Option<usize>) -> Result<Vec<String>> {
        unique_values(&self.motif_ids, limit)
    }

    /// Columns in report order: motif id, motif name, sequence name, start,
    /// stop, strand, score, p-value, matched sequence, haplotype frequency,
    /// reference and, when present, q-value.
    pub fn into_columns(self) -> Vec<Column> {
        let mut columns = vec![
            Column::new(MOTIF_ID.into(), self.motif_ids),
            Column::new(MOTIF_ALT_ID.into(), self.motif_names),
            Column::new(SEQUENCE_NAME.into(), self.sequence_names),
            Column::new(START.into(), self.starts),
            Column::new(STOP.into(), self.stops),
            Column::new(STRAND.into(), self.strands),
            Column::new(SCORE.into(), self.scores),
            Column::new(PVALUE.into(), self.pvalues),
            Column::new(MATCHED_SEQUENCE.into(), self.sequences),
            Column::new(HAPLOTYPE_FREQUENCY.into(), self.frequencies),
            Column::new(REFERENCE.into(), self.references),
        ];
        if let Some(qvalues) = self.qvalues {
            columns.push(Column::new(QVALUE.into(), qvalues));
        }
        columns
    }
}

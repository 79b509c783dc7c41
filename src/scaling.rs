use crate::alphabet::Background;
use crate::config::ScalingConfig;
use crate::types::{LogOddsMatrix, ProbabilityMatrix, ScoreMatrix};
use crate::utils::lg2;
use log::{debug, warn};
use ndarray::{Array2, Axis};

/// Floor applied to motif probabilities before taking logarithms, so a zero
/// entry yields a very low but finite score
pub const PSEUDO_PROBABILITY: f64 = 0.0000005;

/// Output of the log-odds to integer conversion.
#[derive(Debug, Clone)]
pub(crate) struct ScaledScores {
    pub log_odds: LogOddsMatrix,
    pub scores: ScoreMatrix,
    pub scale: u32,
    pub offset: f64,
    pub min_value: i64,
    pub max_value: i64,
}

/// Converts motif probabilities to base-2 log-odds against the background.
///
/// When `pseudocount` is positive each probability is first mixed with the
/// background as `(p + pseudocount * bg) / (1 + pseudocount)`.
pub fn log_odds_matrix(
    probabilities: &ProbabilityMatrix,
    background: &Background,
    pseudocount: f64,
) -> LogOddsMatrix {
    let bg = background.probabilities();
    Array2::from_shape_fn(probabilities.raw_dim(), |(i, j)| {
        let mut p = probabilities[[i, j]];
        if pseudocount > 0.0 {
            p = (p + pseudocount * bg[j]) / (1.0 + pseudocount);
        }
        lg2(p.max(PSEUDO_PROBABILITY) / bg[j])
    })
}

/// Integer lower bound and real upper bound of a log-odds matrix.
///
/// The lower bound is always strictly below the upper one.
fn log_odds_bounds(log_odds: &LogOddsMatrix) -> (f64, f64) {
    let min = log_odds.iter().copied().fold(f64::INFINITY, f64::min);
    let max = log_odds.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut lower = min.floor();
    if max <= lower {
        lower = (max - 1.0).floor();
    }
    (lower, max)
}

/// Largest error, over every path through the matrix, made when an integer
/// score is converted back to log-odds.
pub fn worst_case_rounding_error(log_odds: &LogOddsMatrix, lower: f64, scale: u32) -> f64 {
    let scale = scale as f64;
    let total: f64 = log_odds
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .map(|&lo| {
                    let exact = (lo - lower) * scale;
                    (exact.round() - exact).abs()
                })
                .fold(0.0, f64::max)
        })
        .sum();
    total / scale
}

/// Sum over positions of the row minimum and of the row maximum.
pub fn score_bounds(scores: &ScoreMatrix) -> (i64, i64) {
    scores
        .axis_iter(Axis(0))
        .fold((0, 0), |(min_total, max_total), row| {
            let row_min = row.iter().copied().fold(i64::MAX, i64::min);
            let row_max = row.iter().copied().fold(i64::MIN, i64::max);
            (min_total + row_min, max_total + row_max)
        })
}

/// Picks the scale of a motif.
///
/// A requested scale is used as is. Otherwise the log-odds range is spread
/// over `config.range` integers and, with a tolerance set, the scale is doubled
/// until the worst-case rounding error fits. Derived scales never exceed
/// `config.max_scale`; requested ones are checked by the caller.
fn choose_scale(
    log_odds: &LogOddsMatrix,
    lower: f64,
    upper: f64,
    desired_scale: Option<u32>,
    config: &ScalingConfig,
) -> u32 {
    if let Some(scale) = desired_scale {
        return scale;
    }

    let derived = (config.range as f64 / (upper - lower)).floor();
    let mut scale = (derived.min(config.max_scale as f64) as u32).max(1);

    if let Some(tolerance) = config.tolerance {
        while worst_case_rounding_error(log_odds, lower, scale) > tolerance {
            match scale.checked_mul(2).filter(|next| *next <= config.max_scale) {
                Some(next) => scale = next,
                None => {
                    warn!(
                        "scale {} cannot reach rounding tolerance {} without exceeding {}",
                        scale, tolerance, config.max_scale
                    );
                    break;
                }
            }
        }
    }

    scale
}

/// Turns a probability matrix into an integer scoring matrix.
///
/// Every log-odds value `lo` becomes `round((lo - lower) * scale)`, where
/// `lower` is the floor of the smallest log-odds value. All integer scores
/// are therefore non-negative, and the shift accumulated over the `width`
/// positions is kept in `offset` so that
/// `log_odds_sum ≈ score / scale - offset`.
pub(crate) fn scale_matrix(
    probabilities: &ProbabilityMatrix,
    background: &Background,
    desired_scale: Option<u32>,
    config: &ScalingConfig,
) -> ScaledScores {
    let log_odds = log_odds_matrix(probabilities, background, config.pseudocount);
    let (lower, upper) = log_odds_bounds(&log_odds);
    let scale = choose_scale(&log_odds, lower, upper, desired_scale, config);

    let factor = scale as f64;
    let scores = log_odds.mapv(|lo| ((lo - lower) * factor).round() as i64);
    let (min_value, max_value) = score_bounds(&scores);
    let offset = -(log_odds.nrows() as f64) * lower;

    debug!(
        "log-odds in [{:.4}, {:.4}], scale {}, offset {}, scores in [{}, {}]",
        lower, upper, scale, offset, min_value, max_value
    );

    ScaledScores {
        log_odds,
        scores,
        scale,
        offset,
        min_value,
        max_value,
    }
}

use crate::error::{MotifError, Result};
use serde::Deserialize;

/// Width of the integer interval the log-odds values of a motif are spread
/// over when no explicit scale is requested
pub const DEFAULT_RANGE: u32 = 1000;

/// Largest scale a motif may be scaled by, requested or refined
pub const DEFAULT_MAX_SCALE: u32 = 100_000;

/// Rounding error accepted by default when converting scores back to log-odds
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Parameters of the log-odds to integer conversion.
///
/// Every field has a default, so a partial JSON document such as
/// `{"range": 500}` is a valid configuration. Refinement is switched off with
/// `{"tolerance": null}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalingConfig {
    /// Target score range used to derive the scale
    pub range: u32,
    /// Weight of the background mixed into each probability row; 0 disables smoothing
    pub pseudocount: f64,
    /// Maximum accepted error when converting an integer score back to log-odds,
    /// applied when the scale is derived rather than requested
    pub tolerance: Option<f64>,
    /// Ceiling for any scale, requested, derived or refined
    pub max_scale: u32,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        ScalingConfig {
            range: DEFAULT_RANGE,
            pseudocount: 0.0,
            tolerance: Some(DEFAULT_TOLERANCE),
            max_scale: DEFAULT_MAX_SCALE,
        }
    }
}

impl ScalingConfig {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn without_tolerance(mut self) -> Self {
        self.tolerance = None;
        self
    }

    pub fn with_pseudocount(mut self, pseudocount: f64) -> Self {
        self.pseudocount = pseudocount;
        self
    }

    /// Checks the configuration before any motif is touched.
    ///
    /// # Errors
    /// * `MotifError::InvalidParameter` for a zero range or scale ceiling, a
    ///   negative or non-finite pseudocount, or a non-positive tolerance
    pub fn validate(&self) -> Result<()> {
        if self.range == 0 {
            return Err(MotifError::invalid_parameter(
                "range",
                self.range,
                "must be positive",
            ));
        }
        if self.max_scale == 0 {
            return Err(MotifError::invalid_parameter(
                "max_scale",
                self.max_scale,
                "must be positive",
            ));
        }
        if !self.pseudocount.is_finite() || self.pseudocount < 0.0 {
            return Err(MotifError::invalid_parameter(
                "pseudocount",
                self.pseudocount,
                "must be a non-negative number",
            ));
        }
        if let Some(tolerance) = self.tolerance {
            if !tolerance.is_finite() || tolerance <= 0.0 {
                return Err(MotifError::invalid_parameter(
                    "tolerance",
                    tolerance,
                    "must be a positive number",
                ));
            }
        }
        Ok(())
    }
}

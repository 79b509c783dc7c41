//! Numeric and list helpers shared by the motif, scaling and reporting code.

use crate::error::{MotifError, Result};
use std::collections::HashSet;
use std::hash::Hash;

/// Multiplier turning a natural logarithm into a base-2 one.
///
/// This is `1 / ln(2)` truncated to eight decimals. Against the exact
/// constant (1.4426950408889634...) the relative error is about 6.2e-10, so
/// for any log-odds value with magnitude up to 25 bits the absolute error
/// stays below 2e-8. Every score in this crate goes through [`lg2`], which
/// keeps scores of different motifs comparable.
pub const LOG_FACTOR: f64 = 1.44269504;

/// Checks whether two values lie within `slope` of each other.
///
/// # Examples
/// ```
/// use motif_pssm::utils::almost_equal;
///
/// assert!(almost_equal(10.0, 10.0009, 0.001));
/// assert!(!almost_equal(10.0, 10.1, 0.001));
/// ```
pub fn almost_equal(value1: f64, value2: f64, slope: f64) -> bool {
    !((value1 - slope) > value2 || (value1 + slope) < value2)
}

/// C-like base-2 logarithm: `ln(value) * LOG_FACTOR`.
///
/// Returns `-inf` for zero and `NaN` for negative input, like [`f64::ln`].
pub fn lg2(value: f64) -> f64 {
    value.ln() * LOG_FACTOR
}

/// Checks whether two lists have the same length and hold the same distinct
/// elements, regardless of order.
pub fn is_list_equal<T: Eq + Hash>(lst1: &[T], lst2: &[T]) -> bool {
    if lst1.len() != lst2.len() {
        return false;
    }
    let set1: HashSet<&T> = lst1.iter().collect();
    let set2: HashSet<&T> = lst2.iter().collect();
    set1 == set2
}

/// Returns true as soon as some element appears twice.
pub fn any_dup<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().any(|value| !seen.insert(value))
}

/// Collects the distinct elements of `values` in first-seen order.
///
/// When `size` is given, collection stops once that many distinct values
/// have been found.
///
/// # Errors
/// * `MotifError::InvalidInput` if `values` is empty
pub fn unique_values<T: Clone + Eq + Hash>(values: &[T], size: Option<usize>) -> Result<Vec<T>> {
    if values.is_empty() {
        return Err(MotifError::InvalidInput(
            "cannot take unique values of an empty list".into(),
        ));
    }

    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for value in values {
        if size.is_some_and(|limit| unique.len() >= limit) {
            break;
        }
        if seen.insert(value) {
            unique.push(value.clone());
        }
    }

    Ok(unique)
}

use approx::assert_abs_diff_eq;
use motif_pssm::utils::{almost_equal, any_dup, is_list_equal, lg2, unique_values, LOG_FACTOR};
use motif_pssm::MotifError;

#[test]
fn test_almost_equal() {
    assert!(almost_equal(10.0, 10.0009, 0.001));
    assert!(!almost_equal(10.0, 10.1, 0.001));

    // symmetric, and the bound itself is accepted
    assert!(almost_equal(10.0009, 10.0, 0.001));
    assert!(almost_equal(1.0, 1.5, 0.5));
    assert!(!almost_equal(-1.0, 1.0, 0.5));
}

#[test]
fn test_lg2() {
    assert_abs_diff_eq!(lg2(8.0), 3.0, epsilon = 1e-8);
    assert_abs_diff_eq!(lg2(1.0), 0.0);
    assert_abs_diff_eq!(LOG_FACTOR, std::f64::consts::LOG2_E, epsilon = 1e-8);

    // approximation error stays below 2e-8 for scores up to 25 bits
    for exponent in -25..=25 {
        let value = 2f64.powi(exponent) * 1.3;
        assert!((lg2(value) - value.log2()).abs() < 2e-8);
    }

    assert!(lg2(0.0).is_infinite());
}

#[test]
fn test_is_list_equal() {
    assert!(is_list_equal(&["A", "C", "G", "T"], &["T", "G", "C", "A"]));
    assert!(!is_list_equal(&["A", "C", "G"][..], &["A", "C", "G", "T"][..]));
    assert!(!is_list_equal(&["A", "A", "C", "G"], &["A", "C", "G", "T"]));
    assert!(is_list_equal::<char>(&[], &[]));
}

#[test]
fn test_any_dup() {
    assert!(!any_dup(&[1, 2, 3, 4]));
    assert!(any_dup(&[1, 2, 3, 1]));
    assert!(!any_dup::<u8>(&[]));
}

#[test]
fn test_unique_values() {
    let values = ["chr1", "chr2", "chr1", "chr3", "chr2"];
    assert_eq!(
        unique_values(&values, None).unwrap(),
        vec!["chr1", "chr2", "chr3"]
    );

    // stop once enough distinct values were found
    assert_eq!(unique_values(&values, Some(2)).unwrap(), vec!["chr1", "chr2"]);

    let empty: [&str; 0] = [];
    assert!(matches!(
        unique_values(&empty, None),
        Err(MotifError::InvalidInput(_))
    ));
}

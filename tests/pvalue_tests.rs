use approx::assert_abs_diff_eq;
use ndarray::array;
use motif_pssm::scaling::log_odds_matrix;
use motif_pssm::{
    Background, ErrorKind, Motif, MotifError, MotifInfo, PvalueTable, ScaledMotif, ScalingConfig,
    DNA_ALPHABET,
};

const NUCLEOTIDES: [char; 4] = ['A', 'C', 'G', 'T'];

fn three_position_motif() -> Motif {
    Motif::new(
        array![[0.5, 0.2, 0.2, 0.1], [0.1, 0.1, 0.1, 0.7], [0.3, 0.3, 0.2, 0.2]],
        3,
        &DNA_ALPHABET,
        "MA0002.1",
        "THREE",
    )
    .unwrap()
}

/// Every window of the motif's width, with its probability under the background
fn all_windows(motif: &ScaledMotif) -> Vec<(String, f64)> {
    let bg = motif.background().probabilities();
    let mut windows = vec![(String::new(), 1.0)];
    for _ in 0..motif.width() {
        windows = windows
            .into_iter()
            .flat_map(|(prefix, p)| {
                NUCLEOTIDES
                    .iter()
                    .enumerate()
                    .map(move |(j, &nucleotide)| (format!("{}{}", prefix, nucleotide), p * bg[j]))
            })
            .collect();
    }
    windows
}

#[test]
fn test_pvalue_table_two_position_motif() {
    let mut motif = Motif::new(
        array![[0.7, 0.1, 0.1, 0.1], [0.25, 0.25, 0.25, 0.25]],
        2,
        &DNA_ALPHABET,
        "MA0001.1",
        "TEST",
    )
    .unwrap()
    .scale(&Background::uniform(), Some(100))
    .unwrap();

    let table = motif.compute_pvalue_table().unwrap().clone();
    assert_eq!(table.min_score(), motif.min_value());
    assert_eq!(table.max_score(), motif.max_value());
    assert_eq!(table.len(), (549 - 268 + 1) as usize);

    // every window scores at least the minimum
    assert_eq!(motif.pvalue(268).unwrap(), 1.0);
    // only windows starting with A reach the maximum
    assert_abs_diff_eq!(motif.pvalue(549).unwrap(), 0.25, epsilon = 1e-12);
    assert_abs_diff_eq!(motif.pvalue(300).unwrap(), 0.25, epsilon = 1e-12);

    // scores outside the achievable range are rejected
    assert!(matches!(motif.pvalue(267), Err(MotifError::InvalidParameter { .. })));
    assert!(matches!(motif.pvalue(550), Err(MotifError::InvalidParameter { .. })));
    assert_eq!(table.pvalue(267), None);
    assert_eq!(table.pvalue(550), None);
}

#[test]
fn test_pvalue_table_is_survival_function() {
    let background = Background::new([0.3, 0.2, 0.2, 0.3]).unwrap();
    let motif = three_position_motif()
        .scale(&background, None)
        .unwrap()
        .with_pvalue_table()
        .unwrap();
    let table = motif.pvalue_table().unwrap();

    assert_eq!(table.values()[0], 1.0);
    for pair in table.values().windows(2) {
        assert!(pair[1] <= pair[0]);
    }
    assert!(table.values().iter().all(|&p| p > 0.0 && p <= 1.0));

    // compare against exhaustive enumeration of the 64 windows
    let windows: Vec<(i64, f64)> = all_windows(&motif)
        .into_iter()
        .map(|(window, p)| (motif.score_sequence(&window).unwrap(), p))
        .collect();
    for &(score, _) in &windows {
        let expected: f64 = windows
            .iter()
            .filter(|(other, _)| *other >= score)
            .map(|(_, p)| p)
            .sum();
        assert_abs_diff_eq!(table.pvalue(score).unwrap(), expected, epsilon = 1e-9);
    }

    // the top entry is the probability of the best window
    let best: f64 = windows
        .iter()
        .filter(|(score, _)| *score == motif.max_value())
        .map(|(_, p)| p)
        .sum();
    assert_abs_diff_eq!(motif.pvalue(motif.max_value()).unwrap(), best, epsilon = 1e-12);
    // A, then T, then C
    assert_abs_diff_eq!(best, 0.3 * 0.3 * 0.2, epsilon = 1e-12);
}

#[test]
fn test_scores_within_bounds() {
    let motif = three_position_motif()
        .scale(&Background::uniform(), None)
        .unwrap();
    for (window, _) in all_windows(&motif) {
        let score = motif.score_sequence(&window).unwrap();
        assert!(motif.min_value() <= score && score <= motif.max_value());
    }
}

#[test]
fn test_round_trip_within_tolerance() {
    let background = Background::new([0.3, 0.2, 0.2, 0.3]).unwrap();
    let config = ScalingConfig::default().with_tolerance(1e-3);
    let motif = three_position_motif()
        .scale_with(&background, None, &config)
        .unwrap();

    assert!(motif.worst_case_rounding_error() <= 1e-3);

    let log_odds = motif.log_odds_matrix();
    for (window, _) in all_windows(&motif) {
        let exact: f64 = window
            .chars()
            .enumerate()
            .map(|(i, nucleotide)| {
                let j = NUCLEOTIDES.iter().position(|&n| n == nucleotide).unwrap();
                log_odds[[i, j]]
            })
            .sum();
        let score = motif.score_sequence(&window).unwrap();
        assert_abs_diff_eq!(motif.score_to_log_odds(score), exact, epsilon = 1e-3);
    }
}

#[test]
fn test_default_scaling_round_trip() {
    let motif = Motif::new(
        array![
            [0.5, 0.2, 0.2, 0.1],
            [0.9, 0.0, 0.05, 0.05],
            [0.1, 0.1, 0.1, 0.7],
            [0.25, 0.25, 0.25, 0.25],
            [0.3, 0.3, 0.2, 0.2],
            [0.1, 0.6, 0.2, 0.1]
        ],
        6,
        &DNA_ALPHABET,
        "MA0004.1",
        "SPARSE",
    )
    .unwrap();

    // log-odds span [-19, 1.848]: the range alone gives a scale of 47, too coarse
    let coarse = motif
        .clone()
        .scale_with(
            &Background::uniform(),
            None,
            &ScalingConfig::default().without_tolerance(),
        )
        .unwrap();
    assert_eq!(coarse.scale(), 47);
    assert!(coarse.worst_case_rounding_error() > 1e-3);

    let motif = motif
        .scale(&Background::uniform(), None)
        .unwrap()
        .with_pvalue_table()
        .unwrap();
    assert!(motif.scale() > 47);
    assert!(motif.scale() <= ScalingConfig::default().max_scale);
    assert!(motif.worst_case_rounding_error() <= 1e-3);

    let log_odds = motif.log_odds_matrix();
    for (window, _) in all_windows(&motif) {
        let exact: f64 = window
            .chars()
            .enumerate()
            .map(|(i, nucleotide)| {
                let j = NUCLEOTIDES.iter().position(|&n| n == nucleotide).unwrap();
                log_odds[[i, j]]
            })
            .sum();
        let score = motif.score_sequence(&window).unwrap();
        assert_abs_diff_eq!(motif.score_to_log_odds(score), exact, epsilon = 1e-3);
    }
}

#[test]
fn test_default_scale_uses_range() {
    // log-odds span [-2, 1.4854], so 1000 / 3.4854 rounds down to 286
    let motif = Motif::new(
        array![[0.7, 0.1, 0.1, 0.1], [0.25, 0.25, 0.25, 0.25]],
        2,
        &DNA_ALPHABET,
        "MA0001.1",
        "TEST",
    )
    .unwrap()
    .scale(&Background::uniform(), None)
    .unwrap();
    assert_eq!(motif.scale(), 286);
}

#[test]
fn test_zero_probability_stays_finite() {
    let motif = Motif::new(
        array![[1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0]],
        2,
        &DNA_ALPHABET,
        "zeros",
        "zeros",
    )
    .unwrap();
    let log_odds = log_odds_matrix(motif.probability_matrix(), &Background::uniform(), 0.0);
    assert!(log_odds.iter().all(|lo| lo.is_finite()));

    let motif = motif
        .scale(&Background::uniform(), None)
        .unwrap()
        .with_pvalue_table()
        .unwrap();
    assert_abs_diff_eq!(
        motif.pvalue(motif.score_sequence("AT").unwrap()).unwrap(),
        1.0 / 16.0,
        epsilon = 1e-12
    );
}

#[test]
fn test_pseudocount_smooths_probabilities() {
    let probabilities = array![[1.0, 0.0, 0.0, 0.0]];
    let log_odds = log_odds_matrix(&probabilities, &Background::uniform(), 1.0);
    // (0 + 0.25) / 2 against 0.25 is one bit below even odds
    assert_abs_diff_eq!(log_odds[[0, 1]], -1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(log_odds[[0, 0]], (0.625f64 / 0.25).log2(), epsilon = 1e-6);
}

#[test]
fn test_pvalue_table_write_once() {
    let mut motif = three_position_motif()
        .scale(&Background::uniform(), None)
        .unwrap();
    assert!(!motif.has_pvalue_table());
    assert!(matches!(motif.pvalue(motif.min_value()), Err(MotifError::MissingMatrix(_))));

    let table = motif.compute_pvalue_table().unwrap().clone();
    let err = motif.compute_pvalue_table().unwrap_err();
    assert!(matches!(err, MotifError::StateConflict(_)));
    assert_eq!(err.kind(), ErrorKind::StateConflict);

    // the failed call left the table in place
    assert_eq!(motif.pvalue_table().unwrap(), &table);
}

#[test]
fn test_pvalue_table_compute_directly() {
    let scores = array![[0, 1, 1, 2]];
    let table = PvalueTable::compute(&scores, &Background::uniform()).unwrap();
    assert_eq!(table.min_score(), 0);
    assert_eq!(table.max_score(), 2);
    assert_abs_diff_eq!(table.values()[1], 0.75, epsilon = 1e-12);
    assert_abs_diff_eq!(table.values()[2], 0.25, epsilon = 1e-12);

    let df = table.to_dataframe().unwrap();
    assert_eq!(df.width(), 2);
    assert_eq!(df.height(), 3);
    assert!(df.column("score").is_ok() && df.column("pvalue").is_ok());

    // a background summing to 2 gives the same, conditional, p-values
    let doubled = Background::new([0.5, 0.5, 0.5, 0.5]).unwrap();
    let conditional = PvalueTable::compute(&scores, &doubled).unwrap();
    assert_eq!(conditional.values()[0], 1.0);
    for (p, q) in conditional.values().iter().zip(table.values().iter()) {
        assert_abs_diff_eq!(*p, *q, epsilon = 1e-12);
    }

    // no positions, no distribution
    let empty = ndarray::Array2::<i64>::zeros((0, 4));
    let err = PvalueTable::compute(&empty, &Background::uniform()).unwrap_err();
    assert!(matches!(err, MotifError::EmptyDistribution(_)));
    assert_eq!(err.kind(), ErrorKind::EmptyCollection);
}

#[test]
fn test_scaling_config() {
    let config: ScalingConfig = serde_json::from_str(r#"{"tolerance": 0.01}"#).unwrap();
    assert_eq!(config.tolerance, Some(0.01));
    assert_eq!(config.range, 1000);

    let config: ScalingConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, ScalingConfig::default());
    assert_eq!(config.tolerance, Some(1e-3));
    let config: ScalingConfig = serde_json::from_str(r#"{"tolerance": null}"#).unwrap();
    assert_eq!(config.tolerance, None);
    assert_eq!(config.pseudocount, 0.0);
    assert!(config.validate().is_ok());

    assert!(serde_json::from_str::<ScalingConfig>(r#"{"scale": 10}"#).is_err());

    let invalid = [
        ScalingConfig {
            range: 0,
            ..ScalingConfig::default()
        },
        ScalingConfig::default().with_tolerance(0.0),
        ScalingConfig::default().with_pseudocount(-1.0),
    ];
    for config in invalid {
        let err = three_position_motif()
            .scale_with(&Background::uniform(), None, &config)
            .unwrap_err();
        assert!(matches!(err, MotifError::InvalidParameter { .. }));
    }
}

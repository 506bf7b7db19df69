//! CoV sweep tests

use crate::error::{ConfigError, EstimateError, SweepError};
use crate::sequence::Sequence;
use crate::{
    DistributionParams, EstimatorConfig, IndexSet, SensitivityEstimator, SequenceOptions,
    cov_sweep,
};

fn sum(p: &[f64], _c: &[f64]) -> f64 {
    p.iter().sum()
}

fn config(index_set: IndexSet) -> EstimatorConfig {
    // Stored variances are deliberately large; the sweep replaces them
    EstimatorConfig::new(
        index_set,
        vec![
            DistributionParams::new(1.0, 100.0),
            DistributionParams::new(2.0, 100.0),
            DistributionParams::new(3.0, 100.0),
        ],
        10_000,
    )
    .with_sequence(SequenceOptions::deterministic())
}

#[test]
fn test_sweep_rows_follow_cov() {
    let mut estimator = SensitivityEstimator::new(&sum, &[], config(IndexSet::from([0]))).unwrap();
    let covs = [0.1, 0.5];

    let results = cov_sweep(&mut estimator, &covs).unwrap();

    assert_eq!(results.len(), 2);
    for (row, cov) in results.rows.iter().zip(covs) {
        // Var(x_i) = (mean_i * cov)^2 with means 1, 2, 3
        let own = cov * cov;
        let rest = 13.0 * cov * cov;
        assert_eq!(row.cov, cov);
        assert!(
            (row.total_index - own).abs() / own < 0.05,
            "cov {cov}: total index {}",
            row.total_index
        );
        assert!(
            (row.complement_lower_index - rest).abs() / rest < 0.05,
            "cov {cov}: complement lower index {}",
            row.complement_lower_index
        );
        assert!((row.model_variance - 14.0 * cov * cov).abs() / (14.0 * cov * cov) < 0.05);
    }

    // Two estimates per CoV value
    assert_eq!(estimator.sequence().position(), 4 * 10_000);
    // The stored variances are untouched
    assert!(estimator.config().parameters.iter().all(|p| p.variance == 100.0));
}

#[test]
fn test_full_index_set_has_empty_complement() {
    let mut estimator =
        SensitivityEstimator::new(&sum, &[], config(IndexSet::full(3))).unwrap();

    let results = cov_sweep(&mut estimator, &[0.2]).unwrap();

    assert_eq!(results.rows[0].complement_lower_index, 0.0);
    assert_eq!(estimator.sequence().position(), 10_000);
}

#[test]
fn test_empty_cov_list_uses_configured_cov() {
    let mut estimator = SensitivityEstimator::new(
        &sum,
        &[],
        config(IndexSet::from([0])).with_cov(0.2),
    )
    .unwrap();

    let results = cov_sweep(&mut estimator, &[]).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results.rows[0].cov, 0.2);
    assert!((results.rows[0].total_index - 0.04).abs() / 0.04 < 0.05);

    estimator.rewind();
    let explicit = cov_sweep(&mut estimator, &[0.2]).unwrap();
    assert_eq!(explicit, results);
}

#[test]
fn test_invalid_cov_rejected_before_estimating() {
    let mut estimator = SensitivityEstimator::new(&sum, &[], config(IndexSet::from([0]))).unwrap();

    let err = cov_sweep(&mut estimator, &[0.1, -0.5]).unwrap_err();
    assert!(matches!(
        err,
        SweepError::Estimate(EstimateError::Config(ConfigError::InvalidCov(c))) if c == -0.5
    ));
    assert_eq!(estimator.sequence().position(), 0);
}

#[test]
fn test_write_sweep_output() {
    let mut estimator = SensitivityEstimator::new(&sum, &[], config(IndexSet::from([1]))).unwrap();
    let results = cov_sweep(&mut estimator, &[0.05, 0.1, 0.2]).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.txt");
    results.write_to(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    for (line, row) in lines.iter().zip(&results.rows) {
        let fields: Vec<f64> = line
            .split_whitespace()
            .map(|f| f.parse().unwrap())
            .collect();
        assert_eq!(
            fields,
            vec![
                row.cov,
                row.total_index,
                row.complement_lower_index,
                row.model_variance
            ]
        );
    }
}

#[test]
fn test_write_to_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let results = crate::CovSweepResults::default();

    // A directory cannot be opened as a file
    let err = results.write_to(dir.path()).unwrap_err();
    assert!(matches!(err, SweepError::OutputIo { ref path, .. } if path == dir.path()));
    assert!(err.to_string().starts_with("unable to write sweep output"));
}

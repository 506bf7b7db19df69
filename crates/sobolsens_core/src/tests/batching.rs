//! Batch decomposition tests
//!
//! Integer-valued models keep every partial sum exact, so merged results can
//! be compared bit for bit regardless of how the iterations were split.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{EstimateError, Evaluation};
use crate::{
    Accumulators, DistributionParams, EstimateOverrides, EstimatorConfig, IndexSet,
    SensitivityEstimator, SequenceOptions,
};

fn rounded_sum(p: &[f64], _c: &[f64]) -> f64 {
    p.iter().map(|x| (x * 4.0).round()).sum()
}

fn config(batch_size: usize) -> EstimatorConfig {
    EstimatorConfig::new(
        IndexSet::from([0, 2]),
        vec![DistributionParams::new(0.0, 1.0); 4],
        1_000,
    )
    .with_sequence(SequenceOptions::seeded(5))
    .with_batch_size(batch_size)
}

#[test]
fn test_split_ranges_merge_to_full_range() {
    let estimator = SensitivityEstimator::new(&rounded_sum, &[], config(64)).unwrap();
    let none = EstimateOverrides::none();

    let full = estimator.accumulate(&none, 0, 1_000).unwrap();
    for split in [1, 300, 512, 999] {
        let head = estimator.accumulate(&none, 0, split).unwrap();
        let tail = estimator.accumulate(&none, split, 1_000 - split).unwrap();
        assert_eq!(head.merged(&tail), full, "split at {split}");
    }
    assert_eq!(full.count, 1_000);
}

#[test]
fn test_merge_is_associative() {
    let estimator = SensitivityEstimator::new(&rounded_sum, &[], config(64)).unwrap();
    let none = EstimateOverrides::none();

    let a = estimator.accumulate(&none, 0, 250).unwrap();
    let b = estimator.accumulate(&none, 250, 400).unwrap();
    let c = estimator.accumulate(&none, 650, 350).unwrap();

    let left = a.merged(&b).merged(&c);
    let right = a.merged(&b.merged(&c));
    assert_eq!(left, right);

    let mut folded = Accumulators::default();
    for part in [a, b, c] {
        folded.merge(&part);
    }
    assert_eq!(folded, left);
}

#[test]
fn test_batch_size_does_not_change_result() {
    let mut small = SensitivityEstimator::new(&rounded_sum, &[], config(7)).unwrap();
    let mut large = SensitivityEstimator::new(&rounded_sum, &[], config(4096)).unwrap();

    assert_eq!(
        small.estimate(&EstimateOverrides::none()).unwrap(),
        large.estimate(&EstimateOverrides::none()).unwrap()
    );
}

#[test]
fn test_estimate_matches_accumulate() {
    let mut estimator = SensitivityEstimator::new(&rounded_sum, &[], config(128)).unwrap();
    let sums = estimator
        .accumulate(&EstimateOverrides::none(), 0, 1_000)
        .unwrap();
    let result = estimator.estimate(&EstimateOverrides::none()).unwrap();
    assert_eq!(sums.finish(false).unwrap(), result);

    // accumulate is relative to the cursor, which has now moved
    let next = estimator
        .accumulate(&EstimateOverrides::none(), 0, 1_000)
        .unwrap();
    assert_ne!(next, sums);
}

#[cfg(feature = "parallel")]
#[test]
fn test_thread_count_does_not_change_result() {
    let sin_sum = |p: &[f64], _c: &[f64]| p.iter().map(|x| x.sin()).sum::<f64>();
    let run = |threads: usize| {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();
        pool.install(|| {
            let mut estimator = SensitivityEstimator::new(&sin_sum, &[], config(50)).unwrap();
            estimator.estimate(&EstimateOverrides::none()).unwrap()
        })
    };

    let single = run(1);
    for threads in [2, 4, 8] {
        assert_eq!(run(threads), single, "{threads} threads");
    }
}

/// Run `f` with batches executed one at a time in batch order.
fn in_batch_order<R: Send>(f: impl FnOnce() -> R + Send) -> R {
    #[cfg(feature = "parallel")]
    {
        rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(f)
    }
    #[cfg(not(feature = "parallel"))]
    {
        f()
    }
}

#[test]
fn test_failure_stops_later_batches() {
    let calls = AtomicUsize::new(0);
    let first_call_fails = |p: &[f64], _c: &[f64]| {
        if calls.fetch_add(1, Ordering::Relaxed) == 0 {
            f64::NAN
        } else {
            p.iter().sum()
        }
    };

    let err = in_batch_order(|| {
        let mut estimator = SensitivityEstimator::new(&first_call_fails, &[], config(50)).unwrap();
        estimator.estimate(&EstimateOverrides::none()).unwrap_err()
    });

    assert!(matches!(
        err,
        EstimateError::ModelEvaluationFailed {
            sample: 0,
            evaluation: Evaluation::Base,
            ..
        }
    ));
    assert_eq!(calls.load(Ordering::Relaxed), 1, "batches kept running after the failure");
}

#[test]
fn test_reported_failure_is_lowest_batch() {
    // Every batch fails on its first iteration; only the first batch's
    // error is reported, for any scheduling.
    let nan_model = |_p: &[f64], _c: &[f64]| f64::NAN;
    let estimator = SensitivityEstimator::new(&nan_model, &[], config(10)).unwrap();

    for offset in [0, 35, 120] {
        let err = estimator
            .accumulate(&EstimateOverrides::none(), offset, 500)
            .unwrap_err();
        assert!(
            matches!(err, EstimateError::ModelEvaluationFailed { sample, .. } if sample == offset),
            "offset {offset}: {err}"
        );
    }
}

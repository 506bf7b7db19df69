//! Pick-and-freeze Monte Carlo estimation of lower and total sensitivity indices.
//!
//! Each iteration draws two independent parameter vectors `x1`, `x2` from the
//! sequence, assembles the mixed vectors `arg1`, `arg2` for the active index
//! set and evaluates the model four times:
//!
//! ```text
//! f  = M(x1)    f2 = M(x2)    m1 = M(arg1)    m2 = M(arg2)
//! ```
//!
//! The running sums `Σf`, `Σf²`, `Σf·(m1 − f2)` and `Σ(f − m2)²` then give
//!
//! ```text
//! mean        = Σf / N
//! variance    = Σf² / N − mean²
//! lower index = Σf·(m1 − f2) / N
//! total index = Σ(f − m2)² / (2N)
//! ```
//!
//! The iterations are split into fixed-size batches that read disjoint ranges
//! of the sequence and keep private accumulators. Partial sums are merged in
//! batch order, so results do not depend on how many threads ran them. A
//! failing batch stops every batch after it; the error reported is always the
//! one from the lowest failing batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::config::{EstimateOverrides, EstimatorConfig, ResolvedCall};
use crate::error::{ConfigError, EstimateError, Evaluation};
use crate::model::Model;
use crate::pick_freeze::assemble;
use crate::sampler::{Distribution, InverseTransform};
use crate::sequence::{Sequence, SequenceGenerator};

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Running sums of one estimation (or one batch of it)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Accumulators {
    /// `Σf`
    pub f_sum: f64,
    /// `Σf²`
    pub f_sq_sum: f64,
    /// `Σ f·(m1 − f2)`
    pub lower_sum: f64,
    /// `Σ (f − m2)²`
    pub total_sum: f64,
    /// Number of iterations folded in
    pub count: u64,
}

impl Accumulators {
    #[inline]
    pub fn add(&mut self, f: f64, f2: f64, m1: f64, m2: f64) {
        self.f_sum += f;
        self.f_sq_sum += f * f;
        self.lower_sum += f * (m1 - f2);
        self.total_sum += (f - m2) * (f - m2);
        self.count += 1;
    }

    /// Fold another set of partial sums into this one.
    pub fn merge(&mut self, other: &Accumulators) {
        self.f_sum += other.f_sum;
        self.f_sq_sum += other.f_sq_sum;
        self.lower_sum += other.lower_sum;
        self.total_sum += other.total_sum;
        self.count += other.count;
    }

    #[must_use]
    pub fn merged(mut self, other: &Accumulators) -> Self {
        self.merge(other);
        self
    }

    /// Turn the sums into index estimates.
    pub fn finish(&self, normalize: bool) -> Result<SensitivityResult, EstimateError> {
        if self.count == 0 {
            return Err(ConfigError::InsufficientSamples.into());
        }
        let n = self.count as f64;
        let model_mean = self.f_sum / n;
        let model_variance = self.f_sq_sum / n - model_mean * model_mean;
        let mut lower_index = self.lower_sum / n;
        let mut total_index = self.total_sum / n / 2.0;

        if normalize {
            if !(model_variance > 0.0 && model_variance.is_finite()) {
                tracing::warn!(model_variance, "cannot normalize sensitivity indices");
                return Err(EstimateError::DegenerateVariance(model_variance));
            }
            lower_index /= model_variance;
            total_index /= model_variance;
        }

        Ok(SensitivityResult {
            lower_index,
            total_index,
            model_variance,
            model_mean,
            samples: self.count,
            normalized: normalize,
        })
    }
}

/// Outcome of one estimate call.
///
/// Unless `normalized` is set, the indices are raw variance terms and must be
/// divided by `model_variance` to obtain Sobol' indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub lower_index: f64,
    pub total_index: f64,
    pub model_variance: f64,
    pub model_mean: f64,
    pub samples: u64,
    pub normalized: bool,
}

impl SensitivityResult {
    /// Lower index divided by the model variance, whatever the configured
    /// normalization. `None` when the variance is not positive.
    #[must_use]
    pub fn first_order(&self) -> Option<f64> {
        self.ratio(self.lower_index)
    }

    /// Total index divided by the model variance. `None` when the variance is
    /// not positive.
    #[must_use]
    pub fn total_order(&self) -> Option<f64> {
        self.ratio(self.total_index)
    }

    fn ratio(&self, value: f64) -> Option<f64> {
        if self.normalized {
            Some(value)
        } else if self.model_variance > 0.0 {
            Some(value / self.model_variance)
        } else {
            None
        }
    }
}

/// Progress and cancellation shared between a caller and a running estimate
#[derive(Debug, Clone, Default)]
pub struct EstimateProgress {
    /// Completed iterations
    completed: Arc<AtomicUsize>,
    /// Cancellation flag
    cancelled: Arc<AtomicBool>,
}

impl EstimateProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from existing atomics
    pub fn from_atomics(completed: Arc<AtomicUsize>, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            completed,
            cancelled,
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    fn add_completed(&self, n: usize) {
        self.completed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.completed.store(0, Ordering::Relaxed);
        self.cancelled.store(false, Ordering::Relaxed);
    }

    /// Ask running estimates to stop at the next iteration boundary
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Pick-and-freeze sensitivity estimator.
///
/// Borrows the model and its constants; owns the sequence generator and the
/// sampler. Every call to [`estimate`](Self::estimate) consumes the next
/// `samples` points of the sequence. [`rewind`](Self::rewind) resets the
/// cursor so a later call reproduces an earlier one exactly.
pub struct SensitivityEstimator<'a, M, Q = SequenceGenerator, S = Distribution>
where
    M: Model + ?Sized,
    Q: Sequence,
    S: InverseTransform,
{
    model: &'a M,
    constants: &'a [f64],
    config: EstimatorConfig,
    sequence: Q,
    sampler: S,
}

impl<'a, M> SensitivityEstimator<'a, M>
where
    M: Model + ?Sized,
{
    /// Build an estimator whose generator and sampler come from `config`.
    pub fn new(
        model: &'a M,
        constants: &'a [f64],
        config: EstimatorConfig,
    ) -> Result<Self, EstimateError> {
        config.validate()?;
        let sequence = SequenceGenerator::new(2 * config.dimension, &config.sequence)?;
        let sampler = config.distribution;
        Self::with_parts(model, constants, config, sequence, sampler)
    }
}

impl<'a, M, Q, S> SensitivityEstimator<'a, M, Q, S>
where
    M: Model + ?Sized,
    Q: Sequence,
    S: InverseTransform,
{
    /// Build an estimator around an explicit generator and sampler. The
    /// generator must produce `2 * dimension` coordinates.
    pub fn with_parts(
        model: &'a M,
        constants: &'a [f64],
        config: EstimatorConfig,
        sequence: Q,
        sampler: S,
    ) -> Result<Self, EstimateError> {
        config.validate()?;
        if sequence.dimension() != 2 * config.dimension {
            return Err(ConfigError::LengthMismatch {
                what: "sequence dimension",
                expected: 2 * config.dimension,
                actual: sequence.dimension(),
            }
            .into());
        }
        Ok(Self {
            model,
            constants,
            config,
            sequence,
            sampler,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    #[must_use]
    pub fn constants(&self) -> &[f64] {
        self.constants
    }

    #[must_use]
    pub fn sequence(&self) -> &Q {
        &self.sequence
    }

    /// Reset the sequence cursor to its initial position.
    pub fn rewind(&mut self) {
        self.sequence.rewind();
    }

    /// Estimate indices for the configured (or overridden) index set.
    pub fn estimate(
        &mut self,
        overrides: &EstimateOverrides,
    ) -> Result<SensitivityResult, EstimateError> {
        self.estimate_with_progress(overrides, None)
    }

    /// Like [`estimate`](Self::estimate), reporting progress and honoring
    /// cancellation between iterations.
    ///
    /// The sequence cursor only moves when the call succeeds.
    pub fn estimate_with_progress(
        &mut self,
        overrides: &EstimateOverrides,
        progress: Option<&EstimateProgress>,
    ) -> Result<SensitivityResult, EstimateError> {
        let samples = self.config.samples as u64;
        let sums = self.accumulate_with_progress(overrides, 0, samples, progress)?;
        let result = sums.finish(self.config.normalize)?;
        self.sequence.skip(samples);

        tracing::debug!(
            lower_index = result.lower_index,
            total_index = result.total_index,
            model_variance = result.model_variance,
            model_mean = result.model_mean,
            "sensitivity estimate complete"
        );
        Ok(result)
    }

    /// Raw sums for `count` iterations starting `offset` points past the
    /// current cursor. The cursor does not move.
    ///
    /// Disjoint ranges can be accumulated separately and merged with
    /// [`Accumulators::merge`].
    pub fn accumulate(
        &self,
        overrides: &EstimateOverrides,
        offset: u64,
        count: u64,
    ) -> Result<Accumulators, EstimateError> {
        self.accumulate_with_progress(overrides, offset, count, None)
    }

    fn accumulate_with_progress(
        &self,
        overrides: &EstimateOverrides,
        offset: u64,
        count: u64,
        progress: Option<&EstimateProgress>,
    ) -> Result<Accumulators, EstimateError> {
        let call = self.config.resolve(overrides)?;
        if count == 0 {
            return Err(ConfigError::InsufficientSamples.into());
        }

        let batch_size = self.config.batch_size as u64;
        let num_batches = count.div_ceil(batch_size);
        let first = self.sequence.position() + offset;

        tracing::debug!(
            dimension = self.config.dimension,
            samples = count,
            batches = num_batches,
            start = first,
            "accumulating pick-freeze sums"
        );

        let batches: Vec<(usize, u64, u64)> = (0..num_batches)
            .map(|i| {
                let start = offset + i * batch_size;
                let len = batch_size.min(offset + count - start);
                (i as usize, start, len)
            })
            .collect();

        // Lowest index of a batch that has failed so far
        let first_failure = AtomicUsize::new(usize::MAX);
        let run = |(index, start, len): (usize, u64, u64)| {
            let outcome = self.run_batch(&call, index, start, len, progress, &first_failure);
            if outcome.is_err() {
                first_failure.fetch_min(index, Ordering::Relaxed);
            }
            outcome
        };

        // Errors are reported for the lowest failing batch, whatever the
        // scheduling order.
        #[cfg(feature = "parallel")]
        let partials = {
            let outcomes: Vec<Result<Option<Accumulators>, EstimateError>> =
                batches.into_par_iter().map(run).collect();
            outcomes.into_iter().collect::<Result<Vec<_>, _>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let partials = batches
            .into_iter()
            .map(run)
            .collect::<Result<Vec<_>, _>>()?;

        let mut total = Accumulators::default();
        for sums in partials.iter().flatten() {
            total.merge(sums);
        }
        Ok(total)
    }

    /// Run `len` iterations starting `start` points past the cursor.
    ///
    /// Returns `None` when the batch stopped because a lower-indexed batch
    /// already failed.
    fn run_batch(
        &self,
        call: &ResolvedCall,
        index: usize,
        start: u64,
        len: u64,
        progress: Option<&EstimateProgress>,
        first_failure: &AtomicUsize,
    ) -> Result<Option<Accumulators>, EstimateError> {
        let dim = self.config.dimension;
        let mut sequence = self.sequence.clone();
        sequence.skip(start);

        let mut x1 = vec![0.0; dim];
        let mut x2 = vec![0.0; dim];
        let mut arg1 = vec![0.0; dim];
        let mut arg2 = vec![0.0; dim];
        let mut sums = Accumulators::default();

        for _ in 0..len {
            if progress.is_some_and(EstimateProgress::is_cancelled) {
                return Err(EstimateError::Cancelled);
            }
            if first_failure.load(Ordering::Relaxed) < index {
                tracing::trace!(batch = index, "batch abandoned after earlier failure");
                return Ok(None);
            }

            sequence.advance();
            let sample = sequence.position() - 1;
            self.transform(&sequence, call, &mut x1, &mut x2)?;
            assemble(&x1, &x2, &call.mask, &mut arg1, &mut arg2);

            let f = self.evaluate(&x1, sample, Evaluation::Base)?;
            let f2 = self.evaluate(&x2, sample, Evaluation::Independent)?;
            let m1 = self.evaluate(&arg1, sample, Evaluation::Picked)?;
            let m2 = self.evaluate(&arg2, sample, Evaluation::Frozen)?;
            sums.add(f, f2, m1, m2);
        }

        if let Some(p) = progress {
            p.add_completed(len as usize);
        }
        tracing::trace!(start, len, "batch complete");
        Ok(Some(sums))
    }

    /// Map the current point into the model domain: coordinate `j` feeds
    /// `x1[j]` and coordinate `j + dim` feeds `x2[j]`.
    fn transform(
        &self,
        sequence: &Q,
        call: &ResolvedCall,
        x1: &mut [f64],
        x2: &mut [f64],
    ) -> Result<(), EstimateError> {
        let dim = self.config.dimension;
        for (j, params) in call.parameters.iter().enumerate() {
            let u1 = sequence.coordinate(j)?;
            let u2 = sequence.coordinate(j + dim)?;
            let sample = |u| {
                self.sampler
                    .sample(u, params.mean, params.variance)
                    .map_err(|source| EstimateError::Sampling {
                        parameter: j,
                        source,
                    })
            };
            x1[j] = sample(u1)?;
            x2[j] = sample(u2)?;
        }
        Ok(())
    }

    #[inline]
    fn evaluate(
        &self,
        parameters: &[f64],
        sample: u64,
        evaluation: Evaluation,
    ) -> Result<f64, EstimateError> {
        let value = self.model.evaluate(parameters, self.constants);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EstimateError::ModelEvaluationFailed {
                sample,
                evaluation,
                value,
            })
        }
    }
}

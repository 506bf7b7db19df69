//! Global sensitivity analysis by quasi-Monte Carlo pick-and-freeze estimation
//!
//! This crate estimates how much of a model's output variance is attributable
//! to a chosen group of uncertain parameters. It provides:
//! - Low-discrepancy (randomized Halton) and pseudo-random point sequences
//! - Inverse-transform sampling into Normal, LogNormal and Uniform parameters
//! - Pick-and-freeze assembly of the mixed argument vectors
//! - A batched, optionally parallel estimator of lower and total indices
//! - A coefficient-of-variation sweep over parameter uncertainty
//!
//! # Example
//!
//! ```ignore
//! use sobolsens_core::{DistributionParams, EstimateOverrides, EstimatorConfig, IndexSet};
//! use sobolsens_core::SensitivityEstimator;
//!
//! let model = |p: &[f64], _c: &[f64]| 0.1 * p.iter().sum::<f64>();
//! let config = EstimatorConfig::new(
//!     IndexSet::from([0]),
//!     vec![DistributionParams::new(0.0, 1.0); 4],
//!     100_000,
//! );
//!
//! let mut estimator = SensitivityEstimator::new(&model, &[], config)?;
//! let result = estimator.estimate(&EstimateOverrides::none())?;
//! // result.lower_index ≈ 0.01, result.model_variance ≈ 0.04
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod config;
pub mod error;
pub mod estimator;
pub mod pick_freeze;
pub mod sampler;
pub mod sequence;
pub mod sweep;

// ============================================================================
// Model definitions
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{DistributionParams, EstimateOverrides, EstimatorConfig, VarianceOverrideScope};
pub use error::{ConfigError, EstimateError, SamplingError, SequenceError, SweepError};
pub use estimator::{Accumulators, EstimateProgress, SensitivityEstimator, SensitivityResult};
pub use model::Model;
pub use pick_freeze::IndexSet;
pub use sampler::{Distribution, InverseTransform};
pub use sequence::{Sequence, SequenceGenerator, SequenceKind, SequenceOptions};
pub use sweep::{CovSweepResults, CovSweepRow, cov_sweep};

//! Estimator configuration and per-call overrides.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pick_freeze::IndexSet;
use crate::sampler::Distribution;
use crate::sequence::SequenceOptions;

/// Mean and variance of one uncertain parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionParams {
    pub mean: f64,
    pub variance: f64,
}

impl DistributionParams {
    #[must_use]
    pub fn new(mean: f64, variance: f64) -> Self {
        Self { mean, variance }
    }

    /// A parameter pinned at `mean`
    #[must_use]
    pub fn fixed(mean: f64) -> Self {
        Self::new(mean, 0.0)
    }

    /// Parameter whose standard deviation is `cov * |mean|`
    #[must_use]
    pub fn from_cov(mean: f64, cov: f64) -> Self {
        Self::new(mean, (mean * cov).powi(2))
    }

    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Ratio of standard deviation to mean. Infinite for a zero mean.
    #[must_use]
    pub fn cov(&self) -> f64 {
        self.std_dev() / self.mean.abs()
    }
}

/// Which parameters a variance override touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VarianceOverrideScope {
    /// Every parameter takes its overridden variance
    #[default]
    All,
    /// Only parameters in the configured index set take the override; the
    /// rest keep their stored variance
    IndexSetOnly,
}

/// Configuration of a sensitivity estimator.
///
/// Constants are not part of the configuration; they are borrowed next to the
/// model when the estimator is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Number of uncertain parameters
    pub dimension: usize,
    /// Default group of interest
    pub index_set: IndexSet,
    /// One entry per parameter, ordered by index
    pub parameters: Vec<DistributionParams>,
    /// Monte Carlo iterations per estimate call
    pub samples: usize,
    /// Coefficient of variation swept when no values are given
    pub cov: f64,
    pub distribution: Distribution,
    pub sequence: SequenceOptions,
    /// Divide the indices by the estimated model variance
    pub normalize: bool,
    pub override_scope: VarianceOverrideScope,
    /// Iterations per worker batch
    pub batch_size: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            dimension: 0,
            index_set: IndexSet::new(),
            parameters: Vec::new(),
            samples: 10_000,
            cov: 1.0,
            distribution: Distribution::Normal,
            sequence: SequenceOptions::default(),
            normalize: false,
            override_scope: VarianceOverrideScope::All,
            batch_size: 4096,
        }
    }
}

impl EstimatorConfig {
    /// Configuration with the dimension taken from `parameters`.
    #[must_use]
    pub fn new(index_set: IndexSet, parameters: Vec<DistributionParams>, samples: usize) -> Self {
        Self {
            dimension: parameters.len(),
            index_set,
            parameters,
            samples,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: SequenceOptions) -> Self {
        self.sequence = sequence;
        self
    }

    #[must_use]
    pub fn normalized(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    #[must_use]
    pub fn with_override_scope(mut self, scope: VarianceOverrideScope) -> Self {
        self.override_scope = scope;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_cov(mut self, cov: f64) -> Self {
        self.cov = cov;
        self
    }

    /// Check every invariant of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dimension == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if self.samples == 0 {
            return Err(ConfigError::InsufficientSamples);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.parameters.len() != self.dimension {
            return Err(ConfigError::LengthMismatch {
                what: "parameters",
                expected: self.dimension,
                actual: self.parameters.len(),
            });
        }
        for (index, p) in self.parameters.iter().enumerate() {
            if !p.mean.is_finite() {
                return Err(ConfigError::InvalidMean {
                    index,
                    mean: p.mean,
                });
            }
            check_variance(index, p.variance)?;
        }
        if !self.cov.is_finite() || self.cov < 0.0 {
            return Err(ConfigError::InvalidCov(self.cov));
        }
        self.index_set.validate(self.dimension)
    }

    /// Variance overrides that give every parameter a standard deviation of
    /// `cov * |mean|`.
    pub fn cov_overrides(&self, cov: f64) -> Result<EstimateOverrides, ConfigError> {
        if !cov.is_finite() || cov < 0.0 {
            return Err(ConfigError::InvalidCov(cov));
        }
        let variances = self
            .parameters
            .iter()
            .map(|p| DistributionParams::from_cov(p.mean, cov).variance)
            .collect();
        Ok(EstimateOverrides::none().with_variances(variances))
    }

    /// Combine the stored configuration with one call's overrides.
    pub(crate) fn resolve(&self, overrides: &EstimateOverrides) -> Result<ResolvedCall, ConfigError> {
        let index_set = match &overrides.index_set {
            Some(set) if !set.is_empty() => {
                set.validate(self.dimension)?;
                set
            }
            _ => &self.index_set,
        };

        let mut parameters = self.parameters.clone();
        if let Some(variances) = &overrides.variances {
            if variances.len() != self.dimension {
                return Err(ConfigError::LengthMismatch {
                    what: "variance override",
                    expected: self.dimension,
                    actual: variances.len(),
                });
            }
            for (index, (param, &variance)) in parameters.iter_mut().zip(variances).enumerate() {
                check_variance(index, variance)?;
                let applies = match self.override_scope {
                    VarianceOverrideScope::All => true,
                    VarianceOverrideScope::IndexSetOnly => self.index_set.contains(index),
                };
                if applies {
                    param.variance = variance;
                }
            }
        }

        Ok(ResolvedCall {
            mask: index_set.membership_mask(self.dimension),
            parameters,
        })
    }
}

fn check_variance(index: usize, variance: f64) -> Result<(), ConfigError> {
    if variance.is_finite() && variance >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidVariance { index, variance })
    }
}

/// Optional replacements for one estimate call. Nothing here is written back
/// into the estimator's configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateOverrides {
    /// Replacement variances, one per parameter. Means are never overridden.
    pub variances: Option<Vec<f64>>,
    /// Replacement group of interest. An empty set means "use the configured set".
    pub index_set: Option<IndexSet>,
}

impl EstimateOverrides {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_variances(mut self, variances: Vec<f64>) -> Self {
        self.variances = Some(variances);
        self
    }

    #[must_use]
    pub fn with_index_set(mut self, index_set: IndexSet) -> Self {
        self.index_set = Some(index_set);
        self
    }
}

/// Effective settings of a single call
#[derive(Debug, Clone)]
pub(crate) struct ResolvedCall {
    pub mask: Vec<bool>,
    pub parameters: Vec<DistributionParams>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EstimatorConfig {
        EstimatorConfig::new(
            IndexSet::from([0]),
            vec![
                DistributionParams::new(1.0, 0.5),
                DistributionParams::new(2.0, 0.25),
                DistributionParams::new(-4.0, 1.0),
            ],
            1000,
        )
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let mut c = config();
        c.samples = 0;
        assert_eq!(c.validate(), Err(ConfigError::InsufficientSamples));

        let mut c = config();
        c.dimension = 4;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::LengthMismatch { expected: 4, actual: 3, .. })
        ));

        let mut c = config();
        c.parameters[1].variance = -1.0;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidVariance { index: 1, .. })
        ));

        let mut c = config();
        c.index_set = IndexSet::from([5]);
        assert!(matches!(
            c.validate(),
            Err(ConfigError::IndexOutOfRange { index: 5, .. })
        ));

        let c = EstimatorConfig::default();
        assert_eq!(c.validate(), Err(ConfigError::ZeroDimension));

        let c = config().with_batch_size(0);
        assert_eq!(c.validate(), Err(ConfigError::ZeroBatchSize));
    }

    #[test]
    fn test_resolve_without_overrides_uses_stored() {
        let c = config();
        let call = c.resolve(&EstimateOverrides::none()).unwrap();
        assert_eq!(call.mask, vec![true, false, false]);
        assert_eq!(call.parameters, c.parameters);
    }

    #[test]
    fn test_empty_index_override_falls_back() {
        let c = config();
        let call = c
            .resolve(&EstimateOverrides::none().with_index_set(IndexSet::new()))
            .unwrap();
        assert_eq!(call.mask, vec![true, false, false]);

        let call = c
            .resolve(&EstimateOverrides::none().with_index_set(IndexSet::from([1, 2])))
            .unwrap();
        assert_eq!(call.mask, vec![false, true, true]);
    }

    #[test]
    fn test_variance_override_scopes() {
        let overrides = EstimateOverrides::none().with_variances(vec![9.0, 9.0, 9.0]);

        let all = config().resolve(&overrides).unwrap();
        assert!(all.parameters.iter().all(|p| p.variance == 9.0));

        let scoped = config()
            .with_override_scope(VarianceOverrideScope::IndexSetOnly)
            .resolve(&overrides)
            .unwrap();
        let variances: Vec<f64> = scoped.parameters.iter().map(|p| p.variance).collect();
        assert_eq!(variances, vec![9.0, 0.25, 1.0]);
        // means are never overridden
        assert_eq!(scoped.parameters[2].mean, -4.0);
    }

    #[test]
    fn test_override_validation() {
        let c = config();
        assert!(matches!(
            c.resolve(&EstimateOverrides::none().with_variances(vec![1.0])),
            Err(ConfigError::LengthMismatch { .. })
        ));
        assert!(matches!(
            c.resolve(&EstimateOverrides::none().with_variances(vec![1.0, f64::NAN, 1.0])),
            Err(ConfigError::InvalidVariance { index: 1, .. })
        ));
        assert!(matches!(
            c.resolve(&EstimateOverrides::none().with_index_set(IndexSet::from([3]))),
            Err(ConfigError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_cov_overrides() {
        let overrides = config().cov_overrides(0.5).unwrap();
        assert_eq!(overrides.variances, Some(vec![0.25, 1.0, 4.0]));
        assert!(config().cov_overrides(-0.1).is_err());
    }

    #[test]
    fn test_distribution_params_helpers() {
        let p = DistributionParams::from_cov(10.0, 0.2);
        assert!((p.variance - 4.0).abs() < 1e-12);
        assert!((p.cov() - 0.2).abs() < 1e-12);
        assert_eq!(DistributionParams::fixed(3.0).variance, 0.0);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let json = r#"{
            "dimension": 2,
            "index_set": [1],
            "parameters": [{"mean": 0.0, "variance": 1.0}, {"mean": 1.0, "variance": 2.0}]
        }"#;
        let c: EstimatorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.samples, 10_000);
        assert_eq!(c.batch_size, 4096);
        assert_eq!(c.index_set, IndexSet::from([1]));
        assert!(c.validate().is_ok());
    }
}

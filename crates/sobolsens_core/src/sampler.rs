//! Inverse-transform sampling from (mean, variance) parameterized distributions.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::SamplingError;

/// Maps a uniform draw on (0, 1) to a sample of a target distribution.
///
/// Implementations must be pure: the same `(u, mean, variance)` always yields
/// the same value. A zero variance pins the result to `mean` for every `u`.
pub trait InverseTransform: Send + Sync {
    fn sample(&self, u: f64, mean: f64, variance: f64) -> Result<f64, SamplingError>;
}

/// Target distributions for the uncertain parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Distribution {
    #[default]
    Normal,
    /// Log-normal with the given mean and variance of the variable itself
    /// (not of its logarithm). The mean must be positive.
    LogNormal,
    /// Uniform on `mean ± sqrt(3 * variance)`
    Uniform,
}

impl Distribution {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Distribution::Normal => "Normal",
            Distribution::LogNormal => "LogNormal",
            Distribution::Uniform => "Uniform",
        }
    }

    fn invalid(&self, mean: f64, variance: f64, reason: &'static str) -> SamplingError {
        SamplingError::InvalidDistributionParameters {
            distribution: self.name(),
            mean,
            variance,
            reason,
        }
    }
}

/// Quantile of the standard normal distribution at `u`.
#[inline]
fn standard_normal_quantile(u: f64) -> f64 {
    // Normal::standard() cannot fail
    Normal::standard().inverse_cdf(u)
}

impl InverseTransform for Distribution {
    fn sample(&self, u: f64, mean: f64, variance: f64) -> Result<f64, SamplingError> {
        if !mean.is_finite() {
            return Err(self.invalid(mean, variance, "mean must be finite"));
        }
        if !variance.is_finite() || variance < 0.0 {
            return Err(self.invalid(mean, variance, "variance must be finite and >= 0"));
        }
        if variance == 0.0 {
            return Ok(mean);
        }
        if !(u > 0.0 && u < 1.0) {
            return Err(SamplingError::UniformOutOfRange(u));
        }

        match self {
            Distribution::Normal => {
                let std_dev = variance.sqrt();
                Normal::new(mean, std_dev)
                    .map(|d| d.inverse_cdf(u))
                    .map_err(|_| self.invalid(mean, variance, "std_dev must be positive"))
            }
            Distribution::LogNormal => {
                if mean <= 0.0 {
                    return Err(self.invalid(mean, variance, "mean must be positive"));
                }
                let sigma_sq = (1.0 + variance / (mean * mean)).ln();
                let mu = mean.ln() - 0.5 * sigma_sq;
                Ok((mu + sigma_sq.sqrt() * standard_normal_quantile(u)).exp())
            }
            Distribution::Uniform => {
                let half_width = (3.0 * variance).sqrt();
                Ok(mean + (2.0 * u - 1.0) * half_width)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Distribution; 3] = [
        Distribution::Normal,
        Distribution::LogNormal,
        Distribution::Uniform,
    ];

    /// Midpoint-rule moments of the transformed variable over u in (0, 1)
    fn moments(dist: Distribution, mean: f64, variance: f64, n: usize) -> (f64, f64) {
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for i in 0..n {
            let u = (i as f64 + 0.5) / n as f64;
            let x = dist.sample(u, mean, variance).unwrap();
            sum += x;
            sum_sq += x * x;
        }
        let m = sum / n as f64;
        (m, sum_sq / n as f64 - m * m)
    }

    #[test]
    fn test_zero_variance_returns_mean() {
        for dist in ALL {
            for u in [1e-9, 0.1, 0.5, 0.999_999] {
                assert_eq!(dist.sample(u, 3.25, 0.0).unwrap(), 3.25);
            }
        }
    }

    #[test]
    fn test_zero_variance_ignores_uniform_range() {
        // A pinned parameter never looks at u
        assert_eq!(Distribution::Normal.sample(0.0, 1.5, 0.0).unwrap(), 1.5);
    }

    #[test]
    fn test_negative_variance_rejected() {
        for dist in ALL {
            let err = dist.sample(0.5, 1.0, -0.1).unwrap_err();
            assert!(matches!(
                err,
                SamplingError::InvalidDistributionParameters { .. }
            ));
        }
    }

    #[test]
    fn test_uniform_draw_out_of_range() {
        assert_eq!(
            Distribution::Normal.sample(1.0, 0.0, 1.0),
            Err(SamplingError::UniformOutOfRange(1.0))
        );
        assert_eq!(
            Distribution::Uniform.sample(0.0, 0.0, 1.0),
            Err(SamplingError::UniformOutOfRange(0.0))
        );
    }

    #[test]
    fn test_normal_quantiles() {
        let d = Distribution::Normal;
        assert!((d.sample(0.5, 2.0, 4.0).unwrap() - 2.0).abs() < 1e-12);
        assert!((d.sample(0.975, 0.0, 1.0).unwrap() - 1.959_964).abs() < 1e-5);
        // mean + sd * z
        let x = d.sample(0.975, 10.0, 9.0).unwrap();
        assert!((x - (10.0 + 3.0 * 1.959_964)).abs() < 1e-4);
    }

    #[test]
    fn test_normal_is_monotone() {
        let d = Distribution::Normal;
        let mut prev = f64::NEG_INFINITY;
        for i in 1..100 {
            let x = d.sample(i as f64 / 100.0, 0.0, 1.0).unwrap();
            assert!(x > prev);
            prev = x;
        }
    }

    #[test]
    fn test_lognormal_requires_positive_mean() {
        assert!(Distribution::LogNormal.sample(0.5, -1.0, 1.0).is_err());
        assert!(Distribution::LogNormal.sample(0.5, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_moments_are_preserved() {
        for dist in ALL {
            let (m, v) = moments(dist, 2.0, 0.25, 20_000);
            assert!((m - 2.0).abs() < 1e-3, "{dist:?} mean {m}");
            assert!((v - 0.25).abs() < 5e-3, "{dist:?} variance {v}");
        }
    }

    #[test]
    fn test_uniform_bounds() {
        let half = 3.0_f64.sqrt();
        let lo = Distribution::Uniform.sample(1e-12, 0.0, 1.0).unwrap();
        let hi = Distribution::Uniform.sample(1.0 - 1e-12, 0.0, 1.0).unwrap();
        assert!((lo + half).abs() < 1e-9);
        assert!((hi - half).abs() < 1e-9);
    }
}

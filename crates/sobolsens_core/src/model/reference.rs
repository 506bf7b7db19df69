//! Reference models with known sensitivity structure.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use super::Model;

/// `Y = Σ cᵢ·pᵢ` with the weights `cᵢ` passed as constants.
///
/// With independent parameters of variance `σᵢ²` the first-order raw index of
/// a single parameter is `cᵢ²·σᵢ²` and the model variance is `Σ cᵢ²·σᵢ²`.
/// A weight vector of the wrong length evaluates to NaN.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinearModel;

impl LinearModel {
    /// Analytic raw first-order index for each parameter
    #[must_use]
    pub fn first_order(weights: &[f64], variances: &[f64]) -> Vec<f64> {
        weights
            .iter()
            .zip(variances)
            .map(|(c, v)| c * c * v)
            .collect()
    }
}

impl Model for LinearModel {
    fn evaluate(&self, parameters: &[f64], constants: &[f64]) -> f64 {
        if parameters.len() != constants.len() {
            return f64::NAN;
        }
        parameters.iter().zip(constants).map(|(p, c)| p * c).sum()
    }
}

/// The Ishigami function `sin x₁ + a·sin² x₂ + b·x₃⁴·sin x₁`.
///
/// Constants are `[a, b]`, defaulting to `a = 7`, `b = 0.1`. The classic
/// setting draws every parameter uniformly on `[-π, π]`, i.e. mean 0 and
/// variance `π²/3`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IshigamiModel;

impl IshigamiModel {
    pub const DEFAULT_A: f64 = 7.0;
    pub const DEFAULT_B: f64 = 0.1;

    /// Parameter variance giving the uniform `[-π, π]` setting
    pub const UNIFORM_VARIANCE: f64 = PI * PI / 3.0;

    /// Analytic output variance on `[-π, π]³`
    #[must_use]
    pub fn variance(a: f64, b: f64) -> f64 {
        a * a / 8.0 + b * PI.powi(4) / 5.0 + b * b * PI.powi(8) / 18.0 + 0.5
    }

    /// Analytic raw first-order indices of `x₁`, `x₂`, `x₃`
    #[must_use]
    pub fn first_order(a: f64, b: f64) -> [f64; 3] {
        let v1 = 0.5 * (1.0 + b * PI.powi(4) / 5.0).powi(2);
        let v2 = a * a / 8.0;
        [v1, v2, 0.0]
    }

    fn constants(constants: &[f64]) -> (f64, f64) {
        (
            constants.first().copied().unwrap_or(Self::DEFAULT_A),
            constants.get(1).copied().unwrap_or(Self::DEFAULT_B),
        )
    }
}

impl Model for IshigamiModel {
    fn evaluate(&self, parameters: &[f64], constants: &[f64]) -> f64 {
        let [x1, x2, x3] = match parameters {
            [x1, x2, x3] => [*x1, *x2, *x3],
            _ => return f64::NAN,
        };
        let (a, b) = Self::constants(constants);
        x1.sin() + a * x2.sin().powi(2) + b * x3.powi(4) * x1.sin()
    }
}

/// Black-Scholes price of a European call.
///
/// Parameters are `[spot, volatility]`; constants are
/// `[strike, rate, maturity]`. Degenerate draws fall back to the limiting
/// price: a non-positive volatility prices the discounted intrinsic value and
/// a non-positive spot prices zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BlackScholesCall;

impl Model for BlackScholesCall {
    fn evaluate(&self, parameters: &[f64], constants: &[f64]) -> f64 {
        let (spot, vol) = match parameters {
            [spot, vol] => (*spot, *vol),
            _ => return f64::NAN,
        };
        let (strike, rate, maturity) = match constants {
            [k, r, t] => (*k, *r, *t),
            _ => return f64::NAN,
        };

        let discounted_strike = strike * (-rate * maturity).exp();
        if spot <= 0.0 {
            return 0.0;
        }
        if vol <= 0.0 || maturity <= 0.0 {
            return (spot - discounted_strike).max(0.0);
        }

        let std = Normal::standard();
        let sqrt_t = maturity.sqrt();
        let d1 = ((spot / strike).ln() + (rate + 0.5 * vol * vol) * maturity) / (vol * sqrt_t);
        let d2 = d1 - vol * sqrt_t;
        spot * std.cdf(d1) - discounted_strike * std.cdf(d2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_model() {
        assert_eq!(LinearModel.evaluate(&[1.0, 2.0], &[0.5, 0.25]), 1.0);
        assert!(LinearModel.evaluate(&[1.0, 2.0], &[0.5]).is_nan());
        assert_eq!(LinearModel::first_order(&[0.1, 2.0], &[1.0, 0.5]), vec![0.1 * 0.1, 2.0]);
    }

    #[test]
    fn test_ishigami_values() {
        let y = IshigamiModel.evaluate(&[PI / 2.0, PI / 2.0, 1.0], &[]);
        assert!((y - (1.0 + 7.0 + 0.1)).abs() < 1e-12);
        assert!(IshigamiModel.evaluate(&[0.0, 0.0], &[]).is_nan());
    }

    #[test]
    fn test_ishigami_variance_decomposes() {
        let (a, b) = (IshigamiModel::DEFAULT_A, IshigamiModel::DEFAULT_B);
        let total = IshigamiModel::variance(a, b);
        let [v1, v2, v3] = IshigamiModel::first_order(a, b);
        // remaining variance is the x1-x3 interaction
        assert!(total > v1 + v2 + v3);
        assert!((total - 13.844_587).abs() < 1e-5);
    }

    #[test]
    fn test_black_scholes_reference_price() {
        // S=100, K=100, r=5%, sigma=20%, T=1 => 10.4506
        let price = BlackScholesCall.evaluate(&[100.0, 0.2], &[100.0, 0.05, 1.0]);
        assert!((price - 10.4506).abs() < 1e-3, "price {price}");
    }

    #[test]
    fn test_black_scholes_degenerate_inputs() {
        let k = [100.0, 0.05, 1.0];
        let intrinsic = 120.0 - 100.0 * (-0.05f64).exp();
        assert!((BlackScholesCall.evaluate(&[120.0, 0.0], &k) - intrinsic).abs() < 1e-12);
        assert_eq!(BlackScholesCall.evaluate(&[80.0, -0.1], &k), 0.0);
        assert_eq!(BlackScholesCall.evaluate(&[-5.0, 0.2], &k), 0.0);
        assert!(BlackScholesCall.evaluate(&[100.0, 0.2], &[100.0]).is_nan());
    }
}

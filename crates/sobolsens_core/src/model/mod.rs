//! The model under study.
//!
//! A model maps a parameter vector and a vector of fixed constants to a scalar.
//! It must be pure and safe to call from several workers at once; closures of
//! the right shape implement [`Model`] directly.

mod reference;

pub use reference::{BlackScholesCall, IshigamiModel, LinearModel};

pub trait Model: Send + Sync {
    fn evaluate(&self, parameters: &[f64], constants: &[f64]) -> f64;
}

impl<F> Model for F
where
    F: Fn(&[f64], &[f64]) -> f64 + Send + Sync,
{
    #[inline]
    fn evaluate(&self, parameters: &[f64], constants: &[f64]) -> f64 {
        self(parameters, constants)
    }
}

//! Pick-and-freeze argument assembly.
//!
//! Given two independent base draws `x1` and `x2`, the estimator evaluates the
//! model on two mixed vectors:
//!
//! - `arg1` takes `x1` on the index set and `x2` elsewhere;
//! - `arg2` takes `x2` on the index set and `x1` elsewhere.
//!
//! `arg2` is the exact complement of `arg1`. An empty set yields `(x2, x1)`
//! and the full set yields `(x1, x2)`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A set of 0-based parameter indices forming the group of interest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexSet(BTreeSet<usize>);

impl IndexSet {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Every index in `0..dimension`
    #[must_use]
    pub fn full(dimension: usize) -> Self {
        Self((0..dimension).collect())
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn insert(&mut self, index: usize) -> bool {
        self.0.insert(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Indices in increasing order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Indices in `0..dimension` that are not in this set
    #[must_use]
    pub fn complement(&self, dimension: usize) -> Self {
        Self((0..dimension).filter(|i| !self.0.contains(i)).collect())
    }

    /// Check that every index is below `dimension`.
    pub fn validate(&self, dimension: usize) -> Result<(), ConfigError> {
        match self.0.iter().next_back() {
            Some(&index) if index >= dimension => {
                Err(ConfigError::IndexOutOfRange { index, dimension })
            }
            _ => Ok(()),
        }
    }

    /// Dense membership lookup for `0..dimension`.
    #[must_use]
    pub fn membership_mask(&self, dimension: usize) -> Vec<bool> {
        let mut mask = vec![false; dimension];
        for index in self.iter().filter(|&i| i < dimension) {
            mask[index] = true;
        }
        mask
    }
}

impl FromIterator<usize> for IndexSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[usize; N]> for IndexSet {
    fn from(indices: [usize; N]) -> Self {
        indices.into_iter().collect()
    }
}

/// Fill `arg1`/`arg2` from `x1`/`x2` according to `mask`.
///
/// # Panics
///
/// Panics if `x1`, `x2`, `arg1` or `arg2` is shorter than `mask`.
#[inline]
pub fn assemble(x1: &[f64], x2: &[f64], mask: &[bool], arg1: &mut [f64], arg2: &mut [f64]) {
    debug_assert!(x1.len() == x2.len() && x1.len() == mask.len());
    debug_assert!(arg1.len() == x1.len() && arg2.len() == x1.len());

    for (j, &picked) in mask.iter().enumerate() {
        let (kept, swapped) = if picked { (x1[j], x2[j]) } else { (x2[j], x1[j]) };
        arg1[j] = kept;
        arg2[j] = swapped;
    }
}

/// Allocating form of [`assemble`], with the lengths checked up front.
pub fn assemble_pair(
    x1: &[f64],
    x2: &[f64],
    indices: &IndexSet,
) -> Result<(Vec<f64>, Vec<f64>), ConfigError> {
    let dimension = x1.len();
    if x2.len() != dimension {
        return Err(ConfigError::LengthMismatch {
            what: "x2",
            expected: dimension,
            actual: x2.len(),
        });
    }
    indices.validate(dimension)?;

    let mask = indices.membership_mask(dimension);
    let mut arg1 = vec![0.0; dimension];
    let mut arg2 = vec![0.0; dimension];
    assemble(x1, x2, &mask, &mut arg1, &mut arg2);
    Ok((arg1, arg2))
}

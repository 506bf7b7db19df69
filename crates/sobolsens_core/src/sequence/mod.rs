//! Point sequences on the unit hypercube.
//!
//! The estimator reads `2 * dim` coordinates per iteration from a [`Sequence`]:
//! coordinates `0..dim` feed the first base draw and `dim..2*dim` the second.
//! Two generators are provided:
//!
//! - [`HaltonSequence`]: a low-discrepancy sequence with an optional random
//!   start offset and random assignment of prime bases to coordinates.
//! - [`PseudoRandomSequence`]: seeded pseudo-random points, useful as a plain
//!   Monte Carlo baseline.
//!
//! Both keep an explicit cursor so independent workers can be positioned on
//! disjoint sub-ranges of the same sequence with [`Sequence::skip`].

mod halton;
mod pseudo;

pub use halton::{HaltonSequence, first_primes, radical_inverse};
pub use pseudo::PseudoRandomSequence;

use serde::{Deserialize, Serialize};

use crate::error::SequenceError;

/// A cursor over points in `[0, 1)^dimension`.
pub trait Sequence: Clone + Send + Sync {
    /// Number of coordinates per point.
    fn dimension(&self) -> usize;

    /// Move to the next point.
    fn advance(&mut self);

    /// The most recently generated point. All zeros before the first `advance`.
    fn point(&self) -> &[f64];

    /// Number of points generated (or skipped) since initialization.
    fn position(&self) -> u64;

    /// Skip `n` points without exposing them.
    fn skip(&mut self, n: u64);

    /// Return to the state right after initialization, keeping any
    /// randomization chosen at construction.
    fn rewind(&mut self);

    /// Coordinate `index` (0-based) of the most recent point.
    fn coordinate(&self, index: usize) -> Result<f64, SequenceError> {
        self.point()
            .get(index)
            .copied()
            .ok_or(SequenceError::IndexOutOfRange {
                index,
                dimension: self.dimension(),
            })
    }
}

/// Which generator backs an estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SequenceKind {
    #[default]
    Halton,
    PseudoRandom,
}

/// Construction options shared by the generators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceOptions {
    pub kind: SequenceKind,
    /// Offset each Halton coordinate by a random start index
    pub randomize_start: bool,
    /// Randomly assign prime bases to Halton coordinates
    pub randomize_permutation: bool,
    /// Seed for the randomization. `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            kind: SequenceKind::Halton,
            randomize_start: true,
            randomize_permutation: true,
            seed: None,
        }
    }
}

impl SequenceOptions {
    /// Plain, unrandomized Halton points. Every run sees the same sequence.
    #[must_use]
    pub fn deterministic() -> Self {
        Self {
            kind: SequenceKind::Halton,
            randomize_start: false,
            randomize_permutation: false,
            seed: None,
        }
    }

    /// Randomized Halton points with a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

/// Generator selected at runtime from [`SequenceOptions`].
#[derive(Debug, Clone)]
pub enum SequenceGenerator {
    Halton(HaltonSequence),
    PseudoRandom(PseudoRandomSequence),
}

impl SequenceGenerator {
    pub fn new(length: usize, options: &SequenceOptions) -> Result<Self, SequenceError> {
        match options.kind {
            SequenceKind::Halton => Ok(Self::Halton(HaltonSequence::new(length, options)?)),
            SequenceKind::PseudoRandom => {
                let seed = options.seed.unwrap_or_else(rand::random);
                Ok(Self::PseudoRandom(PseudoRandomSequence::new(length, seed)?))
            }
        }
    }
}

impl Sequence for SequenceGenerator {
    fn dimension(&self) -> usize {
        match self {
            Self::Halton(s) => s.dimension(),
            Self::PseudoRandom(s) => s.dimension(),
        }
    }

    fn advance(&mut self) {
        match self {
            Self::Halton(s) => s.advance(),
            Self::PseudoRandom(s) => s.advance(),
        }
    }

    fn point(&self) -> &[f64] {
        match self {
            Self::Halton(s) => s.point(),
            Self::PseudoRandom(s) => s.point(),
        }
    }

    fn position(&self) -> u64 {
        match self {
            Self::Halton(s) => s.position(),
            Self::PseudoRandom(s) => s.position(),
        }
    }

    fn skip(&mut self, n: u64) {
        match self {
            Self::Halton(s) => s.skip(n),
            Self::PseudoRandom(s) => s.skip(n),
        }
    }

    fn rewind(&mut self) {
        match self {
            Self::Halton(s) => s.rewind(),
            Self::PseudoRandom(s) => s.rewind(),
        }
    }
}

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Open01};

use super::Sequence;
use crate::error::SequenceError;

/// Seeded pseudo-random points drawn from the open interval (0, 1).
///
/// Every point comes from its own generator seeded by `(seed, index)`, so
/// [`Sequence::skip`] only moves the cursor and workers can start anywhere in
/// the stream at no cost.
#[derive(Debug, Clone)]
pub struct PseudoRandomSequence {
    seed: u64,
    position: u64,
    point: Vec<f64>,
}

/// Seed of the generator producing point `index` (1-based) of stream `seed`
#[inline]
fn point_seed(seed: u64, index: u64) -> u64 {
    seed.rotate_left(29) ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

impl PseudoRandomSequence {
    pub fn new(length: usize, seed: u64) -> Result<Self, SequenceError> {
        if length == 0 {
            return Err(SequenceError::ZeroDimension);
        }
        Ok(Self {
            seed,
            position: 0,
            point: vec![0.0; length],
        })
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Sequence for PseudoRandomSequence {
    fn dimension(&self) -> usize {
        self.point.len()
    }

    fn advance(&mut self) {
        self.position += 1;
        let mut rng = SmallRng::seed_from_u64(point_seed(self.seed, self.position));
        for value in self.point.iter_mut() {
            *value = Open01.sample(&mut rng);
        }
    }

    fn point(&self) -> &[f64] {
        &self.point
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn skip(&mut self, n: u64) {
        self.position += n;
    }

    fn rewind(&mut self) {
        self.position = 0;
        self.point.fill(0.0);
    }
}

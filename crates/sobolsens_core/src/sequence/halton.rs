use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::{Sequence, SequenceOptions};
use crate::error::SequenceError;

/// Upper bound (exclusive) for a randomized start index
const START_RANGE: u64 = 1 << 20;

/// Radical inverse of `n` in `base`: the base-`base` digits of `n` mirrored
/// about the radix point. Positive `n` maps into the open interval (0, 1).
#[must_use]
#[inline]
pub fn radical_inverse(mut n: u64, base: u64) -> f64 {
    let inv_base = 1.0 / base as f64;
    let mut factor = inv_base;
    let mut result = 0.0;
    while n > 0 {
        result += (n % base) as f64 * factor;
        n /= base;
        factor *= inv_base;
    }
    result
}

/// The first `n` primes in increasing order.
#[must_use]
pub fn first_primes(n: usize) -> Vec<u64> {
    let mut primes = Vec::with_capacity(n);
    let mut candidate = 2u64;
    while primes.len() < n {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// Halton sequence with optional random start and random base permutation.
///
/// Coordinate `i` of point `n` (0-based) is the radical inverse of
/// `start[i] + n + 1` in `bases[i]`. Without randomization `start` is all
/// zeros and `bases` are the first primes in order, so the first point in
/// three dimensions is `(1/2, 1/3, 1/5)`.
///
/// The randomization is drawn once in [`HaltonSequence::new`] and survives
/// [`Sequence::rewind`], so a single generator stays internally consistent
/// while separate runs see independently shifted sequences.
#[derive(Debug, Clone)]
pub struct HaltonSequence {
    bases: Vec<u64>,
    start: Vec<u64>,
    position: u64,
    point: Vec<f64>,
}

impl HaltonSequence {
    pub fn new(length: usize, options: &SequenceOptions) -> Result<Self, SequenceError> {
        if length == 0 {
            return Err(SequenceError::ZeroDimension);
        }

        let mut rng = match options.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        let start = if options.randomize_start {
            (0..length)
                .map(|_| rng.random_range(0..START_RANGE))
                .collect()
        } else {
            vec![0; length]
        };

        let primes = first_primes(length);
        let mut order: Vec<usize> = (0..length).collect();
        if options.randomize_permutation {
            order.shuffle(&mut rng);
        }
        let bases = order.iter().map(|&i| primes[i]).collect();

        Ok(Self {
            bases,
            start,
            position: 0,
            point: vec![0.0; length],
        })
    }

    /// Prime base feeding each coordinate
    #[must_use]
    pub fn bases(&self) -> &[u64] {
        &self.bases
    }

    /// Start index added to each coordinate
    #[must_use]
    pub fn start_offsets(&self) -> &[u64] {
        &self.start
    }
}

impl Sequence for HaltonSequence {
    fn dimension(&self) -> usize {
        self.bases.len()
    }

    fn advance(&mut self) {
        self.position += 1;
        for ((value, &base), &start) in self.point.iter_mut().zip(&self.bases).zip(&self.start) {
            *value = radical_inverse(start + self.position, base);
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

//! Uniform random source used by line generation and the ambient timer.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f32;

    /// Uniform sample in `[min, max)`.
    fn range(&mut self, (min, max): (f32, f32)) -> f32 {
        min + self.next_unit() * (max - min)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        ((self.next_unit() * len as f32) as usize).min(len - 1)
    }
}

/// Adapter from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<StdRng> {
    /// Entropy-seeded generator (getrandom, `js` backend on wasm).
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    #[inline]
    fn next_unit(&mut self) -> f32 {
        self.0.gen::<f32>()
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct Sequence {
    samples: Vec<f32>,
    cursor: usize,
}

#[cfg(test)]
impl Sequence {
    pub(crate) fn new(samples: impl Into<Vec<f32>>) -> Self {
        let samples = samples.into();
        assert!(!samples.is_empty(), "sequence needs at least one sample");
        Self { samples, cursor: 0 }
    }
}

#[cfg(test)]
impl RandomSource for Sequence {
    fn next_unit(&mut self) -> f32 {
        let value = self.samples[self.cursor % self.samples.len()];
        self.cursor += 1;
        value
    }
}

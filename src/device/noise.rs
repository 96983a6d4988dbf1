//! Noise sources for the physics simulation.
//!
//! Every simulated reading carries a little bounded jitter. The jitter comes
//! from a [`NoiseSource`] owned by the device so tests can swap the random
//! generator for a deterministic one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

/// Supplies uniformly distributed offsets.
pub trait NoiseSource: Send {
    /// Returns a value in `low..=high`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// `rand`-backed noise.
#[derive(Debug, Clone)]
pub struct RandomNoise {
    rng: StdRng,
}

impl RandomNoise {
    pub fn from_entropy() -> Self {
        RandomNoise {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        RandomNoise {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomNoise {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl NoiseSource for RandomNoise {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low.partial_cmp(&high) != Some(Ordering::Less) {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Deterministic noise: always the midpoint of the requested interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedNoise;

impl NoiseSource for FixedNoise {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (low + high) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_noise_stays_in_bounds() {
        let mut noise = RandomNoise::seeded(7);
        for _ in 0..1000 {
            let v = noise.uniform(-0.5, 0.5);
            assert!((-0.5..=0.5).contains(&v));
        }
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let mut a = RandomNoise::seeded(42);
        let mut b = RandomNoise::seeded(42);
        for _ in 0..16 {
            assert_eq!(a.uniform(0.0, 10.0), b.uniform(0.0, 10.0));
        }
    }

    #[test]
    fn test_degenerate_interval() {
        let mut noise = RandomNoise::seeded(1);
        assert_eq!(noise.uniform(7.0, 7.0), 7.0);
    }

    #[test]
    fn test_fixed_noise_is_midpoint() {
        let mut noise = FixedNoise;
        assert_eq!(noise.uniform(-2.0, 2.0), 0.0);
        assert_eq!(noise.uniform(6.0, 8.0), 7.0);
    }
}

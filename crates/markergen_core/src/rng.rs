//! Seeded random streams for layer processing.
//!
//! - `StdRandom`: `rand::rngs::StdRng`, for general use
//! - `EngineRandomStream`: the dungeon engine's linear congruential stream,
//!   reproducing its fraction sequence for a given seed
//!
//! Processing only asks for uniform fractions in `[0, 1)` and shuffles, both
//! through the object-safe [`RandomStream`] trait.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of randomness consumed sequentially by a processing pass.
pub trait RandomStream {
    /// Next raw 32 bit value.
    fn next_u32(&mut self) -> u32;

    /// Uniform fraction in `[0, 1)`.
    fn next_fraction(&mut self) -> f32;

    /// Uniform index in `[0, max)`. Zero when `max` is zero.
    fn next_usize_max(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        ((self.next_fraction() * max as f32) as usize).min(max - 1)
    }

    /// Uniform integer in `[min, max]`.
    fn rand_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min) as usize + 1;
        min + self.next_usize_max(span) as i32
    }

    fn next_bool(&mut self) -> bool {
        self.next_fraction() < 0.5
    }
}

/// Shuffle a slice in place, Fisher-Yates from the back.
/// A free function since generic methods aren't dyn-compatible.
pub fn shuffle_with_rng<T>(slice: &mut [T], rng: &mut dyn RandomStream) {
    for i in (1..slice.len()).rev() {
        let j = rng.next_usize_max(i + 1);
        slice.swap(i, j);
    }
}

/// Random stream backed by `rand::rngs::StdRng`.
#[derive(Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomStream for StdRandom {
    fn next_u32(&mut self) -> u32 {
        self.rng.gen()
    }

    fn next_fraction(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}

/// The dungeon engine's random stream.
///
/// `seed = seed * 196314165 + 907633515` (wrapping), and a fraction is
/// built from the top 23 bits of the new seed as a float in `[1, 2)` minus one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRandomStream {
    initial_seed: u32,
    seed: u32,
}

impl EngineRandomStream {
    pub fn new(seed: i32) -> Self {
        Self {
            initial_seed: seed as u32,
            seed: seed as u32,
        }
    }

    /// Rewind to the seed the stream was created with.
    pub fn reset(&mut self) {
        self.seed = self.initial_seed;
    }

    pub fn current_seed(&self) -> i32 {
        self.seed as i32
    }

    fn mutate_seed(&mut self) {
        self.seed = self
            .seed
            .wrapping_mul(196_314_165)
            .wrapping_add(907_633_515);
    }
}

impl RandomStream for EngineRandomStream {
    fn next_u32(&mut self) -> u32 {
        self.mutate_seed();
        self.seed
    }

    fn next_fraction(&mut self) -> f32 {
        self.mutate_seed();
        f32::from_bits(0x3F80_0000 | (self.seed >> 9)) - 1.0
    }
}

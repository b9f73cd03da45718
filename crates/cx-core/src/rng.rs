//! Deterministic session RNG for shuffling trial orders.
//!
//! # Determinism strategy
//!
//! Interval values are computed in closed form; only their *order* is random.
//! All ordering randomness flows through one `SessionRng` seeded from the
//! experiment configuration, so a session can be replayed exactly by reusing
//! its seed.  Child RNGs for independent blocks are derived with
//!
//!   seed = parent_draw XOR (block_index * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive block indices uniformly across the seed space.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seeded RNG used for every shuffle in a session.
///
/// Implements [`RngCore`], so it can be passed anywhere a `rand::Rng` is
/// expected (`&mut SessionRng` satisfies `R: Rng + ?Sized`).
pub struct SessionRng(SmallRng);

impl SessionRng {
    pub fn new(seed: u64) -> Self {
        SessionRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed from OS entropy, for sessions that do not need to be replayed.
    pub fn from_entropy() -> Self {
        SessionRng(SmallRng::from_entropy())
    }

    /// Derive a child `SessionRng` for block `offset`.
    pub fn child(&mut self, offset: u64) -> SessionRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SessionRng(SmallRng::seed_from_u64(child_seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }
}

impl RngCore for SessionRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}

//! Deterministic RNG for battle resolution
//!
//! The engine never reaches for a global random source. Every roll goes
//! through [`BattleRng`], so the browser can seed from `getrandom` while tests
//! feed fixed sequences.

use parity_scale_codec::{Decode, Encode};

/// Scale used for probability rolls (basis points).
pub const ROLL_SCALE: u32 = 10_000;

/// Trait for random number generation in battles
pub trait BattleRng {
    /// Generate a random u32
    fn next_u32(&mut self) -> u32;

    /// Generate a random number in range [0, max)
    fn gen_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u32() as usize) % max
    }

    /// Draw a uniform value in basis points, [0, ROLL_SCALE)
    fn roll_basis_points(&mut self) -> u32 {
        self.gen_range(ROLL_SCALE as usize) as u32
    }

    /// Shuffle a slice using Fisher-Yates algorithm
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.gen_range(i + 1);
            slice.swap(i, j);
        }
    }
}

/// XorShift32 RNG - simple, fast, deterministic
///
/// The same seed will always produce the same sequence.
#[derive(Debug, Clone, Encode, Decode)]
pub struct XorShiftRng {
    state: u32,
}

impl XorShiftRng {
    /// Create a new RNG from a u64 seed
    ///
    /// The seed is combined into a u32, ensuring state is never 0.
    pub fn seed_from_u64(seed: u64) -> Self {
        let state = ((seed as u32) ^ ((seed >> 32) as u32)).max(1);
        Self { state }
    }

    /// Create a new RNG from a u32 seed
    pub fn seed_from_u32(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }
}

impl BattleRng for XorShiftRng {
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

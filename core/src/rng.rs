//! Randomness seam plus a Park-Miller Linear Congruential Generator (MINSTD)
//!
//! Generation and Q-learning exploration only ever see [`RandomSource`],
//! so tests drive them with a seeded [`SimpleLCG`] and get the same maze
//! and the same training run every time.
//!
//! Constants:
//! - Multiplier (a): 48271
//! - Modulus (m): 2^31 - 1 = 2147483647
//!
//! Reference: https://en.wikipedia.org/wiki/Lehmer_random_number_generator

const MODULUS: u64 = 2147483647; // 2^31 - 1

/// Source of uniform randomness consumed by the generator and the learner.
pub trait RandomSource {
    /// Next raw value in `[1, 2^31 - 1)`.
    fn next_u32(&mut self) -> u32;

    /// Uniform float in `[0, 1)`.
    fn next_f32(&mut self) -> f32 {
        let value = self.next_u32() as f64 / MODULUS as f64;
        // f64 -> f32 can round 0.99999999 up to 1.0
        (value as f32).min(1.0 - f32::EPSILON)
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    fn choice_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "choice_index on empty range");
        let scaled = (self.next_u32() as u64 * len as u64) / MODULUS;
        scaled as usize
    }

    /// Fair coin flip.
    fn coin(&mut self) -> bool {
        self.choice_index(2) == 1
    }
}

/// Park-Miller Linear Congruential Generator
///
/// Generates a deterministic sequence of pseudo-random numbers from a seed.
/// Same seed always produces the same sequence.
#[derive(Clone, Debug)]
pub struct SimpleLCG {
    state: u32,
}

impl SimpleLCG {
    /// Create a new LCG with the given seed
    ///
    /// Seeds are reduced modulo 2^31 - 1; a seed that reduces to 0 is
    /// replaced with 1 to avoid the degenerate all-zero sequence.
    pub fn new(seed: u32) -> Self {
        let state = (seed as u64 % MODULUS) as u32;
        Self {
            state: if state == 0 { 1 } else { state },
        }
    }

    /// Advance RNG state (internal)
    fn advance(&mut self) {
        const A: u64 = 48271;

        // Use u64 to avoid overflow during multiplication
        self.state = ((self.state as u64 * A) % MODULUS) as u32;
    }
}

impl RandomSource for SimpleLCG {
    fn next_u32(&mut self) -> u32 {
        self.advance();
        self.state
    }
}

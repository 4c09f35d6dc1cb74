//! Deterministic uniform generators
//!
//! Every stochastic run in this crate draws from a [`UniformSource`]. Two
//! implementations exist:
//!
//! - [`Mulberry32`]: a seeded 32-bit multiply-xorshift generator. Two
//!   instances built from the same seed yield identical sequences forever.
//! - [`SuppliedDraws`]: a caller-provided list of uniform values (manual
//!   input mode), consumed in order.
//!
//! # Example
//!
//! ```
//! use outfall::rng::{Mulberry32, UniformSource};
//!
//! let mut a = Mulberry32::new(42);
//! let mut b = Mulberry32::new(42);
//! for _ in 0..8 {
//!     assert_eq!(a.next_uniform(), b.next_uniform());
//! }
//! ```

use rand::{Error, RngCore, SeedableRng};

/// 2^32 as f64, maps a u32 onto [0,1)
const U32_SCALE: f64 = 4_294_967_296.0;

/// Weyl increment added to the state on every draw
const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;

/// Source of uniform draws in [0,1)
pub trait UniformSource {
    /// Next value in [0,1)
    fn next_uniform(&mut self) -> f64;
}

/// Mulberry32 generator
///
/// Not cryptographic. The full state is one `u32`, so a generator is cheap to
/// clone and to recreate from its seed for replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Create a generator from an unsigned seed
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Create a generator from any integer seed
    ///
    /// Negative and wide seeds are normalised by wrapping into u32, so
    /// `-1` and `4294967295` describe the same stream.
    pub fn from_signed(seed: i64) -> Self {
        Self::new(seed as u32)
    }
}

impl UniformSource for Mulberry32 {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        self.next_u32() as f64 / U32_SCALE
    }
}

impl RngCore for Mulberry32 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_u32() as u64;
        let lo = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state as u32)
    }
}

/// Caller-supplied uniform values, consumed front to back
///
/// Callers check [`SuppliedDraws::remaining`] before a run; reading past the
/// end yields 0.0.
#[derive(Debug, Clone)]
pub struct SuppliedDraws<'a> {
    values: &'a [f64],
    pos: usize,
}

impl<'a> SuppliedDraws<'a> {
    pub fn new(values: &'a [f64]) -> Self {
        Self { values, pos: 0 }
    }

    /// Number of values not yet consumed
    pub fn remaining(&self) -> usize {
        self.values.len() - self.pos
    }
}

impl UniformSource for SuppliedDraws<'_> {
    fn next_uniform(&mut self) -> f64 {
        match self.values.get(self.pos) {
            Some(&u) => {
                self.pos += 1;
                u
            }
            None => 0.0,
        }
    }
}

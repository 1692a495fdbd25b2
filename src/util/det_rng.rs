//! Deterministic pseudo-random number generator.
//!
//! Uses the xorshift64 algorithm. Given the same seed, the sequence of
//! generated numbers is always identical, which keeps generated task lists
//! and their expected sums reproducible between runs.

/// A deterministic pseudo-random number generator using xorshift64.
///
/// It is NOT cryptographically secure.
#[derive(Debug, Clone)]
pub struct DetRng {
    state: u64,
}

impl DetRng {
    /// Creates a new PRNG with the given seed.
    ///
    /// The seed must be non-zero. If zero is provided, it will be replaced with 1.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Generates the next pseudo-random u64 value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generates a pseudo-random byte.
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_u8(&mut self) -> u8 {
        (self.next_u64() >> 56) as u8
    }

    /// Generates a pseudo-random usize value in the range [0, bound).
    ///
    /// # Panics
    ///
    /// Panics if `bound` is zero.
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_usize(&mut self, bound: usize) -> usize {
        assert!(bound > 0, "bound must be non-zero");
        (self.next_u64() as usize) % bound
    }

    /// Returns true with the given probability, expressed in percent.
    ///
    /// Values above 100 behave like 100.
    pub fn chance(&mut self, percent: u8) -> bool {
        self.next_usize(100) < usize::from(percent)
    }
}

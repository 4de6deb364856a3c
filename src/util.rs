//! Shared utilities

/// Simple deterministic RNG using xorshift64
/// Drives `fill_static` so noise frames are reproducible for a given seed
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) } // Ensure non-zero
    }

    /// Get the next random u64
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Get a random u32 (high half, the low bits of xorshift are weaker)
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Get a random i32 in [min, max]
    #[inline]
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        debug_assert!(min <= max, "range_i32: min ({}) must be <= max ({})", min, max);
        if min >= max {
            return min;
        }
        let range = (max as i64 - min as i64 + 1) as u64;
        (min as i64 + (self.next_u64() % range) as i64) as i32
    }
}

/// FNV-1a hash of a pixel buffer, for cheap before/after comparisons
pub fn checksum(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ b as u64).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_rng_zero_seed_still_moves() {
        let mut r = Rng::new(0);
        assert_ne!(r.next_u64(), 0);
    }

    #[test]
    fn test_range_i32_bounds() {
        let mut r = Rng::new(9);
        for _ in 0..1000 {
            let v = r.range_i32(-3, 4);
            assert!((-3..=4).contains(&v));
        }
        assert_eq!(r.range_i32(5, 5), 5);
    }

    #[test]
    fn test_checksum_detects_single_byte_change() {
        let mut buf = vec![0u8; 64];
        let before = checksum(&buf);
        buf[40] = 1;
        assert_ne!(checksum(&buf), before);
        assert_eq!(checksum(&[]), 0xcbf2_9ce4_8422_2325);
    }
}

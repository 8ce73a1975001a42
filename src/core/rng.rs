//! Deterministic Random Number Generator
//!
//! Uses Xorshift128+ for fast, reproducible randomness.
//! Map generation and the autonomy shuffle both draw from this, so a fixed
//! seed reproduces an entire game.

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use miner_game::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl DeterministicRng {
    /// Seed through SplitMix64 so small or sequential seeds still start
    /// from well-mixed state.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Xorshift must never be all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Derive an independent stream from this seed and a domain label.
    ///
    /// Lets map generation and the autonomy policy consume randomness
    /// without shifting each other's sequences.
    pub fn derived(seed: u64, domain: &[u8]) -> Self {
        let mut s = seed;
        for byte in domain {
            s = s.rotate_left(8) ^ u64::from(*byte);
            splitmix64(&mut s);
        }
        Self::new(s)
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Uniform-ish integer in `0..max`; `0` when `max` is `0`.
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        match max {
            0 => 0,
            _ => (self.next_u64() % u64::from(max)) as u32,
        }
    }

    /// Integer in `min..=max`. Returns `min` for an empty range.
    #[inline]
    pub fn next_int_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let span = max - min;
        if span == u32::MAX {
            return self.next_u64() as u32;
        }
        min + self.next_int(span + 1)
    }

    /// Roll a percentage chance (0 = never, 100 = always).
    #[inline]
    pub fn chance_percent(&mut self, percent: u32) -> bool {
        self.next_int(100) < percent
    }

    /// Fisher-Yates shuffle. Draws `len - 1` values.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for upper in (1..items.len()).rev() {
            let pick = self.next_int(upper as u32 + 1) as usize;
            items.swap(upper, pick);
        }
    }

    /// Raw generator state, fed into the world hash.
    pub fn state(&self) -> [u64; 2] {
        self.state
    }
}

#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = DeterministicRng::new(12345);
        let mut b = DeterministicRng::new(12345);
        let mut c = DeterministicRng::new(54321);

        let first: Vec<u64> = (0..100).map(|_| a.next_u64()).collect();
        let second: Vec<u64> = (0..100).map(|_| b.next_u64()).collect();
        assert_eq!(first, second);
        assert_ne!(first[0], c.next_u64());
    }

    #[test]
    fn test_zero_seed_is_usable() {
        let mut rng = DeterministicRng::new(0);
        let draws: Vec<u64> = (0..4).map(|_| rng.next_u64()).collect();
        assert!(draws.iter().any(|&v| v != 0));
    }

    #[test]
    fn test_derived_streams_differ() {
        let mut map_rng = DeterministicRng::derived(7, b"map");
        let mut ai_rng = DeterministicRng::derived(7, b"autonomy");
        assert_ne!(map_rng.next_u64(), ai_rng.next_u64());

        let mut again = DeterministicRng::derived(7, b"map");
        let mut map_rng = DeterministicRng::derived(7, b"map");
        assert_eq!(map_rng.next_u64(), again.next_u64());
    }

    #[test]
    fn test_next_int_bounds() {
        let mut rng = DeterministicRng::new(1234);
        assert!((0..1000).all(|_| rng.next_int(7) < 7));
        assert_eq!(rng.next_int(0), 0);
        assert_eq!(rng.next_int(1), 0);
    }

    #[test]
    fn test_next_int_range_inclusive() {
        let mut rng = DeterministicRng::new(5678);
        let mut saw_min = false;
        let mut saw_max = false;

        for _ in 0..5000 {
            let val = rng.next_int_range(1, 50);
            assert!((1..=50).contains(&val));
            saw_min |= val == 1;
            saw_max |= val == 50;
        }

        assert!(saw_min && saw_max, "both bounds should be reachable");
        assert_eq!(rng.next_int_range(5, 5), 5);
    }

    #[test]
    fn test_chance_percent_extremes() {
        let mut rng = DeterministicRng::new(99);
        for _ in 0..500 {
            assert!(!rng.chance_percent(0));
            assert!(rng.chance_percent(100));
        }
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut a = DeterministicRng::new(1111);
        let mut b = DeterministicRng::new(1111);
        let mut left = [3, 1, 4, 1, 5, 9, 2, 6];
        let mut right = left;

        a.shuffle(&mut left);
        b.shuffle(&mut right);
        assert_eq!(left, right);

        left.sort_unstable();
        assert_eq!(left, [1, 1, 2, 3, 4, 5, 6, 9]);

        // Nothing to shuffle, nothing drawn
        let before = a.state();
        a.shuffle::<u8>(&mut []);
        a.shuffle(&mut [42]);
        assert_eq!(a.state(), before);
    }
}

// Seeded random stream for the composer.
//
// xoshiro256++ (Blackman & Vigna, 2019) seeded through SplitMix64. One
// `ComposerRng` is created per `generate()` call and threaded by `&mut`
// through harmony sampling, voice-leading tie-breaks, fugue subject walks,
// and every ornament pass. Nothing reseeds mid-pipeline, so a seed string
// plus options fully determines the output.
//
// Seeds arrive from callers as strings ("default", "t1", ...). They are
// folded into a u64 with 64-bit FNV-1a, which is stable across platforms
// and Rust versions, unlike `std::hash`.
//
// Determinism rule: the core generator uses integer arithmetic only. Float
// helpers (`next_f64`, `random_bool`, `weighted_index`) derive from it and
// perform the same IEEE operations on every target.

use serde::{Deserialize, Serialize};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// The composer's sole source of randomness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComposerRng {
    s: [u64; 4],
}

impl ComposerRng {
    /// Seed from a `u64`, expanded to 256 bits of state with SplitMix64.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Seed from a caller-supplied string such as `"default"`.
    pub fn from_seed_str(seed: &str) -> Self {
        Self::new(fnv1a_64(seed.as_bytes()))
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform `f64` in [0, 1) from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)`, rejection-sampled to avoid modulo bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Uniform `i32` in `[low, high]`, inclusive on both ends.
    ///
    /// Used for symmetric jitter (velocity, timing). Panics if `low > high`.
    pub fn range_i32_inclusive(&mut self, low: i32, high: i32) -> i32 {
        assert!(low <= high, "range_i32_inclusive: low must be <= high");
        let span = (high as i64 - low as i64 + 1) as u64;
        (low as i64 + self.range_u64(0, span) as i64) as i32
    }

    /// `true` with probability `p`. `p <= 0` is always false, `p >= 1` always true.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick a uniformly random element, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range_usize(0, items.len());
        items.get(idx)
    }

    /// Sample an index proportionally to `weights`.
    ///
    /// Walks the cumulative sum against a single uniform draw scaled to the
    /// total. Negative and NaN weights count as zero. Returns `None` if the
    /// slice is empty or every weight is zero.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let total: f64 = weights.iter().map(|&w| clean(w)).sum();
        if total <= 0.0 {
            return None;
        }
        let target = self.next_f64() * total;
        let mut cumulative = 0.0;
        let mut last_positive = None;
        for (i, &w) in weights.iter().enumerate() {
            let w = clean(w);
            if w == 0.0 {
                continue;
            }
            cumulative += w;
            last_positive = Some(i);
            if target < cumulative {
                return Some(i);
            }
        }
        // Float rounding can leave target == total; land on the last live bucket.
        last_positive
    }
}

/// SplitMix64, used only to expand a seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// 64-bit FNV-1a over raw bytes.
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = ComposerRng::new(42);
        let mut b = ComposerRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn string_seeds_are_stable_and_distinct() {
        let mut a = ComposerRng::from_seed_str("t1");
        let mut b = ComposerRng::from_seed_str("t1");
        let mut c = ComposerRng::from_seed_str("t2");
        let first = a.next_u64();
        assert_eq!(first, b.next_u64());
        assert_ne!(first, c.next_u64());
    }

    #[test]
    fn fnv1a_known_vectors() {
        // Reference values from the FNV specification.
        assert_eq!(fnv1a_64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_64(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = ComposerRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn range_usize_within_bounds() {
        let mut rng = ComposerRng::new(555);
        for _ in 0..10_000 {
            let v = rng.range_usize(5, 15);
            assert!((5..15).contains(&v), "range_usize out of range: {v}");
        }
    }

    #[test]
    fn range_i32_inclusive_hits_both_ends() {
        let mut rng = ComposerRng::new(666);
        let mut saw_low = false;
        let mut saw_high = false;
        for _ in 0..10_000 {
            let v = rng.range_i32_inclusive(-3, 3);
            assert!((-3..=3).contains(&v));
            saw_low |= v == -3;
            saw_high |= v == 3;
        }
        assert!(saw_low && saw_high);
    }

    #[test]
    fn random_bool_extremes() {
        let mut rng = ComposerRng::new(42);
        for _ in 0..100 {
            assert!(!rng.random_bool(0.0));
            assert!(rng.random_bool(1.0));
        }
    }

    #[test]
    fn random_bool_distribution() {
        let mut rng = ComposerRng::new(42);
        let n = 10_000;
        let hits = (0..n).filter(|_| rng.random_bool(0.3)).count();
        let pct = hits as f64 / n as f64;
        assert!((0.25..0.35).contains(&pct), "expected ~30%, got {pct}");
    }

    #[test]
    fn choose_empty_and_single() {
        let mut rng = ComposerRng::new(7);
        let empty: [u8; 0] = [];
        assert_eq!(rng.choose(&empty), None);
        assert_eq!(rng.choose(&[9]), Some(&9));
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let mut rng = ComposerRng::new(11);
        for _ in 0..1000 {
            let idx = rng.weighted_index(&[0.0, 2.0, 0.0, 1.0]);
            assert!(matches!(idx, Some(1) | Some(3)));
        }
        assert_eq!(rng.weighted_index(&[0.0, 0.0]), None);
        assert_eq!(rng.weighted_index(&[]), None);
    }

    #[test]
    fn weighted_index_follows_proportions() {
        let mut rng = ComposerRng::new(99);
        let mut counts = [0usize; 3];
        for _ in 0..30_000 {
            if let Some(i) = rng.weighted_index(&[0.7, 0.2, 0.1]) {
                counts[i] += 1;
            }
        }
        let first = counts[0] as f64 / 30_000.0;
        assert!((0.67..0.73).contains(&first), "got {first}");
        assert!(counts[1] > counts[2]);
    }

    #[test]
    fn serialization_roundtrip_continues_stream() {
        let mut rng = ComposerRng::from_seed_str("resume");
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: ComposerRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}

// Deterministic seeded randomness.
//
// Every random-looking decision in the engine is a pure function of
// (seed, domain, key). Draws hash the inputs with FNV-1a and run the result
// through a 64-bit finalizer, so the same call against the same inputs always
// produces the same value, across runs and across save/reload.

// ---------------------------------------------------------------------------
// FNV-1a
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Fnv1a64 {
    hash: u64,
}

impl Fnv1a64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            hash: Self::OFFSET_BASIS,
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.hash ^= u64::from(b);
            self.hash = self.hash.wrapping_mul(Self::PRIME);
        }
    }

    fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write(s.as_bytes());
    }

    fn finish(&self) -> u64 {
        self.hash
    }
}

/// 64-bit avalanche finalizer. FNV-1a alone leaves the low bits of short
/// numeric keys poorly mixed.
fn avalanche(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51afd7ed558ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ceb9fe1a85ec53);
    x ^= x >> 33;
    x
}

/// Hash an arbitrary string (e.g. an offer id) into a key part.
pub fn text_key(s: &str) -> u64 {
    let mut h = Fnv1a64::new();
    h.write_str(s);
    h.finish()
}

// ---------------------------------------------------------------------------
// SeededStream
// ---------------------------------------------------------------------------

/// A named source of reproducible draws.
///
/// The `domain` tag separates independent streams that share a seed (team
/// profiles, prospect truth, offer noise, ...), so adding a new consumer
/// never shifts the values an existing one sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededStream {
    seed: u64,
    domain: &'static str,
}

impl SeededStream {
    pub fn new(seed: u64, domain: &'static str) -> Self {
        Self { seed, domain }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    /// Raw 64-bit draw for a key.
    pub fn hash(&self, key: &[u64]) -> u64 {
        let mut h = Fnv1a64::new();
        h.write_u64(self.seed);
        h.write_str(self.domain);
        for &part in key {
            h.write_u64(part);
        }
        avalanche(h.finish())
    }

    /// Uniform value in `[0, 1)`.
    pub fn unit(&self, key: &[u64]) -> f64 {
        (self.hash(key) >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform value in `[-1, 1)`.
    pub fn signed(&self, key: &[u64]) -> f64 {
        self.unit(key) * 2.0 - 1.0
    }

    /// Uniform value in `[lo, hi)`.
    pub fn range(&self, key: &[u64], lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.unit(key)
    }

    /// Deterministic coin flip that lands `true` with probability `p`.
    pub fn chance(&self, key: &[u64], p: f64) -> bool {
        if p >= 1.0 {
            return true;
        }
        if p <= 0.0 {
            return false;
        }
        self.unit(key) < p
    }

    /// Index in `0..n`. Returns 0 when `n` is 0.
    pub fn index(&self, key: &[u64], n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        (self.hash(key) % n as u64) as usize
    }

    /// Weighted index into `weights`. Non-positive weights are never chosen
    /// unless every weight is non-positive, in which case index 0 is returned.
    pub fn weighted_index(&self, key: &[u64], weights: &[f64]) -> usize {
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 {
            return 0;
        }
        let mut roll = self.unit(key) * total;
        let mut last_positive = 0;
        for (i, &w) in weights.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            last_positive = i;
            if roll < w {
                return i;
            }
            roll -= w;
        }
        last_positive
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_draw() {
        let a = SeededStream::new(42, "test");
        let b = SeededStream::new(42, "test");
        for k in 0..50u64 {
            assert_eq!(a.hash(&[k, 7]), b.hash(&[k, 7]));
            assert_eq!(a.unit(&[k]).to_bits(), b.unit(&[k]).to_bits());
        }
    }

    #[test]
    fn domains_and_seeds_are_independent() {
        let base = SeededStream::new(42, "alpha");
        let other_domain = SeededStream::new(42, "beta");
        let other_seed = SeededStream::new(43, "alpha");
        assert_ne!(base.hash(&[1]), other_domain.hash(&[1]));
        assert_ne!(base.hash(&[1]), other_seed.hash(&[1]));
    }

    #[test]
    fn key_order_matters() {
        let s = SeededStream::new(9, "order");
        assert_ne!(s.hash(&[1, 2]), s.hash(&[2, 1]));
    }

    #[test]
    fn unit_stays_in_range() {
        let s = SeededStream::new(7, "range");
        for k in 0..2000u64 {
            let u = s.unit(&[k]);
            assert!((0.0..1.0).contains(&u), "unit out of range: {u}");
            let v = s.signed(&[k]);
            assert!((-1.0..1.0).contains(&v), "signed out of range: {v}");
            let r = s.range(&[k], 0.15, 0.95);
            assert!((0.15..0.95).contains(&r));
        }
    }

    #[test]
    fn unit_is_roughly_uniform() {
        let s = SeededStream::new(1234, "uniform");
        let n = 10_000u64;
        let mean: f64 = (0..n).map(|k| s.unit(&[k])).sum::<f64>() / n as f64;
        assert!((mean - 0.5).abs() < 0.02, "mean drifted: {mean}");
    }

    #[test]
    fn chance_edges() {
        let s = SeededStream::new(1, "chance");
        assert!(s.chance(&[0], 1.0));
        assert!(!s.chance(&[0], 0.0));
        assert!(!s.chance(&[0], -0.5));
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let s = SeededStream::new(5, "weights");
        for k in 0..200u64 {
            let i = s.weighted_index(&[k], &[0.0, 1.0, 0.0]);
            assert_eq!(i, 1);
        }
        assert_eq!(s.weighted_index(&[0], &[]), 0);
        assert_eq!(s.weighted_index(&[0], &[0.0, 0.0]), 0);
    }

    #[test]
    fn index_handles_empty_range() {
        let s = SeededStream::new(5, "index");
        assert_eq!(s.index(&[3], 0), 0);
        for k in 0..100u64 {
            assert!(s.index(&[k], 4) < 4);
        }
    }

    #[test]
    fn text_key_is_stable() {
        assert_eq!(text_key("offer-1"), text_key("offer-1"));
        assert_ne!(text_key("offer-1"), text_key("offer-2"));
    }
}

//! Seeded linear-congruential generator.
//!
//! The multiplier, increment and modulus are fixed: every permutation table,
//! and therefore every terrain, is reproduced from them bit for bit.

const MULTIPLIER: i64 = 9301;
const INCREMENT: i64 = 49297;
const MODULUS: i64 = 233_280;

/// Reproducible stream of floats from an integer seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: i64,
}

impl SeededRandom {
    pub fn new(seed: i64) -> Self {
        Self { state: seed }
    }

    /// Advance the state and return it scaled by the modulus.
    ///
    /// In `[0, 1)` for non-negative seeds. A negative seed keeps a negative
    /// state (truncating remainder) until the sequence crosses zero, so values
    /// may start in `(-1, 0)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.state as f64 / MODULUS as f64
    }

    /// Draw a byte-sized lattice value, `floor(next * 256)` wrapped into `0..=255`.
    pub fn next_byte(&mut self) -> u8 {
        ((self.next_f64() * 256.0).floor() as i64).rem_euclid(256) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_matches_reference_for_seed_12345() {
        let mut rng = SeededRandom::new(12345);
        let expected = [
            0.4131601508916324,
            0.01388460219478738,
            0.3520061728395062,
            0.22073473936899862,
            0.2651320301783265,
        ];
        for e in expected {
            assert_eq!(rng.next_f64(), e);
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = SeededRandom::new(777);
        let mut b = SeededRandom::new(777);
        for _ in 0..1000 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn values_stay_in_unit_interval_for_positive_seed() {
        let mut rng = SeededRandom::new(i32::MAX as i64);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn negative_seed_bytes_are_wrapped() {
        // -42 produces negative draws at first; bytes must still be valid.
        let mut rng = SeededRandom::new(-42);
        let first = rng.next_f64();
        assert!(first < 0.0);
        let mut rng = SeededRandom::new(-42);
        // floor(first * 256) == -119 -> 137
        assert_eq!(rng.next_byte(), 137);
    }
}

//! Noise generators: white, triangular (TPDF), brown and pink.

use rand::RngCore;

use super::rng::{bipolar, signed_bits};

/// One uniform draw in [-1, 1).
#[inline]
pub fn white<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    bipolar(rng)
}

/// Triangular-PDF noise: mean of two uniform draws.
#[inline]
pub fn tpdf<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    0.5 * (bipolar(rng) + bipolar(rng))
}

/// Random walk kept inside [-1, 1] by redrawing any step that would leave it.
#[derive(Debug, Clone, Default)]
pub struct BrownNoise {
    last: f64,
}

impl BrownNoise {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn next_sample<R: RngCore + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let out = loop {
            let candidate = self.last + bipolar(rng) * (1.0 / 16.0);
            if candidate.abs() <= 1.0 {
                break candidate;
            }
        };
        self.last = out;
        out
    }
}

/// Upper bound on generator rows.
pub const PINK_MAX_RANDOM_ROWS: usize = 30;
const PINK_RANDOM_BITS: u32 = 24;

/// Pink (1/f) noise using the Voss-McCartney row algorithm.
///
/// Row `k` is refreshed every `2^(k+1)` samples, chosen by the lowest set bit
/// of a wrapping counter, so each row contributes roughly one octave of the
/// spectrum. A fresh white draw is added on every call.
#[derive(Debug, Clone)]
pub struct PinkNoise {
    rows: [i32; PINK_MAX_RANDOM_ROWS],
    num_rows: usize,
    running_sum: i64,
    index: u32,
    index_mask: u32,
    scalar: f64,
}

impl PinkNoise {
    /// Create a generator with `num_rows` rows (clamped to 1..=30).
    pub fn new(num_rows: usize) -> Self {
        let num_rows = num_rows.clamp(1, PINK_MAX_RANDOM_ROWS);
        // Extra 1 for the white noise always added.
        let pmax = (num_rows as i64 + 1) * (1 << (PINK_RANDOM_BITS - 1));
        Self {
            rows: [0; PINK_MAX_RANDOM_ROWS],
            num_rows,
            running_sum: 0,
            index: 0,
            index_mask: (1u32 << num_rows) - 1,
            scalar: 1.0 / pmax as f64,
        }
    }

    /// Row count for the given audio channel: 10, 12, 14, ... up to the cap.
    pub fn for_channel(channel_index: usize) -> Self {
        Self::new(10 + 2 * channel_index.min(PINK_MAX_RANDOM_ROWS))
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Next sample in [-1, 1).
    pub fn next_sample<R: RngCore + ?Sized>(&mut self, rng: &mut R) -> f64 {
        self.index = (self.index + 1) & self.index_mask;

        // Index zero refreshes no row.
        if self.index != 0 {
            let row = self.index.trailing_zeros() as usize;
            let fresh = signed_bits(rng, PINK_RANDOM_BITS);
            self.running_sum += fresh as i64 - self.rows[row] as i64;
            self.rows[row] = fresh;
        }

        let sum = self.running_sum + signed_bits(rng, PINK_RANDOM_BITS) as i64;
        self.scalar * sum as f64
    }
}

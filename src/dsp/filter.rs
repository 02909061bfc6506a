//! First-order filter sections used inside the plucked-string loop.

use std::f64::consts::PI;

/// Single-pole low-pass: `y = x·gain + y₋₁·feedback`.
#[derive(Debug, Clone, Default)]
pub struct OnePoleLowpass {
    /// Pole position (c0).
    pub feedback: f64,
    /// Feedforward gain (c1).
    pub gain: f64,
    last_out: f64,
}

impl OnePoleLowpass {
    pub fn new(feedback: f64, gain: f64) -> Self {
        Self {
            feedback,
            gain,
            last_out: 0.0,
        }
    }

    /// Unity-DC-gain low-pass whose squared magnitude at `cutoff_hz` is
    /// `loss²` (linear gain per pass, 0 < loss < 1).
    pub fn damping(loss: f64, cutoff_hz: f64, sample_rate: f64) -> Self {
        let d = loss * loss;
        let d = (d * (2.0 * PI * cutoff_hz / sample_rate).cos() - 1.0) / (d - 1.0);
        let feedback = d - (d * d - 1.0).sqrt();
        Self::new(feedback, 1.0 - feedback)
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.last_out = input * self.gain + self.last_out * self.feedback;
        self.last_out
    }
}

/// One-pole, one-zero DC blocker.
#[derive(Debug, Clone, Default)]
pub struct DcBlocker {
    /// Pole (c2).
    pub pole: f64,
    /// Input gain (c3).
    pub gain: f64,
    last_in: f64,
    last_out: f64,
}

impl DcBlocker {
    pub fn new(corner_hz: f64, sample_rate: f64) -> Self {
        let pole = (-2.0 * PI * corner_hz / sample_rate).exp();
        Self {
            pole,
            gain: (1.0 + pole) * 0.5,
            last_in: 0.0,
            last_out: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.last_out = (input - self.last_in) * self.gain + self.last_out * self.pole;
        self.last_in = input;
        self.last_out
    }
}

/// First-order all-pass used as a fractional delay of `frac` samples
/// (accurate at low frequencies).
#[derive(Debug, Clone, Default)]
pub struct FractionalAllpass {
    /// All-pass coefficient (c4).
    pub coeff: f64,
    last_in: f64,
    last_out: f64,
}

impl FractionalAllpass {
    pub fn new(frac: f64) -> Self {
        Self {
            coeff: (1.0 - frac) / (1.0 + frac),
            last_in: 0.0,
            last_out: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.last_out = (input - self.last_out) * self.coeff + self.last_in;
        self.last_in = input;
        self.last_out
    }
}

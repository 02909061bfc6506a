//! Phase evolution for tonal channels under the sweep laws.
//!
//! Phase is computed in closed form from the shared sample counter rather
//! than accumulated, so every channel stays locked to elapsed time. Only the
//! per-cycle exponential law keeps state (the start time of the current
//! cycle).

use crate::config::{ChannelSpec, SweepLaw};

#[derive(Debug, Clone)]
pub struct PhaseEngine {
    law: Option<SweepLaw>,
    /// Base frequency (divided by `mult` for the exponential law).
    freq: f64,
    mult: f64,
    phase_offset: f64,
    sample_rate: f64,
    cycle_start: f64,
}

impl PhaseEngine {
    /// Derive the sweep multiplier for a run of `samples_to_do` samples
    /// (0 = unbounded). A sweep between equal endpoints is a steady tone.
    pub fn new(spec: &ChannelSpec, samples_to_do: u64, sample_rate: f64) -> Self {
        let f1 = spec.freq;
        let f2 = spec.end_freq();
        let law = spec.sweep.map(|s| s.law).filter(|_| f1 != f2);
        let n = samples_to_do as f64;
        let bounded = samples_to_do != 0;

        let mut freq = f1;
        let mult = match law {
            None => 0.0,
            Some(SweepLaw::Linear) if bounded => (f2 - f1) / n / 2.0,
            Some(SweepLaw::Linear) => 0.0,
            Some(SweepLaw::Square) if bounded => {
                let m = (f2 - f1).abs().sqrt() / n / 3f64.sqrt();
                if f1 > f2 { -m } else { m }
            }
            Some(SweepLaw::Square) => 0.0,
            Some(SweepLaw::Exp) => {
                let m = if bounded {
                    (f2 / f1).ln() / n * sample_rate
                } else {
                    1.0
                };
                freq /= m;
                m
            }
            Some(SweepLaw::ExpCycle) if bounded => (f2.ln() - f1.ln()) / n,
            Some(SweepLaw::ExpCycle) => 1.0,
        };

        Self {
            law,
            freq,
            mult,
            phase_offset: spec.phase,
            sample_rate,
            cycle_start: 0.0,
        }
    }

    pub fn mult(&self) -> f64 {
        self.mult
    }

    /// Phase before the offset is added and before wrapping.
    pub fn raw_phase(&mut self, samples_done: u64) -> f64 {
        let n = samples_done as f64;
        let t = n / self.sample_rate;
        match self.law {
            None => self.freq * t,
            Some(SweepLaw::Linear) => (self.freq + n * self.mult) * t,
            Some(SweepLaw::Square) => {
                let s = n * self.mult;
                (self.freq + self.mult.signum() * s * s) * t
            }
            Some(SweepLaw::Exp) => self.freq * (self.mult * t).exp(),
            Some(SweepLaw::ExpCycle) => {
                let f = self.freq * (n * self.mult).exp();
                let elapsed = f * (t - self.cycle_start);
                if !elapsed.is_finite() {
                    return 0.0;
                }
                let cycles = elapsed.floor();
                if cycles >= 1.0 {
                    self.cycle_start += cycles / f;
                }
                wrap_unit(f * (t - self.cycle_start))
            }
        }
    }

    /// Position within the current cycle, in [0, 1).
    pub fn phase(&mut self, samples_done: u64) -> f64 {
        wrap_unit(self.raw_phase(samples_done) + self.phase_offset)
    }

    /// Analytic instantaneous frequency in Hz at `samples_done`.
    pub fn instantaneous_frequency(&self, samples_done: u64) -> f64 {
        let n = samples_done as f64;
        let t = n / self.sample_rate;
        match self.law {
            None => self.freq,
            Some(SweepLaw::Linear) => self.freq + 2.0 * n * self.mult,
            Some(SweepLaw::Square) => {
                let s = n * self.mult;
                self.freq + 3.0 * self.mult.signum() * s * s
            }
            Some(SweepLaw::Exp) => self.freq * self.mult * (self.mult * t).exp(),
            Some(SweepLaw::ExpCycle) => self.freq * (n * self.mult).exp(),
        }
    }
}

/// `x mod 1`, always in [0, 1).
#[inline]
pub fn wrap_unit(x: f64) -> f64 {
    let r = x.rem_euclid(1.0);
    if r >= 1.0 { 0.0 } else { r }
}

//! Plucked string: a recirculating delay line excited by a noise burst.
//!
//! The loop holds one period of the string. Each sample the value under the
//! read position is DC-blocked to produce the output, then low-passed
//! (decay) and all-passed (fractional tuning) and written back in place.

use rand::RngCore;
use tracing::debug;

use crate::error::{ConfigError, Result, SynthError};

use super::filter::{DcBlocker, FractionalAllpass, OnePoleLowpass};
use super::rng::{bipolar, Ranqd1};
use super::db_to_linear;

/// Sample rates the single-pole loop filter is tuned for.
pub const MIN_SAMPLE_RATE: f64 = 44100.0;
pub const MAX_SAMPLE_RATE: f64 = 48000.0;

/// Loop loss per second, in dB.
const DECAY_RATE_DB: f64 = -2.0;
const DC_BLOCK_HZ: f64 = 10.0;

/// Excitation and decay settings for one string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PluckParams {
    /// String decay time control (p1).
    pub decay: f64,
    /// Colour of the first excitation pass (p2).
    pub colour: f64,
    /// Colour of the optional second pass (p3).
    pub second_colour: Option<f64>,
    /// Draw the excitation from the caller's generator instead of the
    /// per-colour reproducible one.
    pub shared_noise: bool,
}

impl Default for PluckParams {
    fn default() -> Self {
        Self {
            decay: 0.4,
            colour: 0.2,
            second_colour: Some(0.9),
            shared_noise: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pluck {
    lowpass: OnePoleLowpass,
    dc_block: DcBlocker,
    allpass: FractionalAllpass,
    buffer: Vec<f64>,
    pos: usize,
}

/// Integer and fractional parts of the loop length, in samples.
fn delay_geometry(freq: f64, sample_rate: f64, lowpass: &OnePoleLowpass) -> Result<(usize, f64)> {
    // Group delay of the low-pass at DC.
    let lp_delay = lowpass.feedback / (lowpass.feedback + lowpass.gain);
    let exact = sample_rate / freq - lp_delay;
    let len = exact.floor();
    if len.is_nan() || len < 1.0 {
        return Err(SynthError::DegenerateGeometry {
            frequency: freq,
            sample_rate,
        });
    }
    Ok((len as usize, exact - len))
}

impl Pluck {
    /// Design the loop filters and build the normalised excitation.
    pub fn new<R: RngCore + ?Sized>(
        freq: f64,
        sample_rate: f64,
        params: PluckParams,
        rng: &mut R,
    ) -> Result<Self> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(ConfigError::PluckSampleRate(sample_rate).into());
        }

        let decay_f = (266.0 + 106.0 * freq.ln()).min(912.0);
        let mut lowpass =
            OnePoleLowpass::damping(db_to_linear(DECAY_RATE_DB / freq), decay_f, sample_rate);
        lowpass.gain *= (-2e4 / (0.05 + params.decay) / freq / sample_rate).exp();

        let dc_block = DcBlocker::new(DC_BLOCK_HZ, sample_rate);

        let (len, frac) = delay_geometry(freq, sample_rate, &lowpass)?;
        let allpass = FractionalAllpass::new(frac);

        let mut pluck = Pluck {
            lowpass,
            dc_block,
            allpass,
            buffer: vec![0.0; len],
            pos: 0,
        };
        pluck.excite(params, rng);
        pluck.graduate_and_normalise(freq, sample_rate)?;

        debug!(
            c0 = pluck.lowpass.feedback,
            c1 = pluck.lowpass.gain,
            c2 = pluck.dc_block.pole,
            c3 = pluck.dc_block.gain,
            c4 = pluck.allpass.coeff,
            decay_f,
            frac,
            len,
            rms_db = pluck.rms_db(),
            "pluck string ready"
        );
        Ok(pluck)
    }

    /// Sum up to two passes of coloured noise into the delay line.
    fn excite<R: RngCore + ?Sized>(&mut self, params: PluckParams, rng: &mut R) {
        let passes = [Some(params.colour), params.second_colour];
        for (k, param) in passes.into_iter().map_while(|p| p).enumerate() {
            let colour = 2f64.powf(4.0 * (param - 1.0));
            let weight = 1.0 - 0.3 * k as f64;
            let mut private = Ranqd1::new((param * 100.0 + 0.5) as i32);
            let mut prev = 0.0;
            for slot in self.buffer.iter_mut() {
                let d = loop {
                    let draw = if params.shared_noise {
                        bipolar(rng)
                    } else {
                        bipolar(&mut private)
                    };
                    let d = prev + draw * colour;
                    if d.abs() <= 1.0 {
                        break d;
                    }
                };
                *slot += d * weight;
                prev = if colour != 1.0 { d } else { 0.0 };
            }
        }
    }

    /// Fade from the raw excitation into its loop-filtered version across the
    /// line, then rescale to exactly [-1, 1].
    fn graduate_and_normalise(&mut self, freq: f64, sample_rate: f64) -> Result<()> {
        let len = self.buffer.len() as f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (j, slot) in self.buffer.iter_mut().enumerate() {
            let t = j as f64 / len;
            let filtered = self.allpass.process(self.lowpass.process(*slot));
            *slot = *slot * (1.0 - t) + filtered * t;
            min = min.min(*slot);
            max = max.max(*slot);
        }

        let range = max - min;
        if range.is_nan() || range <= 0.0 {
            return Err(SynthError::DegenerateGeometry {
                frequency: freq,
                sample_rate,
            });
        }
        for slot in self.buffer.iter_mut() {
            *slot = (2.0 * *slot - max - min) / range;
        }
        Ok(())
    }

    fn rms_db(&self) -> f64 {
        let power = self.buffer.iter().map(|v| v * v).sum::<f64>() / self.buffer.len() as f64;
        10.0 * power.log10()
    }

    /// Advance the string by one sample.
    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        let d = self.buffer[self.pos];
        let out = self.dc_block.process(d).clamp(-1.0, 1.0);

        let damped = self.lowpass.process(d);
        self.buffer[self.pos] = self.allpass.process(damped);

        self.pos = if self.pos + 1 == self.buffer.len() {
            0
        } else {
            self.pos + 1
        };
        out
    }

    /// Delay line length in whole samples.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &[f64] {
        &self.buffer
    }

    pub fn coefficients(&self) -> [f64; 5] {
        [
            self.lowpass.feedback,
            self.lowpass.gain,
            self.dc_block.pole,
            self.dc_block.gain,
            self.allpass.coeff,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn pluck(freq: f64, rate: f64, params: PluckParams) -> Pluck {
        Pluck::new(freq, rate, params, &mut Ranqd1::new(0)).unwrap()
    }

    #[test]
    fn excitation_is_normalised_to_full_range() {
        for &freq in &[27.5, 110.0, 440.0, 1000.0, 4220.0] {
            for &rate in &[44100.0, 48000.0] {
                for params in [
                    PluckParams::default(),
                    PluckParams {
                        decay: 1.0,
                        colour: 1.0,
                        second_colour: None,
                        shared_noise: true,
                    },
                    PluckParams {
                        decay: 0.0,
                        colour: 0.0,
                        second_colour: Some(0.0),
                        shared_noise: false,
                    },
                ] {
                    let p = pluck(freq, rate, params);
                    let min = p.buffer().iter().cloned().fold(f64::INFINITY, f64::min);
                    let max = p.buffer().iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    assert_abs_diff_eq!(min, -1.0, epsilon = 1e-12);
                    assert_abs_diff_eq!(max, 1.0, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn loop_length_tracks_period() {
        let p = pluck(441.0, 44100.0, PluckParams::default());
        // 100 samples per period minus the low-pass group delay (< 1 sample).
        assert_eq!(p.len(), 99);
        let [c0, c1, _, _, c4] = p.coefficients();
        let frac = 100.0 - c0 / (c0 + c1) - 99.0;
        assert_abs_diff_eq!(c4, (1.0 - frac) / (1.0 + frac), epsilon = 1e-12);
    }

    #[test]
    fn dc_blocker_coefficients() {
        let p = pluck(220.0, 48000.0, PluckParams::default());
        let [_, _, c2, c3, _] = p.coefficients();
        assert_abs_diff_eq!(c2, (-2.0 * std::f64::consts::PI * 10.0 / 48000.0).exp());
        assert_abs_diff_eq!(c3, (1.0 + c2) * 0.5);
    }

    #[test]
    fn rejects_unsupported_sample_rate() {
        for rate in [22050.0, 96000.0] {
            let err = Pluck::new(220.0, rate, PluckParams::default(), &mut Ranqd1::new(0))
                .unwrap_err();
            assert_eq!(err, SynthError::Config(ConfigError::PluckSampleRate(rate)));
        }
    }

    #[test]
    fn zero_length_line_is_degenerate() {
        let lowpass = OnePoleLowpass::new(0.5, 0.5);
        let err = delay_geometry(100_000.0, 44100.0, &lowpass).unwrap_err();
        assert!(matches!(err, SynthError::DegenerateGeometry { .. }));
        assert!(delay_geometry(4220.0, 44100.0, &lowpass).is_ok());
    }

    #[test]
    fn private_noise_ignores_injected_generator() {
        let params = PluckParams::default();
        let a = Pluck::new(330.0, 44100.0, params, &mut Ranqd1::new(1)).unwrap();
        let b = Pluck::new(330.0, 44100.0, params, &mut Ranqd1::new(999)).unwrap();
        assert_eq!(a.buffer(), b.buffer());
    }

    #[test]
    fn shared_noise_follows_injected_generator() {
        let params = PluckParams {
            shared_noise: true,
            ..PluckParams::default()
        };
        let a = Pluck::new(330.0, 44100.0, params, &mut Ranqd1::new(1)).unwrap();
        let b = Pluck::new(330.0, 44100.0, params, &mut Ranqd1::new(999)).unwrap();
        assert_ne!(a.buffer(), b.buffer());
    }

    #[test]
    fn output_bounded_and_decaying() {
        let mut p = pluck(220.0, 44100.0, PluckParams::default());
        let block = 4410;
        let mut energies = Vec::new();
        for _ in 0..20 {
            let mut energy = 0.0;
            for _ in 0..block {
                let s = p.next_sample();
                assert!(s.abs() <= 1.0);
                energy += s * s;
            }
            energies.push(energy);
        }
        assert!(energies[0] > 0.0);
        assert!(
            energies[19] < energies[0] * 0.5,
            "string should decay: first {} last {}",
            energies[0],
            energies[19]
        );
    }

    #[test]
    fn string_repeats_with_its_period() {
        let mut p = pluck(441.0, 44100.0, PluckParams::default());
        // Skip the attack so the loop filters have smoothed the burst.
        let samples: Vec<f64> = (0..4000).map(|_| p.next_sample()).collect();
        let tail = &samples[2000..];
        let corr = |lag: usize| -> f64 {
            tail.iter().zip(&tail[lag..]).map(|(a, b)| a * b).sum()
        };
        let at_period = corr(100);
        let at_half = corr(50);
        assert!(at_period > at_half, "period {at_period} half {at_half}");
        assert!(at_period > 0.0);
    }
}

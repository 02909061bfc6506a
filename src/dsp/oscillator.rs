//! Tonal waveforms as pure functions of phase.
//!
//! Shape parameters are resolved to concrete values once, when the channel
//! starts; `sample` then maps a phase in [0, 1) to a value in [-1, 1].

use std::f64::consts::PI;

use crate::config::{ChannelSpec, SynthType};

use super::db_to_linear;

/// A tonal waveform with its shape parameters resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Sine,
    /// +1 before `duty`, -1 after.
    Square { duty: f64 },
    Sawtooth,
    /// Rises to +1 at `peak`, falls back to -1 at the end of the cycle.
    Triangle { peak: f64 },
    /// Rise over [0, rise_end], high until `fall_start`, fall until
    /// `fall_end`, low for the rest.
    Trapezium {
        rise_end: f64,
        fall_start: f64,
        fall_end: f64,
    },
    /// Exponential rise from `floor` to 1 at `peak`, then back down.
    Exp { peak: f64, floor: f64 },
}

/// Fill in unset trapezium parameters and keep them ordered.
pub fn resolve_trapezium(p1: Option<f64>, p2: Option<f64>, p3: Option<f64>) -> (f64, f64, f64) {
    let (p1, p2, p3) = match (p1, p2, p3) {
        (None, _, _) => (0.1, 0.5, 0.6),
        (Some(p1), None, _) if p1 <= 0.5 => {
            // Try a symmetric shape.
            let p2 = (1.0 - 2.0 * p1) / 2.0;
            (p1, p2, p2 + p1)
        }
        // Symmetric is impossible: asymmetric triangle.
        (Some(p1), None, _) => (p1, p1, 1.0),
        (Some(p1), Some(p2), None) => (p1, p2, 1.0),
        (Some(p1), Some(p2), Some(p3)) => (p1, p2, p3),
    };
    let p2 = p2.max(p1);
    (p1, p2, p3.max(p2).min(1.0))
}

impl Waveform {
    /// Resolve the waveform for a tonal channel; `None` for noise and pluck.
    pub fn from_spec(spec: &ChannelSpec) -> Option<Self> {
        let waveform = match spec.synth_type {
            SynthType::Sine => Waveform::Sine,
            SynthType::Square => Waveform::Square {
                duty: spec.p1.unwrap_or(0.5),
            },
            SynthType::Sawtooth => Waveform::Sawtooth,
            SynthType::Triangle => Waveform::Triangle {
                peak: spec.p1.unwrap_or(0.5),
            },
            SynthType::Trapezium => {
                let (rise_end, fall_start, fall_end) = resolve_trapezium(spec.p1, spec.p2, spec.p3);
                Waveform::Trapezium {
                    rise_end,
                    fall_start,
                    fall_end,
                }
            }
            SynthType::Exp => Waveform::Exp {
                peak: spec.p1.unwrap_or(0.5),
                floor: db_to_linear(spec.p2.unwrap_or(0.5) * -200.0),
            },
            SynthType::WhiteNoise
            | SynthType::TpdfNoise
            | SynthType::PinkNoise
            | SynthType::BrownNoise
            | SynthType::Pluck => return None,
        };
        Some(waveform)
    }

    /// Resolved shape parameters, as (p1, p2, p3) with -1 for unused slots.
    pub fn params(&self) -> (f64, f64, f64) {
        match *self {
            Waveform::Sine | Waveform::Sawtooth => (-1.0, -1.0, -1.0),
            Waveform::Square { duty } => (duty, -1.0, -1.0),
            Waveform::Triangle { peak } => (peak, -1.0, -1.0),
            Waveform::Trapezium {
                rise_end,
                fall_start,
                fall_end,
            } => (rise_end, fall_start, fall_end),
            Waveform::Exp { peak, floor } => (peak, floor.log10() / -10.0, -1.0),
        }
    }

    /// Sample at `phase` in [0, 1).
    #[inline]
    pub fn sample(&self, phase: f64) -> f64 {
        match *self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square { duty } => {
                if phase < duty {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => -1.0 + 2.0 * phase,
            Waveform::Triangle { peak } => {
                if phase < peak {
                    -1.0 + 2.0 * phase / peak
                } else {
                    1.0 - 2.0 * (phase - peak) / (1.0 - peak)
                }
            }
            Waveform::Trapezium {
                rise_end,
                fall_start,
                fall_end,
            } => {
                if phase < rise_end {
                    -1.0 + 2.0 * phase / rise_end
                } else if phase < fall_start {
                    1.0
                } else if phase < fall_end {
                    1.0 - 2.0 * (phase - fall_start) / (fall_end - fall_start)
                } else {
                    -1.0
                }
            }
            Waveform::Exp { peak, floor } => {
                let span = (1.0 / floor).ln();
                let level = if phase < peak {
                    floor * (phase * span / peak).exp()
                } else {
                    floor * ((1.0 - phase) * span / (1.0 - peak)).exp()
                };
                level.min(1.0) * 2.0 - 1.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn waveform(ty: SynthType, p1: Option<f64>, p2: Option<f64>, p3: Option<f64>) -> Waveform {
        let spec = ChannelSpec::new(ty, 440.0).with_params(p1, p2, p3);
        Waveform::from_spec(&spec).unwrap()
    }

    fn all_defaults() -> Vec<Waveform> {
        [
            SynthType::Sine,
            SynthType::Square,
            SynthType::Sawtooth,
            SynthType::Triangle,
            SynthType::Trapezium,
            SynthType::Exp,
        ]
        .into_iter()
        .map(|ty| waveform(ty, None, None, None))
        .collect()
    }

    #[test]
    fn every_shape_stays_in_range() {
        let mut shapes = all_defaults();
        shapes.push(waveform(SynthType::Square, Some(0.0), None, None));
        shapes.push(waveform(SynthType::Triangle, Some(0.0), None, None));
        shapes.push(waveform(SynthType::Triangle, Some(1.0), None, None));
        shapes.push(waveform(SynthType::Trapezium, Some(0.7), None, None));
        shapes.push(waveform(SynthType::Exp, Some(0.0), Some(1.0), None));
        shapes.push(waveform(SynthType::Exp, Some(1.0), Some(0.0), None));
        for shape in shapes {
            for i in 0..10_000 {
                let phase = i as f64 / 10_000.0;
                let s = shape.sample(phase);
                assert!(
                    (-1.0..=1.0).contains(&s),
                    "{shape:?} out of range at phase {phase}: {s}"
                );
            }
        }
    }

    #[test]
    fn boundary_values_at_phase_zero() {
        assert_abs_diff_eq!(Waveform::Sine.sample(0.0), 0.0);
        let square = waveform(SynthType::Square, None, None, None);
        assert_eq!(square.sample(0.0), 1.0);
        assert_eq!(square.sample(0.5), -1.0);
        assert_eq!(Waveform::Sawtooth.sample(0.0), -1.0);
        assert_eq!(waveform(SynthType::Triangle, None, None, None).sample(0.0), -1.0);
        assert_eq!(waveform(SynthType::Trapezium, None, None, None).sample(0.0), -1.0);
        let exp = waveform(SynthType::Exp, None, None, None);
        assert_abs_diff_eq!(exp.sample(0.0), -1.0, epsilon = 1e-4);
    }

    #[test]
    fn peaks_land_on_shape_parameters() {
        assert_abs_diff_eq!(Waveform::Sine.sample(0.25), 1.0);
        let tri = waveform(SynthType::Triangle, Some(0.25), None, None);
        assert_abs_diff_eq!(tri.sample(0.25), 1.0);
        assert_abs_diff_eq!(tri.sample(0.625), 0.0);
        let exp = waveform(SynthType::Exp, Some(0.3), None, None);
        assert_abs_diff_eq!(exp.sample(0.3), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn square_duty_cycle() {
        let square = waveform(SynthType::Square, Some(0.25), None, None);
        assert_eq!(square.sample(0.2), 1.0);
        assert_eq!(square.sample(0.25), -1.0);
    }

    #[test]
    fn trapezium_defaults() {
        assert_eq!(resolve_trapezium(None, None, None), (0.1, 0.5, 0.6));
        assert_eq!(resolve_trapezium(Some(0.2), None, None), (0.2, 0.3, 0.5));
        assert_eq!(resolve_trapezium(Some(0.7), None, None), (0.7, 0.7, 1.0));
        assert_eq!(resolve_trapezium(Some(0.2), Some(0.4), None), (0.2, 0.4, 1.0));
        assert_eq!(resolve_trapezium(Some(0.1), Some(0.2), Some(0.3)), (0.1, 0.2, 0.3));
    }

    #[test]
    fn trapezium_resolution_is_always_ordered() {
        for i in 0..=100 {
            let p1 = i as f64 / 100.0;
            let (a, b, c) = resolve_trapezium(Some(p1), None, None);
            assert!(0.0 <= a && a <= b && b <= c && c <= 1.0, "{p1}: {a} {b} {c}");
        }
    }

    #[test]
    fn trapezium_plateau_and_floor() {
        let trap = waveform(SynthType::Trapezium, None, None, None);
        assert_eq!(trap.sample(0.3), 1.0);
        assert_abs_diff_eq!(trap.sample(0.55), 0.0, epsilon = 1e-12);
        assert_eq!(trap.sample(0.8), -1.0);
    }

    #[test]
    fn exp_floor_follows_p2() {
        match waveform(SynthType::Exp, None, None, None) {
            Waveform::Exp { floor, .. } => assert_abs_diff_eq!(floor, 1e-5, epsilon = 1e-12),
            other => panic!("unexpected {other:?}"),
        }
        let (_, p2, _) = waveform(SynthType::Exp, None, Some(0.3), None).params();
        assert_abs_diff_eq!(p2, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn noise_and_pluck_have_no_waveform() {
        for ty in [SynthType::WhiteNoise, SynthType::PinkNoise, SynthType::Pluck] {
            assert!(Waveform::from_spec(&ChannelSpec::new(ty, 440.0)).is_none());
        }
    }
}

//! Mixer: merges a generated sample with the incoming one.

use crate::config::CombineMode;

/// Largest positive integer sample.
pub const FULL_SCALE: f64 = i32::MAX as f64;

/// Per-channel offset and combine stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelMixer {
    /// DC offset in [-1, 1].
    pub offset: f64,
    pub combine: CombineMode,
}

impl ChannelMixer {
    pub fn new(offset: f64, combine: CombineMode) -> Self {
        ChannelMixer { offset, combine }
    }

    /// Add the DC offset, scaling the signal down so the sum cannot clip.
    #[inline]
    pub fn apply_offset(&self, sample: f64) -> f64 {
        sample * (1.0 - self.offset.abs()) + self.offset
    }

    /// Combine an offset sample with the input, at integer scale.
    #[inline]
    pub fn combine(&self, sample: f64, input: i32) -> f64 {
        let input = input as f64;
        match self.combine {
            CombineMode::Create => sample * FULL_SCALE,
            CombineMode::Mix => (sample * FULL_SCALE + input) * 0.5,
            CombineMode::AMod => (sample + 1.0) * input * 0.5,
            CombineMode::FMod => sample * input,
        }
    }

    /// Full output path for one raw sample in [-1, 1].
    #[inline]
    pub fn mix(&self, raw: f64, input: i32, gain: f64) -> i32 {
        round_sample(self.combine(self.apply_offset(raw), input) * gain)
    }
}

/// Round to nearest, ties away from zero, saturating at the integer range.
#[inline]
pub fn round_sample(x: f64) -> i32 {
    if x < 0.0 {
        (x - 0.5) as i32
    } else {
        (x + 0.5) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_never_clips() {
        for &offset in &[-1.0, -0.5, 0.0, 0.3, 1.0] {
            let m = ChannelMixer::new(offset, CombineMode::Create);
            for &s in &[-1.0, -0.25, 0.0, 0.9, 1.0] {
                let v = m.apply_offset(s);
                assert!((-1.0..=1.0).contains(&v), "offset {offset} sample {s} -> {v}");
            }
        }
        let half = ChannelMixer::new(0.5, CombineMode::Create);
        assert_eq!(half.apply_offset(-1.0), 0.0);
        assert_eq!(half.apply_offset(1.0), 1.0);
    }

    #[test]
    fn create_ignores_input() {
        let m = ChannelMixer::new(0.0, CombineMode::Create);
        assert_eq!(m.mix(1.0, 12345, 1.0), i32::MAX);
        assert_eq!(m.mix(-1.0, 12345, 1.0), -i32::MAX);
        assert_eq!(m.mix(0.0, 12345, 1.0), 0);
    }

    #[test]
    fn mix_averages() {
        let m = ChannelMixer::new(0.0, CombineMode::Mix);
        assert_eq!(m.mix(0.0, 1000, 1.0), 500);
        assert_eq!(m.mix(1.0, i32::MAX, 1.0), i32::MAX);
    }

    #[test]
    fn amod_scales_input_between_zero_and_one() {
        let m = ChannelMixer::new(0.0, CombineMode::AMod);
        assert_eq!(m.mix(1.0, 1000, 1.0), 1000);
        assert_eq!(m.mix(-1.0, 1000, 1.0), 0);
        assert_eq!(m.mix(0.0, 1000, 1.0), 500);
    }

    #[test]
    fn fmod_multiplies() {
        let m = ChannelMixer::new(0.0, CombineMode::FMod);
        assert_eq!(m.mix(-0.5, 1000, 1.0), -500);
        assert_eq!(m.mix(1.0, -7, 1.0), -7);
    }

    #[test]
    fn gain_applies_before_rounding() {
        let m = ChannelMixer::new(0.0, CombineMode::FMod);
        assert_eq!(m.mix(1.0, 3, 0.5), 2);
        assert_eq!(m.mix(1.0, -3, 0.5), -2);
    }

    #[test]
    fn rounding_ties_away_from_zero() {
        assert_eq!(round_sample(2.5), 3);
        assert_eq!(round_sample(-2.5), -3);
        assert_eq!(round_sample(2.49), 2);
        assert_eq!(round_sample(-0.4), 0);
        assert_eq!(round_sample(1e12), i32::MAX);
        assert_eq!(round_sample(-1e12), i32::MIN);
    }
}

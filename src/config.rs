//! Channel specifications and whole-generator configuration.
//!
//! Shape parameters, offset and phase are stored normalized (percentages
//! divided by 100). `None` marks a shape parameter the user left unset; its
//! default is chosen per type when the engine starts.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Lowest and highest pluck frequencies the string model is tuned for.
pub const PLUCK_MIN_FREQ: f64 = 27.5;
pub const PLUCK_MAX_FREQ: f64 = 4220.0;

/// What a channel generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthType {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
    #[serde(alias = "trapetz")]
    Trapezium,
    Exp,
    #[serde(alias = "noise")]
    WhiteNoise,
    TpdfNoise,
    PinkNoise,
    BrownNoise,
    Pluck,
}

impl SynthType {
    /// Look up a type by its command-line name (including the legacy aliases).
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "sine" => SynthType::Sine,
            "square" => SynthType::Square,
            "sawtooth" => SynthType::Sawtooth,
            "triangle" => SynthType::Triangle,
            "trapezium" | "trapetz" => SynthType::Trapezium,
            "exp" => SynthType::Exp,
            "whitenoise" | "noise" => SynthType::WhiteNoise,
            "tpdfnoise" => SynthType::TpdfNoise,
            "pinknoise" => SynthType::PinkNoise,
            "brownnoise" => SynthType::BrownNoise,
            "pluck" => SynthType::Pluck,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SynthType::Sine => "sine",
            SynthType::Square => "square",
            SynthType::Sawtooth => "sawtooth",
            SynthType::Triangle => "triangle",
            SynthType::Trapezium => "trapezium",
            SynthType::Exp => "exp",
            SynthType::WhiteNoise => "whitenoise",
            SynthType::TpdfNoise => "tpdfnoise",
            SynthType::PinkNoise => "pinknoise",
            SynthType::BrownNoise => "brownnoise",
            SynthType::Pluck => "pluck",
        }
    }

    /// Tonal types have a phase and can sweep; noise and pluck do not.
    pub fn is_tonal(&self) -> bool {
        matches!(
            self,
            SynthType::Sine
                | SynthType::Square
                | SynthType::Sawtooth
                | SynthType::Triangle
                | SynthType::Trapezium
                | SynthType::Exp
        )
    }
}

/// How the generated sample is merged with the incoming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// Replace the input.
    #[default]
    Create,
    /// Average with the input.
    Mix,
    /// Amplitude-modulate the input.
    AMod,
    /// Multiply with the input.
    FMod,
}

impl CombineMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "create" => Some(CombineMode::Create),
            "mix" => Some(CombineMode::Mix),
            "amod" => Some(CombineMode::AMod),
            "fmod" => Some(CombineMode::FMod),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CombineMode::Create => "create",
            CombineMode::Mix => "mix",
            CombineMode::AMod => "amod",
            CombineMode::FMod => "fmod",
        }
    }
}

/// How frequency moves from the start to the target over the whole duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepLaw {
    Linear,
    Square,
    Exp,
    /// Exponential, with phase restarting at every cycle boundary.
    ExpCycle,
}

impl SweepLaw {
    /// Separator character used between the two frequencies on the command line.
    pub fn from_separator(c: char) -> Option<Self> {
        match c {
            ':' => Some(SweepLaw::Linear),
            '+' => Some(SweepLaw::Square),
            '/' => Some(SweepLaw::Exp),
            '-' => Some(SweepLaw::ExpCycle),
            _ => None,
        }
    }

    pub fn is_exponential(&self) -> bool {
        matches!(self, SweepLaw::Exp | SweepLaw::ExpCycle)
    }
}

/// A frequency sweep to `target` Hz following `law`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    pub law: SweepLaw,
    pub target: f64,
}

/// Total generation length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Samples(u64),
    Seconds(f64),
}

impl Length {
    /// Resolve to a sample count at `sample_rate`. Zero means unbounded.
    pub fn samples(&self, sample_rate: f64) -> u64 {
        match *self {
            Length::Samples(n) => n,
            Length::Seconds(s) => (s * sample_rate + 0.5) as u64,
        }
    }
}

/// One channel's generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSpec {
    #[serde(rename = "type")]
    pub synth_type: SynthType,
    pub combine: CombineMode,
    /// Base frequency in Hz.
    pub freq: f64,
    pub sweep: Option<Sweep>,
    /// DC offset in [-1, 1].
    pub offset: f64,
    /// Phase offset in [0, 1].
    pub phase: f64,
    pub p1: Option<f64>,
    pub p2: Option<f64>,
    pub p3: Option<f64>,
}

impl Default for ChannelSpec {
    fn default() -> Self {
        Self {
            synth_type: SynthType::Sine,
            combine: CombineMode::Create,
            freq: 440.0,
            sweep: None,
            offset: 0.0,
            phase: 0.0,
            p1: None,
            p2: None,
            p3: None,
        }
    }
}

impl ChannelSpec {
    pub fn new(synth_type: SynthType, freq: f64) -> Self {
        Self {
            synth_type,
            freq,
            ..Self::default()
        }
    }

    pub fn with_combine(mut self, combine: CombineMode) -> Self {
        self.combine = combine;
        self
    }

    pub fn with_sweep(mut self, law: SweepLaw, target: f64) -> Self {
        self.sweep = Some(Sweep { law, target });
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_params(mut self, p1: Option<f64>, p2: Option<f64>, p3: Option<f64>) -> Self {
        self.p1 = p1;
        self.p2 = p2;
        self.p3 = p3;
        self
    }

    /// Frequency at the end of the sweep (the base frequency if not sweeping).
    pub fn end_freq(&self) -> f64 {
        self.sweep.map_or(self.freq, |s| s.target)
    }

    /// Checks that do not depend on the sample rate.
    pub fn validate(&self, has_length: bool) -> std::result::Result<(), ConfigError> {
        check_range("offset", self.offset, -1.0, 1.0)?;
        check_range("phase", self.phase, 0.0, 1.0)?;
        for (name, p) in [("p1", self.p1), ("p2", self.p2), ("p3", self.p3)] {
            if let Some(v) = p {
                check_range(name, v, 0.0, 1.0)?;
            }
        }

        if !self.freq.is_finite() || self.freq < 0.0 {
            return Err(ConfigError::InvalidFrequency(self.freq));
        }
        if self.synth_type == SynthType::Pluck
            && !(PLUCK_MIN_FREQ..=PLUCK_MAX_FREQ).contains(&self.freq)
        {
            return Err(ConfigError::PluckFrequency(self.freq));
        }

        if let Some(sweep) = self.sweep {
            if !self.synth_type.is_tonal() {
                return Err(ConfigError::SweepNotSupported(self.synth_type));
            }
            if !sweep.target.is_finite() || sweep.target < 0.0 {
                return Err(ConfigError::InvalidFrequency(sweep.target));
            }
            if !has_length {
                return Err(ConfigError::SweepWithoutDuration);
            }
            if sweep.law.is_exponential() && self.freq * sweep.target == 0.0 {
                return Err(ConfigError::ZeroExponentialEndpoint {
                    from: self.freq,
                    to: sweep.target,
                });
            }
        }

        if self.synth_type == SynthType::Trapezium {
            let given: Vec<f64> = [self.p1, self.p2, self.p3].into_iter().flatten().collect();
            if given.windows(2).any(|w| w[0] > w[1]) {
                return Err(ConfigError::TrapeziumOrder {
                    p1: self.p1.unwrap_or(-1.0),
                    p2: self.p2.unwrap_or(-1.0),
                    p3: self.p3.unwrap_or(-1.0),
                });
            }
        }
        Ok(())
    }
}

fn check_range(
    name: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> std::result::Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ParameterOutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

/// Everything the engine needs besides the sample rate and channel count.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Channel templates; repeated cyclically when there are more audio channels.
    pub channels: Vec<ChannelSpec>,
    /// Total length; unbounded when absent.
    pub length: Option<Length>,
    /// Suppress the cooperative headroom gain.
    pub no_headroom: bool,
}

impl SynthConfig {
    pub fn new(channels: Vec<ChannelSpec>) -> Self {
        Self {
            channels,
            ..Self::default()
        }
    }

    pub fn with_length(mut self, length: Length) -> Self {
        self.length = Some(length);
        self
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Run every rate-independent configuration check.
    pub fn validate(&self) -> Result<()> {
        if let Some(Length::Seconds(s)) = self.length {
            check_range("length", s, 0.0, f64::MAX)?;
        }
        let has_length = match self.length {
            Some(Length::Samples(n)) => n > 0,
            Some(Length::Seconds(s)) => s > 0.0,
            None => false,
        };
        for chan in &self.channels {
            chan.validate(has_length)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_round_trip() {
        for name in [
            "sine", "square", "sawtooth", "triangle", "trapezium", "exp", "whitenoise",
            "tpdfnoise", "pinknoise", "brownnoise", "pluck",
        ] {
            let ty = SynthType::from_name(name).unwrap();
            assert_eq!(ty.name(), name);
        }
        assert_eq!(SynthType::from_name("trapetz"), Some(SynthType::Trapezium));
        assert_eq!(SynthType::from_name("noise"), Some(SynthType::WhiteNoise));
        assert_eq!(SynthType::from_name("Sine"), None);
    }

    #[test]
    fn only_tones_are_tonal() {
        assert!(SynthType::Exp.is_tonal());
        assert!(!SynthType::WhiteNoise.is_tonal());
        assert!(!SynthType::Pluck.is_tonal());
    }

    #[test]
    fn sweep_on_noise_is_rejected() {
        let chan =
            ChannelSpec::new(SynthType::PinkNoise, 440.0).with_sweep(SweepLaw::Linear, 880.0);
        assert_eq!(
            chan.validate(true),
            Err(ConfigError::SweepNotSupported(SynthType::PinkNoise))
        );
    }

    #[test]
    fn exponential_sweep_needs_nonzero_endpoints() {
        let chan = ChannelSpec::new(SynthType::Sine, 0.0).with_sweep(SweepLaw::Exp, 880.0);
        assert!(matches!(
            chan.validate(true),
            Err(ConfigError::ZeroExponentialEndpoint { .. })
        ));
        let linear = ChannelSpec::new(SynthType::Sine, 0.0).with_sweep(SweepLaw::Linear, 880.0);
        assert_eq!(linear.validate(true), Ok(()));
    }

    #[test]
    fn sweep_requires_duration() {
        let chan = ChannelSpec::new(SynthType::Sine, 100.0).with_sweep(SweepLaw::Linear, 200.0);
        assert_eq!(chan.validate(false), Err(ConfigError::SweepWithoutDuration));
    }

    #[test]
    fn pluck_frequency_bounds() {
        assert!(ChannelSpec::new(SynthType::Pluck, 27.5).validate(false).is_ok());
        assert!(ChannelSpec::new(SynthType::Pluck, 4220.0).validate(false).is_ok());
        assert_eq!(
            ChannelSpec::new(SynthType::Pluck, 20.0).validate(false),
            Err(ConfigError::PluckFrequency(20.0))
        );
        assert_eq!(
            ChannelSpec::new(SynthType::Pluck, 5000.0).validate(false),
            Err(ConfigError::PluckFrequency(5000.0))
        );
    }

    #[test]
    fn out_of_range_parameter_names_itself() {
        let chan = ChannelSpec::new(SynthType::Square, 440.0).with_params(Some(1.5), None, None);
        match chan.validate(false) {
            Err(ConfigError::ParameterOutOfRange { name, value, .. }) => {
                assert_eq!(name, "p1");
                assert_eq!(value, 1.5);
            }
            other => panic!("expected range error, got {other:?}"),
        }
        let chan = ChannelSpec::new(SynthType::Sine, 440.0).with_offset(-1.2);
        assert!(chan.validate(false).is_err());
    }

    #[test]
    fn trapezium_parameters_must_be_ordered() {
        let chan = ChannelSpec::new(SynthType::Trapezium, 440.0)
            .with_params(Some(0.5), Some(0.2), None);
        assert!(matches!(chan.validate(false), Err(ConfigError::TrapeziumOrder { .. })));
    }

    #[test]
    fn seconds_length_rounds_to_nearest_sample() {
        assert_eq!(Length::Seconds(0.5).samples(44100.0), 22050);
        assert_eq!(Length::Seconds(1.0 / 3.0).samples(1000.0), 333);
        assert_eq!(Length::Samples(80).samples(8000.0), 80);
    }

    #[test]
    fn config_from_json_with_defaults() {
        let json = r#"{
            "channels": [
                { "type": "square", "freq": 100.0, "p1": 0.25 },
                { "type": "trapetz", "combine": "amod",
                  "sweep": { "law": "expcycle", "target": 800.0 } }
            ],
            "length": { "seconds": 2.0 },
            "no_headroom": true
        }"#;
        let config = SynthConfig::from_json(json).unwrap();
        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.channels[0].synth_type, SynthType::Square);
        assert_eq!(config.channels[0].p1, Some(0.25));
        assert_eq!(config.channels[0].p2, None);
        assert_eq!(config.channels[1].synth_type, SynthType::Trapezium);
        assert_eq!(config.channels[1].combine, CombineMode::AMod);
        assert_eq!(config.channels[1].freq, 440.0);
        assert_eq!(config.channels[1].end_freq(), 800.0);
        assert_eq!(config.length, Some(Length::Seconds(2.0)));
        assert!(config.no_headroom);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_serializes_back() {
        let config = SynthConfig::new(vec![ChannelSpec::new(SynthType::Pluck, 220.0)])
            .with_length(Length::Samples(1000));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""type":"pluck""#), "{json}");
        assert_eq!(SynthConfig::from_json(&json).unwrap(), config);
    }
}

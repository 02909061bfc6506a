//! Channel: one audio channel's generator, running state and mixer.

use rand::RngCore;

use crate::config::{ChannelSpec, SynthType};
use crate::error::Result;

use super::mixer::ChannelMixer;
use super::noise::{self, BrownNoise, PinkNoise};
use super::oscillator::Waveform;
use super::pluck::{Pluck, PluckParams};
use super::sweep::PhaseEngine;

/// The sample source behind a channel.
#[derive(Debug, Clone)]
pub enum Generator {
    Tone { phase: PhaseEngine, waveform: Waveform },
    White,
    Tpdf,
    Pink(PinkNoise),
    Brown(BrownNoise),
    Pluck(Pluck),
}

/// Resolve pluck defaults: decay 0.4, excitation colours 0.2 then 0.9.
fn pluck_params(spec: &ChannelSpec) -> PluckParams {
    let (colour, second_colour) = match spec.p2 {
        Some(p2) => (p2, spec.p3),
        None => (0.2, Some(0.9)),
    };
    PluckParams {
        decay: spec.p1.unwrap_or(0.4),
        colour,
        second_colour,
        shared_noise: spec.phase != 0.0,
    }
}

#[derive(Debug, Clone)]
pub struct Channel {
    spec: ChannelSpec,
    generator: Generator,
    mixer: ChannelMixer,
}

impl Channel {
    /// Build the channel at position `index`. Pluck channels design their
    /// filters and fill their delay line here.
    pub fn new<R: RngCore + ?Sized>(
        spec: &ChannelSpec,
        index: usize,
        samples_to_do: u64,
        sample_rate: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let generator = match spec.synth_type {
            SynthType::WhiteNoise => Generator::White,
            SynthType::TpdfNoise => Generator::Tpdf,
            SynthType::PinkNoise => Generator::Pink(PinkNoise::for_channel(index)),
            SynthType::BrownNoise => Generator::Brown(BrownNoise::new()),
            SynthType::Pluck => Generator::Pluck(Pluck::new(
                spec.freq,
                sample_rate,
                pluck_params(spec),
                rng,
            )?),
            SynthType::Sine
            | SynthType::Square
            | SynthType::Sawtooth
            | SynthType::Triangle
            | SynthType::Trapezium
            | SynthType::Exp => Generator::Tone {
                phase: PhaseEngine::new(spec, samples_to_do, sample_rate),
                // Tonal types always resolve.
                waveform: Waveform::from_spec(spec).unwrap_or(Waveform::Sine),
            },
        };

        Ok(Channel {
            spec: spec.clone(),
            generator,
            mixer: ChannelMixer::new(spec.offset, spec.combine),
        })
    }

    pub fn spec(&self) -> &ChannelSpec {
        &self.spec
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Sweep multiplier (0 for channels that do not sweep).
    pub fn sweep_mult(&self) -> f64 {
        match &self.generator {
            Generator::Tone { phase, .. } => phase.mult(),
            _ => 0.0,
        }
    }

    /// Resolved (p1, p2, p3), -1 where a slot is unused.
    pub fn resolved_params(&self) -> (f64, f64, f64) {
        match &self.generator {
            Generator::Tone { waveform, .. } => waveform.params(),
            Generator::Pluck(_) => {
                let p = pluck_params(&self.spec);
                (p.decay, p.colour, p.second_colour.unwrap_or(-1.0))
            }
            _ => (-1.0, -1.0, -1.0),
        }
    }

    /// Raw generated sample in [-1, 1] for frame `samples_done`.
    #[inline]
    pub fn next_raw<R: RngCore + ?Sized>(&mut self, samples_done: u64, rng: &mut R) -> f64 {
        match &mut self.generator {
            Generator::Tone { phase, waveform } => waveform.sample(phase.phase(samples_done)),
            Generator::White => noise::white(rng),
            Generator::Tpdf => noise::tpdf(rng),
            Generator::Pink(pink) => pink.next_sample(rng),
            Generator::Brown(brown) => brown.next_sample(rng),
            Generator::Pluck(pluck) => pluck.next_sample(),
        }
    }

    /// Generate, offset, combine with `input` and scale by `gain`.
    #[inline]
    pub fn next_sample<R: RngCore + ?Sized>(
        &mut self,
        samples_done: u64,
        input: i32,
        gain: f64,
        rng: &mut R,
    ) -> i32 {
        let raw = self.next_raw(samples_done, rng);
        self.mixer.mix(raw, input, gain)
    }
}

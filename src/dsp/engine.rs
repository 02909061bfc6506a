//! Engine: drives one Channel per audio channel, frame by frame.
//!
//! The engine is pull-based: each call to [`Engine::produce_into`] emits
//! one frame, asking every channel for a sample in channel order and then
//! advancing the shared sample counter once. All failure modes are caught
//! by [`Engine::new`] and [`Engine::start`]; production itself cannot fail.

use rand::RngCore;
use tracing::{debug, info, trace};

use crate::config::{ChannelSpec, SynthConfig};
use crate::error::{ConfigError, Result};

use super::channel::Channel;
use super::rng::Ranqd1;

/// Outcome of [`Engine::process_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flow {
    /// Whole frames written.
    pub frames: usize,
    /// The sample limit was reached.
    pub finished: bool,
}

/// The multi-channel signal generator.
pub struct Engine<R: RngCore = Ranqd1> {
    config: SynthConfig,
    channels: Vec<Channel>,
    rng: R,
    sample_rate: f64,
    samples_done: u64,
    /// Frame limit; 0 means unbounded.
    samples_to_do: u64,
    gain: f64,
}

impl Engine<Ranqd1> {
    /// Validate `config` and create an engine with the default reproducible
    /// random source.
    pub fn new(config: SynthConfig) -> Result<Self> {
        Self::with_rng(config, Ranqd1::default())
    }
}

impl<R: RngCore> Engine<R> {
    /// Validate `config` and create an engine drawing noise from `rng`.
    pub fn with_rng(config: SynthConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Engine {
            config,
            channels: Vec::new(),
            rng,
            sample_rate: 0.0,
            samples_done: 0,
            samples_to_do: 0,
            gain: 1.0,
        })
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Build the channels for `sample_rate`. `channel_count` defaults to the
    /// number of channel templates; templates repeat cyclically.
    pub fn start(&mut self, sample_rate: f64, channel_count: Option<usize>) -> Result<()> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(sample_rate).into());
        }

        let default_templates = [ChannelSpec::default()];
        let templates: &[ChannelSpec] = if self.config.channels.is_empty() {
            &default_templates
        } else {
            &self.config.channels
        };
        let count = channel_count.unwrap_or(templates.len());
        if count == 0 {
            return Err(ConfigError::NoChannels.into());
        }

        let samples_to_do = self.config.length.map_or(0, |l| l.samples(sample_rate));
        if samples_to_do == 0 && templates.iter().any(|spec| spec.sweep.is_some()) {
            return Err(ConfigError::SweepWithoutDuration.into());
        }

        let mut channels = Vec::with_capacity(count);
        for i in 0..count {
            let spec = &templates[i % templates.len()];
            let chan = Channel::new(spec, i, samples_to_do, sample_rate, &mut self.rng)?;
            let (p1, p2, p3) = chan.resolved_params();
            debug!(
                channel = i,
                r#type = spec.synth_type.name(),
                combine = spec.combine.name(),
                samples_to_do,
                f1 = spec.freq,
                f2 = spec.end_freq(),
                offset = spec.offset,
                phase = spec.phase,
                p1,
                p2,
                p3,
                mult = chan.sweep_mult(),
                "channel ready"
            );
            channels.push(chan);
        }

        self.channels = channels;
        self.sample_rate = sample_rate;
        self.samples_done = 0;
        self.samples_to_do = samples_to_do;
        self.gain = 1.0;
        info!(
            channels = count,
            sample_rate,
            samples_to_do,
            headroom = !self.config.no_headroom,
            "synth started"
        );
        Ok(())
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Frames produced since `start`.
    pub fn samples_done(&self) -> u64 {
        self.samples_done
    }

    /// Frame limit, if bounded.
    pub fn samples_to_do(&self) -> Option<u64> {
        (self.samples_to_do != 0).then_some(self.samples_to_do)
    }

    pub fn is_finished(&self) -> bool {
        self.samples_to_do != 0 && self.samples_done >= self.samples_to_do
    }

    /// Output gain currently applied.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// The cooperative headroom gain slot. The surrounding pipeline may lower
    /// it to make room for `mix`/`amod` sums. `None` when headroom is
    /// suppressed, in which case the gain stays at 1.
    pub fn headroom_gain(&mut self) -> Option<&mut f64> {
        if self.config.no_headroom {
            None
        } else {
            Some(&mut self.gain)
        }
    }

    /// Produce one frame into `output` (one slot per channel). Missing input
    /// samples count as silence. Returns true once the frame limit is reached.
    pub fn produce_into(&mut self, input: Option<&[i32]>, output: &mut [i32]) -> bool {
        let samples_done = self.samples_done;
        for (c, (chan, out)) in self.channels.iter_mut().zip(output.iter_mut()).enumerate() {
            let x = input.and_then(|frame| frame.get(c)).copied().unwrap_or(0);
            *out = chan.next_sample(samples_done, x, self.gain, &mut self.rng);
        }

        self.samples_done += 1;
        if self.samples_to_do != 0 && self.samples_done == self.samples_to_do {
            trace!(samples_done = self.samples_done, "sample limit reached");
        }
        self.is_finished()
    }

    /// Produce one frame, returning it with the final-frame flag.
    pub fn produce(&mut self, input: Option<&[i32]>) -> (Vec<i32>, bool) {
        let mut frame = vec![0; self.channels.len()];
        let last = self.produce_into(input, &mut frame);
        (frame, last)
    }

    /// Process interleaved frames: as many whole frames as both buffers hold,
    /// stopping after the final frame.
    pub fn process_block(&mut self, input: &[i32], output: &mut [i32]) -> Flow {
        let width = self.channels.len();
        if width == 0 {
            return Flow {
                frames: 0,
                finished: self.is_finished(),
            };
        }

        let len = input.len().min(output.len()) / width;
        let mut frames = 0;
        let mut finished = self.is_finished();
        while frames < len && !finished {
            let range = frames * width..(frames + 1) * width;
            finished = self.produce_into(Some(&input[range.clone()]), &mut output[range]);
            frames += 1;
        }
        Flow { frames, finished }
    }

    /// Release every channel and its buffers.
    pub fn stop(&mut self) {
        info!(samples_done = self.samples_done, "synth stopped");
        self.channels = Vec::new();
    }
}

pub mod config;
pub mod dsp;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use crate::config::{ChannelSpec, CombineMode, Length, Sweep, SweepLaw, SynthConfig, SynthType};
pub use crate::dsp::engine::{Engine, Flow};
pub use crate::dsp::rng::Ranqd1;
pub use crate::error::{ConfigError, LexError, ParseError, Result, SynthError};

use crate::dsp::mixer::FULL_SCALE;
use crate::lexer::Lexer;
use crate::parser::Parser;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the synthkit version string.
#[wasm_bindgen]
pub fn synth_version() -> String {
    VERSION.to_string()
}

/// Parse a synth argument line into a validated `SynthConfig`.
pub fn parse(args: &str) -> Result<SynthConfig> {
    let tokens = Lexer::new(args).tokenize()?;
    let mut parser = Parser::new(tokens);
    let config = parser.parse_config()?;
    config.validate()?;
    Ok(config)
}

/// Render an argument line offline to interleaved samples in [-1, 1].
/// Stops at the configured length or after `max_frames`, whichever is first.
pub fn render_samples(
    args: &str,
    sample_rate: f64,
    channels: Option<usize>,
    max_frames: usize,
) -> Result<Vec<f32>> {
    let mut engine = Engine::new(parse(args)?)?;
    engine.start(sample_rate, channels)?;

    let frames = engine
        .samples_to_do()
        .map_or(max_frames, |n| n.min(max_frames as u64) as usize);
    let mut frame = vec![0; engine.channel_count()];
    let mut out = Vec::with_capacity(frames * frame.len());
    for _ in 0..frames {
        let last = engine.produce_into(None, &mut frame);
        out.extend(frame.iter().map(|&s| (s as f64 / FULL_SCALE) as f32));
        if last {
            break;
        }
    }
    engine.stop();
    Ok(out)
}

/// Render an argument line offline to a 32-bit PCM WAV byte buffer.
pub fn render_wav(
    args: &str,
    sample_rate: u32,
    channels: Option<usize>,
    max_frames: usize,
) -> Result<Vec<u8>> {
    let mut engine = Engine::new(parse(args)?)?;
    engine.start(sample_rate as f64, channels)?;
    let wav = dsp::renderer::render_wav(&mut engine, max_frames)?;
    engine.stop();
    Ok(wav)
}

/// WASM-exposed: parse an argument line into its configuration object.
#[wasm_bindgen]
pub fn parse_synth(args: &str) -> std::result::Result<JsValue, JsValue> {
    let config = parse(args).map_err(|e| JsValue::from_str(&e.report(args)))?;
    serde_wasm_bindgen::to_value(&config).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render an argument line to interleaved f32 samples for
/// AudioWorklet playback. A channel count of 0 uses one channel per template.
#[wasm_bindgen]
pub fn render_synth_samples(
    args: &str,
    sample_rate: u32,
    channels: u32,
    max_frames: u32,
) -> std::result::Result<Vec<f32>, JsValue> {
    let channels = (channels > 0).then_some(channels as usize);
    render_samples(args, sample_rate as f64, channels, max_frames as usize)
        .map_err(|e| JsValue::from_str(&e.report(args)))
}

/// WASM-exposed: render an argument line to a WAV byte array.
#[wasm_bindgen]
pub fn render_synth_wav(
    args: &str,
    sample_rate: u32,
    channels: u32,
    max_frames: u32,
) -> std::result::Result<Vec<u8>, JsValue> {
    let channels = (channels > 0).then_some(channels as usize);
    render_wav(args, sample_rate, channels, max_frames as usize)
        .map_err(|e| JsValue::from_str(&e.report(args)))
}

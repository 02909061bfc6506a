//! DSP: sample generation, one pure-Rust stage per file.
//!
//! The [`engine`] owns a [`channel::Channel`] per audio channel; each
//! channel pairs a generator (waveform, noise or pluck) with its mixer.

pub mod channel;
pub mod engine;
pub mod filter;
pub mod mixer;
pub mod noise;
pub mod oscillator;
pub mod pluck;
pub mod renderer;
pub mod rng;
pub mod sweep;

/// Amplitude ratio for a level in dB.
#[inline]
pub(crate) fn db_to_linear(db: f64) -> f64 {
    (db * std::f64::consts::LN_10 * 0.05).exp()
}

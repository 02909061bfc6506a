//! WAV renderer: runs a started engine offline into a WAV byte buffer.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use rand::RngCore;

use crate::error::{Result, SynthError};

use super::engine::Engine;

fn wav_error(e: hound::Error) -> SynthError {
    SynthError::Wav(e.to_string())
}

/// Render up to `max_frames` frames as 32-bit integer PCM, one WAV channel
/// per engine channel. Stops early at the engine's sample limit.
pub fn render_wav<R: RngCore>(engine: &mut Engine<R>, max_frames: usize) -> Result<Vec<u8>> {
    let channels = engine.channel_count();
    let wav_channels = u16::try_from(channels)
        .map_err(|_| SynthError::Wav(format!("too many channels: {channels}")))?;
    let spec = WavSpec {
        channels: wav_channels,
        sample_rate: engine.sample_rate().round() as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec).map_err(wav_error)?;
    let mut frame = vec![0; channels];
    for _ in 0..max_frames {
        let last = engine.produce_into(None, &mut frame);
        for &sample in &frame {
            writer.write_sample(sample).map_err(wav_error)?;
        }
        if last {
            break;
        }
    }
    writer.finalize().map_err(wav_error)?;
    Ok(cursor.into_inner())
}

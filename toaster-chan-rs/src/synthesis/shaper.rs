//! Pitch and speed adjustment by sample-rate remapping.
//!
//! The clip is treated as if it had been recorded at
//! `rate × 2^(semitones/12) × speed` and resampled back to `rate`. Pitch and
//! tempo move together, like playing a tape faster.

use std::borrow::Cow;
use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

use crate::{Error, Result};

const CHUNK_FRAMES: usize = 1024;
const MAX_SEMITONES: f32 = 24.0;
const SPEED_RANGE: (f32, f32) = (0.25, 4.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceShaper {
    pitch_semitones: f32,
    speed: f32,
}

impl VoiceShaper {
    /// # Errors
    ///
    /// Returns error if the pitch or speed is outside the supported range
    pub fn new(pitch_semitones: f32, speed: f32) -> Result<Self> {
        if !pitch_semitones.is_finite() || pitch_semitones.abs() > MAX_SEMITONES {
            return Err(Error::Config(format!(
                "pitch_semitones must be within ±{MAX_SEMITONES}, got {pitch_semitones}"
            )));
        }
        if !speed.is_finite() || speed < SPEED_RANGE.0 || speed > SPEED_RANGE.1 {
            return Err(Error::Config(format!(
                "speed must be within {}..={}, got {speed}",
                SPEED_RANGE.0, SPEED_RANGE.1
            )));
        }
        Ok(Self {
            pitch_semitones,
            speed,
        })
    }

    /// Playback-rate multiplier applied to the clip.
    pub fn factor(&self) -> f64 {
        2f64.powf(f64::from(self.pitch_semitones) / 12.0) * f64::from(self.speed)
    }

    pub fn is_identity(&self) -> bool {
        (self.factor() - 1.0).abs() < 1e-6
    }

    /// Reshape a WAV clip. Output is 16-bit PCM at the input's sample rate.
    ///
    /// # Errors
    ///
    /// Returns error if the input is not decodable WAV or resampling fails
    pub fn apply(&self, wav: &[u8]) -> Result<Vec<u8>> {
        if self.is_identity() {
            return Ok(wav.to_vec());
        }

        let (spec, channels) = decode(wav)?;
        let ratio = 1.0 / self.factor();
        debug!(
            "Reshaping {} frames at {} Hz (factor {:.3})",
            channels.first().map_or(0, Vec::len),
            spec.sample_rate,
            self.factor()
        );

        let reshaped = resample(&channels, ratio)?;
        encode(spec, &reshaped)
    }
}

/// Streamed WAV responses carry placeholder chunk sizes (`0xFFFFFFFF`).
/// Rewrite the `data` size from the bytes actually present, rounded down to
/// whole frames, and the RIFF size to match.
fn repair_sizes(wav: &[u8]) -> Cow<'_, [u8]> {
    let read_u32 = |at: usize| {
        wav.get(at..at + 4)
            .and_then(|b| <[u8; 4]>::try_from(b).ok())
            .map(u32::from_le_bytes)
    };
    if wav.len() < 12 || &wav[0..4] != b"RIFF" || &wav[8..12] != b"WAVE" {
        return Cow::Borrowed(wav);
    }

    let mut block_align = 1usize;
    let mut pos = 12;
    while let (Some(id), Some(size)) = (wav.get(pos..pos + 4), read_u32(pos + 4)) {
        let body = pos + 8;
        let available = wav.len() - body;

        if id == b"fmt " {
            if let Some(align) = wav.get(body + 12..body + 14) {
                block_align = usize::from(u16::from_le_bytes([align[0], align[1]])).max(1);
            }
        } else if id == b"data" {
            if size as usize <= available {
                return Cow::Borrowed(wav);
            }
            let data_len = available - available % block_align;
            let end = body + data_len;
            let mut fixed = wav[..end].to_vec();
            fixed[pos + 4..body].copy_from_slice(&(data_len as u32).to_le_bytes());
            fixed[4..8].copy_from_slice(&((end - 8) as u32).to_le_bytes());
            debug!("Rewrote streamed WAV sizes: {data_len} data bytes");
            return Cow::Owned(fixed);
        }

        let next = body.saturating_add(size as usize).saturating_add(size as usize & 1);
        if next > wav.len() {
            break;
        }
        pos = next;
    }
    Cow::Borrowed(wav)
}

fn decode(wav: &[u8]) -> Result<(WavSpec, Vec<Vec<f64>>)> {
    let wav = repair_sizes(wav);
    let mut reader =
        WavReader::new(Cursor::new(wav.as_ref())).map_err(|e| Error::PostProcess(format!("not a WAV clip: {e}")))?;
    let spec = reader.spec();
    let decode_err = |e: hound::Error| Error::PostProcess(format!("bad WAV sample: {e}"));

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<_, _>>()
            .map_err(decode_err)?,
        SampleFormat::Int => {
            let scale = f64::from(1u32 << (spec.bits_per_sample.clamp(1, 32) - 1));
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(decode_err)?
        }
    };

    let n_channels = usize::from(spec.channels.max(1));
    let mut channels = vec![Vec::with_capacity(interleaved.len() / n_channels); n_channels];
    for frame in interleaved.chunks_exact(n_channels) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }
    Ok((spec, channels))
}

fn resample(channels: &[Vec<f64>], ratio: f64) -> Result<Vec<Vec<f64>>> {
    let frames = channels.first().map_or(0, Vec::len);
    if frames == 0 {
        return Ok(channels.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f64>::new(ratio, 1.0, params, CHUNK_FRAMES, channels.len())
        .map_err(|e| Error::PostProcess(format!("resampler init failed: {e}")))?;

    let delay = resampler.output_delay();
    let expected = (frames as f64 * ratio).round() as usize;
    let mut output = vec![Vec::with_capacity(expected + delay); channels.len()];
    let mut pos = 0;

    // Keep feeding (zero-padded past the end) until the delayed tail is out
    while output[0].len() < expected + delay {
        let need = resampler.input_frames_next();
        let block: Vec<Vec<f64>> = channels
            .iter()
            .map(|c| {
                let mut b: Vec<f64> = c.iter().skip(pos).take(need).copied().collect();
                b.resize(need, 0.0);
                b
            })
            .collect();
        pos += need;

        let produced = resampler
            .process(&block, None)
            .map_err(|e| Error::PostProcess(format!("resample failed: {e}")))?;
        for (out, chunk) in output.iter_mut().zip(produced) {
            out.extend(chunk);
        }
    }

    Ok(output
        .into_iter()
        .map(|mut c| {
            c.drain(..delay.min(c.len()));
            c.truncate(expected);
            c
        })
        .collect())
}

fn encode(spec: WavSpec, channels: &[Vec<f64>]) -> Result<Vec<u8>> {
    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let encode_err = |e: hound::Error| Error::PostProcess(format!("WAV encode failed: {e}"));

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, out_spec).map_err(encode_err)?;
        let frames = channels.first().map_or(0, Vec::len);
        for i in 0..frames {
            for channel in channels {
                let s = (channel[i] * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(s).map_err(encode_err)?;
            }
        }
        writer.finalize().map_err(encode_err)?;
    }
    Ok(cursor.into_inner())
}

//! Audio capture abstraction.
//!
//! The pipeline records 16 kHz mono 16-bit PCM and wraps it in a WAV
//! container before upload. Real capture backends implement [`Recorder`];
//! [`UnavailableRecorder`] models a host without a usable device, failing
//! closed with an actionable message.

use crate::VoiceError;

/// Sample rate the pipeline records and uploads at.
pub const SAMPLE_RATE: u32 = 16_000;

/// A microphone-like capture device.
pub trait Recorder: Send {
    /// Begin capturing. Fails if no device is available or access is denied.
    fn start(&mut self) -> Result<(), VoiceError>;

    /// Stop capturing and return the recorded PCM samples.
    fn stop(&mut self) -> Result<Vec<i16>, VoiceError>;
}

/// Recorder for hosts without a capture device. `start` always fails.
#[derive(Debug, Default)]
pub struct UnavailableRecorder;

impl Recorder for UnavailableRecorder {
    fn start(&mut self) -> Result<(), VoiceError> {
        Err(VoiceError::CaptureUnavailable(
            "no microphone available; connect a capture device and grant access".into(),
        ))
    }

    fn stop(&mut self) -> Result<Vec<i16>, VoiceError> {
        Err(VoiceError::CaptureUnavailable(
            "recorder was never started".into(),
        ))
    }
}

/// Wrap raw 16-bit PCM in a WAV container.
pub fn pcm_to_wav(pcm: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    const BITS_PER_SAMPLE: u16 = 16;
    let data_len = pcm.len() * 2;
    let byte_rate = sample_rate * channels as u32 * BITS_PER_SAMPLE as u32 / 8;
    let block_align = channels * BITS_PER_SAMPLE / 8;

    let mut wav = Vec::with_capacity(44 + data_len);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_len as u32).to_le_bytes());
    for &sample in pcm {
        wav.extend_from_slice(&sample.to_le_bytes());
    }
    wav
}

//! 16-bit PCM codec used on the AI service boundary

use crate::{MediZenError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::time::Duration;

/// Encode raw bytes as standard base64
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 into raw bytes
pub fn decode(data: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(data.trim())
        .map_err(|e| MediZenError::AudioProcessingError(format!("Invalid base64 audio: {}", e)))
}

/// Planar float audio ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackBuffer {
    pub sample_rate: u32,
    /// One vector of samples per channel, all the same length
    pub channels: Vec<Vec<f32>>,
}

impl PlaybackBuffer {
    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Frame-interleaved samples, as audio devices expect them
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frames();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for i in 0..frames {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }
}

/// Reinterpret little-endian signed 16-bit samples as floats in [-1, 1].
///
/// Trailing bytes that do not form a whole frame are ignored.
pub fn to_playback_buffer(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<PlaybackBuffer> {
    if channels == 0 || sample_rate == 0 {
        return Err(MediZenError::AudioProcessingError(format!(
            "Invalid PCM layout: {} Hz, {} channels",
            sample_rate, channels
        )));
    }

    let channels = channels as usize;
    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let frames = samples.len() / channels;

    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (channel, &sample) in planar.iter_mut().zip(frame) {
            channel.push(sample as f32 / 32768.0);
        }
    }

    Ok(PlaybackBuffer {
        sample_rate,
        channels: planar,
    })
}

/// Quantize float samples to little-endian 16-bit PCM bytes
pub fn float_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let value = if clamped < 0.0 {
            (clamped * 32768.0) as i16
        } else {
            (clamped * 32767.0) as i16
        };
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_pattern_normalizes_exactly() {
        let samples: [i16; 5] = [0, 16384, -16384, i16::MAX, i16::MIN];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let buffer = to_playback_buffer(&bytes, 24000, 1).unwrap();
        let expected: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
        assert_eq!(buffer.channels[0], expected);
        assert_eq!(buffer.channels[0][1], 0.5);
        assert_eq!(buffer.channels[0][4], -1.0);
    }

    #[test]
    fn test_stereo_is_deinterleaved() {
        let samples: [i16; 4] = [100, -100, 200, -200];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let buffer = to_playback_buffer(&bytes, 16000, 2).unwrap();
        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.channels[0], vec![100.0 / 32768.0, 200.0 / 32768.0]);
        assert_eq!(buffer.channels[1], vec![-100.0 / 32768.0, -200.0 / 32768.0]);
        assert_eq!(buffer.interleaved().len(), 4);
    }

    #[test]
    fn test_odd_trailing_byte_is_ignored() {
        let buffer = to_playback_buffer(&[0, 64, 7], 24000, 1).unwrap();
        assert_eq!(buffer.frames(), 1);
    }

    #[test]
    fn test_duration() {
        let bytes = vec![0u8; 24000 * 2];
        let buffer = to_playback_buffer(&bytes, 24000, 1).unwrap();
        assert_eq!(buffer.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        assert!(decode("not base64!!").is_err());
    }

    #[test]
    fn test_float_to_pcm16_clamps() {
        let bytes = float_to_pcm16(&[2.0, -2.0, 0.0]);
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), i16::MIN);
        assert_eq!(i16::from_le_bytes([bytes[4], bytes[5]]), 0);
    }

    proptest! {
        #[test]
        fn prop_base64_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..2048)) {
            prop_assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
        }

        #[test]
        fn prop_pcm_samples_map_to_unit_range(samples in proptest::collection::vec(any::<i16>(), 1..512)) {
            let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
            let buffer = to_playback_buffer(&bytes, 24000, 1).unwrap();
            for (&raw, &value) in samples.iter().zip(&buffer.channels[0]) {
                prop_assert_eq!(value, raw as f32 / 32768.0);
                prop_assert!((-1.0..1.0).contains(&value));
            }
        }
    }
}

use super::pcm::PlaybackBuffer;
use crate::{MediZenError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::info;

/// Save raw little-endian 16-bit PCM as a WAV file without re-quantizing
pub fn write_pcm16_wav<P: AsRef<Path>>(
    path: P,
    pcm: &[u8],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| MediZenError::IOError(format!("Failed to create WAV writer: {}", e)))?;

    for pair in pcm.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
            .map_err(|e| MediZenError::IOError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| MediZenError::IOError(format!("Failed to finalize WAV file: {}", e)))?;

    info!("Saved {} bytes of speech to {:?}", pcm.len(), path.as_ref());
    Ok(())
}

/// Load a 16-bit integer WAV file into a playback buffer
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<PlaybackBuffer> {
    let mut reader = WavReader::open(path.as_ref())
        .map_err(|e| MediZenError::IOError(format!("Failed to open WAV file: {}", e)))?;

    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(MediZenError::AudioProcessingError(format!(
            "Unsupported WAV format: {:?} {} bits",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let channels = spec.channels.max(1) as usize;
    let mut planar = vec![Vec::new(); channels];
    for (i, sample) in reader.samples::<i16>().enumerate() {
        let sample =
            sample.map_err(|e| MediZenError::IOError(format!("Failed to read sample: {}", e)))?;
        planar[i % channels].push(sample as f32 / 32768.0);
    }

    Ok(PlaybackBuffer {
        sample_rate: spec.sample_rate,
        channels: planar,
    })
}

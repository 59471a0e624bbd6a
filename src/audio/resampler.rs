use crate::{MediZenError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

const FRAMES_PER_BLOCK: usize = 1024;

/// Mono sample-rate converter, used to bring microphone audio to the rate
/// the live session expects
pub struct AudioResampler {
    inner: Option<SincFixedIn<f32>>,
    // Input held back until a full block is available
    pending: Vec<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl AudioResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(MediZenError::ConfigError(
                "Sample rates must be greater than 0".into(),
            ));
        }

        // Equal rates pass samples straight through
        let inner = if input_rate == output_rate {
            None
        } else {
            let params = SincInterpolationParameters {
                sinc_len: 128,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 128,
                window: WindowFunction::BlackmanHarris2,
            };
            let ratio = output_rate as f64 / input_rate as f64;
            let resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, FRAMES_PER_BLOCK, 1)
                .map_err(|e| {
                    MediZenError::AudioProcessingError(format!("Failed to create resampler: {}", e))
                })?;
            Some(resampler)
        };

        debug!("Resampler {} Hz -> {} Hz", input_rate, output_rate);
        Ok(Self {
            inner,
            pending: Vec::new(),
            input_rate,
            output_rate,
        })
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Input samples waiting for a full block
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Convert the next stretch of a continuous mono stream.
    ///
    /// Only whole blocks go through the filter; a trailing partial block is
    /// kept for the next call, so chunk sizes never affect the output.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let resampler = match self.inner.as_mut() {
            Some(r) => r,
            None => return Ok(input.to_vec()),
        };
        self.pending.extend_from_slice(input);

        let ratio = self.output_rate as f64 / self.input_rate as f64;
        let mut output = Vec::with_capacity((self.pending.len() as f64 * ratio) as usize + 1);
        let mut consumed = 0;

        loop {
            let needed = resampler.input_frames_next();
            if self.pending.len() - consumed < needed {
                break;
            }
            let block = &self.pending[consumed..consumed + needed];
            let converted = resampler.process(&[block], None).map_err(|e| {
                MediZenError::AudioProcessingError(format!("Resampling failed: {}", e))
            })?;
            output.extend_from_slice(&converted[0]);
            consumed += needed;
        }

        self.pending.drain(..consumed);
        Ok(output)
    }

    /// Push out whatever is still held back, zero padding the last block.
    ///
    /// Only the share of output matching real input is kept.
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        let resampler = match self.inner.as_mut() {
            Some(r) => r,
            None => return Ok(Vec::new()),
        };
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let real = self.pending.len();
        let ratio = self.output_rate as f64 / self.input_rate as f64;
        let mut block = std::mem::take(&mut self.pending);
        block.resize(resampler.input_frames_next().max(real), 0.0);

        let converted = resampler.process(&[block.as_slice()], None).map_err(|e| {
            MediZenError::AudioProcessingError(format!("Resampling failed: {}", e))
        })?;
        let keep = ((real as f64) * ratio).ceil() as usize;
        Ok(converted[0][..keep.min(converted[0].len())].to_vec())
    }
}

/// Mix interleaved multi-channel audio down to mono
pub fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_rates() {
        assert!(AudioResampler::new(0, 16000).is_err());
        assert!(AudioResampler::new(48000, 0).is_err());
    }

    #[test]
    fn test_same_rate_passes_through() {
        let mut resampler = AudioResampler::new(16000, 16000).unwrap();
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resampler.process(&input).unwrap(), input);
    }

    #[test]
    fn test_downsampling_shrinks_output() {
        let mut resampler = AudioResampler::new(48000, 16000).unwrap();
        let input: Vec<f32> = (0..3072).map(|i| (i as f32 * 0.01).sin()).collect();
        let output = resampler.process(&input).unwrap();
        assert!(!output.is_empty());
        assert!(output.len() < input.len());
    }

    #[test]
    fn test_partial_blocks_wait_for_more_input() {
        let mut resampler = AudioResampler::new(44100, 16000).unwrap();
        let output = resampler.process(&vec![0.5; FRAMES_PER_BLOCK - 1]).unwrap();
        assert!(output.is_empty());
        assert_eq!(resampler.pending(), FRAMES_PER_BLOCK - 1);

        let output = resampler.process(&[0.5, 0.5]).unwrap();
        assert!(!output.is_empty());
        assert_eq!(resampler.pending(), 1);
    }

    #[test]
    fn test_odd_sized_stream_chunks_stay_continuous() {
        // Microphone chunk size at 44.1 kHz, not a multiple of the block size
        let chunk = 4096 * 44100 / 16000;
        let mut resampler = AudioResampler::new(44100, 16000).unwrap();

        let mut output = Vec::new();
        for _ in 0..4 {
            output.extend(resampler.process(&vec![0.5f32; chunk]).unwrap());
        }

        let expected = (4 * chunk) as f64 * 16000.0 / 44100.0;
        assert!((output.len() as f64) <= expected);
        assert!((output.len() as f64) > expected - 2.0 * FRAMES_PER_BLOCK as f64);

        // Skip the filter warm-up, then the level must hold steady
        let settled = &output[256..];
        let min = settled.iter().cloned().fold(f32::MAX, f32::min);
        let max = settled.iter().cloned().fold(f32::MIN, f32::max);
        assert!(min > 0.45, "constant input dipped to {}", min);
        assert!(max < 0.55, "constant input rose to {}", max);
    }

    #[test]
    fn test_flush_drains_held_back_input() {
        let mut resampler = AudioResampler::new(48000, 16000).unwrap();
        resampler.process(&vec![0.1; 1500]).unwrap();
        assert_eq!(resampler.pending(), 1500 - FRAMES_PER_BLOCK);

        let tail = resampler.flush().unwrap();
        assert_eq!(resampler.pending(), 0);
        assert!(!tail.is_empty());
        assert!(tail.len() <= ((1500 - FRAMES_PER_BLOCK) as f64 / 3.0).ceil() as usize);
        assert!(resampler.flush().unwrap().is_empty());
    }

    #[test]
    fn test_downmix_averages_frames() {
        let mono = downmix(&[0.5, 0.3, 0.7, 0.1], 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.4).abs() < 1e-6);
        assert!((mono[1] - 0.4).abs() < 1e-6);
    }
}

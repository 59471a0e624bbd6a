use ringbuf::{traits::*, HeapRb};

/// Size of each microphone chunk sent to the live session
pub const MIC_CHUNK_SAMPLES: usize = 4096;

/// Collects microphone samples and releases them in fixed-size chunks
pub struct MicChunker {
    buffer: HeapRb<f32>,
    chunk_size: usize,
}

impl MicChunker {
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            // Room for a few chunks so bursts from the device callback fit
            buffer: HeapRb::new(chunk_size * 4),
            chunk_size,
        }
    }

    /// Add samples; returns every chunk that became complete.
    ///
    /// When the device delivers faster than chunks are drained the oldest
    /// samples are overwritten.
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        let mut ready = Vec::new();

        for &sample in samples {
            if self.buffer.is_full() {
                let _ = self.buffer.try_pop();
            }
            let _ = self.buffer.try_push(sample);

            if self.buffer.occupied_len() >= self.chunk_size {
                let mut chunk = vec![0.0f32; self.chunk_size];
                let read = self.buffer.pop_slice(&mut chunk);
                chunk.truncate(read);
                ready.push(chunk);
            }
        }

        ready
    }

    /// Samples waiting for a full chunk
    pub fn pending(&self) -> usize {
        self.buffer.occupied_len()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Drain whatever is left as a short final chunk
    pub fn flush(&mut self) -> Option<Vec<f32>> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut rest = vec![0.0f32; self.buffer.occupied_len()];
        let read = self.buffer.pop_slice(&mut rest);
        rest.truncate(read);
        Some(rest)
    }
}

impl Default for MicChunker {
    fn default() -> Self {
        Self::new(MIC_CHUNK_SAMPLES)
    }
}

use super::pcm::PlaybackBuffer;
use super::session::{PlaybackHandle, PlaybackSink};
use crate::{MediZenError, Result};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::time::Duration;
use tracing::info;

/// Speaker output on the default device
pub struct RodioSink {
    // Dropping the stream silences every sink created from it
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioSink {
    pub fn open() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| MediZenError::AudioDeviceError(format!("No output device: {}", e)))?;
        info!("Opened default output device");
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

struct RodioHandle {
    sink: Sink,
}

impl PlaybackHandle for RodioHandle {
    fn stop(&mut self) {
        self.sink.stop();
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn wait(&mut self) {
        self.sink.sleep_until_end();
    }
}

impl PlaybackSink for RodioSink {
    fn start(&mut self, buffer: PlaybackBuffer, delay: Duration) -> Result<Box<dyn PlaybackHandle>> {
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| MediZenError::AudioDeviceError(format!("Failed to create sink: {}", e)))?;

        let source = SamplesBuffer::new(
            buffer.channel_count(),
            buffer.sample_rate,
            buffer.interleaved(),
        );
        sink.append(source.delay(delay));

        Ok(Box::new(RodioHandle { sink }))
    }
}

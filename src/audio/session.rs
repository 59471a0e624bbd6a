//! Single-clip playback owned by an explicit session object
//!
//! Starting a clip always stops the one before it, so at most one clip is
//! audible per session.

use super::pcm::{self, PlaybackBuffer};
use crate::Result;
use std::time::Duration;
use tracing::debug;

/// Something that can play a buffer after an optional delay
pub trait PlaybackSink {
    fn start(&mut self, buffer: PlaybackBuffer, delay: Duration) -> Result<Box<dyn PlaybackHandle>>;
}

/// Control over one clip that has been started
pub trait PlaybackHandle {
    fn stop(&mut self);

    fn is_finished(&self) -> bool;

    /// Block until the clip has played out
    fn wait(&mut self);
}

pub struct AudioSession<S: PlaybackSink> {
    sink: S,
    current: Option<Box<dyn PlaybackHandle>>,
    sample_rate: u32,
    channels: u16,
}

impl<S: PlaybackSink> AudioSession<S> {
    /// Session decoding clips as `sample_rate` Hz with `channels` channels
    pub fn new(sink: S, sample_rate: u32, channels: u16) -> Self {
        Self {
            sink,
            current: None,
            sample_rate,
            channels,
        }
    }

    /// Stop anything playing, then decode and play a base64 PCM clip.
    ///
    /// Returns the clip duration. An empty clip stops playback and plays nothing.
    pub fn play(&mut self, data: &str) -> Result<Duration> {
        self.stop();
        if data.trim().is_empty() {
            return Ok(Duration::ZERO);
        }

        let bytes = pcm::decode(data)?;
        let buffer = pcm::to_playback_buffer(&bytes, self.sample_rate, self.channels)?;
        self.play_buffer(buffer)
    }

    pub fn play_buffer(&mut self, buffer: PlaybackBuffer) -> Result<Duration> {
        self.stop();
        let duration = buffer.duration();
        debug!("Playing {:?} of audio", duration);
        self.current = Some(self.sink.start(buffer, Duration::ZERO)?);
        Ok(duration)
    }

    /// Halt the active clip, if any
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.current.take() {
            handle.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Block until the active clip has finished
    pub fn wait(&mut self) {
        if let Some(handle) = self.current.as_mut() {
            handle.wait();
        }
    }
}

impl<S: PlaybackSink> Drop for AudioSession<S> {
    fn drop(&mut self) {
        self.stop();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingSink, SinkEvent};
    use super::*;

    fn clip(frames: usize) -> String {
        pcm::encode(&vec![0u8; frames * 2])
    }

    #[test]
    fn test_new_clip_stops_previous() {
        let sink = RecordingSink::default();
        let events = sink.events.clone();
        let mut session = AudioSession::new(sink, 24000, 1);

        session.play(&clip(240)).unwrap();
        session.play(&clip(480)).unwrap();
        assert!(session.is_playing());

        assert_eq!(
            *events.lock(),
            vec![
                SinkEvent::Started { id: 0, frames: 240, delay: Duration::ZERO },
                SinkEvent::Stopped { id: 0 },
                SinkEvent::Started { id: 1, frames: 480, delay: Duration::ZERO },
            ]
        );
    }

    #[test]
    fn test_stop_is_deterministic() {
        let sink = RecordingSink::default();
        let events = sink.events.clone();
        let mut session = AudioSession::new(sink, 24000, 1);

        let duration = session.play(&clip(24000)).unwrap();
        assert_eq!(duration, Duration::from_secs(1));

        session.stop();
        session.stop();
        assert!(!session.is_playing());
        assert_eq!(events.lock().len(), 2);
    }

    #[test]
    fn test_empty_clip_only_stops() {
        let sink = RecordingSink::default();
        let events = sink.events.clone();
        let mut session = AudioSession::new(sink, 24000, 1);

        session.play(&clip(10)).unwrap();
        assert_eq!(session.play("").unwrap(), Duration::ZERO);
        assert!(!session.is_playing());
        assert_eq!(events.lock().last(), Some(&SinkEvent::Stopped { id: 0 }));
    }
}

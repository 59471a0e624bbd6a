//! Gapless back-to-back scheduling of streamed audio chunks

use super::pcm::PlaybackBuffer;
use super::session::{PlaybackHandle, PlaybackSink};
use crate::Result;
use std::time::{Duration, Instant};
use tracing::debug;

/// Running "next start time" cursor.
///
/// A chunk starts at `max(cursor, now)` and moves the cursor to its end, so
/// consecutive chunks never overlap and leave no gap while data keeps coming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackScheduler {
    cursor: Duration,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `duration` of playback time; returns the start time
    pub fn schedule(&mut self, now: Duration, duration: Duration) -> Duration {
        let start = self.cursor.max(now);
        self.cursor = start + duration;
        start
    }

    /// Time at which everything scheduled so far has played
    pub fn cursor(&self) -> Duration {
        self.cursor
    }

    pub fn reset(&mut self) {
        self.cursor = Duration::ZERO;
    }
}

/// Plays streamed chunks through a sink using a [`PlaybackScheduler`]
pub struct StreamPlayer<S: PlaybackSink> {
    sink: S,
    scheduler: PlaybackScheduler,
    epoch: Instant,
    active: Vec<Box<dyn PlaybackHandle>>,
}

impl<S: PlaybackSink> StreamPlayer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            scheduler: PlaybackScheduler::new(),
            epoch: Instant::now(),
            active: Vec::new(),
        }
    }

    /// Queue a chunk right after the previously queued ones
    pub fn enqueue(&mut self, buffer: PlaybackBuffer) -> Result<Duration> {
        let now = self.epoch.elapsed();
        self.enqueue_at(buffer, now)
    }

    /// Queue a chunk as if the clock read `now`; returns its start time
    pub fn enqueue_at(&mut self, buffer: PlaybackBuffer, now: Duration) -> Result<Duration> {
        if buffer.is_empty() {
            return Ok(self.scheduler.cursor().max(now));
        }

        let start = self.scheduler.schedule(now, buffer.duration());
        let delay = start.saturating_sub(now);
        debug!("Chunk of {:?} scheduled at {:?}", buffer.duration(), start);

        self.active.retain(|h| !h.is_finished());
        self.active.push(self.sink.start(buffer, delay)?);
        Ok(start)
    }

    /// Stop every queued chunk and rewind the cursor to the current time
    pub fn interrupt(&mut self) {
        for mut handle in self.active.drain(..) {
            handle.stop();
        }
        self.scheduler = PlaybackScheduler {
            cursor: self.epoch.elapsed(),
        };
    }

    pub fn pending(&self) -> usize {
        self.active.iter().filter(|h| !h.is_finished()).count()
    }
}

impl<S: PlaybackSink> Drop for StreamPlayer<S> {
    fn drop(&mut self) {
        for mut handle in self.active.drain(..) {
            handle.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::session::testing::{RecordingSink, SinkEvent};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn chunk(millis: u64) -> PlaybackBuffer {
        PlaybackBuffer {
            sample_rate: 1000,
            channels: vec![vec![0.0; millis as usize]],
        }
    }

    #[test]
    fn test_consecutive_chunks_are_gapless() {
        let mut scheduler = PlaybackScheduler::new();
        assert_eq!(scheduler.schedule(ms(0), ms(100)), ms(0));
        assert_eq!(scheduler.schedule(ms(10), ms(100)), ms(100));
        assert_eq!(scheduler.schedule(ms(20), ms(50)), ms(200));
        assert_eq!(scheduler.cursor(), ms(250));
    }

    #[test]
    fn test_late_chunk_starts_now() {
        let mut scheduler = PlaybackScheduler::new();
        scheduler.schedule(ms(0), ms(100));
        assert_eq!(scheduler.schedule(ms(400), ms(100)), ms(400));
        assert_eq!(scheduler.cursor(), ms(500));

        scheduler.reset();
        assert_eq!(scheduler.cursor(), Duration::ZERO);
    }

    #[test]
    fn test_player_delays_follow_cursor() {
        let sink = RecordingSink::default();
        let events = sink.events.clone();
        let mut player = StreamPlayer::new(sink);

        player.enqueue_at(chunk(100), ms(0)).unwrap();
        player.enqueue_at(chunk(100), ms(30)).unwrap();

        let delays: Vec<Duration> = events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Started { delay, .. } => Some(*delay),
                _ => None,
            })
            .collect();
        assert_eq!(delays, vec![ms(0), ms(70)]);
        assert_eq!(player.pending(), 2);
    }

    #[test]
    fn test_interrupt_stops_all_chunks() {
        let sink = RecordingSink::default();
        let events = sink.events.clone();
        let mut player = StreamPlayer::new(sink);

        player.enqueue_at(chunk(100), ms(0)).unwrap();
        player.enqueue_at(chunk(100), ms(0)).unwrap();
        player.interrupt();

        let stopped = events
            .lock()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Stopped { .. }))
            .count();
        assert_eq!(stopped, 2);
        assert_eq!(player.pending(), 0);
    }
}

pub mod buffer;
#[cfg(feature = "audio-io")]
pub mod input;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod pcm;
pub mod resampler;
pub mod scheduler;
pub mod session;
pub mod wav;

pub use buffer::{MicChunker, MIC_CHUNK_SAMPLES};
#[cfg(feature = "audio-io")]
pub use input::Microphone;
#[cfg(feature = "audio-io")]
pub use output::RodioSink;
pub use pcm::{decode, encode, float_to_pcm16, to_playback_buffer, PlaybackBuffer};
pub use resampler::{downmix, AudioResampler};
pub use scheduler::{PlaybackScheduler, StreamPlayer};
pub use session::{AudioSession, PlaybackHandle, PlaybackSink};
pub use wav::{read_wav, write_pcm16_wav};

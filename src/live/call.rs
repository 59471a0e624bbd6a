//! Voice call wiring: microphone into the live session, session audio out
//! of the speakers

use super::{ClientMessage, LiveEvent, LiveSession};
use crate::audio::{
    decode, float_to_pcm16, to_playback_buffer, AudioResampler, MicChunker, Microphone,
    RodioSink, StreamPlayer, MIC_CHUNK_SAMPLES,
};
use crate::config::AppConfig;
use crate::gateway::prompts::LIVE_SYSTEM_INSTRUCTION;
use crate::Result;
use crossbeam_channel::Receiver;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Run a call until the server hangs up or the user presses Ctrl-C
pub async fn run_voice_call(config: &AppConfig) -> Result<()> {
    let mut session = LiveSession::connect(config, Some(LIVE_SYSTEM_INSTRUCTION)).await?;
    let mut player = StreamPlayer::new(RodioSink::open()?);

    let mut mic = Microphone::open()?;
    let (samples_tx, samples_rx) = crossbeam_channel::bounded::<Vec<f32>>(32);
    mic.start(samples_tx)?;

    let sender = session.audio_sender();
    let input_rate = mic.sample_rate();
    let target_rate = config.input_sample_rate;
    let pump = tokio::task::spawn_blocking(move || {
        pump_microphone(samples_rx, sender, input_rate, target_rate)
    });

    info!("Call started, press Ctrl-C to hang up");
    loop {
        tokio::select! {
            event = session.next_event() => match event {
                Some(LiveEvent::Audio(data)) => {
                    let queued = decode(&data)
                        .and_then(|bytes| to_playback_buffer(&bytes, config.output_sample_rate, 1))
                        .and_then(|buffer| player.enqueue(buffer));
                    if let Err(e) = queued {
                        warn!("Skipping audio chunk: {}", e);
                    }
                }
                Some(LiveEvent::Interrupted) => player.interrupt(),
                Some(LiveEvent::Ready) => info!("Doctor is on the line"),
                Some(LiveEvent::TurnComplete) => debug!("Turn complete"),
                Some(LiveEvent::Closed) | None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Hanging up");
                break;
            }
        }
    }

    // Dropping the input stream disconnects the pump, which releases its sender
    mic.stop();
    player.interrupt();
    match pump.await {
        Ok(Err(e)) => warn!("Microphone pump failed: {}", e),
        Err(e) => warn!("Microphone pump panicked: {}", e),
        Ok(Ok(())) => {}
    }
    session.close().await;
    Ok(())
}

/// Resample microphone blocks to the session rate and forward fixed-size chunks
fn pump_microphone(
    samples_rx: Receiver<Vec<f32>>,
    sender: mpsc::Sender<ClientMessage>,
    input_rate: u32,
    target_rate: u32,
) -> Result<()> {
    let mut resampler = AudioResampler::new(input_rate, target_rate)?;
    let device_chunk =
        (MIC_CHUNK_SAMPLES as u64 * input_rate as u64 / target_rate.max(1) as u64) as usize;
    let mut chunker = MicChunker::new(device_chunk);

    let frame = |samples: &[f32]| {
        ClientMessage::audio(crate::audio::encode(&float_to_pcm16(samples)), target_rate)
    };

    while let Ok(block) = samples_rx.recv() {
        for chunk in chunker.push(&block) {
            let converted = resampler.process(&chunk)?;
            if converted.is_empty() {
                continue;
            }
            if sender.blocking_send(frame(&converted)).is_err() {
                return Ok(());
            }
        }
    }

    // Microphone closed; the session may already be gone
    let mut tail = match chunker.flush() {
        Some(rest) => resampler.process(&rest)?,
        None => Vec::new(),
    };
    tail.extend(resampler.flush()?);
    if !tail.is_empty() {
        let _ = sender.blocking_send(frame(&tail));
    }
    Ok(())
}

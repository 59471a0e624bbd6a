use super::resampler::downmix;
use crate::{MediZenError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Default microphone delivering mono float samples at the device rate
pub struct Microphone {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    capturing: Arc<Mutex<bool>>,
}

impl Microphone {
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| MediZenError::AudioDeviceError("No microphone available".into()))?;

        info!(
            "Using microphone: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_input_config()
            .map_err(|e| MediZenError::AudioDeviceError(format!("Failed to get input config: {}", e)))?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            capturing: Arc::new(Mutex::new(false)),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start capturing; every device callback becomes one message on `samples_tx`
    pub fn start(&mut self, samples_tx: Sender<Vec<f32>>) -> Result<()> {
        if *self.capturing.lock() {
            warn!("Microphone already capturing");
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let capturing = Arc::clone(&self.capturing);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !*capturing.lock() {
                        return;
                    }
                    if let Err(e) = samples_tx.try_send(downmix(data, channels)) {
                        debug!("Dropped microphone block: {}", e);
                    }
                },
                |err| error!("Microphone stream error: {}", err),
                None,
            )
            .map_err(|e| MediZenError::AudioDeviceError(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| MediZenError::AudioDeviceError(format!("Failed to start input stream: {}", e)))?;

        *self.capturing.lock() = true;
        self.stream = Some(stream);
        info!("Microphone capturing at {} Hz", self.sample_rate());
        Ok(())
    }

    pub fn stop(&mut self) {
        *self.capturing.lock() = false;
        if self.stream.take().is_some() {
            info!("Microphone stopped");
        }
    }

    pub fn is_capturing(&self) -> bool {
        *self.capturing.lock()
    }
}

impl Drop for Microphone {
    fn drop(&mut self) {
        self.stop();
    }
}

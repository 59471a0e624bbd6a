//! Two-way voice session with the AI service over a websocket

#[cfg(feature = "audio-io")]
pub mod call;
pub mod protocol;

pub use protocol::{parse_server_message, ClientMessage, LiveEvent};

use crate::config::AppConfig;
use crate::{MediZenError, Result};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 64;

/// An open live session.
///
/// Outgoing frames go through a writer task and incoming frames are parsed
/// by a reader task, so sending never waits on the server.
pub struct LiveSession {
    outgoing: mpsc::Sender<ClientMessage>,
    events: mpsc::Receiver<LiveEvent>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl LiveSession {
    /// Connect and send the setup frame
    pub async fn connect(config: &AppConfig, instruction: Option<&str>) -> Result<Self> {
        config.validate()?;
        let url = format!("{}?key={}", config.live_endpoint, config.api_key);

        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| MediZenError::SessionError(format!("Failed to connect: {}", e)))?;
        let (mut ws_tx, mut ws_rx) = socket.split();
        info!("Live session connected");

        let setup = ClientMessage::setup(&config.models.live, &config.voice_name, instruction);
        ws_tx
            .send(Message::Text(serde_json::to_string(&setup)?))
            .await
            .map_err(|e| MediZenError::SessionError(format!("Failed to send setup: {}", e)))?;

        let (outgoing, mut outgoing_rx) = mpsc::channel::<ClientMessage>(CHANNEL_CAPACITY);
        let (events_tx, events) = mpsc::channel::<LiveEvent>(CHANNEL_CAPACITY);

        let writer = tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                let frame = match serde_json::to_string(&message) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Dropping unserializable frame: {}", e);
                        continue;
                    }
                };
                if let Err(e) = ws_tx.send(Message::Text(frame)).await {
                    warn!("Live session send failed: {}", e);
                    break;
                }
            }
            let _ = ws_tx.close().await;
            debug!("Live writer finished");
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = ws_rx.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => text,
                        Err(_) => continue,
                    },
                    Ok(Message::Close(reason)) => {
                        info!("Live session closed by server: {:?}", reason);
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Live session receive failed: {}", e);
                        break;
                    }
                };

                match parse_server_message(&text) {
                    Ok(parsed) => {
                        for event in parsed {
                            if events_tx.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => debug!("Ignoring unrecognized frame: {}", e),
                }
            }
            let _ = events_tx.send(LiveEvent::Closed).await;
        });

        Ok(Self {
            outgoing,
            events,
            writer,
            reader,
        })
    }

    /// Sender for feeding audio from another task
    pub fn audio_sender(&self) -> mpsc::Sender<ClientMessage> {
        self.outgoing.clone()
    }

    /// Next server event; `None` once the session is gone
    pub async fn next_event(&mut self) -> Option<LiveEvent> {
        self.events.recv().await
    }

    /// Close the socket and wait for both tasks
    pub async fn close(self) {
        let LiveSession {
            outgoing,
            events,
            writer,
            reader,
        } = self;
        drop(outgoing);
        drop(events);
        let _ = writer.await;
        reader.abort();
        info!("Live session closed");
    }
}

//! JSON frames of the bidirectional live voice protocol

use crate::gateway::wire::{Blob, Content, SpeechConfig};
use serde::{Deserialize, Serialize};

/// MIME type of microphone PCM at `sample_rate`
pub fn input_mime_type(sample_rate: u32) -> String {
    format!("audio/pcm;rate={}", sample_rate)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGenerationConfig {
    pub response_modalities: Vec<String>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    pub generation_config: LiveGenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<Blob>,
}

/// Frames sent by the client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(Setup),
    RealtimeInput(RealtimeInput),
}

impl ClientMessage {
    /// First frame of a session; `model` is a bare id such as `gemini-2.5-flash-native-audio-…`
    pub fn setup(model: &str, voice: &str, instruction: Option<&str>) -> Self {
        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        ClientMessage::Setup(Setup {
            model,
            generation_config: LiveGenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig::voice(voice),
            },
            system_instruction: instruction.map(Content::plain),
        })
    }

    /// One chunk of PCM at `sample_rate`, already encoded as base64
    pub fn audio(data: String, sample_rate: u32) -> Self {
        ClientMessage::RealtimeInput(RealtimeInput {
            media_chunks: vec![Blob {
                mime_type: input_mime_type(sample_rate),
                data,
            }],
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    pub model_turn: Option<Content>,
    #[serde(default)]
    pub turn_complete: bool,
    #[serde(default)]
    pub interrupted: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub setup_complete: Option<serde_json::Value>,
    pub server_content: Option<ServerContent>,
}

/// What the rest of the application sees of the server stream
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Ready,
    /// Base64 24 kHz PCM
    Audio(String),
    Interrupted,
    TurnComplete,
    Closed,
}

/// Translate one server frame into events, in the order they should be handled
pub fn parse_server_message(text: &str) -> serde_json::Result<Vec<LiveEvent>> {
    let message: ServerMessage = serde_json::from_str(text)?;
    let mut events = Vec::new();

    if message.setup_complete.is_some() {
        events.push(LiveEvent::Ready);
    }

    if let Some(content) = message.server_content {
        if content.interrupted {
            events.push(LiveEvent::Interrupted);
        }
        if let Some(turn) = content.model_turn {
            events.extend(
                turn.parts
                    .into_iter()
                    .filter_map(|p| p.inline_data)
                    .map(|blob| LiveEvent::Audio(blob.data)),
            );
        }
        if content.turn_complete {
            events.push(LiveEvent::TurnComplete);
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_frame_shape() {
        let frame = ClientMessage::setup("gemini-live", "Kore", Some("Be brief"));
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(value["setup"]["model"], "models/gemini-live");
        assert_eq!(value["setup"]["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            value["setup"]["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Kore"
        );
        assert_eq!(value["setup"]["systemInstruction"]["parts"][0]["text"], "Be brief");
    }

    #[test]
    fn test_audio_frame_shape() {
        let value = serde_json::to_value(ClientMessage::audio("AAAA".into(), 16000)).unwrap();
        assert_eq!(value["realtimeInput"]["mediaChunks"][0]["mimeType"], "audio/pcm;rate=16000");
        assert_eq!(value["realtimeInput"]["mediaChunks"][0]["data"], "AAAA");
    }

    #[test]
    fn test_audio_frame_carries_configured_rate() {
        let value = serde_json::to_value(ClientMessage::audio("AAAA".into(), 24000)).unwrap();
        assert_eq!(value["realtimeInput"]["mediaChunks"][0]["mimeType"], "audio/pcm;rate=24000");
    }

    #[test]
    fn test_parse_audio_and_turn_end() {
        let events = parse_server_message(
            r#"{"serverContent":{"modelTurn":{"parts":[{"inlineData":{"mimeType":"audio/pcm;rate=24000","data":"AQI="}}]},"turnComplete":true}}"#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![LiveEvent::Audio("AQI=".into()), LiveEvent::TurnComplete]
        );
    }

    #[test]
    fn test_parse_interruption_and_setup() {
        assert_eq!(
            parse_server_message(r#"{"serverContent":{"interrupted":true}}"#).unwrap(),
            vec![LiveEvent::Interrupted]
        );
        assert_eq!(
            parse_server_message(r#"{"setupComplete":{}}"#).unwrap(),
            vec![LiveEvent::Ready]
        );
        assert!(parse_server_message(r#"{"usageMetadata":{}}"#).unwrap().is_empty());
    }
}

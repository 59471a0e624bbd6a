//! Application configuration
//!
//! Resolved once at startup and passed into the store, gateway and audio
//! components. The API key is the only required value.

use crate::{MediZenError, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Default base URL of the Gemini REST API
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default websocket endpoint for live voice sessions
pub const DEFAULT_LIVE_ENDPOINT: &str =
    "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Model ids used for each kind of request
#[derive(Clone, Debug)]
pub struct ModelSet {
    /// Structured JSON answers (diagnosis, plans, pharmacy)
    pub text: String,

    /// Long-form clinical reports
    pub reasoning: String,

    /// Text-to-speech
    pub speech: String,

    /// Maps-grounded clinic search
    pub maps: String,

    /// Live two-way voice calls
    pub live: String,
}

impl Default for ModelSet {
    fn default() -> Self {
        Self {
            text: "gemini-3-flash-preview".to_string(),
            reasoning: "gemini-3-pro-preview".to_string(),
            speech: "gemini-2.5-flash-preview-tts".to_string(),
            maps: "gemini-2.5-flash".to_string(),
            live: "gemini-2.5-flash-native-audio-preview-12-2025".to_string(),
        }
    }
}

/// Retry policy for quota failures
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Number of retries after the first attempt
    pub retries: u32,

    /// Delay multiplied by the attempt number
    pub base_delay: Duration,

    /// Upper bound of the random delay added to every wait
    pub jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_millis(3000),
            jitter: Duration::from_millis(1000),
        }
    }
}

/// Configuration for the whole application
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Credential for the AI service
    pub api_key: String,

    /// REST base URL
    pub api_base: String,

    /// Live session websocket endpoint
    pub live_endpoint: String,

    /// Model ids
    pub models: ModelSet,

    /// Prebuilt voice used for speech and live calls
    pub voice_name: String,

    /// Quota retry policy
    pub retry: RetryConfig,

    /// Timeout for a single REST request
    pub request_timeout: Duration,

    /// Directory holding the persisted slots
    pub data_dir: PathBuf,

    /// Directory receiving exported text files
    pub export_dir: PathBuf,

    /// Sample rate of audio returned by the AI service
    pub output_sample_rate: u32,

    /// Sample rate expected for microphone audio sent to the AI service
    pub input_sample_rate: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            live_endpoint: DEFAULT_LIVE_ENDPOINT.to_string(),
            models: ModelSet::default(),
            voice_name: "Kore".to_string(),
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(120),
            data_dir: default_data_dir(),
            export_dir: PathBuf::from("."),
            output_sample_rate: 24000,
            input_sample_rate: 16000,
        }
    }
}

impl AppConfig {
    /// Create a configuration with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Build the configuration from the process environment.
    ///
    /// A `.env` file in the working directory is honoured. `GEMINI_API_KEY`
    /// (or `API_KEY`) is required; `MEDIZEN_DATA_DIR` and
    /// `MEDIZEN_EXPORT_DIR` override the default directories.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {:?}", path);
        }

        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .unwrap_or_default();

        let mut config = Self::new(api_key);

        if let Ok(dir) = std::env::var("MEDIZEN_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("MEDIZEN_EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }
        if let Ok(base) = std::env::var("MEDIZEN_API_BASE") {
            config.api_base = base;
        }

        config.validate()?;
        info!("Using data directory {:?}", config.data_dir);
        Ok(config)
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the export directory
    pub fn with_export_dir(mut self, export_dir: impl Into<PathBuf>) -> Self {
        self.export_dir = export_dir.into();
        self
    }

    /// Set the REST base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the quota retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the prebuilt voice
    pub fn with_voice(mut self, voice_name: impl Into<String>) -> Self {
        self.voice_name = voice_name.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(MediZenError::ConfigError("API_KEY_MISSING".to_string()));
        }

        if self.output_sample_rate == 0 || self.input_sample_rate == 0 {
            return Err(MediZenError::ConfigError(
                "Sample rates must be greater than 0".to_string(),
            ));
        }

        if !self.api_base.starts_with("http") {
            return Err(MediZenError::ConfigError(format!(
                "Invalid API base URL: {}",
                self.api_base
            )));
        }

        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medizen")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.retry.retries, 2);
        assert_eq!(config.output_sample_rate, 24000);
        assert_eq!(config.input_sample_rate, 16000);
        assert_eq!(config.voice_name, "Kore");
        assert!(config.data_dir.ends_with("medizen"));
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, MediZenError::ConfigError(ref m) if m == "API_KEY_MISSING"));
    }

    #[test]
    fn test_config_builder() {
        let config = AppConfig::new("key-123")
            .with_data_dir("/tmp/medizen-test")
            .with_voice("Puck");

        assert!(config.validate().is_ok());
        assert_eq!(config.data_dir, PathBuf::from("/tmp/medizen-test"));
        assert_eq!(config.voice_name, "Puck");
    }
}

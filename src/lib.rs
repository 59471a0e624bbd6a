pub mod audio;
pub mod config;
pub mod export;
pub mod features;
pub mod gateway;
pub mod live;
pub mod records;
pub mod store;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MediZenError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("AUTHENTICATION_FAILED")]
    AuthenticationFailed,

    #[error("QUOTA_EXCEEDED")]
    QuotaExceeded,

    #[error("Local storage is full: {0}")]
    StorageQuotaExceeded(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("State store has not been loaded")]
    NotLoaded,

    #[error("AI service error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed AI response: {0}")]
    ParseError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Voice session error: {0}")]
    SessionError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not enough points: need {needed}, have {available}")]
    InsufficientPoints { needed: u32, available: u32 },

    #[error("Already checked in on {0}")]
    AlreadyCheckedIn(chrono::NaiveDate),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<std::io::Error> for MediZenError {
    fn from(e: std::io::Error) -> Self {
        MediZenError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for MediZenError {
    fn from(e: serde_json::Error) -> Self {
        MediZenError::ParseError(e.to_string())
    }
}

impl MediZenError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Credentials and configuration need the user
            MediZenError::ConfigError(_) => false,
            MediZenError::AuthenticationFailed => false,
            MediZenError::QuotaExceeded => false,
            MediZenError::StorageQuotaExceeded(_) => false,
            MediZenError::StorageError(_) => false,
            MediZenError::NotLoaded => false,
            // Typically transient
            MediZenError::ApiError { .. } => true,
            MediZenError::ParseError(_) => true,
            MediZenError::AudioDeviceError(_) => false,
            MediZenError::AudioProcessingError(_) => true,
            MediZenError::IOError(_) => false,
            MediZenError::SessionError(_) => true,
            // Bad requests from the user can simply be retried with other input
            MediZenError::NotFound(_) => true,
            MediZenError::InsufficientPoints { .. } => true,
            MediZenError::AlreadyCheckedIn(_) => true,
            MediZenError::InvalidInput(_) => true,
        }
    }

    /// Whether the user should be prompted to replace the AI service key.
    ///
    /// Only AI-side authentication and quota failures qualify; a full local
    /// disk never does.
    pub fn needs_credential_replacement(&self) -> bool {
        matches!(
            self,
            MediZenError::AuthenticationFailed | MediZenError::QuotaExceeded
        )
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            MediZenError::ConfigError(_) => {
                "Configuration error. Set GEMINI_API_KEY and try again.".to_string()
            }
            MediZenError::AuthenticationFailed => {
                "The AI service rejected the API key. Please replace your key.".to_string()
            }
            MediZenError::QuotaExceeded => {
                "The AI service quota is exhausted. Please replace your key or wait.".to_string()
            }
            MediZenError::StorageQuotaExceeded(_) => {
                "Local storage is full. Free some disk space to keep saving records.".to_string()
            }
            MediZenError::StorageError(_) => "Could not save your health records.".to_string(),
            MediZenError::NotLoaded => "Records are still loading. Please try again.".to_string(),
            MediZenError::ApiError { .. } => "Analysis failed. Please try again.".to_string(),
            MediZenError::ParseError(_) => {
                "The AI service returned an unreadable answer. Please try again.".to_string()
            }
            MediZenError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            MediZenError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            MediZenError::IOError(_) => "File system error occurred.".to_string(),
            MediZenError::SessionError(_) => "The voice call dropped. Please call again.".to_string(),
            MediZenError::NotFound(what) => format!("Nothing found for {}.", what),
            MediZenError::InsufficientPoints { needed, available } => format!(
                "Not enough Medi Points! This needs {} and you have {}.",
                needed, available
            ),
            MediZenError::AlreadyCheckedIn(_) => {
                "You already checked in today. Come back tomorrow.".to_string()
            }
            MediZenError::InvalidInput(reason) => format!("Invalid input: {}.", reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, MediZenError>;

pub mod client;
pub mod prompts;
pub mod retry;
pub mod schema;
pub mod service;
pub mod wire;

pub use client::{GeminiClient, GenerativeModel};
pub use retry::{classify, with_retry, Backoff, FailureKind, JitteredBackoff, RecordingBackoff};
pub use service::{
    AiGateway, ClinicLocation, ClinicSearch, DiagnosisRequest, ForecastRisk, HealthForecast,
    HealthMetrics, MedicineDraft, SpeechClip, WellnessAnalysis, WellnessFindings,
};
pub use wire::{Blob, GenerateContentRequest, GenerateContentResponse, LatLng};

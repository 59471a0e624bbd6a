//! Feature-level calls to the AI service
//!
//! Every call builds a request, runs it through [`with_retry`] and turns the
//! answer into a typed value. Malformed or empty answers are reported as
//! [`MediZenError::ParseError`] instead of being replaced by empty defaults.

use super::client::{GeminiClient, GenerativeModel};
use super::prompts;
use super::retry::{with_retry, Backoff, JitteredBackoff};
use super::schema;
use super::wire::{Blob, Content, GenerateContentRequest, GenerateContentResponse, LatLng, Part};
use crate::config::{AppConfig, ModelSet};
use crate::records::{
    ChatRole, ChatTurn, ConsultationMode, DailyLog, HealthReport, MonthlyPlan, ReportAnalysis,
    RiskCategory, UserProfile,
};
use crate::{MediZenError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Longest text sent to speech synthesis
pub const MAX_SPEECH_CHARS: usize = 500;

pub const NO_ROUTING_DETAILS: &str = "No additional clinical routing details provided.";

/// Vitals read out of a report; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub blood_pressure: Option<String>,
    pub blood_sugar: Option<f64>,
    pub stress_level: Option<f64>,
    pub hemoglobin: Option<f64>,
}

/// Input of a diagnosis request
#[derive(Debug, Clone)]
pub struct DiagnosisRequest {
    pub symptoms: String,
    pub mode: ConsultationMode,
    pub attachment: Option<Blob>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellnessFindings {
    pub depression: String,
    pub anxiety: String,
    pub ptsd: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessAnalysis {
    pub summary: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub findings: WellnessFindings,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl WellnessAnalysis {
    /// Category named by the model, `Normal` when missing or unknown
    pub fn risk_category(&self) -> RiskCategory {
        match self.category.as_deref().map(str::trim) {
            Some("Emergency") => RiskCategory::Emergency,
            Some("Medium Risk") => RiskCategory::MediumRisk,
            _ => RiskCategory::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastRisk {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthForecast {
    pub prediction: String,
    pub actions: Vec<String>,
    pub risk_level: ForecastRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicLocation {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClinicSearch {
    pub locations: Vec<ClinicLocation>,
    pub text: String,
}

/// Medicine as described by the model; missing fields are filled in by the pharmacy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicineDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub uses: Vec<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Synthesized speech as returned by the service
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechClip {
    /// Base64 16-bit little-endian PCM
    pub data: String,
    pub mime_type: String,
}

/// Entry point for every AI-backed feature
#[derive(Clone)]
pub struct AiGateway {
    client: Arc<dyn GenerativeModel>,
    models: ModelSet,
    voice_name: String,
    retries: u32,
    backoff: Arc<dyn Backoff>,
}

impl AiGateway {
    /// Gateway talking to the real service
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let client = Arc::new(GeminiClient::new(config)?);
        Ok(Self::with_client(client, config))
    }

    /// Gateway over any model implementation
    pub fn with_client(client: Arc<dyn GenerativeModel>, config: &AppConfig) -> Self {
        Self {
            client,
            models: config.models.clone(),
            voice_name: config.voice_name.clone(),
            retries: config.retry.retries,
            backoff: Arc::new(JitteredBackoff::from(&config.retry)),
        }
    }

    /// Replace the delay policy between quota retries
    pub fn with_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    async fn execute(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let client = self.client.as_ref();
        let request = &request;
        with_retry(
            move || client.generate(model, request),
            self.retries,
            self.backoff.as_ref(),
        )
        .await
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<T> {
        let response = self.execute(model, request).await?;
        parse_json(&response)
    }

    async fn execute_text(&self, model: &str, request: GenerateContentRequest) -> Result<String> {
        let response = self.execute(model, request).await?;
        response
            .text()
            .ok_or_else(|| MediZenError::ParseError("response contained no text".to_string()))
    }

    /// Pull vitals out of free text
    pub async fn extract_metrics(&self, text: &str) -> Result<HealthMetrics> {
        let request = GenerateContentRequest::prompt(prompts::extract_metrics(text))
            .with_json_schema(schema::metrics());
        self.execute_json(&self.models.text, request).await
    }

    /// Long-form clinical report for an analysis or assessment
    pub async fn formal_report<S: Serialize>(
        &self,
        findings: &S,
        profile: &UserProfile,
    ) -> Result<String> {
        let data = serde_json::to_string(findings)?;
        let request = GenerateContentRequest::prompt(prompts::formal_report(&profile.name, &data))
            .with_system(prompts::CLINICAL_SYSTEM_INSTRUCTION);
        self.execute_text(&self.models.reasoning, request).await
    }

    /// Diagnose from symptoms, optionally with an attached document or image
    pub async fn diagnose(
        &self,
        request: &DiagnosisRequest,
        profile: &UserProfile,
    ) -> Result<ReportAnalysis> {
        let mut parts = Vec::with_capacity(2);
        if let Some(blob) = &request.attachment {
            parts.push(Part::blob(blob.clone()));
        }
        parts.push(Part::text(prompts::diagnose(
            &profile.name,
            &request.symptoms,
            &request.mode.to_string(),
        )));

        let request = GenerateContentRequest::new(parts)
            .with_system(prompts::CLINICAL_SYSTEM_INSTRUCTION)
            .with_json_schema(schema::diagnosis());
        self.execute_json(&self.models.text, request).await
    }

    /// Analyze an uploaded medical document
    pub async fn analyze_report(&self, document: &Blob) -> Result<ReportAnalysis> {
        let request = GenerateContentRequest::new(vec![
            Part::blob(document.clone()),
            Part::text(prompts::ANALYZE_DOCUMENT_PROMPT),
        ])
        .with_system(prompts::CLINICAL_SYSTEM_INSTRUCTION)
        .with_json_schema(schema::diagnosis());
        self.execute_json(&self.models.text, request).await
    }

    /// Speak `text`, truncated to [`MAX_SPEECH_CHARS`]
    pub async fn synthesize_speech(&self, text: &str) -> Result<SpeechClip> {
        let truncated: String = text.chars().take(MAX_SPEECH_CHARS).collect();
        let request =
            GenerateContentRequest::prompt(truncated).with_audio_output(self.voice_name.clone());

        let response = self.execute(&self.models.speech, request).await?;
        let blob = response
            .inline_data()
            .ok_or_else(|| MediZenError::ParseError("response contained no audio".to_string()))?;

        debug!("Synthesized {} base64 bytes of {}", blob.data.len(), blob.mime_type);
        Ok(SpeechClip {
            data: blob.data.clone(),
            mime_type: blob.mime_type.clone(),
        })
    }

    /// Single-turn reply from the support bot
    pub async fn support_reply(&self, message: &str) -> Result<String> {
        let request = GenerateContentRequest::prompt(message)
            .with_system(prompts::SUPPORT_SYSTEM_INSTRUCTION);
        self.execute_text(&self.models.text, request).await
    }

    /// Continue a conversation about a report
    pub async fn consult_chat(&self, history: &[ChatTurn], message: &str) -> Result<String> {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| match turn.role {
                ChatRole::User => Content::user(vec![Part::text(turn.text.clone())]),
                ChatRole::Model => Content::model(turn.text.clone()),
            })
            .collect();
        contents.push(Content::user(vec![Part::text(message)]));

        let request = GenerateContentRequest {
            contents,
            ..Default::default()
        }
        .with_system(prompts::CLINICAL_SYSTEM_INSTRUCTION);
        self.execute_text(&self.models.text, request).await
    }

    /// 30-day protocol from recent history; `reports` and `logs` are most recent first
    pub async fn monthly_plan(
        &self,
        reports: &[HealthReport],
        logs: &[DailyLog],
        profile: &UserProfile,
    ) -> Result<MonthlyPlan> {
        let history = json!({
            "userMetrics": {
                "age": profile.age,
                "bp": profile.blood_pressure,
                "sugar": profile.blood_sugar,
                "stress": profile.stress_level,
            },
            "recentReports": reports
                .iter()
                .take(3)
                .map(|r| json!({"specialty": r.specialty, "summary": r.analysis.summary}))
                .collect::<Vec<_>>(),
            "recentLogs": logs.iter().take(5).collect::<Vec<_>>(),
        });

        let request = GenerateContentRequest::prompt(prompts::monthly_plan(&history.to_string()))
            .with_system(prompts::STRATEGIST_SYSTEM_INSTRUCTION)
            .with_json_schema(schema::monthly_plan());
        self.execute_json(&self.models.text, request).await
    }

    /// Interpret questionnaire scores
    pub async fn wellness_analysis<S: Serialize>(
        &self,
        scores: &S,
        profile: &UserProfile,
    ) -> Result<WellnessAnalysis> {
        let scores = serde_json::to_string(scores)?;
        let request = GenerateContentRequest::prompt(prompts::wellness(&profile.name, &scores))
            .with_system(prompts::PSYCHIATRIST_SYSTEM_INSTRUCTION)
            .with_json_schema(schema::wellness());
        self.execute_json(&self.models.text, request).await
    }

    pub async fn health_forecast(
        &self,
        logs: &[DailyLog],
        profile: &UserProfile,
    ) -> Result<HealthForecast> {
        let context = json!({"logs": logs, "user": profile});
        let request = GenerateContentRequest::prompt(prompts::forecast(&context.to_string()))
            .with_json_schema(schema::forecast());
        self.execute_json(&self.models.text, request).await
    }

    /// Maps-grounded search for clinics of a specialty
    pub async fn find_clinics(
        &self,
        specialty: &str,
        location: Option<LatLng>,
    ) -> Result<ClinicSearch> {
        let request =
            GenerateContentRequest::prompt(prompts::find_clinics(specialty)).with_maps(location);
        let response = self.execute(&self.models.maps, request).await?;

        let locations: Vec<ClinicLocation> = response
            .map_chunks()
            .into_iter()
            .map(|chunk| ClinicLocation {
                title: chunk.title.clone().unwrap_or_default(),
                uri: chunk.uri.clone().unwrap_or_default(),
            })
            .collect();

        info!("Found {} {} locations", locations.len(), specialty);
        Ok(ClinicSearch {
            locations,
            text: response
                .text()
                .unwrap_or_else(|| NO_ROUTING_DETAILS.to_string()),
        })
    }

    pub async fn identify_medicine(&self, name: &str) -> Result<MedicineDraft> {
        let request = GenerateContentRequest::prompt(prompts::identify_medicine(name))
            .with_json_schema(schema::medicine());
        self.execute_json(&self.models.text, request).await
    }

    pub async fn suggest_medicines(&self, query: &str) -> Result<Vec<MedicineDraft>> {
        let request = GenerateContentRequest::prompt(prompts::suggest_medicines(query))
            .with_json_schema(schema::medicine_list());
        self.execute_json(&self.models.text, request).await
    }

    /// Identify a product from a photo
    pub async fn analyze_medicine_image(&self, image: &Blob) -> Result<MedicineDraft> {
        let request = GenerateContentRequest::new(vec![
            Part::blob(image.clone()),
            Part::text(prompts::MEDICINE_IMAGE_PROMPT),
        ])
        .with_json_schema(schema::medicine());
        self.execute_json(&self.models.text, request).await
    }

    /// Every medication mentioned in a clinical document
    pub async fn extract_medicines_from_report(
        &self,
        document: &Blob,
    ) -> Result<Vec<MedicineDraft>> {
        let request = GenerateContentRequest::new(vec![
            Part::blob(document.clone()),
            Part::text(prompts::EXTRACT_MEDICINES_PROMPT),
        ])
        .with_json_schema(schema::medicine_list());
        self.execute_json(&self.models.text, request).await
    }
}

/// Parse the JSON text of a response, tolerating a Markdown code fence
pub fn parse_json<T: DeserializeOwned>(response: &GenerateContentResponse) -> Result<T> {
    let text = response
        .text()
        .ok_or_else(|| MediZenError::ParseError("response contained no text".to_string()))?;
    serde_json::from_str(strip_code_fence(&text))
        .map_err(|e| MediZenError::ParseError(format!("{}: {}", e, preview(&text))))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_accepts_fenced_output() {
        let response = GenerateContentResponse::from_text("```json\n{\"bloodSugar\": 110}\n```");
        let metrics: HealthMetrics = parse_json(&response).unwrap();
        assert_eq!(metrics.blood_sugar, Some(110.0));
        assert_eq!(metrics.blood_pressure, None);
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let response = GenerateContentResponse::from_text("I cannot help with that");
        let result: Result<HealthMetrics> = parse_json(&response);
        assert!(matches!(result, Err(MediZenError::ParseError(_))));
    }

    #[test]
    fn test_empty_response_is_a_parse_error() {
        let result: Result<Vec<MedicineDraft>> = parse_json(&GenerateContentResponse::default());
        assert!(matches!(result, Err(MediZenError::ParseError(_))));
    }

    #[test]
    fn test_unknown_wellness_category_defaults_to_normal() {
        let analysis: WellnessAnalysis = serde_json::from_str(
            r#"{"summary":"ok","category":"Unclear","recommendations":["Sleep"]}"#,
        )
        .unwrap();
        assert_eq!(analysis.risk_category(), RiskCategory::Normal);

        let urgent: WellnessAnalysis =
            serde_json::from_str(r#"{"summary":"x","category":"Emergency"}"#).unwrap();
        assert_eq!(urgent.risk_category(), RiskCategory::Emergency);
    }

    #[test]
    fn test_medicine_draft_reads_type_field() {
        let draft: MedicineDraft =
            serde_json::from_str(r#"{"name":"Paracetamol","type":"Analgesic"}"#).unwrap();
        assert_eq!(draft.kind.as_deref(), Some("Analgesic"));
        assert!(draft.price.is_none());
    }
}

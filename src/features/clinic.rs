//! Diagnosis, report upload and follow-up on stored reports

use super::{Companion, CONSULTATION_POINTS};
use crate::export::clean_report_text;
use crate::gateway::{Blob, DiagnosisRequest, HealthMetrics, SpeechClip};
use crate::records::{
    ChatTurn, Consultation, ConsultationMode, HealthReport, ProfilePatch, ReportAnalysis,
    UserProfile,
};
use crate::{MediZenError, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Filename recorded for consultations without an attachment
pub const DEFAULT_REPORT_NAME: &str = "Clinical Checkup";

/// A document or image handed in with a consultation
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub blob: Blob,
}

impl Attachment {
    pub fn from_path(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_REPORT_NAME)
            .to_string();
        Ok(Self {
            filename,
            blob: Blob::from_file(path)?,
        })
    }
}

/// What the user hands in for a diagnosis
#[derive(Debug, Clone)]
pub struct Intake {
    pub mode: ConsultationMode,
    pub symptoms: String,
    pub duration: Option<String>,
    /// `None` lets the model pick the specialty
    pub specialty_preference: Option<String>,
    pub attachment: Option<Attachment>,
}

impl Intake {
    pub fn symptoms(symptoms: impl Into<String>) -> Self {
        Self {
            mode: ConsultationMode::Symptoms,
            symptoms: symptoms.into(),
            duration: None,
            specialty_preference: None,
            attachment: None,
        }
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    fn validate(&self) -> Result<()> {
        match self.mode {
            ConsultationMode::Symptoms if self.symptoms.trim().is_empty() => Err(
                MediZenError::InvalidInput("describe your symptoms first".into()),
            ),
            ConsultationMode::Report if self.attachment.is_none() => Err(
                MediZenError::InvalidInput("a report file is required".into()),
            ),
            _ => Ok(()),
        }
    }

    /// Symptom text with duration and preferred specialty folded in
    fn described_symptoms(&self) -> String {
        let mut text = self.symptoms.trim().to_string();
        if let Some(duration) = &self.duration {
            text.push_str(&format!(" (for {})", duration));
        }
        if let Some(specialty) = &self.specialty_preference {
            text.push_str(&format!(". Preferred specialty: {}", specialty));
        }
        text
    }
}

/// Everything a finished consultation wrote to the store
#[derive(Debug, Clone)]
pub struct ConsultationOutcome {
    pub report: HealthReport,
    pub consultation: Consultation,
    pub profile: UserProfile,
}

/// Profile patch carrying whatever vitals the model found
pub fn metrics_patch(metrics: &HealthMetrics) -> ProfilePatch {
    let mut patch = ProfilePatch::default();
    if let Some(bp) = metrics.blood_pressure.as_deref().filter(|v| !v.trim().is_empty()) {
        patch = patch.blood_pressure(bp.trim());
    }
    if let Some(sugar) = metrics.blood_sugar.filter(|v| *v > 0.0) {
        patch = patch.blood_sugar(sugar);
    }
    if let Some(stress) = metrics.stress_level.filter(|v| *v > 0.0) {
        patch = patch.stress_level(stress.round().clamp(1.0, 10.0) as u8);
    }
    if let Some(hb) = metrics.hemoglobin.filter(|v| *v > 0.0) {
        patch = patch.hemoglobin(hb);
    }
    patch
}

impl Companion {
    /// Run a diagnosis and file it as a consultation plus a report
    pub async fn diagnose(&self, intake: Intake) -> Result<ConsultationOutcome> {
        intake.validate()?;
        let profile = self.store.profile();

        let request = DiagnosisRequest {
            symptoms: intake.described_symptoms(),
            mode: intake.mode,
            attachment: intake.attachment.as_ref().map(|a| a.blob.clone()),
        };
        let analysis = self.gateway.diagnose(&request, &profile).await?;

        let symptoms = Some(intake.symptoms.clone()).filter(|s| !s.trim().is_empty());
        let filename = intake
            .attachment
            .map(|a| a.filename)
            .unwrap_or_else(|| DEFAULT_REPORT_NAME.to_string());
        self.record_analysis(intake.mode, symptoms, intake.duration, filename, analysis)
    }

    /// Analyze an uploaded medical document
    pub async fn upload_report(&self, path: &Path) -> Result<ConsultationOutcome> {
        let attachment = Attachment::from_path(path)?;
        let analysis = self.gateway.analyze_report(&attachment.blob).await?;
        self.record_analysis(
            ConsultationMode::Report,
            None,
            None,
            attachment.filename,
            analysis,
        )
    }

    fn record_analysis(
        &self,
        mode: ConsultationMode,
        symptoms: Option<String>,
        duration: Option<String>,
        filename: String,
        analysis: ReportAnalysis,
    ) -> Result<ConsultationOutcome> {
        let consultation = Consultation::from_analysis(mode, symptoms, duration, &analysis);
        let mut report = HealthReport::new(filename, analysis);
        report.date = consultation.date;

        let outcome = self.store.mutate(|data| {
            data.consultations.insert(0, consultation.clone());
            data.reports.insert(0, report.clone());
            data.profile.medi_points += CONSULTATION_POINTS;
            Ok(ConsultationOutcome {
                report,
                consultation,
                profile: data.profile.clone(),
            })
        })?;

        info!(
            "Filed {} consultation {} ({})",
            mode, outcome.consultation.id, outcome.consultation.specialty
        );
        Ok(outcome)
    }

    fn require_report(&self, report_id: &str) -> Result<HealthReport> {
        self.store
            .find_report(report_id)
            .ok_or_else(|| MediZenError::NotFound(format!("report {}", report_id)))
    }

    /// Write up a formal clinical report and keep it on the stored report
    pub async fn generate_formal_report(&self, report_id: &str) -> Result<HealthReport> {
        let mut report = self.require_report(report_id)?;
        let profile = self.store.profile();

        let text = self.gateway.formal_report(&report.analysis, &profile).await?;
        report.formal_report_text = Some(clean_report_text(&text));
        self.store.replace_report(report.clone())?;
        Ok(report)
    }

    /// Save a report's formal text as a plain-text file
    pub fn export_formal_report(&self, report_id: &str) -> Result<PathBuf> {
        let report = self.require_report(report_id)?;
        let text = report.formal_report_text.ok_or_else(|| {
            MediZenError::InvalidInput("generate the formal report first".into())
        })?;
        self.export("Clinical_Report", &text)
    }

    /// Ask the consultant about a stored report; the exchange is kept on the report
    pub async fn chat_about_report(&self, report_id: &str, message: &str) -> Result<String> {
        if message.trim().is_empty() {
            return Err(MediZenError::InvalidInput("empty message".into()));
        }
        let mut report = self.require_report(report_id)?;

        let reply = self
            .gateway
            .consult_chat(&report.chat_history, message)
            .await?;

        report.chat_history.push(ChatTurn::user(message));
        report.chat_history.push(ChatTurn::model(reply.clone()));
        self.store.replace_report(report)?;
        Ok(reply)
    }

    /// Copy the vitals found in the most recent report into the profile
    pub async fn sync_metrics_from_latest_report(&self) -> Result<UserProfile> {
        let latest = self
            .store
            .reports()
            .into_iter()
            .next()
            .ok_or_else(|| MediZenError::NotFound("medical reports".into()))?;

        let metrics = self
            .gateway
            .extract_metrics(&latest.analysis.summary)
            .await?;
        self.store.update_profile(&metrics_patch(&metrics))
    }

    /// Spoken version of a report's analysis
    pub async fn speak_report(&self, report_id: &str) -> Result<SpeechClip> {
        let report = self.require_report(report_id)?;
        self.gateway
            .synthesize_speech(report.analysis.speech_text())
            .await
    }
}

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

/// Structured result of a diagnosis or document analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAnalysis {
    pub summary: String,
    pub recommendations: Vec<String>,
    pub medications: Vec<String>,
    pub specialty: String,
    pub full_speech_text: String,
}

impl ReportAnalysis {
    /// Text to read aloud, falling back to the summary
    pub fn speech_text(&self) -> &str {
        if self.full_speech_text.trim().is_empty() {
            &self.summary
        } else {
            &self.full_speech_text
        }
    }

    /// Specialty with the "General" fallback used for empty answers
    pub fn specialty_or_general(&self) -> String {
        if self.specialty.trim().is_empty() {
            "General".to_string()
        } else {
            self.specialty.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub id: String,
    pub date: DateTime<Utc>,
    pub filename: String,
    pub specialty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formal_report_text: Option<String>,
    pub analysis: ReportAnalysis,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
}

impl HealthReport {
    pub fn new(filename: impl Into<String>, analysis: ReportAnalysis) -> Self {
        Self {
            id: new_id("rep"),
            date: Utc::now(),
            filename: filename.into(),
            specialty: analysis.specialty_or_general(),
            formal_report_text: None,
            analysis,
            chat_history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationMode {
    Symptoms,
    Report,
}

impl std::fmt::Display for ConsultationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsultationMode::Symptoms => write!(f, "symptoms"),
            ConsultationMode::Report => write!(f, "report"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: String,
    pub date: DateTime<Utc>,
    pub mode: ConsultationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub specialty: String,
    pub problem: String,
    pub instructions: String,
    pub medicines: Vec<String>,
    pub is_clean_health: bool,
}

impl Consultation {
    /// Build the consultation record for a finished analysis
    pub fn from_analysis(
        mode: ConsultationMode,
        symptoms: Option<String>,
        duration: Option<String>,
        analysis: &ReportAnalysis,
    ) -> Self {
        Self {
            id: new_id("cons"),
            date: Utc::now(),
            mode,
            symptoms,
            duration,
            specialty: analysis.specialty_or_general(),
            problem: analysis.summary.clone(),
            instructions: analysis.full_speech_text.clone(),
            medicines: analysis.medications.clone(),
            is_clean_health: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub clinic_name: String,
    pub specialty: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn scheduled(
        clinic_name: impl Into<String>,
        specialty: impl Into<String>,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Self {
        Self {
            id: new_id("appt"),
            clinic_name: clinic_name.into(),
            specialty: specialty.into(),
            date,
            time,
            status: AppointmentStatus::Scheduled,
        }
    }
}

/// Self-reported vitals for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub date: NaiveDate,
    pub blood_pressure: String,
    pub blood_sugar: f64,
    pub stress_level: u8,
    pub hemoglobin: f64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentType {
    #[serde(rename = "PHQ9")]
    Phq9,
    #[serde(rename = "GAD7")]
    Gad7,
    #[serde(rename = "PCPTSD5")]
    PcPtsd5,
    #[serde(rename = "ULTIMATE_CHECK")]
    UltimateCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RiskCategory {
    #[default]
    Normal,
    #[serde(rename = "Medium Risk")]
    MediumRisk,
    Emergency,
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskCategory::Normal => write!(f, "Normal"),
            RiskCategory::MediumRisk => write!(f, "Medium Risk"),
            RiskCategory::Emergency => write!(f, "Emergency"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetailedScores {
    pub depression: u32,
    pub anxiety: u32,
    pub ptsd: u32,
}

impl DetailedScores {
    pub fn total(&self) -> u32 {
        self.depression + self.anxiety + self.ptsd
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AssessmentType,
    pub date: DateTime<Utc>,
    pub score: u32,
    pub category: RiskCategory,
    pub strategies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_scores: Option<DetailedScores>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPhase {
    pub phase: String,
    pub days: String,
    pub focus: String,
    pub activities: Vec<String>,
}

/// 30-day health protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPlan {
    pub title: String,
    pub diet_strategy: String,
    pub phases: Vec<PlanPhase>,
    pub do_list: Vec<String>,
    pub dont_list: Vec<String>,
    pub precautions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub uses: Vec<String>,
    pub dosage: String,
    pub price: f64,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(specialty: &str) -> ReportAnalysis {
        ReportAnalysis {
            summary: "Mild hypertension".to_string(),
            recommendations: vec!["Reduce salt".to_string()],
            medications: vec!["Amlodipine".to_string()],
            specialty: specialty.to_string(),
            full_speech_text: String::new(),
        }
    }

    #[test]
    fn test_report_uses_storage_field_names() {
        let report = HealthReport::new("scan.pdf", analysis("Cardiologist"));
        let value = serde_json::to_value(&report).unwrap();

        assert!(value.get("chatHistory").is_some());
        assert!(value["analysis"].get("fullSpeechText").is_some());
        assert!(value.get("formalReportText").is_none());
    }

    #[test]
    fn test_empty_specialty_falls_back_to_general() {
        let consultation =
            Consultation::from_analysis(ConsultationMode::Symptoms, None, None, &analysis(" "));
        assert_eq!(consultation.specialty, "General");
        assert_eq!(consultation.medicines, vec!["Amlodipine".to_string()]);
    }

    #[test]
    fn test_speech_text_falls_back_to_summary() {
        assert_eq!(analysis("General").speech_text(), "Mild hypertension");
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&RiskCategory::MediumRisk).unwrap(),
            "\"Medium Risk\""
        );
        assert_eq!(
            serde_json::to_string(&AssessmentType::UltimateCheck).unwrap(),
            "\"ULTIMATE_CHECK\""
        );
        assert_eq!(
            serde_json::to_string(&ConsultationMode::Report).unwrap(),
            "\"report\""
        );
    }
}

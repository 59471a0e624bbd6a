//! Dashboard series, forecast and the history archive

use super::Companion;
use crate::gateway::HealthForecast;
use crate::records::{
    Appointment, AssessmentResult, AssessmentType, Consultation, DailyLog, HealthReport,
};
use crate::store::AppData;
use crate::{MediZenError, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Daily logs needed before a forecast is worth asking for
pub const FORECAST_MIN_LOGS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPoint {
    pub date: NaiveDate,
    pub sugar: f64,
    pub stress: u8,
    pub hemoglobin: f64,
}

/// Chart series from newest-first logs, returned oldest first
pub fn metric_series(logs: &[DailyLog]) -> Vec<MetricPoint> {
    logs.iter()
        .rev()
        .map(|log| MetricPoint {
            date: log.date,
            sugar: log.blood_sugar,
            stress: log.stress_level,
            hemoglobin: log.hemoglobin,
        })
        .collect()
}

/// Text an archive entry is searched by
pub trait Searchable {
    fn search_labels(&self) -> Vec<&str>;

    /// True when any label contains `query`, ignoring case
    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.search_labels()
            .iter()
            .any(|label| label.to_lowercase().contains(&query))
    }
}

impl Searchable for HealthReport {
    fn search_labels(&self) -> Vec<&str> {
        vec![self.filename.as_str(), self.specialty.as_str()]
    }
}

impl Searchable for Appointment {
    fn search_labels(&self) -> Vec<&str> {
        vec![self.clinic_name.as_str()]
    }
}

impl Searchable for Consultation {
    fn search_labels(&self) -> Vec<&str> {
        vec![self.problem.as_str()]
    }
}

impl Searchable for AssessmentResult {
    fn search_labels(&self) -> Vec<&str> {
        let label = match self.kind {
            AssessmentType::Phq9 => "PHQ9",
            AssessmentType::Gad7 => "GAD7",
            AssessmentType::PcPtsd5 => "PCPTSD5",
            AssessmentType::UltimateCheck => "ULTIMATE_CHECK",
        };
        vec![label]
    }
}

fn filter<T: Searchable + Clone>(items: &[T], query: &str) -> Vec<T> {
    items.iter().filter(|i| i.matches(query)).cloned().collect()
}

/// Archive entries matching a query, newest first within each kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveResults {
    pub reports: Vec<HealthReport>,
    pub appointments: Vec<Appointment>,
    pub consultations: Vec<Consultation>,
    pub assessments: Vec<AssessmentResult>,
}

impl ArchiveResults {
    /// Case-insensitive substring search; an empty query matches everything
    pub fn search(data: &AppData, query: &str) -> Self {
        let query = query.trim();
        Self {
            reports: filter(&data.reports, query),
            appointments: filter(&data.appointments, query),
            consultations: filter(&data.consultations, query),
            assessments: filter(&data.assessments, query),
        }
    }

    pub fn len(&self) -> usize {
        self.reports.len() + self.appointments.len() + self.consultations.len() + self.assessments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Companion {
    pub fn metric_series(&self) -> Vec<MetricPoint> {
        metric_series(&self.store.daily_logs())
    }

    pub fn search_archive(&self, query: &str) -> ArchiveResults {
        ArchiveResults::search(&self.store.snapshot(), query)
    }

    /// Outlook from the logged vitals
    pub async fn forecast(&self) -> Result<HealthForecast> {
        let logs = self.store.daily_logs();
        if logs.len() < FORECAST_MIN_LOGS {
            return Err(MediZenError::InvalidInput(format!(
                "a forecast needs {} check-ins, found {}",
                FORECAST_MIN_LOGS,
                logs.len()
            )));
        }
        let profile = self.store.profile();
        self.gateway.health_forecast(&logs, &profile).await
    }

    /// Save an archived report's formal text
    pub fn export_record(&self, report_id: &str) -> Result<PathBuf> {
        let report = self
            .store
            .find_report(report_id)
            .ok_or_else(|| MediZenError::NotFound(format!("report {}", report_id)))?;
        let text = report.formal_report_text.ok_or_else(|| {
            MediZenError::InvalidInput("this record has no formal report".into())
        })?;
        self.export("Record", &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ConsultationMode, ReportAnalysis};
    use chrono::NaiveTime;

    fn log(day: u32, sugar: f64) -> DailyLog {
        DailyLog {
            date: NaiveDate::from_ymd_opt(2026, 4, day).unwrap(),
            blood_pressure: "120/80".into(),
            blood_sugar: sugar,
            stress_level: day as u8,
            hemoglobin: 13.0,
            notes: String::new(),
        }
    }

    #[test]
    fn test_series_is_oldest_first() {
        let logs = vec![log(3, 110.0), log(2, 100.0), log(1, 90.0)];
        let series = metric_series(&logs);
        let sugars: Vec<f64> = series.iter().map(|p| p.sugar).collect();
        assert_eq!(sugars, vec![90.0, 100.0, 110.0]);
        assert_eq!(series[0].stress, 1);
    }

    #[test]
    fn test_archive_search_is_case_insensitive() {
        let analysis = ReportAnalysis {
            summary: "Arrhythmia".into(),
            recommendations: vec![],
            medications: vec![],
            specialty: "Cardiologist".into(),
            full_speech_text: String::new(),
        };
        let data = AppData {
            reports: vec![
                HealthReport::new("ECG_March.pdf", analysis.clone()),
                HealthReport::new("blood_panel.png", analysis.clone()),
            ],
            appointments: vec![Appointment::scheduled(
                "City Heart Clinic",
                "Cardiologist",
                NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            )],
            consultations: vec![Consultation::from_analysis(
                ConsultationMode::Symptoms,
                None,
                None,
                &analysis,
            )],
            ..Default::default()
        };

        let results = ArchiveResults::search(&data, "ecg");
        assert_eq!(results.reports.len(), 1);
        assert!(results.appointments.is_empty());

        assert_eq!(ArchiveResults::search(&data, "HEART").appointments.len(), 1);
        assert_eq!(ArchiveResults::search(&data, "arrhythmia").consultations.len(), 1);
        assert_eq!(ArchiveResults::search(&data, "").len(), 4);
    }

    #[test]
    fn test_reports_match_on_specialty() {
        let analysis = |specialty: &str| ReportAnalysis {
            summary: "Routine follow-up".into(),
            recommendations: vec![],
            medications: vec![],
            specialty: specialty.into(),
            full_speech_text: String::new(),
        };
        let data = AppData {
            reports: vec![
                HealthReport::new("scan_01.pdf", analysis("Cardiologist")),
                HealthReport::new("scan_02.pdf", analysis("Dermatologist")),
            ],
            ..Default::default()
        };

        let results = ArchiveResults::search(&data, "cardio");
        assert_eq!(results.reports.len(), 1);
        assert_eq!(results.reports[0].filename, "scan_01.pdf");
        assert_eq!(ArchiveResults::search(&data, "scan").reports.len(), 2);
    }
}

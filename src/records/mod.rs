pub mod profile;
pub mod types;

pub use profile::{apply_patch, initial_profile, ProfilePatch, UserProfile};
pub use types::{
    Appointment, AppointmentStatus, AssessmentResult, AssessmentType, ChatRole, ChatTurn,
    Consultation, ConsultationMode, DailyLog, DetailedScores, HealthReport, Medicine, MonthlyPlan,
    PlanPhase, ReportAnalysis, RiskCategory,
};

use uuid::Uuid;

/// Generate a record id such as `rep_1f0c…`
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_prefixed_and_unique() {
        let a = new_id("rep");
        let b = new_id("rep");
        assert!(a.starts_with("rep_"));
        assert_ne!(a, b);
    }
}

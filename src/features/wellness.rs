//! Combined PHQ-9, GAD-7 and PC-PTSD-5 questionnaire

use super::Companion;
use crate::gateway::WellnessAnalysis;
use crate::records::{new_id, AssessmentResult, AssessmentType, DetailedScores};
use crate::{MediZenError, Result};
use chrono::Utc;
use std::ops::Range;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub section: &'static str,
    pub text: &'static str,
    pub kind: AssessmentType,
}

const fn q(section: &'static str, text: &'static str, kind: AssessmentType) -> Question {
    Question {
        section,
        text,
        kind,
    }
}

pub const QUESTIONS: [Question; 21] = [
    q("Cognitive Health", "Little interest or pleasure in doing things?", AssessmentType::Phq9),
    q("Cognitive Health", "Feeling down, depressed, or hopeless?", AssessmentType::Phq9),
    q("Rest Cycles", "Trouble falling or staying asleep, or sleeping too much?", AssessmentType::Phq9),
    q("Rest Cycles", "Feeling tired or having little energy?", AssessmentType::Phq9),
    q("Metabolic Signals", "Poor appetite or overeating?", AssessmentType::Phq9),
    q("Self-Perception", "Feeling bad about yourself, or that you are a failure?", AssessmentType::Phq9),
    q("Neural Focus", "Trouble concentrating on things, such as reading the newspaper?", AssessmentType::Phq9),
    q("Motor Stability", "Moving or speaking so slowly that other people could have noticed?", AssessmentType::Phq9),
    q("Vital Safety", "Thoughts that you would be better off dead, or of hurting yourself?", AssessmentType::Phq9),
    q("Amygdala Response", "Feeling nervous, anxious, or on edge?", AssessmentType::Gad7),
    q("Amygdala Response", "Not being able to stop or control worrying?", AssessmentType::Gad7),
    q("Neural Feedback", "Worrying too much about different things?", AssessmentType::Gad7),
    q("Neural Feedback", "Trouble relaxing?", AssessmentType::Gad7),
    q("Somatic Output", "Being so restless that it is hard to sit still?", AssessmentType::Gad7),
    q("Threshold Status", "Becoming easily annoyed or irritable?", AssessmentType::Gad7),
    q("Anticipatory State", "Feeling afraid, as if something awful might happen?", AssessmentType::Gad7),
    q("Memory Index", "Have you had nightmares about a stressful experience?", AssessmentType::PcPtsd5),
    q("Memory Index", "Tried hard not to think about a stressful experience?", AssessmentType::PcPtsd5),
    q("Arousal Modulation", "Been constantly on guard, watchful, or easily startled?", AssessmentType::PcPtsd5),
    q("Social Integration", "Felt numb or detached from people, activities, or your surroundings?", AssessmentType::PcPtsd5),
    q("Cognitive Bias", "Felt guilty or unable to stop blaming yourself for a stressful experience?", AssessmentType::PcPtsd5),
];

/// Answer labels, indexed by their score
pub const ANSWER_OPTIONS: [&str; 4] = [
    "Not at all",
    "Several days",
    "More than half the days",
    "Nearly every day",
];

const DEPRESSION_ITEMS: Range<usize> = 0..9;
const ANXIETY_ITEMS: Range<usize> = 9..16;
const PTSD_ITEMS: Range<usize> = 16..21;

/// Score a complete set of answers.
///
/// Depression and anxiety are sums over their items; PTSD counts items
/// answered 2 or higher.
pub fn score_answers(answers: &[u8]) -> Result<DetailedScores> {
    if answers.len() != QUESTIONS.len() {
        return Err(MediZenError::InvalidInput(format!(
            "expected {} answers, got {}",
            QUESTIONS.len(),
            answers.len()
        )));
    }
    if let Some(bad) = answers.iter().find(|&&a| a as usize >= ANSWER_OPTIONS.len()) {
        return Err(MediZenError::InvalidInput(format!(
            "answer {} is outside 0-3",
            bad
        )));
    }

    let sum = |range: Range<usize>| -> u32 { answers[range].iter().map(|&a| a as u32).sum() };
    Ok(DetailedScores {
        depression: sum(DEPRESSION_ITEMS),
        anxiety: sum(ANXIETY_ITEMS),
        ptsd: answers[PTSD_ITEMS].iter().filter(|&&a| a >= 2).count() as u32,
    })
}

/// Stored result for scores and the model's reading of them
pub fn assessment_from(scores: DetailedScores, analysis: &WellnessAnalysis) -> AssessmentResult {
    AssessmentResult {
        id: new_id("well"),
        kind: AssessmentType::UltimateCheck,
        date: Utc::now(),
        score: scores.total(),
        category: analysis.risk_category(),
        strategies: analysis.recommendations.clone(),
        ai_analysis: Some(analysis.summary.clone()).filter(|s| !s.is_empty()),
        detailed_scores: Some(scores),
    }
}

impl Companion {
    /// Score the questionnaire, have it analyzed and store the result
    pub async fn complete_wellness_check(
        &self,
        answers: &[u8],
    ) -> Result<(AssessmentResult, WellnessAnalysis)> {
        let scores = score_answers(answers)?;
        let profile = self.store.profile();

        let analysis = self.gateway.wellness_analysis(&scores, &profile).await?;
        let result = assessment_from(scores, &analysis);
        self.store.add_assessment(result.clone())?;

        info!("Wellness check scored {} ({})", result.score, result.category);
        Ok((result, analysis))
    }

    /// Formal write-up of a stored assessment, saved as a text file
    pub async fn export_wellness_report(&self, assessment_id: &str) -> Result<PathBuf> {
        let assessment = self
            .store
            .assessments()
            .into_iter()
            .find(|a| a.id == assessment_id)
            .ok_or_else(|| MediZenError::NotFound(format!("assessment {}", assessment_id)))?;

        let profile = self.store.profile();
        let text = self.gateway.formal_report(&assessment, &profile).await?;
        self.export(
            "Wellness_Report",
            &crate::export::clean_report_text(&text),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RiskCategory;

    #[test]
    fn test_all_zero_answers() {
        let scores = score_answers(&[0; 21]).unwrap();
        assert_eq!(
            (scores.depression, scores.anxiety, scores.ptsd),
            (0, 0, 0)
        );
    }

    #[test]
    fn test_ranges_and_threshold() {
        let mut answers = [0u8; 21];
        answers[0] = 3;
        answers[8] = 2;
        answers[9] = 1;
        answers[15] = 3;
        answers[16] = 1;
        answers[17] = 2;
        answers[20] = 3;

        let scores = score_answers(&answers).unwrap();
        assert_eq!(scores.depression, 5);
        assert_eq!(scores.anxiety, 4);
        assert_eq!(scores.ptsd, 2);
        assert_eq!(scores.total(), 11);
    }

    #[test]
    fn test_bad_answers_are_rejected() {
        assert!(score_answers(&[0; 20]).is_err());
        let mut answers = [0u8; 21];
        answers[3] = 4;
        assert!(score_answers(&answers).is_err());
    }

    #[test]
    fn test_question_layout() {
        let count = |kind| QUESTIONS.iter().filter(|q| q.kind == kind).count();
        assert_eq!(count(AssessmentType::Phq9), DEPRESSION_ITEMS.len());
        assert_eq!(count(AssessmentType::Gad7), ANXIETY_ITEMS.len());
        assert_eq!(count(AssessmentType::PcPtsd5), PTSD_ITEMS.len());
    }

    #[test]
    fn test_assessment_from_analysis() {
        let analysis = WellnessAnalysis {
            summary: "Mild anxiety".into(),
            category: None,
            findings: Default::default(),
            recommendations: vec!["Breathing exercises".into()],
        };
        let scores = DetailedScores {
            depression: 2,
            anxiety: 6,
            ptsd: 1,
        };

        let result = assessment_from(scores, &analysis);
        assert_eq!(result.kind, AssessmentType::UltimateCheck);
        assert_eq!(result.score, 9);
        assert_eq!(result.category, RiskCategory::Normal);
        assert_eq!(result.strategies, vec!["Breathing exercises".to_string()]);
        assert!(result.id.starts_with("well_"));
    }
}

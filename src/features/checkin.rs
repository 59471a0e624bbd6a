use super::{Companion, CHECK_IN_POINTS};
use crate::records::{apply_patch, DailyLog, ProfilePatch, UserProfile};
use crate::{MediZenError, Result};
use tracing::info;

/// Profile change for a check-in on `log.date`
pub fn check_in_patch(profile: &UserProfile, log: &DailyLog) -> ProfilePatch {
    let streak = profile.streak + 1;
    ProfilePatch {
        medi_points: Some(profile.medi_points + CHECK_IN_POINTS),
        last_check_in: Some(log.date),
        streak: Some(streak),
        max_streak: Some(profile.max_streak.max(streak)),
        ..Default::default()
    }
}

fn validate(log: &DailyLog) -> Result<()> {
    if !(1..=10).contains(&log.stress_level) {
        return Err(MediZenError::InvalidInput(format!(
            "stress level {} is outside 1-10",
            log.stress_level
        )));
    }
    if log.blood_sugar < 0.0 || log.hemoglobin < 0.0 {
        return Err(MediZenError::InvalidInput("vitals cannot be negative".into()));
    }
    Ok(())
}

impl Companion {
    /// Record today's vitals. One check-in per calendar day.
    pub fn check_in(&self, log: DailyLog) -> Result<UserProfile> {
        validate(&log)?;

        let profile = self.store.mutate(|data| {
            if data.profile.last_check_in == Some(log.date) {
                return Err(MediZenError::AlreadyCheckedIn(log.date));
            }
            let patch = check_in_patch(&data.profile, &log);
            data.profile = apply_patch(&data.profile, &patch);
            data.daily_logs.insert(0, log);
            Ok(data.profile.clone())
        })?;

        info!(
            "Checked in, {} points, streak {}",
            profile.medi_points, profile.streak
        );
        Ok(profile)
    }
}

use super::Companion;
use crate::records::MonthlyPlan;
use crate::Result;
use tracing::info;

/// Reports considered when drafting a plan
pub const PLAN_REPORTS: usize = 3;

/// Daily logs considered when drafting a plan
pub const PLAN_LOGS: usize = 5;

impl Companion {
    /// Draft a 30-day protocol from recent history and keep it as the current plan
    pub async fn generate_monthly_plan(&self) -> Result<MonthlyPlan> {
        let data = self.store.snapshot();
        let reports = &data.reports[..data.reports.len().min(PLAN_REPORTS)];
        let logs = &data.daily_logs[..data.daily_logs.len().min(PLAN_LOGS)];

        let plan = self
            .gateway
            .monthly_plan(reports, logs, &data.profile)
            .await?;
        self.store.save_plan(&plan)?;

        info!("Saved plan \"{}\" ({} phases)", plan.title, plan.phases.len());
        Ok(plan)
    }

    /// The last saved plan, if any
    pub fn current_plan(&self) -> Option<MonthlyPlan> {
        self.store.load_plan()
    }
}

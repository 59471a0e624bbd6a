//! The persistent state store
//!
//! Owns the six persisted slots. The store is loaded once at startup; every
//! mutation afterwards rewrites all six slots while still holding the write
//! lock, so durable storage always matches the in-memory state of this
//! process.
//!
//! There is no coordination between processes. Two processes sharing a data
//! directory overwrite each other's snapshots (last write wins).

use super::backend::SlotBackend;
use crate::records::{
    apply_patch, Appointment, AssessmentResult, Consultation, DailyLog, HealthReport, MonthlyPlan,
    ProfilePatch, UserProfile,
};
use crate::{MediZenError, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The named, independently persisted slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Profile,
    Reports,
    Appointments,
    Consultations,
    DailyLogs,
    Assessments,
}

impl Slot {
    pub const ALL: [Slot; 6] = [
        Slot::Profile,
        Slot::Reports,
        Slot::Appointments,
        Slot::Consultations,
        Slot::DailyLogs,
        Slot::Assessments,
    ];

    /// Storage key of the slot
    pub fn key(&self) -> &'static str {
        match self {
            Slot::Profile => "medi_user_v2",
            Slot::Reports => "medi_reports",
            Slot::Appointments => "medi_appointments",
            Slot::Consultations => "medi_consults",
            Slot::DailyLogs => "medi_logs",
            Slot::Assessments => "medi_assessments",
        }
    }
}

/// Key of the saved monthly plan, kept beside the six slots
pub const PLAN_KEY: &str = "medi_current_plan";

/// In-memory image of all slots. Collections are newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppData {
    pub profile: UserProfile,
    pub reports: Vec<HealthReport>,
    pub appointments: Vec<Appointment>,
    pub consultations: Vec<Consultation>,
    pub daily_logs: Vec<DailyLog>,
    pub assessments: Vec<AssessmentResult>,
}

impl AppData {
    fn serialize_slot(&self, slot: Slot) -> Result<String> {
        let json = match slot {
            Slot::Profile => serde_json::to_string(&self.profile),
            Slot::Reports => serde_json::to_string(&self.reports),
            Slot::Appointments => serde_json::to_string(&self.appointments),
            Slot::Consultations => serde_json::to_string(&self.consultations),
            Slot::DailyLogs => serde_json::to_string(&self.daily_logs),
            Slot::Assessments => serde_json::to_string(&self.assessments),
        };
        json.map_err(|e| MediZenError::StorageError(format!("Failed to serialize {}: {}", slot.key(), e)))
    }
}

/// Shared handle to the store
pub type SharedStateStore = Arc<StateStore>;

pub struct StateStore {
    backend: Arc<dyn SlotBackend>,
    data: RwLock<AppData>,
    loaded: AtomicBool,
}

impl StateStore {
    /// Create an unloaded store over `backend`
    pub fn new(backend: Arc<dyn SlotBackend>) -> Self {
        Self {
            backend,
            data: RwLock::new(AppData::default()),
            loaded: AtomicBool::new(false),
        }
    }

    /// Read every slot from durable storage.
    ///
    /// A slot that is missing keeps its default. A slot that cannot be read or
    /// parsed is logged and reset to its default without affecting the
    /// others; those slots are returned. Loading again without intervening
    /// writes yields the same state.
    pub fn load(&self) -> Vec<Slot> {
        let mut fallbacks = Vec::new();
        let mut data = AppData::default();

        for slot in Slot::ALL {
            let ok = match slot {
                Slot::Profile => self.read_slot(slot, &mut data.profile),
                Slot::Reports => self.read_slot(slot, &mut data.reports),
                Slot::Appointments => self.read_slot(slot, &mut data.appointments),
                Slot::Consultations => self.read_slot(slot, &mut data.consultations),
                Slot::DailyLogs => self.read_slot(slot, &mut data.daily_logs),
                Slot::Assessments => self.read_slot(slot, &mut data.assessments),
            };
            if !ok {
                fallbacks.push(slot);
            }
        }

        *self.data.write() = data;
        self.loaded.store(true, Ordering::SeqCst);

        info!(
            "Loaded state store ({} slot(s) fell back to defaults)",
            fallbacks.len()
        );
        fallbacks
    }

    fn read_slot<T: DeserializeOwned>(&self, slot: Slot, target: &mut T) -> bool {
        let raw = match self.backend.read(slot.key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return true,
            Err(e) => {
                error!("Failed to read slot {}: {}", slot.key(), e);
                return false;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                *target = value;
                true
            }
            Err(e) => {
                warn!("Slot {} is corrupt, using default: {}", slot.key(), e);
                false
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(MediZenError::NotLoaded)
        }
    }

    /// Write every slot from the current in-memory state
    pub fn save(&self) -> Result<()> {
        self.ensure_loaded()?;
        let data = self.data.read();
        self.persist(&data)
    }

    /// Serialize and write all slots. Every slot is attempted; the first
    /// failure is returned, with storage-full taking precedence.
    fn persist(&self, data: &AppData) -> Result<()> {
        let mut first_error: Option<MediZenError> = None;

        for slot in Slot::ALL {
            let result = data
                .serialize_slot(slot)
                .and_then(|json| self.backend.write(slot.key(), &json));

            if let Err(e) = result {
                error!("Failed to persist slot {}: {}", slot.key(), e);
                let replace = match (&first_error, &e) {
                    (None, _) => true,
                    (Some(MediZenError::StorageQuotaExceeded(_)), _) => false,
                    (Some(_), MediZenError::StorageQuotaExceeded(_)) => true,
                    _ => false,
                };
                if replace {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                debug!("Persisted all slots");
                Ok(())
            }
        }
    }

    /// Apply a mutation and persist the result.
    ///
    /// The in-memory change is kept even when persisting fails; the error
    /// is returned so the caller can tell the user.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut AppData) -> Result<R>) -> Result<R> {
        self.ensure_loaded()?;
        let mut data = self.data.write();
        let out = f(&mut data)?;
        self.persist(&data)?;
        Ok(out)
    }

    /// Clone of the whole in-memory state
    pub fn snapshot(&self) -> AppData {
        self.data.read().clone()
    }

    pub fn profile(&self) -> UserProfile {
        self.data.read().profile.clone()
    }

    pub fn reports(&self) -> Vec<HealthReport> {
        self.data.read().reports.clone()
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.data.read().appointments.clone()
    }

    pub fn consultations(&self) -> Vec<Consultation> {
        self.data.read().consultations.clone()
    }

    pub fn daily_logs(&self) -> Vec<DailyLog> {
        self.data.read().daily_logs.clone()
    }

    pub fn assessments(&self) -> Vec<AssessmentResult> {
        self.data.read().assessments.clone()
    }

    pub fn find_report(&self, id: &str) -> Option<HealthReport> {
        self.data.read().reports.iter().find(|r| r.id == id).cloned()
    }

    /// Merge a partial profile into the singleton
    pub fn update_profile(&self, patch: &ProfilePatch) -> Result<UserProfile> {
        self.mutate(|data| {
            data.profile = apply_patch(&data.profile, patch);
            Ok(data.profile.clone())
        })
    }

    pub fn add_report(&self, report: HealthReport) -> Result<()> {
        self.mutate(|data| {
            data.reports.insert(0, report);
            Ok(())
        })
    }

    /// Replace the report with the same id
    pub fn replace_report(&self, report: HealthReport) -> Result<()> {
        self.mutate(|data| {
            let slot = data
                .reports
                .iter_mut()
                .find(|r| r.id == report.id)
                .ok_or_else(|| MediZenError::NotFound(format!("report {}", report.id)))?;
            *slot = report;
            Ok(())
        })
    }

    pub fn add_appointment(&self, appointment: Appointment) -> Result<()> {
        self.mutate(|data| {
            data.appointments.insert(0, appointment);
            Ok(())
        })
    }

    pub fn add_consultation(&self, consultation: Consultation) -> Result<()> {
        self.mutate(|data| {
            data.consultations.insert(0, consultation);
            Ok(())
        })
    }

    pub fn add_daily_log(&self, log: DailyLog) -> Result<()> {
        self.mutate(|data| {
            data.daily_logs.insert(0, log);
            Ok(())
        })
    }

    pub fn add_assessment(&self, assessment: AssessmentResult) -> Result<()> {
        self.mutate(|data| {
            data.assessments.insert(0, assessment);
            Ok(())
        })
    }

    /// Persist the current monthly plan
    pub fn save_plan(&self, plan: &MonthlyPlan) -> Result<()> {
        self.ensure_loaded()?;
        self.write_extra(PLAN_KEY, plan)
    }

    /// The saved monthly plan; a corrupt value is logged and ignored
    pub fn load_plan(&self) -> Option<MonthlyPlan> {
        let raw = match self.backend.read(PLAN_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read saved plan: {}", e);
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| warn!("Saved plan is corrupt: {}", e))
            .ok()
    }

    fn write_extra<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| MediZenError::StorageError(format!("Failed to serialize {}: {}", key, e)))?;
        self.backend.write(key, &json)
    }
}

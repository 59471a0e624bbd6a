use super::Companion;
use crate::gateway::{Blob, ClinicSearch, LatLng};
use crate::records::Appointment;
use crate::{MediZenError, Result};
use chrono::{NaiveDate, NaiveTime};
use std::path::Path;
use tracing::info;

/// Specialty the model answers with when a document needs no follow-up
pub const HEALTHY_SPECIALTY: &str = "Healthy";

/// Where a scanned document sends the user
#[derive(Debug, Clone, PartialEq)]
pub enum Referral {
    /// Nothing in the document needs a specialist
    Healthy { summary: String },
    /// No specialty could be read; one has to be picked by hand
    Undetermined { summary: String },
    Clinics {
        specialty: String,
        summary: String,
        search: ClinicSearch,
    },
}

impl Companion {
    /// Clinics near `location` for `specialty`, defaulting to the specialty of
    /// the most recent report
    pub async fn find_clinics(
        &self,
        specialty: Option<&str>,
        location: Option<LatLng>,
    ) -> Result<ClinicSearch> {
        let specialty = match specialty.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.to_string(),
            None => self
                .store
                .reports()
                .first()
                .map(|r| r.specialty.clone())
                .unwrap_or_else(|| "General".to_string()),
        };
        self.gateway.find_clinics(&specialty, location).await
    }

    /// Read a medical document and look for clinics of the specialty it calls for.
    ///
    /// The document is not filed as a report.
    pub async fn find_clinics_for_document(
        &self,
        path: &Path,
        location: Option<LatLng>,
    ) -> Result<Referral> {
        let document = Blob::from_file(path)?;
        let analysis = self.gateway.analyze_report(&document).await?;
        let summary = analysis.summary;
        let specialty = analysis.specialty.trim();

        if specialty.eq_ignore_ascii_case(HEALTHY_SPECIALTY) {
            info!("Document needs no specialist");
            return Ok(Referral::Healthy { summary });
        }
        if specialty.is_empty() {
            return Ok(Referral::Undetermined { summary });
        }

        let search = self.gateway.find_clinics(specialty, location).await?;
        Ok(Referral::Clinics {
            specialty: specialty.to_string(),
            summary,
            search,
        })
    }

    /// Book a visit; new appointments are always `Scheduled`
    pub fn book_appointment(
        &self,
        clinic_name: &str,
        specialty: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Appointment> {
        if clinic_name.trim().is_empty() {
            return Err(MediZenError::InvalidInput("clinic name is required".into()));
        }

        let appointment = Appointment::scheduled(clinic_name.trim(), specialty, date, time);
        self.store.add_appointment(appointment.clone())?;
        info!("Booked {} on {} at {}", appointment.clinic_name, date, time);
        Ok(appointment)
    }
}

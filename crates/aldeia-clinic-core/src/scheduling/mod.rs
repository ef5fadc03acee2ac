//! Appointment scheduling operations.
//!
//! Lifecycle: a visit is created `Scheduled`; an operator may cancel it or
//! bring it forward to now; the prescription finalizer (see [`crate::finalize`])
//! drives it to `Completed`. Terminal states accept no further mutation.

pub mod normalizer;
mod status;
mod transitions;

pub use status::StatusDeriver;
pub use transitions::{transition, AppointmentEvent};

use thiserror::Error;
use tracing::info;

use crate::config::ClinicConfig;
use crate::db::{Database, DbError};
use crate::models::{
    AgendaEntry, Appointment, AppointmentHistoryEntry, AppointmentStatus, Prescription,
    PrescriptionItemDetail, DEFAULT_APPOINTMENT_REASON,
};

/// Scheduling errors.
#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No transition defined from '{from}' for '{event}'")]
    InvalidTransition { from: String, event: String },

    #[error("Appointment already finalized: {0}")]
    AlreadyFinalized(String),

    #[error("A prescription needs at least one item or care notes")]
    EmptyPrescription,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Appointment store unavailable: {0}")]
    StoreUnavailable(#[from] DbError),
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Input for creating an appointment.
#[derive(Debug, Clone, Default)]
pub struct NewAppointment {
    pub patient_id: String,
    /// Absent falls back to the configured default clinician
    pub doctor_id: Option<String>,
    /// Calendar day or timestamp; absent means now
    pub date: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Partial update for cancel / bring-forward flows.
#[derive(Debug, Clone, Default)]
pub struct AppointmentUpdate {
    /// Target status label (`"cancelled"`); completion is rejected here, it
    /// only happens through the finalizer
    pub status: Option<String>,
    pub date: Option<String>,
}

/// Detail read model joining appointment → prescription → items.
#[derive(Debug, Clone)]
pub struct AppointmentDetails {
    pub appointment: Appointment,
    pub doctor_name: Option<String>,
    pub prescription: Option<Prescription>,
    pub items: Vec<PrescriptionItemDetail>,
}

/// Appointment operations against the store.
pub struct Scheduler<'a> {
    db: &'a Database,
    config: &'a ClinicConfig,
}

impl<'a> Scheduler<'a> {
    pub fn new(db: &'a Database, config: &'a ClinicConfig) -> Self {
        Self { db, config }
    }

    /// Create an appointment; the initial status is always `Scheduled`.
    pub fn create_appointment(&self, input: NewAppointment) -> SchedulingResult<Appointment> {
        if self.db.get_patient(&input.patient_id)?.is_none() {
            return Err(SchedulingError::NotFound(format!(
                "patient {}",
                input.patient_id
            )));
        }

        let date = normalizer::normalize(input.date.as_deref())?;
        let doctor_id = input
            .doctor_id
            .or_else(|| self.config.default_clinician_id.clone());
        let reason = input
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APPOINTMENT_REASON.into());

        let appointment = Appointment::new(input.patient_id, doctor_id, date, reason, input.notes);
        self.db.insert_appointment(&appointment)?;

        info!(
            appointment_id = %appointment.id,
            patient_id = %appointment.patient_id,
            date = %appointment.date,
            "appointment scheduled"
        );
        Ok(appointment)
    }

    /// Cancel a scheduled appointment.
    pub fn cancel_appointment(&self, id: &str) -> SchedulingResult<Appointment> {
        let appointment = self.require(id)?;
        let next = transitions::transition(appointment.status, AppointmentEvent::Cancel)?;
        self.db.update_appointment_fields(id, Some(next), None)?;

        info!(appointment_id = %id, "appointment cancelled");
        self.require(id)
    }

    /// Rewrite a scheduled appointment's date to the current instant. A date
    /// mutation only; the status stays `Scheduled`.
    pub fn bring_to_now(&self, id: &str) -> SchedulingResult<Appointment> {
        let appointment = self.require(id)?;
        transitions::transition(appointment.status, AppointmentEvent::Reschedule)?;

        let now = chrono::Utc::now();
        self.db.update_appointment_fields(id, None, Some(&now))?;

        info!(appointment_id = %id, "appointment brought forward to now");
        self.require(id)
    }

    /// Generic partial update used by the cancel / bring-forward flows.
    /// Rejects terminal-state mutation and any attempt to set `completed`
    /// directly.
    pub fn update_appointment(
        &self,
        id: &str,
        update: AppointmentUpdate,
    ) -> SchedulingResult<Appointment> {
        if update.status.is_none() && update.date.is_none() {
            return Err(SchedulingError::Validation(
                "Update carries neither status nor date".into(),
            ));
        }

        let appointment = self.require(id)?;

        let new_status = match update.status.as_deref() {
            None => None,
            Some(raw) => {
                let target = AppointmentStatus::parse(raw).ok_or_else(|| {
                    SchedulingError::Validation(format!("Unknown status: '{raw}'"))
                })?;
                match target {
                    AppointmentStatus::Cancelled => Some(transitions::transition(
                        appointment.status,
                        AppointmentEvent::Cancel,
                    )?),
                    // Completion only happens through the finalizer; setting
                    // `scheduled` re-opens nothing, it is a no-op guarded like
                    // a reschedule.
                    AppointmentStatus::Completed => {
                        return Err(SchedulingError::InvalidTransition {
                            from: appointment.status.as_str().into(),
                            event: AppointmentEvent::Complete.as_str().into(),
                        });
                    }
                    AppointmentStatus::Scheduled => {
                        transitions::transition(appointment.status, AppointmentEvent::Reschedule)?;
                        None
                    }
                }
            }
        };

        let new_date = match update.date.as_deref() {
            None => None,
            Some(raw) => {
                transitions::transition(appointment.status, AppointmentEvent::Reschedule)?;
                Some(normalizer::normalize(Some(raw))?)
            }
        };

        self.db
            .update_appointment_fields(id, new_status, new_date.as_ref())?;
        self.require(id)
    }

    /// Appointments within a date range, with patient names (agenda view).
    /// Bare dates bound the range by whole local days.
    pub fn agenda(&self, start: &str, end: &str) -> SchedulingResult<Vec<AgendaEntry>> {
        let start = normalizer::range_start_in(start, &chrono::Local)?;
        let end = normalizer::range_end_in(end, &chrono::Local)?;
        Ok(self.db.list_agenda(&start, &end)?)
    }

    /// Per-patient appointment history, newest first, with prescription
    /// annotations.
    pub fn patient_history(&self, patient_id: &str) -> SchedulingResult<Vec<AppointmentHistoryEntry>> {
        Ok(self.db.list_appointments_for_patient(patient_id)?)
    }

    /// Full detail view for one appointment: prescription and items included
    /// when the visit was finalized.
    pub fn appointment_details(&self, id: &str) -> SchedulingResult<AppointmentDetails> {
        let appointment = self.require(id)?;

        let doctor_name = match &appointment.doctor_id {
            Some(doctor_id) => self.db.get_clinician(doctor_id)?.map(|c| c.full_name),
            None => None,
        };

        let prescription = self.db.get_prescription_for_appointment(id)?;
        let items = match &prescription {
            Some(rx) => self.db.list_prescription_items_with_catalog(&rx.id)?,
            None => Vec::new(),
        };

        Ok(AppointmentDetails {
            appointment,
            doctor_name,
            prescription,
            items,
        })
    }

    fn require(&self, id: &str) -> SchedulingResult<Appointment> {
        self.db
            .get_appointment(id)?
            .ok_or_else(|| SchedulingError::NotFound(format!("appointment {id}")))
    }
}

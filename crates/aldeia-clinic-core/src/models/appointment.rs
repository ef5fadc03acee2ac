//! Appointment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason recorded when a visit is created without one.
pub const DEFAULT_APPOINTMENT_REASON: &str = "Consulta Inicial";

/// Reason marking a follow-up visit chained from a finalized one.
pub const FOLLOW_UP_REASON: &str = "Retorno";

/// Note attached to appointments booked by the prescription finalizer.
pub const FOLLOW_UP_NOTE: &str = "Agendado via Prescrição";

/// Appointment lifecycle status.
///
/// `Scheduled` is the only live state; `Completed` and `Cancelled` are
/// terminal. Completion is reached exclusively through the prescription
/// finalizer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// No transition is defined out of a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A clinical encounter between a patient and a clinician at one instant.
/// There is no separate duration or end time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// UUID, generated at creation
    pub id: String,
    pub patient_id: String,
    /// Attending clinician; NULL falls back to the configured default
    pub doctor_id: Option<String>,
    /// Instant of the visit
    pub date: DateTime<Utc>,
    /// Free-text visit reason
    pub reason: String,
    /// Free-text notes
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Appointment {
    /// Create a new appointment; initial status is always `Scheduled`.
    pub fn new(
        patient_id: String,
        doctor_id: Option<String>,
        date: DateTime<Utc>,
        reason: String,
        notes: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            doctor_id,
            date,
            reason,
            notes,
            status: AppointmentStatus::Scheduled,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Agenda (calendar) read model: one appointment with the patient it belongs to.
#[derive(Debug, Clone)]
pub struct AgendaEntry {
    pub appointment: Appointment,
    pub patient_name: String,
}

/// Per-patient history read model: one appointment annotated with the
/// clinician name and the outcome of the visit, if finalized.
#[derive(Debug, Clone)]
pub struct AppointmentHistoryEntry {
    pub appointment: Appointment,
    pub doctor_name: Option<String>,
    pub has_prescription: bool,
    pub diagnosis: Option<String>,
}

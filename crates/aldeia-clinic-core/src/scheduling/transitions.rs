//! Appointment state transitions.
//!
//! `Scheduled` is the only state with outgoing edges. The source system left
//! this to UI button visibility; here every mutation path goes through
//! [`transition`], so terminal appointments reject changes at the data layer.

use crate::models::AppointmentStatus;

use super::{SchedulingError, SchedulingResult};

/// Events that drive an appointment's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentEvent {
    /// Operator cancels the visit.
    Cancel,
    /// The prescription finalizer closes the visit.
    Complete,
    /// The visit date is rewritten (e.g. brought forward to now). A date
    /// mutation, not a state change; listed so terminal states reject it.
    Reschedule,
}

impl AppointmentEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentEvent::Cancel => "cancel",
            AppointmentEvent::Complete => "complete",
            AppointmentEvent::Reschedule => "reschedule",
        }
    }
}

/// Apply an event to a status, returning the next status or
/// `InvalidTransition`.
pub fn transition(
    from: AppointmentStatus,
    event: AppointmentEvent,
) -> SchedulingResult<AppointmentStatus> {
    match (from, event) {
        (AppointmentStatus::Scheduled, AppointmentEvent::Cancel) => Ok(AppointmentStatus::Cancelled),
        (AppointmentStatus::Scheduled, AppointmentEvent::Complete) => {
            Ok(AppointmentStatus::Completed)
        }
        (AppointmentStatus::Scheduled, AppointmentEvent::Reschedule) => {
            Ok(AppointmentStatus::Scheduled)
        }
        (from, event) => Err(SchedulingError::InvalidTransition {
            from: from.as_str().into(),
            event: event.as_str().into(),
        }),
    }
}

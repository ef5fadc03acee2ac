//! Prescription finalizer.
//!
//! The one transactional unit of the subsystem: issuing a prescription for a
//! scheduled appointment persists the prescription and its items and drives
//! the appointment to `Completed`, atomically. No prescription may exist
//! whose owning appointment is not completed.
//!
//! An optional follow-up visit is booked *after* the transaction commits, in
//! its own unit of work: the prescription is the primary artifact, so a
//! failed follow-up booking downgrades to a warning instead of rolling back.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::ClinicConfig;
use crate::db::{self, Database};
use crate::models::{
    AppointmentStatus, FollowUpRequest, Prescription, PrescriptionItem, PrescriptionItemInput,
    FOLLOW_UP_NOTE, FOLLOW_UP_REASON,
};
use crate::scheduling::{
    transition, AppointmentEvent, NewAppointment, Scheduler, SchedulingError, SchedulingResult,
};

/// Input for finalizing an appointment.
#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    pub appointment_id: String,
    /// Absent falls back to the configured default clinician
    pub doctor_id: Option<String>,
    pub items: Vec<PrescriptionItemInput>,
    /// Free-text care instructions
    pub notes: String,
    pub diagnosis: Option<String>,
    pub follow_up: Option<FollowUpRequest>,
}

/// What happened to the requested follow-up visit.
#[derive(Debug, Clone, PartialEq)]
pub enum FollowUpOutcome {
    NotRequested,
    Scheduled { appointment_id: String },
    /// Booking failed after the prescription committed; reported as a
    /// warning, never as a transaction abort.
    Failed { reason: String },
}

/// Result of a successful finalization.
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub prescription_id: String,
    pub appointment_id: String,
    pub follow_up: FollowUpOutcome,
}

/// Finalizes appointments. Needs exclusive database access for the duration
/// of its write transaction.
pub struct Finalizer<'a> {
    db: &'a mut Database,
    config: &'a ClinicConfig,
}

impl<'a> Finalizer<'a> {
    pub fn new(db: &'a mut Database, config: &'a ClinicConfig) -> Self {
        Self { db, config }
    }

    /// Issue a prescription for a scheduled appointment.
    ///
    /// Inside one IMMEDIATE transaction: insert the prescription, insert its
    /// items in caller order, complete the appointment. The transaction holds
    /// the write lock across the status check, so of two concurrent calls for
    /// the same appointment exactly one succeeds and the other observes the
    /// committed `Completed` row and gets `AlreadyFinalized`.
    pub fn finalize(&mut self, request: FinalizeRequest) -> SchedulingResult<FinalizeOutcome> {
        if request.items.is_empty() && request.notes.trim().is_empty() {
            return Err(SchedulingError::EmptyPrescription);
        }

        let doctor_id = request
            .doctor_id
            .or_else(|| self.config.default_clinician_id.clone());

        let prescription = Prescription::new(
            request.appointment_id.clone(),
            doctor_id,
            request.notes,
            request.diagnosis,
        );
        let items = build_items(&prescription.id, request.items)?;

        let patient_id;
        {
            let tx = self.db.write_transaction()?;

            let appointment = db::get_appointment(&tx, &request.appointment_id)?.ok_or_else(
                || SchedulingError::NotFound(format!("appointment {}", request.appointment_id)),
            )?;
            match appointment.status {
                AppointmentStatus::Scheduled => {}
                AppointmentStatus::Completed => {
                    return Err(SchedulingError::AlreadyFinalized(request.appointment_id));
                }
                AppointmentStatus::Cancelled => {
                    return Err(SchedulingError::InvalidTransition {
                        from: appointment.status.as_str().into(),
                        event: AppointmentEvent::Complete.as_str().into(),
                    });
                }
            }

            db::insert_prescription(&tx, &prescription)?;
            for item in &items {
                db::insert_prescription_item(&tx, item)?;
            }

            let next = transition(appointment.status, AppointmentEvent::Complete)?;
            db::set_appointment_status(&tx, &appointment.id, next)?;

            tx.commit().map_err(db::DbError::from)?;
            patient_id = appointment.patient_id;
        }

        info!(
            prescription_id = %prescription.id,
            appointment_id = %prescription.appointment_id,
            items = items.len(),
            "prescription issued, appointment completed"
        );

        let follow_up = match request.follow_up {
            None => FollowUpOutcome::NotRequested,
            Some(follow_up) => self.schedule_follow_up(&patient_id, follow_up),
        };

        Ok(FinalizeOutcome {
            prescription_id: prescription.id,
            appointment_id: prescription.appointment_id,
            follow_up,
        })
    }

    /// Best-effort follow-up booking, after the prescription committed.
    fn schedule_follow_up(&self, patient_id: &str, request: FollowUpRequest) -> FollowUpOutcome {
        let scheduler = Scheduler::new(&*self.db, self.config);
        let result = scheduler.create_appointment(NewAppointment {
            patient_id: patient_id.into(),
            doctor_id: None,
            date: Some(format!("{}T{}", request.date, request.time)),
            reason: Some(FOLLOW_UP_REASON.into()),
            notes: Some(FOLLOW_UP_NOTE.into()),
        });

        match result {
            Ok(appointment) => FollowUpOutcome::Scheduled {
                appointment_id: appointment.id,
            },
            Err(e) => {
                warn!(patient_id = %patient_id, error = %e, "follow-up booking failed");
                FollowUpOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Materialize item inputs, validating end dates and computing the
/// open-ended flag once, at write time.
fn build_items(
    prescription_id: &str,
    inputs: Vec<PrescriptionItemInput>,
) -> SchedulingResult<Vec<PrescriptionItem>> {
    inputs
        .into_iter()
        .map(|input| {
            let end_date = input
                .end_date
                .map(|raw| {
                    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                        SchedulingError::Validation(format!("Unparsable end date '{raw}': {e}"))
                    })
                })
                .transpose()?;
            let is_ongoing = crate::models::classify_ongoing(input.duration.as_deref());

            Ok(PrescriptionItem {
                id: uuid::Uuid::new_v4().to_string(),
                prescription_id: prescription_id.into(),
                kind: input.kind,
                name: input.name,
                dosage: input.dosage,
                frequency: input.frequency,
                duration: input.duration,
                end_date,
                is_ongoing,
                plant_id: input.plant_id,
                treatment_id: input.treatment_id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemKind, Patient};
    use crate::scheduling::StatusDeriver;
    use chrono::{Datelike, Local};

    fn setup() -> (Database, ClinicConfig, String, String) {
        let db = Database::open_in_memory().unwrap();
        let config = ClinicConfig::default();
        let patient = Patient::new("Iracema".into(), "São João".into());
        db.insert_patient(&patient).unwrap();

        let scheduler = Scheduler::new(&db, &config);
        let apt = scheduler
            .create_appointment(NewAppointment {
                patient_id: patient.id.clone(),
                reason: Some("Consulta".into()),
                ..Default::default()
            })
            .unwrap();
        (db, config, patient.id, apt.id)
    }

    fn guaco_item() -> PrescriptionItemInput {
        PrescriptionItemInput {
            kind: ItemKind::Traditional,
            name: "Chá de Guaco".into(),
            dosage: "200ml".into(),
            frequency: "2x/dia".into(),
            duration: Some("7 dias".into()),
            end_date: None,
            plant_id: None,
            treatment_id: None,
        }
    }

    fn request(appointment_id: &str) -> FinalizeRequest {
        FinalizeRequest {
            appointment_id: appointment_id.into(),
            doctor_id: None,
            items: vec![guaco_item()],
            notes: "Repouso".into(),
            diagnosis: Some("Gripe".into()),
            follow_up: None,
        }
    }

    #[test]
    fn test_finalize_completes_appointment() {
        let (mut db, config, _, apt_id) = setup();

        let outcome = Finalizer::new(&mut db, &config)
            .finalize(request(&apt_id))
            .unwrap();
        assert_eq!(outcome.follow_up, FollowUpOutcome::NotRequested);

        let apt = db.get_appointment(&apt_id).unwrap().unwrap();
        assert_eq!(apt.status, AppointmentStatus::Completed);

        let rx = db.get_prescription_for_appointment(&apt_id).unwrap().unwrap();
        assert_eq!(rx.id, outcome.prescription_id);
        assert_eq!(rx.diagnosis, Some("Gripe".into()));

        let items = db.list_prescription_items(&rx.id).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Chá de Guaco");
        assert!(!items[0].is_ongoing);
    }

    #[test]
    fn test_second_finalize_rejected() {
        let (mut db, config, _, apt_id) = setup();

        Finalizer::new(&mut db, &config)
            .finalize(request(&apt_id))
            .unwrap();
        let result = Finalizer::new(&mut db, &config).finalize(request(&apt_id));
        assert!(matches!(result, Err(SchedulingError::AlreadyFinalized(_))));

        // Still exactly one prescription
        let count: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM prescriptions WHERE appointment_id = ?",
                [apt_id.as_str()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_finalize_cancelled_is_invalid_transition() {
        let (mut db, config, _, apt_id) = setup();

        Scheduler::new(&db, &config).cancel_appointment(&apt_id).unwrap();

        let result = Finalizer::new(&mut db, &config).finalize(request(&apt_id));
        assert!(matches!(
            result,
            Err(SchedulingError::InvalidTransition { .. })
        ));
        assert!(db.get_prescription_for_appointment(&apt_id).unwrap().is_none());
    }

    #[test]
    fn test_finalize_missing_appointment() {
        let (mut db, config, _, _) = setup();
        let result = Finalizer::new(&mut db, &config).finalize(request("no-such-appointment"));
        assert!(matches!(result, Err(SchedulingError::NotFound(_))));
    }

    #[test]
    fn test_empty_prescription_rejected() {
        let (mut db, config, _, apt_id) = setup();

        let mut req = request(&apt_id);
        req.items.clear();
        req.notes = "  ".into();

        let result = Finalizer::new(&mut db, &config).finalize(req);
        assert!(matches!(result, Err(SchedulingError::EmptyPrescription)));

        // The appointment is untouched
        let apt = db.get_appointment(&apt_id).unwrap().unwrap();
        assert_eq!(apt.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_notes_alone_suffice() {
        let (mut db, config, _, apt_id) = setup();

        let mut req = request(&apt_id);
        req.items.clear();
        req.notes = "Apenas repouso e hidratação".into();

        assert!(Finalizer::new(&mut db, &config).finalize(req).is_ok());
    }

    #[test]
    fn test_ongoing_flag_computed_at_write() {
        let (mut db, config, _, apt_id) = setup();

        let mut req = request(&apt_id);
        req.items[0].duration = Some("Uso Contínuo".into());

        let outcome = Finalizer::new(&mut db, &config).finalize(req).unwrap();
        let items = db.list_prescription_items(&outcome.prescription_id).unwrap();
        assert!(items[0].is_ongoing);
    }

    #[test]
    fn test_bad_end_date_rejected_before_writing() {
        let (mut db, config, _, apt_id) = setup();

        let mut req = request(&apt_id);
        req.items[0].end_date = Some("next week".into());

        let result = Finalizer::new(&mut db, &config).finalize(req);
        assert!(matches!(result, Err(SchedulingError::Validation(_))));
        assert!(db.get_prescription_for_appointment(&apt_id).unwrap().is_none());
    }

    #[test]
    fn test_follow_up_scheduled() {
        let (mut db, config, patient_id, apt_id) = setup();

        let mut req = request(&apt_id);
        req.follow_up = Some(FollowUpRequest {
            date: "2099-06-08".into(),
            time: "09:00".into(),
        });

        let outcome = Finalizer::new(&mut db, &config).finalize(req).unwrap();
        let FollowUpOutcome::Scheduled { appointment_id } = &outcome.follow_up else {
            panic!("expected scheduled follow-up, got {:?}", outcome.follow_up);
        };

        let follow_up = db.get_appointment(appointment_id).unwrap().unwrap();
        assert_eq!(follow_up.patient_id, patient_id);
        assert_eq!(follow_up.reason, FOLLOW_UP_REASON);
        assert_eq!(follow_up.status, AppointmentStatus::Scheduled);
        let local_date = follow_up.date.with_timezone(&Local);
        assert_eq!(local_date.year(), 2099);
        assert_eq!(local_date.month(), 6);
        assert_eq!(local_date.day(), 8);
    }

    #[test]
    fn test_follow_up_failure_is_partial_success() {
        let (mut db, config, patient_id, apt_id) = setup();

        let mut req = request(&apt_id);
        req.follow_up = Some(FollowUpRequest {
            date: "semana que vem".into(),
            time: "09:00".into(),
        });

        let outcome = Finalizer::new(&mut db, &config).finalize(req).unwrap();
        assert!(matches!(outcome.follow_up, FollowUpOutcome::Failed { .. }));

        // The prescription committed and the appointment completed
        let apt = db.get_appointment(&apt_id).unwrap().unwrap();
        assert_eq!(apt.status, AppointmentStatus::Completed);
        assert!(db.get_prescription_for_appointment(&apt_id).unwrap().is_some());

        // No follow-up row appeared
        let history = db.list_appointments_for_patient(&patient_id).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_finalize_clears_waiting_status() {
        let (mut db, config, patient_id, apt_id) = setup();

        assert!(StatusDeriver::new(&db).is_waiting_today(&patient_id).unwrap());
        Finalizer::new(&mut db, &config)
            .finalize(request(&apt_id))
            .unwrap();
        assert!(!StatusDeriver::new(&db).is_waiting_today(&patient_id).unwrap());
    }

    #[test]
    fn test_default_clinician_attributed() {
        let (mut db, _, _, apt_id) = setup();
        let doc = crate::models::Clinician::new(
            "Dra. Ana".into(),
            "ana@clinic.org".into(),
            "doctor".into(),
        );
        db.insert_clinician(&doc).unwrap();
        let config = ClinicConfig {
            default_clinician_id: Some(doc.id.clone()),
        };

        let outcome = Finalizer::new(&mut db, &config)
            .finalize(request(&apt_id))
            .unwrap();
        let rx = db
            .get_prescription_for_appointment(&outcome.appointment_id)
            .unwrap()
            .unwrap();
        assert_eq!(rx.doctor_id, Some(doc.id));
    }
}

//! Derived patient status.
//!
//! "Waiting" is not a column: a patient is waiting while they have a
//! scheduled appointment today. The derived value overrides the stored
//! status label for display only and is never written back.

use chrono::{Local, NaiveDate, TimeZone};

use crate::db::Database;
use crate::models::{ActiveTreatment, Patient, WAITING_LABEL};

use super::normalizer;
use super::SchedulingResult;

/// Read-side queries computing a patient's effective clinical state from
/// appointment and prescription rows.
pub struct StatusDeriver<'a> {
    db: &'a Database,
}

impl<'a> StatusDeriver<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Whether the patient has a scheduled appointment today (system-local
    /// calendar day).
    pub fn is_waiting_today(&self, patient_id: &str) -> SchedulingResult<bool> {
        self.is_waiting_on(patient_id, Local::now().date_naive(), &Local)
    }

    /// Same check against an explicit day and zone.
    pub fn is_waiting_on<Tz: TimeZone>(
        &self,
        patient_id: &str,
        day: NaiveDate,
        tz: &Tz,
    ) -> SchedulingResult<bool> {
        let (start, end) = normalizer::day_window_in(day, tz)?;
        Ok(self.db.has_scheduled_between(patient_id, &start, &end)?)
    }

    /// The status label to display: the waiting override while the patient is
    /// in today's queue, the stored label otherwise.
    pub fn effective_status(&self, patient: &Patient) -> SchedulingResult<String> {
        if self.is_waiting_today(&patient.id)? {
            Ok(WAITING_LABEL.into())
        } else {
            Ok(patient.status.clone())
        }
    }

    /// Prescribed items still in effect for the patient as of today.
    pub fn active_treatments(&self, patient_id: &str) -> SchedulingResult<Vec<ActiveTreatment>> {
        self.active_treatments_on(patient_id, Local::now().date_naive())
    }

    /// Same query against an explicit reference day.
    pub fn active_treatments_on(
        &self,
        patient_id: &str,
        today: NaiveDate,
    ) -> SchedulingResult<Vec<ActiveTreatment>> {
        Ok(self.db.list_active_items_for_patient(patient_id, today)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, AppointmentStatus, DEFAULT_PATIENT_STATUS};
    use chrono::Utc;

    fn setup() -> (Database, Patient) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Iracema".into(), "São João".into());
        db.insert_patient(&patient).unwrap();
        (db, patient)
    }

    #[test]
    fn test_waiting_with_scheduled_appointment_today() {
        let (db, patient) = setup();

        let apt = Appointment::new(patient.id.clone(), None, Utc::now(), "Consulta".into(), None);
        db.insert_appointment(&apt).unwrap();

        let deriver = StatusDeriver::new(&db);
        assert!(deriver.is_waiting_today(&patient.id).unwrap());
        assert_eq!(deriver.effective_status(&patient).unwrap(), WAITING_LABEL);
    }

    #[test]
    fn test_not_waiting_without_appointments() {
        let (db, patient) = setup();

        let deriver = StatusDeriver::new(&db);
        assert!(!deriver.is_waiting_today(&patient.id).unwrap());
        assert_eq!(
            deriver.effective_status(&patient).unwrap(),
            DEFAULT_PATIENT_STATUS
        );
    }

    #[test]
    fn test_completed_appointment_clears_waiting() {
        let (db, patient) = setup();

        let apt = Appointment::new(patient.id.clone(), None, Utc::now(), "Consulta".into(), None);
        db.insert_appointment(&apt).unwrap();
        db.update_appointment_fields(&apt.id, Some(AppointmentStatus::Completed), None)
            .unwrap();

        let deriver = StatusDeriver::new(&db);
        assert!(!deriver.is_waiting_today(&patient.id).unwrap());
    }

    #[test]
    fn test_cancelled_appointment_clears_waiting() {
        let (db, patient) = setup();

        let apt = Appointment::new(patient.id.clone(), None, Utc::now(), "Consulta".into(), None);
        db.insert_appointment(&apt).unwrap();
        db.update_appointment_fields(&apt.id, Some(AppointmentStatus::Cancelled), None)
            .unwrap();

        let deriver = StatusDeriver::new(&db);
        assert!(!deriver.is_waiting_today(&patient.id).unwrap());
    }

    #[test]
    fn test_appointment_on_another_day_does_not_count() {
        let (db, patient) = setup();

        let next_week = Utc::now() + chrono::Duration::days(7);
        let apt = Appointment::new(patient.id.clone(), None, next_week, "Retorno".into(), None);
        db.insert_appointment(&apt).unwrap();

        let deriver = StatusDeriver::new(&db);
        assert!(!deriver.is_waiting_today(&patient.id).unwrap());
    }

    #[test]
    fn test_derivation_never_writes_back() {
        let (db, patient) = setup();

        let apt = Appointment::new(patient.id.clone(), None, Utc::now(), "Consulta".into(), None);
        db.insert_appointment(&apt).unwrap();

        let deriver = StatusDeriver::new(&db);
        assert_eq!(deriver.effective_status(&patient).unwrap(), WAITING_LABEL);

        // The stored label is untouched
        let stored = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(stored.status, DEFAULT_PATIENT_STATUS);
    }
}

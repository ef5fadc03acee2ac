//! Appointment store operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{AgendaEntry, Appointment, AppointmentHistoryEntry, AppointmentStatus};

/// Serialize an instant for storage. All appointment dates go through this,
/// so stored values order lexicographically.
pub(crate) fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339()
}

/// Parse a stored instant back.
pub(crate) fn parse_instant(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| DbError::Constraint(format!("Invalid stored timestamp '{}': {}", s, e)))
}

fn status_to_string(status: AppointmentStatus) -> &'static str {
    status.as_str()
}

fn string_to_status(s: &str) -> DbResult<AppointmentStatus> {
    AppointmentStatus::parse(s)
        .ok_or_else(|| DbError::Constraint(format!("Unknown appointment status: {}", s)))
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: String,
    patient_id: String,
    doctor_id: Option<String>,
    date: String,
    reason: String,
    notes: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl AppointmentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            doctor_id: row.get(2)?,
            date: row.get(3)?,
            reason: row.get(4)?,
            notes: row.get(5)?,
            status: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            date: parse_instant(&row.date)?,
            reason: row.reason,
            notes: row.notes,
            status: string_to_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const APPOINTMENT_COLUMNS: &str =
    "id, patient_id, doctor_id, date, reason, notes, status, created_at, updated_at";

/// Same columns qualified with the `a` alias, for joined queries.
const APPOINTMENT_COLUMNS_QUALIFIED: &str = "a.id, a.patient_id, a.doctor_id, a.date, \
     a.reason, a.notes, a.status, a.created_at, a.updated_at";

/// Insert a new appointment. Connection-level so the finalizer can call it
/// inside its own transaction.
pub(crate) fn insert_appointment(conn: &Connection, appointment: &Appointment) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO appointments (
            id, patient_id, doctor_id, date, reason, notes,
            status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            appointment.id,
            appointment.patient_id,
            appointment.doctor_id,
            format_instant(&appointment.date),
            appointment.reason,
            appointment.notes,
            status_to_string(appointment.status),
            appointment.created_at,
            appointment.updated_at,
        ],
    )?;
    Ok(())
}

/// Get an appointment by ID.
pub(crate) fn get_appointment(conn: &Connection, id: &str) -> DbResult<Option<Appointment>> {
    conn.query_row(
        &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?"),
        [id],
        AppointmentRow::from_row,
    )
    .optional()?
    .map(TryInto::try_into)
    .transpose()
}

/// Set the status of an appointment.
pub(crate) fn set_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
) -> DbResult<bool> {
    let rows_affected = conn.execute(
        "UPDATE appointments SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![id, status_to_string(status)],
    )?;
    Ok(rows_affected > 0)
}

impl Database {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        insert_appointment(&self.conn, appointment)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        get_appointment(&self.conn, id)
    }

    /// Partially update status and/or date in one atomic statement; omitted
    /// fields keep their stored value.
    pub fn update_appointment_fields(
        &self,
        id: &str,
        status: Option<AppointmentStatus>,
        date: Option<&DateTime<Utc>>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                status = COALESCE(?2, status),
                date = COALESCE(?3, date),
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![id, status.map(status_to_string), date.map(format_instant)],
        )?;
        Ok(rows_affected > 0)
    }

    /// List appointments within `[start, end)` with patient names, ordered by
    /// date ascending (the agenda view).
    pub fn list_agenda(
        &self,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> DbResult<Vec<AgendaEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS_QUALIFIED}, p.name
            FROM appointments a
            JOIN patients p ON a.patient_id = p.id
            WHERE a.date >= ?1 AND a.date < ?2
            ORDER BY a.date ASC
            "#
        ))?;

        let rows = stmt.query_map(
            params![format_instant(start), format_instant(end)],
            |row| {
                let apt = AppointmentRow::from_row(row)?;
                let patient_name: String = row.get(9)?;
                Ok((apt, patient_name))
            },
        )?;

        let mut entries = Vec::new();
        for row in rows {
            let (apt, patient_name) = row?;
            entries.push(AgendaEntry {
                appointment: apt.try_into()?,
                patient_name,
            });
        }
        Ok(entries)
    }

    /// List all appointments for a patient, newest first, annotated with the
    /// clinician name and the prescription outcome if the visit was finalized.
    pub fn list_appointments_for_patient(
        &self,
        patient_id: &str,
    ) -> DbResult<Vec<AppointmentHistoryEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS_QUALIFIED},
                   c.full_name,
                   pr.id IS NOT NULL,
                   pr.diagnosis
            FROM appointments a
            LEFT JOIN clinicians c ON a.doctor_id = c.id
            LEFT JOIN prescriptions pr ON pr.appointment_id = a.id
            WHERE a.patient_id = ?
            ORDER BY a.date DESC
            "#
        ))?;

        let rows = stmt.query_map([patient_id], |row| {
            let apt = AppointmentRow::from_row(row)?;
            let doctor_name: Option<String> = row.get(9)?;
            let has_prescription: bool = row.get(10)?;
            let diagnosis: Option<String> = row.get(11)?;
            Ok((apt, doctor_name, has_prescription, diagnosis))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (apt, doctor_name, has_prescription, diagnosis) = row?;
            entries.push(AppointmentHistoryEntry {
                appointment: apt.try_into()?,
                doctor_name,
                has_prescription,
                diagnosis,
            });
        }
        Ok(entries)
    }

    /// Whether the patient has at least one scheduled appointment with its
    /// date in `[start, end)`.
    pub fn has_scheduled_between(
        &self,
        patient_id: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM appointments
            WHERE patient_id = ?1
              AND status = 'scheduled'
              AND date >= ?2 AND date < ?3
            "#,
            params![patient_id, format_instant(start), format_instant(end)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;
    use chrono::TimeZone;

    fn setup_db() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Iracema".into(), "São João".into());
        db.insert_patient(&patient).unwrap();
        let id = patient.id;
        (db, id)
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let (db, patient_id) = setup_db();

        let apt = Appointment::new(
            patient_id,
            None,
            at(2024, 6, 1, 9, 0),
            "Consulta".into(),
            Some("primeira visita".into()),
        );
        db.insert_appointment(&apt).unwrap();

        let retrieved = db.get_appointment(&apt.id).unwrap().unwrap();
        assert_eq!(retrieved.date, apt.date);
        assert_eq!(retrieved.status, AppointmentStatus::Scheduled);
        assert_eq!(retrieved.notes, Some("primeira visita".into()));
    }

    #[test]
    fn test_update_fields_partial() {
        let (db, patient_id) = setup_db();

        let apt = Appointment::new(patient_id, None, at(2024, 6, 1, 9, 0), "Consulta".into(), None);
        db.insert_appointment(&apt).unwrap();

        // Only status
        db.update_appointment_fields(&apt.id, Some(AppointmentStatus::Cancelled), None)
            .unwrap();
        let after = db.get_appointment(&apt.id).unwrap().unwrap();
        assert_eq!(after.status, AppointmentStatus::Cancelled);
        assert_eq!(after.date, apt.date);

        // Only date
        let new_date = at(2024, 6, 2, 10, 30);
        db.update_appointment_fields(&apt.id, None, Some(&new_date))
            .unwrap();
        let after = db.get_appointment(&apt.id).unwrap().unwrap();
        assert_eq!(after.date, new_date);
        assert_eq!(after.status, AppointmentStatus::Cancelled);
    }

    #[test]
    fn test_update_missing_row() {
        let (db, _) = setup_db();
        let changed = db
            .update_appointment_fields("no-such-id", Some(AppointmentStatus::Cancelled), None)
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_agenda_range_query() {
        let (db, patient_id) = setup_db();

        let inside = Appointment::new(
            patient_id.clone(),
            None,
            at(2024, 6, 1, 9, 0),
            "Consulta".into(),
            None,
        );
        let later = Appointment::new(
            patient_id.clone(),
            None,
            at(2024, 6, 1, 14, 0),
            "Consulta".into(),
            None,
        );
        let outside = Appointment::new(
            patient_id,
            None,
            at(2024, 6, 2, 9, 0),
            "Consulta".into(),
            None,
        );
        db.insert_appointment(&later).unwrap();
        db.insert_appointment(&inside).unwrap();
        db.insert_appointment(&outside).unwrap();

        let entries = db
            .list_agenda(&at(2024, 6, 1, 0, 0), &at(2024, 6, 2, 0, 0))
            .unwrap();
        assert_eq!(entries.len(), 2);
        // Ascending by date, with patient name joined
        assert_eq!(entries[0].appointment.id, inside.id);
        assert_eq!(entries[1].appointment.id, later.id);
        assert_eq!(entries[0].patient_name, "Iracema");
    }

    #[test]
    fn test_list_for_patient_newest_first() {
        let (db, patient_id) = setup_db();

        let older = Appointment::new(
            patient_id.clone(),
            None,
            at(2024, 5, 1, 9, 0),
            "Consulta".into(),
            None,
        );
        let newer = Appointment::new(
            patient_id.clone(),
            None,
            at(2024, 6, 1, 9, 0),
            "Retorno".into(),
            None,
        );
        db.insert_appointment(&older).unwrap();
        db.insert_appointment(&newer).unwrap();

        let history = db.list_appointments_for_patient(&patient_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].appointment.id, newer.id);
        assert_eq!(history[1].appointment.id, older.id);
        assert!(!history[0].has_prescription);
        assert!(history[0].diagnosis.is_none());
    }

    #[test]
    fn test_has_scheduled_between() {
        let (db, patient_id) = setup_db();

        let apt = Appointment::new(
            patient_id.clone(),
            None,
            at(2024, 6, 1, 9, 0),
            "Consulta".into(),
            None,
        );
        db.insert_appointment(&apt).unwrap();

        assert!(db
            .has_scheduled_between(&patient_id, &at(2024, 6, 1, 0, 0), &at(2024, 6, 2, 0, 0))
            .unwrap());
        assert!(!db
            .has_scheduled_between(&patient_id, &at(2024, 6, 2, 0, 0), &at(2024, 6, 3, 0, 0))
            .unwrap());

        // A cancelled appointment does not count
        db.update_appointment_fields(&apt.id, Some(AppointmentStatus::Cancelled), None)
            .unwrap();
        assert!(!db
            .has_scheduled_between(&patient_id, &at(2024, 6, 1, 0, 0), &at(2024, 6, 2, 0, 0))
            .unwrap());
    }

    #[test]
    fn test_unknown_status_string_rejected() {
        assert!(string_to_status("archived").is_err());
        assert!(string_to_status("Agendada").is_err());
    }
}
